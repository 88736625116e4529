use crate::domain::{ClassifiedMessage, KindFilter, MediaKind, RemoteMessage};

/// Transfer direction. The two flows recognize different content kinds and
/// check populated fields in a different precedence order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Download,
    Copy,
}

impl Flow {
    /// Fixed precedence used to resolve a message's intrinsic kind.
    pub fn precedence(&self) -> &'static [MediaKind] {
        match self {
            Flow::Download => &[
                MediaKind::Video,
                MediaKind::Photo,
                MediaKind::Voice,
                MediaKind::Audio,
                MediaKind::Animation,
                MediaKind::Document,
            ],
            Flow::Copy => &[
                MediaKind::Document,
                MediaKind::Video,
                MediaKind::Animation,
                MediaKind::Sticker,
                MediaKind::Voice,
                MediaKind::Audio,
                MediaKind::Text,
                MediaKind::Photo,
            ],
        }
    }

    /// Kind filters a caller may request for this flow.
    pub fn allowed_kinds(&self) -> &'static [MediaKind] {
        self.precedence()
    }
}

/// Resolve the intrinsic content kind of a message for a flow: the first
/// populated content field in the flow's precedence order.
pub fn intrinsic_kind(msg: &RemoteMessage, flow: Flow) -> Option<MediaKind> {
    flow.precedence().iter().copied().find(|kind| match kind {
        MediaKind::Text => msg.text.is_some(),
        other => msg.attachment(*other).is_some(),
    })
}

/// Case-insensitive caption substring check. An empty filter set passes
/// everything; a missing caption fails any non-empty filter set.
pub fn caption_matches(caption: Option<&str>, filters: &[String]) -> bool {
    if filters.is_empty() {
        return true;
    }
    let Some(caption) = caption else {
        return false;
    };
    let lower = caption.to_lowercase();
    filters.iter().any(|f| lower.contains(&f.to_lowercase()))
}

/// Classify one message against a requested kind filter and caption filters.
///
/// `kind` is set only when the intrinsic kind matches the request; usability
/// additionally requires the caption filters to pass. Pure: classifying the
/// same message twice yields identical results.
pub fn classify(
    msg: &RemoteMessage,
    requested: KindFilter,
    caption_filters: &[String],
    flow: Flow,
) -> ClassifiedMessage {
    let kind = intrinsic_kind(msg, flow).filter(|k| requested.matches(*k));
    let usable = kind.is_some() && caption_matches(msg.caption.as_deref(), caption_filters);

    ClassifiedMessage {
        id: msg.id,
        kind,
        caption: msg.caption.clone(),
        usable,
    }
}

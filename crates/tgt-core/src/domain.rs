use std::fmt;

use serde::{Deserialize, Serialize};

/// A chat identifier: numeric id or public username/handle.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChatHandle {
    Id(i64),
    Username(String),
}

impl ChatHandle {
    /// Parse a user-supplied chat identifier. Digits (with optional leading
    /// minus) become a numeric id, anything else is treated as a username.
    pub fn parse(value: &str) -> Self {
        if let Ok(id) = value.parse::<i64>() {
            return ChatHandle::Id(id);
        }
        ChatHandle::Username(value.to_string())
    }
}

impl fmt::Display for ChatHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatHandle::Id(id) => write!(f, "{id}"),
            ChatHandle::Username(name) => write!(f, "{name}"),
        }
    }
}

/// A parsed message link: where to start harvesting.
///
/// Immutable after parse; see [`crate::links::parse_link`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageLink {
    pub chat: ChatHandle,
    pub topic_id: Option<i64>,
    pub message_id: i64,
}

/// A forum topic: a sub-conversation with its own bounded id range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topic {
    pub id: i64,
    pub title: String,
    /// Upper bound of valid message ids inside this topic.
    pub top_message: i64,
}

/// Intrinsic content kind of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Text,
    Video,
    Photo,
    Voice,
    Audio,
    Animation,
    Document,
    Sticker,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Text => "text",
            MediaKind::Video => "video",
            MediaKind::Photo => "photo",
            MediaKind::Voice => "voice",
            MediaKind::Audio => "audio",
            MediaKind::Animation => "animation",
            MediaKind::Document => "document",
            MediaKind::Sticker => "sticker",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested media-kind filter: everything, or one intrinsic kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindFilter {
    All,
    Only(MediaKind),
}

impl KindFilter {
    pub fn matches(&self, kind: MediaKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Only(k) => *k == kind,
        }
    }
}

impl fmt::Display for KindFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindFilter::All => f.write_str("all"),
            KindFilter::Only(k) => f.write_str(k.as_str()),
        }
    }
}

/// A media attachment as exposed by the provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub file_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

/// A caption/text formatting marker, preserved verbatim when copying.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatEntity {
    pub kind: String,
    pub offset: usize,
    pub length: usize,
}

/// Provider-facing message shape.
///
/// One optional field per content kind mirrors the wire object, so the
/// classifier can resolve the intrinsic kind by precedence. A message with
/// no populated content fields models a deleted or empty slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteMessage {
    pub id: i64,
    /// Topic/thread this message belongs to, when the chat is a forum.
    pub thread_id: Option<i64>,

    pub text: Option<String>,
    pub caption: Option<String>,
    pub entities: Vec<FormatEntity>,

    pub video: Option<FileRef>,
    pub photo: Option<FileRef>,
    pub voice: Option<FileRef>,
    pub audio: Option<FileRef>,
    pub animation: Option<FileRef>,
    pub document: Option<FileRef>,
    pub sticker: Option<FileRef>,
}

impl RemoteMessage {
    /// Whether any content field is populated at all.
    pub fn has_content(&self) -> bool {
        self.text.is_some()
            || self.video.is_some()
            || self.photo.is_some()
            || self.voice.is_some()
            || self.audio.is_some()
            || self.animation.is_some()
            || self.document.is_some()
            || self.sticker.is_some()
    }

    /// Whether any media attachment (anything but plain text) is populated.
    pub fn has_media(&self) -> bool {
        self.video.is_some()
            || self.photo.is_some()
            || self.voice.is_some()
            || self.audio.is_some()
            || self.animation.is_some()
            || self.document.is_some()
            || self.sticker.is_some()
    }

    /// The attachment for a given kind, if populated. `Text` has none.
    pub fn attachment(&self, kind: MediaKind) -> Option<&FileRef> {
        match kind {
            MediaKind::Text => None,
            MediaKind::Video => self.video.as_ref(),
            MediaKind::Photo => self.photo.as_ref(),
            MediaKind::Voice => self.voice.as_ref(),
            MediaKind::Audio => self.audio.as_ref(),
            MediaKind::Animation => self.animation.as_ref(),
            MediaKind::Document => self.document.as_ref(),
            MediaKind::Sticker => self.sticker.as_ref(),
        }
    }
}

/// Classification verdict for one message against one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedMessage {
    pub id: i64,
    /// Resolved intrinsic kind, or `None` when nothing matched the request.
    pub kind: Option<MediaKind>,
    pub caption: Option<String>,
    pub usable: bool,
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tgt_core::{
    classify::Flow,
    domain::{ChatHandle, ClassifiedMessage, MediaKind, RemoteMessage},
    files::{format_size, guess_extension, sanitize_filename},
    provider::{ChatProvider, OutgoingMessage, OutgoingPayload},
    Error, Result,
};
use tracing::info;

use crate::retry::RateLimitedExecutor;

/// Directory (under the download target) that collects dry-run placeholders.
pub const TEST_MODE_DIR: &str = ".test_mode";

/// Caption characters kept when deriving a filename from the caption.
const CAPTION_NAME_LEN: usize = 200;

/// One way of moving a usable message out of the source chat.
///
/// The harvester owns scanning and counting; a strategy only moves a single
/// message. Errors are per-item: the harvester logs them and keeps scanning.
#[async_trait]
pub trait TransferStrategy: Send + Sync {
    /// The classification flow this strategy serves.
    fn flow(&self) -> Flow;

    /// Delay applied between messages, for strategies that must pace.
    fn pacing(&self) -> Option<Duration> {
        None
    }

    async fn transfer(&self, msg: &RemoteMessage, classified: &ClassifiedMessage) -> Result<()>;
}

/// How downloaded files are named on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamingMode {
    /// Keep the attachment's original filename when it has one.
    FileName,
    /// Derive the name from the caption, keeping the original extension.
    Caption,
}

/// Downloads message attachments into a local directory.
pub struct Downloader<'a> {
    provider: &'a dyn ChatProvider,
    executor: RateLimitedExecutor,
    chat: ChatHandle,
    dir: PathBuf,
    naming: NamingMode,
    test_mode: bool,
}

impl<'a> Downloader<'a> {
    pub fn new(
        provider: &'a dyn ChatProvider,
        chat: ChatHandle,
        dir: PathBuf,
        naming: NamingMode,
        test_mode: bool,
    ) -> Self {
        Self {
            provider,
            executor: RateLimitedExecutor::default(),
            chat,
            dir,
            naming,
            test_mode,
        }
    }

    /// Resolve the on-disk filename for a classified message. Caption naming
    /// falls back to the original filename, which falls back to a timestamp.
    fn target_name(&self, msg: &RemoteMessage, classified: &ClassifiedMessage) -> String {
        let attachment = classified.kind.and_then(|kind| msg.attachment(kind));
        let file_name = attachment.and_then(|a| a.file_name.as_deref());
        let mime_type = attachment.and_then(|a| a.mime_type.as_deref());

        if self.naming == NamingMode::Caption {
            if let Some(caption) = classified.caption.as_deref() {
                let stem: String = caption.chars().take(CAPTION_NAME_LEN).collect();
                let ext = guess_extension(file_name, mime_type);
                return sanitize_filename(&format!("{stem}{ext}"));
            }
        }

        if let Some(name) = file_name.filter(|n| !n.is_empty()) {
            return sanitize_filename(name);
        }

        let ext = guess_extension(None, mime_type);
        format!("{}{ext}", Utc::now().timestamp_millis())
    }
}

#[async_trait]
impl TransferStrategy for Downloader<'_> {
    fn flow(&self) -> Flow {
        Flow::Download
    }

    async fn transfer(&self, msg: &RemoteMessage, classified: &ClassifiedMessage) -> Result<()> {
        let name = self.target_name(msg, classified);

        if self.test_mode {
            let dir = self.dir.join(TEST_MODE_DIR);
            tokio::fs::create_dir_all(&dir).await?;
            let path = dir.join(format!("{name}.test_mode"));
            tokio::fs::write(&path, b"TEST MODE").await?;
            info!(message_id = msg.id, path = %path.display(), "dry run, wrote placeholder");
            return Ok(());
        }

        let target = self.dir.join(&name);
        let written = self
            .executor
            .run(|| self.provider.download_media(&self.chat, msg, &target))
            .await?;

        let size = tokio::fs::metadata(&written)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        info!(
            message_id = msg.id,
            path = %written.display(),
            size = %format_size(size),
            "downloaded"
        );
        Ok(())
    }
}

/// Re-emits messages into a destination chat, preserving captions and
/// formatting and replying to the source message id for traceability.
pub struct Copier<'a> {
    provider: &'a dyn ChatProvider,
    executor: RateLimitedExecutor,
    dest: ChatHandle,
    delay: Duration,
    test_mode: bool,
}

impl<'a> Copier<'a> {
    pub fn new(
        provider: &'a dyn ChatProvider,
        dest: ChatHandle,
        delay: Duration,
        test_mode: bool,
    ) -> Self {
        Self {
            provider,
            executor: RateLimitedExecutor::default(),
            dest,
            delay,
            test_mode,
        }
    }

    fn payload_for(msg: &RemoteMessage, kind: MediaKind) -> Result<OutgoingPayload> {
        if kind == MediaKind::Text {
            return Ok(OutgoingPayload::Text {
                text: msg.text.clone().unwrap_or_default(),
                entities: msg.entities.clone(),
            });
        }

        let attachment = msg
            .attachment(kind)
            .ok_or_else(|| Error::Transfer(format!("message {} has no {kind} content", msg.id)))?;

        // Animations and stickers carry no caption on resend.
        let caption = match kind {
            MediaKind::Animation | MediaKind::Sticker => None,
            _ => msg.caption.clone(),
        };

        Ok(OutgoingPayload::Media {
            kind,
            file_id: attachment.file_id.clone(),
            caption,
            entities: msg.entities.clone(),
        })
    }
}

#[async_trait]
impl TransferStrategy for Copier<'_> {
    fn flow(&self) -> Flow {
        Flow::Copy
    }

    fn pacing(&self) -> Option<Duration> {
        Some(self.delay)
    }

    async fn transfer(&self, msg: &RemoteMessage, classified: &ClassifiedMessage) -> Result<()> {
        let kind = classified
            .kind
            .ok_or_else(|| Error::Transfer(format!("message {} has no usable kind", msg.id)))?;

        if self.test_mode {
            info!(message_id = msg.id, %kind, "dry run, would copy");
            return Ok(());
        }

        let outgoing = OutgoingMessage {
            payload: Self::payload_for(msg, kind)?,
            reply_to: Some(msg.id),
        };
        let new_id = self
            .executor
            .run(|| self.provider.send_message(&self.dest, &outgoing))
            .await?;
        info!(message_id = msg.id, new_id, dest = %self.dest, "copied");
        Ok(())
    }
}

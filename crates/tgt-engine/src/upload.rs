use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use tgt_core::{
    domain::{ChatHandle, MediaKind},
    files::search_files,
    provider::ChatProvider,
    store::{ConfigKey, ConfigStore},
    thumbnail, Error, Result,
};
use tracing::{error, info, warn};

use crate::retry::RateLimitedExecutor;

/// Wait between directory rescans in listen mode.
pub const LISTEN_POLL: Duration = Duration::from_secs(1);

/// Local files to push into a chat.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    /// A file or a directory scanned recursively.
    pub source: PathBuf,
    pub chat: ChatHandle,
    /// Accepted extensions; `*` accepts everything.
    pub formats: Vec<String>,
    /// Kind each file is sent as. Text and sticker cannot be uploaded.
    pub kind: MediaKind,
    pub delete_after_send: bool,
    /// Keep rescanning the source for new files after the initial pass.
    pub listen_for_new_files: bool,
    /// Raw thumbnail bytes, applied to kinds that accept one.
    pub thumbnail: Option<Vec<u8>>,
    pub test_mode: bool,
}

impl UploadRequest {
    pub fn validate(&self) -> Result<()> {
        if matches!(self.kind, MediaKind::Text | MediaKind::Sticker) {
            return Err(Error::InvariantViolation(format!(
                "cannot upload files as {}",
                self.kind
            )));
        }
        if self.formats.is_empty() {
            return Err(Error::InvariantViolation(
                "at least one format (or *) is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// The configured thumbnail as raw bytes, ready for
/// [`ChatProvider::send_file`]. `None` when no thumbnail is stored.
pub fn stored_thumbnail(store: &dyn ConfigStore) -> Result<Option<Vec<u8>>> {
    match store.get(ConfigKey::Thumbnail) {
        Some(encoded) => Ok(Some(thumbnail::decode(&encoded)?)),
        None => Ok(None),
    }
}

fn accepts_thumbnail(kind: MediaKind) -> bool {
    matches!(
        kind,
        MediaKind::Video | MediaKind::Audio | MediaKind::Animation | MediaKind::Document
    )
}

/// Send every matching file under `source` to the chat, one at a time in
/// sorted order. Per-file failures are logged and skipped. In listen mode the
/// scan repeats until a pass finds nothing new. Returns the files sent (or,
/// in test mode, the files that would have been sent).
pub async fn upload_files(
    provider: &dyn ChatProvider,
    request: &UploadRequest,
) -> Result<Vec<PathBuf>> {
    request.validate()?;

    let executor = RateLimitedExecutor::default();
    let thumbnail = request
        .thumbnail
        .as_deref()
        .filter(|_| accepts_thumbnail(request.kind));

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut sent = Vec::new();

    loop {
        let files: Vec<PathBuf> = search_files(&request.source, &request.formats)
            .into_iter()
            .filter(|f| !seen.contains(f))
            .collect();
        let total = files.len();
        if total > 0 {
            info!(total, kind = %request.kind, "found files to upload");
        }

        for (index, file) in files.iter().enumerate() {
            seen.insert(file.clone());
            let caption = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned());

            if request.test_mode {
                info!(file = %file.display(), "dry run, would upload");
                sent.push(file.clone());
                continue;
            }

            info!(
                file = %file.display(),
                position = index + 1,
                total,
                "uploading"
            );
            let result = executor
                .run(|| {
                    provider.send_file(
                        &request.chat,
                        file,
                        request.kind,
                        caption.as_deref(),
                        thumbnail,
                    )
                })
                .await;

            match result {
                Ok(_) => {
                    sent.push(file.clone());
                    if request.delete_after_send {
                        if let Err(e) = tokio::fs::remove_file(file).await {
                            warn!(file = %file.display(), "could not delete after send: {e}");
                        } else {
                            info!(file = %file.display(), "deleted after send");
                        }
                    }
                }
                Err(e) => {
                    error!(file = %file.display(), "upload failed: {e}");
                }
            }
        }

        if !request.listen_for_new_files || total == 0 {
            break;
        }
        tokio::time::sleep(LISTEN_POLL).await;
    }

    Ok(sent)
}

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tgt_core::{
    domain::ChatHandle,
    provider::ChatProvider,
    Error, Result,
};
use tracing::{info, warn};

use crate::{
    harvest::{HarvestOutcome, HarvestRequest, RangeHarvester},
    retry::RateLimitedExecutor,
    transfer::{Copier, Downloader, NamingMode},
    upload::{self, UploadRequest},
};

/// Harvest a message range and download each usable attachment.
#[derive(Clone, Debug)]
pub struct DownloadRequest {
    pub harvest: HarvestRequest,
    pub dir: PathBuf,
    pub naming: NamingMode,
}

/// Harvest a message range and re-emit each usable message into `dest`.
#[derive(Clone, Debug)]
pub struct CopyRequest {
    pub harvest: HarvestRequest,
    pub dest: ChatHandle,
    /// Pause between scanned messages, to stay under the send rate.
    pub delay: Duration,
}

/// Run `work` inside an open provider session. The session is closed on
/// every exit path; a close failure is logged, not propagated.
async fn with_session<T, F>(provider: &dyn ChatProvider, work: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    provider.open().await?;
    match provider.me().await {
        Ok(account) => info!(account = %account.name, bot = account.is_bot, "session opened"),
        Err(e) => warn!("could not identify session account: {e}"),
    }
    let result = work.await;
    if let Err(e) = provider.close().await {
        warn!("failed to close session: {e}");
    }
    result
}

async fn verify_chat(
    provider: &dyn ChatProvider,
    executor: &RateLimitedExecutor,
    chat: &ChatHandle,
) -> Result<()> {
    executor
        .run(|| provider.verify_chat(chat))
        .await
        .map_err(|e| Error::ChatVerificationFailed(format!("{chat}: {e}")))
}

/// Download flow: validate, open a session, verify the source chat, then
/// harvest with a [`Downloader`] strategy.
pub async fn download_media(
    provider: &dyn ChatProvider,
    request: &DownloadRequest,
) -> Result<HarvestOutcome> {
    request.harvest.validate()?;

    // A file path means "download next to this file".
    let dir = if request.dir.is_file() {
        request
            .dir
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        request.dir.clone()
    };

    let executor = RateLimitedExecutor::default();
    with_session(provider, async {
        verify_chat(provider, &executor, &request.harvest.link.chat).await?;

        let strategy = Downloader::new(
            provider,
            request.harvest.link.chat.clone(),
            dir,
            request.naming,
            request.harvest.test_mode,
        );
        RangeHarvester::new(provider, &strategy, &request.harvest)
            .run()
            .await
    })
    .await
}

/// Copy flow: validate, open a session, verify source and destination chats,
/// then harvest with a [`Copier`] strategy.
pub async fn copy_messages(
    provider: &dyn ChatProvider,
    request: &CopyRequest,
) -> Result<HarvestOutcome> {
    request.harvest.validate()?;

    let executor = RateLimitedExecutor::default();
    with_session(provider, async {
        verify_chat(provider, &executor, &request.harvest.link.chat).await?;
        verify_chat(provider, &executor, &request.dest).await?;

        let strategy = Copier::new(
            provider,
            request.dest.clone(),
            request.delay,
            request.harvest.test_mode,
        );
        RangeHarvester::new(provider, &strategy, &request.harvest)
            .run()
            .await
    })
    .await
}

/// Upload flow: validate, open a session, verify the destination chat, then
/// push matching local files.
pub async fn upload_media(
    provider: &dyn ChatProvider,
    request: &UploadRequest,
) -> Result<Vec<PathBuf>> {
    request.validate()?;

    let executor = RateLimitedExecutor::default();
    with_session(provider, async {
        verify_chat(provider, &executor, &request.chat).await?;
        upload::upload_files(provider, request).await
    })
    .await
}

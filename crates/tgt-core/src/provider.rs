use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{
    domain::{ChatHandle, FormatEntity, MediaKind, RemoteMessage, Topic},
    Result,
};

/// Provider-imposed page limit: the most message ids one batch fetch may
/// carry, and therefore the largest window the harvester ever requests.
pub const MAX_MESSAGE_BATCH: usize = 200;

/// The account behind the open session (user or bot).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountInfo {
    pub id: i64,
    pub name: String,
    pub is_bot: bool,
}

/// Content to re-emit into a destination chat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutgoingPayload {
    Text {
        text: String,
        entities: Vec<FormatEntity>,
    },
    Media {
        kind: MediaKind,
        file_id: String,
        caption: Option<String>,
        entities: Vec<FormatEntity>,
    },
}

/// A message to send, optionally as a reply to a source message id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub payload: OutgoingPayload,
    pub reply_to: Option<i64>,
}

/// Port to the messaging service.
///
/// The engine only ever talks to this trait; the real protocol client is an
/// adapter concern, and tests drive the engine with an in-memory fake.
/// Transient rate limiting surfaces as [`crate::Error::FloodWait`] from any
/// method; the engine's executor handles the retry.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Open the remote session. Must be balanced by [`ChatProvider::close`];
    /// callers guarantee the close on every exit path.
    async fn open(&self) -> Result<()>;

    async fn close(&self) -> Result<()>;

    async fn me(&self) -> Result<AccountInfo>;

    /// Confirm the chat exists and the session can access it.
    async fn verify_chat(&self, chat: &ChatHandle) -> Result<()>;

    /// Fetch the given message ids in one batch (at most
    /// [`MAX_MESSAGE_BATCH`]). Deleted or inaccessible ids come back as
    /// empty messages, not as errors.
    async fn get_messages(&self, chat: &ChatHandle, ids: &[i64]) -> Result<Vec<RemoteMessage>>;

    /// Resolve a forum topic by id; `None` when the topic does not exist.
    async fn get_forum_topic(&self, chat: &ChatHandle, topic_id: i64) -> Result<Option<Topic>>;

    /// Download the message's attachment to `target`, returning the path
    /// actually written.
    async fn download_media(
        &self,
        chat: &ChatHandle,
        message: &RemoteMessage,
        target: &Path,
    ) -> Result<PathBuf>;

    /// Send a message into `chat`, returning the new message id.
    async fn send_message(&self, chat: &ChatHandle, outgoing: &OutgoingMessage) -> Result<i64>;

    /// Upload a local file into `chat` as the given kind, returning the new
    /// message id. `thumbnail` applies only to kinds that accept one.
    async fn send_file(
        &self,
        chat: &ChatHandle,
        file: &Path,
        kind: MediaKind,
        caption: Option<&str>,
        thumbnail: Option<&[u8]>,
    ) -> Result<i64>;
}

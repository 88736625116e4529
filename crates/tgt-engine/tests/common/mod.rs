#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tgt_core::{
    domain::{ChatHandle, FileRef, MediaKind, RemoteMessage, Topic},
    provider::{AccountInfo, ChatProvider, OutgoingMessage},
    Error, Result,
};

/// Deterministic in-memory provider. Messages live in a map keyed by id;
/// ids absent from the map come back as empty (deleted) messages. Counters
/// record every remote interaction so tests can assert call order and
/// session discipline.
#[derive(Default)]
pub struct FakeProvider {
    pub messages: Mutex<HashMap<i64, RemoteMessage>>,
    pub topics: Mutex<HashMap<i64, Topic>>,

    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub remote_calls: AtomicUsize,

    pub fetched_windows: Mutex<Vec<Vec<i64>>>,
    pub downloaded: Mutex<Vec<i64>>,
    pub sent: Mutex<Vec<(ChatHandle, OutgoingMessage)>>,
    pub uploaded: Mutex<Vec<(PathBuf, Option<String>, bool)>>,

    /// Per-message-id count of flood signals to emit before a download
    /// succeeds.
    pub flood_before_download: Mutex<HashMap<i64, usize>>,
    pub reject_chats: Mutex<Vec<ChatHandle>>,
}

impl FakeProvider {
    pub fn with_messages(messages: Vec<RemoteMessage>) -> Self {
        let provider = Self::default();
        *provider.messages.lock().unwrap() = messages.into_iter().map(|m| (m.id, m)).collect();
        provider
    }

    pub fn add_topic(&self, topic: Topic) {
        self.topics.lock().unwrap().insert(topic.id, topic);
    }

    pub fn fetched_windows(&self) -> Vec<Vec<i64>> {
        self.fetched_windows.lock().unwrap().clone()
    }

    pub fn downloaded(&self) -> Vec<i64> {
        self.downloaded.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(ChatHandle, OutgoingMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn uploaded(&self) -> Vec<(PathBuf, Option<String>, bool)> {
        self.uploaded.lock().unwrap().clone()
    }

    fn track(&self) {
        self.remote_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatProvider for FakeProvider {
    async fn open(&self) -> Result<()> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn me(&self) -> Result<AccountInfo> {
        Ok(AccountInfo {
            id: 1,
            name: "fake".to_string(),
            is_bot: false,
        })
    }

    async fn verify_chat(&self, chat: &ChatHandle) -> Result<()> {
        self.track();
        if self.reject_chats.lock().unwrap().contains(chat) {
            return Err(Error::External(format!("no access to {chat}")));
        }
        Ok(())
    }

    async fn get_messages(&self, _chat: &ChatHandle, ids: &[i64]) -> Result<Vec<RemoteMessage>> {
        self.track();
        self.fetched_windows.lock().unwrap().push(ids.to_vec());
        let messages = self.messages.lock().unwrap();
        Ok(ids
            .iter()
            .map(|id| {
                messages.get(id).cloned().unwrap_or(RemoteMessage {
                    id: *id,
                    ..Default::default()
                })
            })
            .collect())
    }

    async fn get_forum_topic(&self, _chat: &ChatHandle, topic_id: i64) -> Result<Option<Topic>> {
        self.track();
        Ok(self.topics.lock().unwrap().get(&topic_id).cloned())
    }

    async fn download_media(
        &self,
        _chat: &ChatHandle,
        message: &RemoteMessage,
        target: &Path,
    ) -> Result<PathBuf> {
        self.track();

        let mut floods = self.flood_before_download.lock().unwrap();
        if let Some(left) = floods.get_mut(&message.id) {
            if *left > 0 {
                *left -= 1;
                return Err(Error::flood_wait(Duration::from_millis(1)));
            }
        }
        drop(floods);

        std::fs::write(target, b"DATA")?;
        self.downloaded.lock().unwrap().push(message.id);
        Ok(target.to_path_buf())
    }

    async fn send_message(&self, chat: &ChatHandle, outgoing: &OutgoingMessage) -> Result<i64> {
        self.track();
        let mut sent = self.sent.lock().unwrap();
        sent.push((chat.clone(), outgoing.clone()));
        Ok(1000 + sent.len() as i64)
    }

    async fn send_file(
        &self,
        _chat: &ChatHandle,
        file: &Path,
        _kind: MediaKind,
        caption: Option<&str>,
        thumbnail: Option<&[u8]>,
    ) -> Result<i64> {
        self.track();
        let mut uploaded = self.uploaded.lock().unwrap();
        uploaded.push((
            file.to_path_buf(),
            caption.map(str::to_string),
            thumbnail.is_some(),
        ));
        Ok(2000 + uploaded.len() as i64)
    }
}

pub fn video(id: i64, caption: Option<&str>) -> RemoteMessage {
    RemoteMessage {
        id,
        caption: caption.map(str::to_string),
        video: Some(FileRef {
            file_id: format!("fid-{id}"),
            file_name: Some(format!("clip-{id}.mp4")),
            mime_type: Some("video/mp4".to_string()),
        }),
        ..Default::default()
    }
}

pub fn video_in_topic(id: i64, thread_id: i64, caption: Option<&str>) -> RemoteMessage {
    RemoteMessage {
        thread_id: Some(thread_id),
        ..video(id, caption)
    }
}

pub fn temp_dir(prefix: &str) -> PathBuf {
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}-{}-{ts}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

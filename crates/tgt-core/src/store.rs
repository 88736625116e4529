use std::{collections::HashMap, fmt, sync::Mutex};

use crate::{errors::Error, Result};

/// Keys understood by the config collaborator. Values are plain strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    SessionString,
    ApiId,
    ApiHash,
    BotToken,
    Thumbnail,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::SessionString,
        ConfigKey::ApiId,
        ConfigKey::ApiHash,
        ConfigKey::BotToken,
        ConfigKey::Thumbnail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::SessionString => "session-string",
            ConfigKey::ApiId => "api-id",
            ConfigKey::ApiHash => "api-hash",
            ConfigKey::BotToken => "bot-token",
            ConfigKey::Thumbnail => "thumbnail",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value config collaborator. Persistence is the embedding caller's
/// concern; the engine only reads credentials through this port.
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: ConfigKey) -> Option<String>;
    fn set(&self, key: ConfigKey, value: String);
    fn remove(&self, key: ConfigKey);
    fn clear(&self);
}

/// In-memory reference implementation.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<ConfigKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: ConfigKey) -> Option<String> {
        self.inner.lock().expect("store lock").get(&key).cloned()
    }

    fn set(&self, key: ConfigKey, value: String) {
        self.inner.lock().expect("store lock").insert(key, value);
    }

    fn remove(&self, key: ConfigKey) {
        self.inner.lock().expect("store lock").remove(&key);
    }

    fn clear(&self) {
        self.inner.lock().expect("store lock").clear();
    }
}

/// Credentials for the privileged user session.
#[derive(Clone, Debug)]
pub struct UserCredentials {
    pub session_string: String,
}

impl UserCredentials {
    /// Fails `ConfigurationIncomplete` before any network activity when the
    /// session string is not configured.
    pub fn from_store(store: &dyn ConfigStore) -> Result<Self> {
        let session_string = require(store, ConfigKey::SessionString)?;
        Ok(Self { session_string })
    }
}

/// Credentials for the bot session.
#[derive(Clone, Debug)]
pub struct BotCredentials {
    pub api_id: String,
    pub api_hash: String,
    pub bot_token: String,
}

impl BotCredentials {
    pub fn from_store(store: &dyn ConfigStore) -> Result<Self> {
        Ok(Self {
            api_id: require(store, ConfigKey::ApiId)?,
            api_hash: require(store, ConfigKey::ApiHash)?,
            bot_token: require(store, ConfigKey::BotToken)?,
        })
    }
}

fn require(store: &dyn ConfigStore, key: ConfigKey) -> Result<String> {
    store
        .get(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::ConfigurationIncomplete(key.as_str().to_string()))
}

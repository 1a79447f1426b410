use crate::auth::{SessionUser, User};
use crate::model::{Class, Records, Student};
use crate::records::Snapshot;
use crate::setup::SetupConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
#[cfg(test)]
use std::collections::HashMap;

/// String key/value persistence. Values are JSON documents.
pub trait KvStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKey {
    Classes,
    Students,
    Records,
    Users,
    CurrentUser,
    Setup,
}

impl StoreKey {
    pub fn key(self) -> &'static str {
        match self {
            Self::Classes => "absensi_classes",
            Self::Students => "absensi_students",
            Self::Records => "absensi_records",
            Self::Users => "absensi_users",
            Self::CurrentUser => "absensi_current_user",
            Self::Setup => "absensi_setup",
        }
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: HashMap<String, String>,
    /// Makes every `set` fail, to exercise quota-exceeded style paths.
    pub fail_writes: bool,
}

#[cfg(test)]
impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every write fails.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        if self.fail_writes {
            anyhow::bail!("storage quota exceeded writing {}", key);
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads one key. A missing, unreadable or malformed value yields the default.
pub fn load_json<T: DeserializeOwned + Default>(store: &dyn KvStore, key: StoreKey) -> T {
    let raw = match store.get(key.key()) {
        Ok(Some(v)) => v,
        Ok(None) => return T::default(),
        Err(e) => {
            tracing::warn!(key = key.key(), error = %e, "failed to read stored value");
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(key = key.key(), error = %e, "malformed stored value, using empty state");
            T::default()
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &mut dyn KvStore,
    key: StoreKey,
    value: &T,
) -> anyhow::Result<()> {
    let json = serde_json::to_string(value)?;
    store.set(key.key(), &json)
}

/// Everything the daemon keeps for one workspace.
#[derive(Debug, Clone, Default)]
pub struct LoadedState {
    pub snapshot: Snapshot,
    pub users: Vec<User>,
    pub session: Option<SessionUser>,
    pub setup: SetupConfig,
}

pub fn load_state(store: &dyn KvStore) -> LoadedState {
    let classes: Vec<Class> = load_json(store, StoreKey::Classes);
    let students: Vec<Student> = load_json(store, StoreKey::Students);
    let records: Records = load_json(store, StoreKey::Records);
    LoadedState {
        snapshot: Snapshot {
            classes,
            students,
            records,
        },
        users: load_json(store, StoreKey::Users),
        session: load_json(store, StoreKey::CurrentUser),
        setup: load_json(store, StoreKey::Setup),
    }
}

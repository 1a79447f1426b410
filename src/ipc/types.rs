use std::path::PathBuf;

use serde::Deserialize;

use crate::auth::{SessionUser, User};
use crate::records::Snapshot;
use crate::setup::SetupConfig;
use crate::store::{self, KvStore, StoreKey};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<Box<dyn KvStore>>,
    pub data: Snapshot,
    pub users: Vec<User>,
    pub session: Option<SessionUser>,
    pub setup: SetupConfig,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all in-memory state with what `kv` holds.
    pub fn attach(&mut self, workspace: PathBuf, kv: Box<dyn KvStore>) {
        let loaded = store::load_state(&*kv);
        self.workspace = Some(workspace);
        self.data = loaded.snapshot;
        self.users = loaded.users;
        self.session = loaded.session;
        self.setup = loaded.setup;
        self.store = Some(kv);
    }

    /// Writes the given keys through to the store. Failures are logged and
    /// returned as a warning; in-memory state stays as it is.
    pub fn persist(&mut self, keys: &[StoreKey]) -> Option<String> {
        let kv = self.store.as_deref_mut()?;
        let mut failures = Vec::new();
        for key in keys {
            let res = match key {
                StoreKey::Classes => store::save_json(kv, *key, &self.data.classes),
                StoreKey::Students => store::save_json(kv, *key, &self.data.students),
                StoreKey::Records => store::save_json(kv, *key, &self.data.records),
                StoreKey::Users => store::save_json(kv, *key, &self.users),
                StoreKey::CurrentUser => store::save_json(kv, *key, &self.session),
                StoreKey::Setup => store::save_json(kv, *key, &self.setup),
            };
            if let Err(e) = res {
                tracing::warn!(key = key.key(), error = %e, "failed to persist");
                failures.push(format!("{}: {}", key.key(), e));
            }
        }
        if failures.is_empty() {
            None
        } else {
            Some(failures.join("; "))
        }
    }
}

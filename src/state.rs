//! Persisted client state.
//!
//! [`LocalState`] plays the role the browser's local storage played for the
//! dashboard: a bag of JSON values that survives between runs and is wiped
//! when the session ends. [`AuthStore`] keeps the signed-in admin's profile on
//! top of it.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::auth::SessionManager;

/// Local state key holding the persisted [`AuthRecord`].
pub const AUTH_STORE_KEY: &str = "auth-store";
pub const USER_ID_KEY: &str = "userId";
pub const REGISTER_STEP_KEY: &str = "register_step";

/// String-keyed JSON values, optionally backed by a file.
#[derive(Debug, Default)]
pub struct LocalState {
    path: Option<PathBuf>,
    values: Mutex<BTreeMap<String, Value>>,
}

impl LocalState {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open file-backed state at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, Value>>(&content) {
                Ok(values) => values,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding unreadable local state");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read local state");
                BTreeMap::new()
            }
        };

        Self {
            path: Some(path),
            values: Mutex::new(values),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Read `key` as `T`; values of another shape read as `None`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        serde_json::from_value(value)
            .map_err(|e| debug!(key, error = %e, "Local state value has unexpected shape"))
            .ok()
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize local state value");
                return;
            }
        };
        let mut values = self.lock();
        values.insert(key.to_string(), value);
        self.persist(&values);
    }

    pub fn remove(&self, key: &str) {
        let mut values = self.lock();
        if values.remove(key).is_some() {
            self.persist(&values);
        }
    }

    pub fn clear(&self) {
        let mut values = self.lock();
        values.clear();
        self.persist(&values);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, values: &BTreeMap<String, Value>) {
        let Some(path) = &self.path else {
            return;
        };

        let content = match serde_json::to_string_pretty(values) {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "Failed to encode local state");
                return;
            }
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "Failed to create state directory");
                return;
            }
        }

        if let Err(e) = std::fs::write(path, content) {
            warn!(path = %path.display(), error = %e, "Failed to write local state");
        }
    }
}

/// Profile returned by the `/profiles` endpoint.
///
/// Only the fields the client reads are typed; everything else is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What the auth store persists under [`AUTH_STORE_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRecord {
    pub user: Option<Profile>,
    pub user_email: Option<String>,
}

/// Current signed-in admin.
#[derive(Debug)]
pub struct AuthStore {
    local: Arc<LocalState>,
    record: RwLock<AuthRecord>,
}

impl AuthStore {
    /// Create the store, restoring any record left in `local`.
    pub fn new(local: Arc<LocalState>) -> Self {
        let record = local.get_as::<AuthRecord>(AUTH_STORE_KEY).unwrap_or_default();
        Self {
            local,
            record: RwLock::new(record),
        }
    }

    /// Register [`AuthStore::clear_user`] to run when `session` expires.
    pub fn attach(self: &Arc<Self>, session: &SessionManager) {
        let store = Arc::clone(self);
        session.on_expired(move || store.clear_user());
    }

    pub fn user(&self) -> Option<Profile> {
        self.read().user.clone()
    }

    pub fn user_email(&self) -> Option<String> {
        self.read().user_email.clone()
    }

    /// True when a profile is loaded. This is the check a route guard makes.
    pub fn is_authenticated(&self) -> bool {
        self.read().user.is_some()
    }

    pub fn set_user(&self, profile: Profile) {
        self.update(|record| record.user = Some(profile));
    }

    pub fn set_user_email(&self, email: &str) {
        self.update(|record| record.user_email = Some(email.to_string()));
    }

    pub fn clear_user(&self) {
        *self.record.write().unwrap_or_else(PoisonError::into_inner) = AuthRecord::default();
        self.local.remove(AUTH_STORE_KEY);
    }

    /// Drop the profile plus every other key the dashboard kept for a signed-in user.
    pub fn sign_out(&self) {
        self.clear_user();
        self.local.remove(USER_ID_KEY);
        self.local.remove(REGISTER_STEP_KEY);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, AuthRecord> {
        self.record.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut AuthRecord)) {
        let mut record = self.record.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut record);
        self.local.set(AUTH_STORE_KEY, &*record);
    }
}

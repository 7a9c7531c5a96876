// ── Session store ──
//
// Holds the current credential and persists it through a pluggable
// key/value `SessionStorage` under the keys `token` and `user`. Malformed
// or half-written data loads as logged-out; loading never fails.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use leadkit_api::TokenSource;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{Credential, User};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

// ── Storage backends ─────────────────────────────────────────────────

/// String key/value persistence for the session.
pub trait SessionStorage: Send + Sync {
    /// `None` when the key is missing or the backend cannot be read.
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;
    fn remove(&self, key: &str) -> Result<(), CoreError>;
}

/// Process-local storage. The session ends with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// A JSON object file holding the session keys, written owner-only.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
            BTreeMap::new()
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), CoreError> {
        let io_err = |e: std::io::Error| CoreError::Session {
            message: format!("cannot write {}: {e}", self.path.display()),
        };

        if entries.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(io_err(e)),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|e| CoreError::Session {
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, json).map_err(io_err)?;
        set_owner_only(&self.path).map_err(io_err)?;

        debug!(path = %self.path.display(), "session file written");
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), CoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all();
        f(&mut entries);
        self.write_all(&entries)
    }
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read_all().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

// ── SessionStore ─────────────────────────────────────────────────────

/// Owner of the current [`Credential`].
///
/// Constructed once and shared (`Arc`) between the dashboard and the API
/// client, which reads the bearer token through [`TokenSource`] right
/// before every request.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    current: RwLock<Option<Credential>>,
    authenticated: watch::Sender<bool>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Restore whatever session `storage` holds.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let current = load(storage.as_ref());
        let (authenticated, _) = watch::channel(current.is_some());
        Self {
            storage,
            current: RwLock::new(current),
            authenticated,
        }
    }

    /// A session that lives only in memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn credential(&self) -> Option<Credential> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn user(&self) -> Option<User> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Store `credential` in memory and in the backing storage.
    pub fn set_credential(&self, credential: Credential) -> Result<(), CoreError> {
        let user_json = serde_json::to_string(&credential.user).map_err(|e| CoreError::Session {
            message: e.to_string(),
        })?;
        self.storage
            .set(TOKEN_KEY, credential.token.expose_secret())?;
        self.storage.set(USER_KEY, &user_json)?;

        info!(user = %credential.user.email, "session started");
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credential);
        self.authenticated.send_replace(true);
        Ok(())
    }

    /// Forget the credential. The in-memory session is cleared even if
    /// the storage backend fails.
    pub fn clear(&self) -> Result<(), CoreError> {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.authenticated.send_replace(false);

        let token = self.storage.remove(TOKEN_KEY);
        let user = self.storage.remove(USER_KEY);
        info!("session cleared");
        token.and(user)
    }

    /// Observe login/logout transitions.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }
}

impl TokenSource for SessionStore {
    fn bearer_token(&self) -> Option<SecretString> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.token.clone())
    }
}

fn load(storage: &dyn SessionStorage) -> Option<Credential> {
    let token = storage.get(TOKEN_KEY).filter(|t| !t.is_empty());
    let user = storage.get(USER_KEY);

    match (token, user) {
        (Some(token), Some(raw)) => match serde_json::from_str::<User>(&raw) {
            Ok(user) => {
                debug!(user = %user.email, "restored session");
                Some(Credential {
                    token: SecretString::from(token),
                    user,
                })
            }
            Err(e) => {
                warn!(error = %e, "stored user is malformed; treating session as logged out");
                None
            }
        },
        (None, None) => None,
        _ => {
            warn!("stored session is incomplete; treating session as logged out");
            None
        }
    }
}

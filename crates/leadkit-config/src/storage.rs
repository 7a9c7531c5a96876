// Session persistence backends selected per profile.

use std::sync::Arc;

use leadkit_core::{CoreError, FileStorage, SessionStorage};

use crate::{Profile, SessionBackend, session_path};

const KEYRING_SERVICE: &str = "leadkit";

/// Session keys stored as system keyring entries named
/// `{profile}/{key}` under the `leadkit` service.
#[derive(Debug, Clone)]
pub struct KeyringStorage {
    profile: String,
}

impl KeyringStorage {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, CoreError> {
        keyring::Entry::new(KEYRING_SERVICE, &format!("{}/{key}", self.profile)).map_err(|e| {
            CoreError::Session {
                message: format!("keyring unavailable: {e}"),
            }
        })
    }
}

impl SessionStorage for KeyringStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entry(key).ok()?.get_password().ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| CoreError::Session {
                message: format!("failed to store '{key}' in keyring: {e}"),
            })
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CoreError::Session {
                message: format!("failed to remove '{key}' from keyring: {e}"),
            }),
        }
    }
}

/// The storage backend `profile` asks for.
pub fn session_storage(profile_name: &str, profile: &Profile) -> Arc<dyn SessionStorage> {
    match profile.session {
        SessionBackend::File => Arc::new(FileStorage::new(session_path(profile_name))),
        SessionBackend::Keyring => Arc::new(KeyringStorage::new(profile_name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sessions_are_separated_per_profile() {
        let a = session_path("prod");
        let b = session_path("local");
        assert_ne!(a, b);
        assert!(a.ends_with("sessions/prod.json"));
    }
}

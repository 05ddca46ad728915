use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use learn_core::model::UserId;
use serde::{Deserialize, Serialize};

use crate::error::LearnerSessionError;

/// The signed-in learner, passed explicitly to every component that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerSession {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl LearnerSession {
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            display_name: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Load a previously saved session. A missing file is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `LearnerSessionError` if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>, LearnerSessionError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LearnerSessionError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Persist the session as JSON, replacing any previous file.
    ///
    /// # Errors
    ///
    /// Returns `LearnerSessionError` if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), LearnerSessionError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| LearnerSessionError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Remove a saved session (sign-out). Missing files are ignored.
    ///
    /// # Errors
    ///
    /// Returns `LearnerSessionError::Io` if the file exists but cannot be removed.
    pub fn clear(path: &Path) -> Result<(), LearnerSessionError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LearnerSessionError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("learn-session-{name}-{}.json", UserId::random()))
    }

    #[test]
    fn save_then_load_restores_session() {
        let path = temp_path("roundtrip");
        let session = LearnerSession::new(UserId::random()).with_display_name("Ada");
        session.save(&path).unwrap();

        let loaded = LearnerSession::load(&path).unwrap();
        assert_eq!(loaded, Some(session));

        LearnerSession::clear(&path).unwrap();
        assert_eq!(LearnerSession::load(&path).unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = temp_path("corrupt");
        fs::write(&path, "{not json").unwrap();
        let err = LearnerSession::load(&path).unwrap_err();
        assert!(matches!(err, LearnerSessionError::Json(_)));
        LearnerSession::clear(&path).unwrap();
    }
}

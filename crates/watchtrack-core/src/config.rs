//! Sync settings and the tracked-user configuration provider.
//!
//! Tracked users live in a TOML file:
//!
//! ```toml
//! [[users]]
//! linked_user_id = "6f1c0f52-4d53-4b8e-9f43-0f7f0d5b8a10"
//! account = "alice"
//! access_token = "..."
//! locations = ["/media/movies", "/media/tv"]
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;
use crate::model::TrackedUser;

/// Quiet period after the last library event before the queue flushes.
pub const DEFAULT_DEBOUNCE_MS: u64 = 3_000;

/// Default location of the tracked-user file.
pub const DEFAULT_USERS_FILE: &str = "./data/watchtrack/users.toml";

// ─── Sync settings ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub debounce: Duration,
    pub users_file: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            users_file: PathBuf::from(DEFAULT_USERS_FILE),
        }
    }
}

impl SyncConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Self {
        Self {
            debounce: Duration::from_millis(
                std::env::var("WATCHTRACK_DEBOUNCE_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_DEBOUNCE_MS),
            ),
            users_file: std::env::var("WATCHTRACK_USERS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_USERS_FILE)),
        }
    }
}

// ─── Provider trait ─────────────────────────────────────────────────────

/// Read-only access to the tracked users.
///
/// Implementations return a snapshot; callers never hold a lock across
/// remote calls.
pub trait UserConfigProvider: Send + Sync {
    fn tracked_users(&self) -> Vec<Arc<TrackedUser>>;

    fn find_user(&self, linked_user_id: Uuid) -> Option<Arc<TrackedUser>> {
        self.tracked_users()
            .into_iter()
            .find(|u| u.linked_user_id == linked_user_id)
    }
}

// ─── TOML file format ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersFile {
    #[serde(default)]
    pub users: Vec<TrackedUser>,
}

impl UsersFile {
    /// Parse and validate a users file.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let file: UsersFile = toml::from_str(content)?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for user in &self.users {
            if !seen.insert(user.linked_user_id) {
                return Err(ConfigError::Invalid(format!(
                    "user {} is configured more than once",
                    user.linked_user_id
                )));
            }
            if let Some(location) = user.locations.iter().find(|l| !l.is_absolute()) {
                return Err(ConfigError::Invalid(format!(
                    "location {} of {} must be an absolute path",
                    location.display(),
                    user.account
                )));
            }
        }
        Ok(())
    }
}

// ─── In-memory provider ─────────────────────────────────────────────────

/// Provider holding users in memory. The settings layer swaps the whole set.
#[derive(Debug, Default)]
pub struct StaticUserConfig {
    users: RwLock<Arc<Vec<Arc<TrackedUser>>>>,
}

impl StaticUserConfig {
    pub fn new(users: Vec<TrackedUser>) -> Self {
        Self {
            users: RwLock::new(Arc::new(users.into_iter().map(Arc::new).collect())),
        }
    }

    /// Replace every tracked user at once.
    pub fn replace(&self, users: Vec<TrackedUser>) {
        let next = Arc::new(users.into_iter().map(Arc::new).collect());
        *self.users.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

impl UserConfigProvider for StaticUserConfig {
    fn tracked_users(&self) -> Vec<Arc<TrackedUser>> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users.iter().cloned().collect()
    }
}

// ─── File-backed provider ───────────────────────────────────────────────

/// Provider backed by a TOML users file, reloadable at runtime.
#[derive(Debug)]
pub struct FileUserConfig {
    path: PathBuf,
    inner: StaticUserConfig,
}

impl FileUserConfig {
    /// Load users from `path`. A missing file means no tracked users.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let config = Self {
            path: path.into(),
            inner: StaticUserConfig::default(),
        };
        config.reload()?;
        Ok(config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file. On error the previous users stay in place.
    pub fn reload(&self) -> Result<usize, ConfigError> {
        let file = match std::fs::read_to_string(&self.path) {
            Ok(content) => UsersFile::parse(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %self.path.display(),
                    "users file not found, no users are tracked"
                );
                UsersFile::default()
            }
            Err(e) => return Err(e.into()),
        };

        let count = file.users.len();
        self.inner.replace(file.users);
        tracing::info!(path = %self.path.display(), users = count, "tracked users loaded");
        Ok(count)
    }
}

impl UserConfigProvider for FileUserConfig {
    fn tracked_users(&self) -> Vec<Arc<TrackedUser>> {
        self.inner.tracked_users()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[users]]
linked_user_id = "6f1c0f52-4d53-4b8e-9f43-0f7f0d5b8a10"
account = "alice"
access_token = "token-a"
locations = ["/media/movies", "/media/tv"]

[[users]]
linked_user_id = "0d6b7bbf-5a0e-4bf6-9b0b-7c6a44a3cf31"
account = "bob"
locations = ["/media/tv"]
"#;

    #[test]
    fn test_sync_config_default() {
        let config = SyncConfig::default();
        assert_eq!(config.debounce, Duration::from_secs(3));
        assert_eq!(config.users_file, PathBuf::from(DEFAULT_USERS_FILE));
    }

    #[test]
    fn test_parse_users_file() {
        let file = UsersFile::parse(SAMPLE).unwrap();
        assert_eq!(file.users.len(), 2);
        assert_eq!(file.users[0].account, "alice");
        assert_eq!(file.users[0].access_token, "token-a");
        assert_eq!(file.users[0].locations.len(), 2);
        assert!(file.users[1].access_token.is_empty());
    }

    #[test]
    fn test_parse_empty_file() {
        let file = UsersFile::parse("").unwrap();
        assert!(file.users.is_empty());
    }

    #[test]
    fn test_parse_rejects_duplicate_user() {
        let content = r#"
[[users]]
linked_user_id = "6f1c0f52-4d53-4b8e-9f43-0f7f0d5b8a10"
account = "alice"

[[users]]
linked_user_id = "6f1c0f52-4d53-4b8e-9f43-0f7f0d5b8a10"
account = "alice-again"
"#;
        let err = UsersFile::parse(content).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_parse_rejects_relative_location() {
        let content = r#"
[[users]]
linked_user_id = "6f1c0f52-4d53-4b8e-9f43-0f7f0d5b8a10"
account = "alice"
locations = ["media/movies"]
"#;
        let err = UsersFile::parse(content).unwrap_err();
        assert!(err.to_string().contains("absolute path"));
    }

    #[test]
    fn test_parse_rejects_bad_uuid() {
        let content = r#"
[[users]]
linked_user_id = "not-a-uuid"
account = "alice"
"#;
        assert!(matches!(
            UsersFile::parse(content),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_static_provider_find_user() {
        let file = UsersFile::parse(SAMPLE).unwrap();
        let bob_id = file.users[1].linked_user_id;
        let provider = StaticUserConfig::new(file.users);

        assert_eq!(provider.tracked_users().len(), 2);
        assert_eq!(provider.find_user(bob_id).unwrap().account, "bob");
        assert!(provider.find_user(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_static_provider_replace_keeps_old_snapshots() {
        let file = UsersFile::parse(SAMPLE).unwrap();
        let provider = StaticUserConfig::new(file.users);
        let before = provider.tracked_users();

        provider.replace(Vec::new());

        assert_eq!(before.len(), 2);
        assert!(provider.tracked_users().is_empty());
    }

    #[test]
    fn test_file_provider_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileUserConfig::load(dir.path().join("users.toml")).unwrap();
        assert!(provider.tracked_users().is_empty());
    }

    #[test]
    fn test_file_provider_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.toml");
        std::fs::write(&path, "").unwrap();

        let provider = FileUserConfig::load(&path).unwrap();
        assert!(provider.tracked_users().is_empty());

        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(provider.reload().unwrap(), 2);
        assert_eq!(provider.tracked_users().len(), 2);
        assert_eq!(provider.path(), path.as_path());
    }

    #[test]
    fn test_file_provider_failed_reload_keeps_users() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let provider = FileUserConfig::load(&path).unwrap();

        std::fs::write(&path, "[[users]]\nlinked_user_id = 12").unwrap();
        assert!(provider.reload().is_err());
        assert_eq!(provider.tracked_users().len(), 2);
    }
}

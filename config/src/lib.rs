//! Settings persistence for chatlog.
//!
//! All durable state lives in one flat JSON file:
//!
//! ```json
//! {
//!   "channels": { "<channel login>": "<channel user id>" },
//!   "auth": { ...scraped headers... },
//!   "identity": { "login": "...", "id": "..." }
//! }
//! ```
//!
//! Loading is tolerant: a missing or corrupt file yields defaults and a
//! warning, never an error. Saving is atomic (temp file + rename) and
//! tightens Unix permissions on the settings directory and file, since the
//! auth headers are credentials.

pub mod curl;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{env, fs};

use chatlog_types::{AuthHeaders, Identity, Login, UserId};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the settings file location.
pub const SETTINGS_ENV_VAR: &str = "CHATLOG_SETTINGS";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("could not determine a home directory for settings")]
    NoHome,
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything the application persists.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Channel login -> channel user id, in stable iteration order.
    #[serde(default)]
    pub channels: BTreeMap<Login, UserId>,
    /// Scraped request headers; `None` until the user pastes curl text.
    #[serde(default)]
    pub auth: Option<AuthHeaders>,
    /// The user whose sent messages are fetched.
    #[serde(default)]
    pub identity: Option<Identity>,
}

impl Settings {
    pub fn add_channel(&mut self, login: Login, id: UserId) {
        self.channels.insert(login, id);
    }

    pub fn remove_channel(&mut self, login: &Login) -> bool {
        self.channels.remove(login).is_some()
    }

    /// Channel logins in display order.
    #[must_use]
    pub fn channel_logins(&self) -> Vec<Login> {
        self.channels.keys().cloned().collect()
    }
}

/// Handle on the settings file location.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Resolve the default location: `$CHATLOG_SETTINGS` if set, else
    /// `~/.chatlog/settings.json`.
    pub fn open_default() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(SETTINGS_ENV_VAR)
            && !path.trim().is_empty()
        {
            return Ok(Self::at(PathBuf::from(path)));
        }
        let home = dirs::home_dir().ok_or(SettingsError::NoHome)?;
        Ok(Self::at(home.join(".chatlog").join("settings.json")))
    }

    #[must_use]
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, falling back to defaults on any failure.
    ///
    /// A corrupt file is left in place; the next save replaces it.
    #[must_use]
    pub fn load(&self) -> Settings {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Settings::default(),
            Err(e) => {
                tracing::warn!("Failed to read settings at {}: {e}", self.path.display());
                return Settings::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(
                    "Failed to parse settings at {}: {e}; starting fresh",
                    self.path.display()
                );
                Settings::default()
            }
        }
    }

    /// Persist settings atomically: write a sibling temp file, then rename
    /// it over the target.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let serialized = serde_json::to_vec_pretty(settings)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
            tighten_dir_permissions(parent);
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &serialized).map_err(|source| SettingsError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        tighten_file_permissions(&tmp_path);
        fs::rename(&tmp_path, &self.path).map_err(|source| SettingsError::Write {
            path: self.path.clone(),
            source,
        })?;

        Ok(())
    }
}

// Only modify permissions on paths we own; a shared or system-managed
// location keeps whatever the administrator chose.
#[cfg(unix)]
fn owned_by_us(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    metadata.uid() == unsafe { libc::getuid() }
}

#[cfg(unix)]
fn tighten_dir_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = fs::metadata(path)
        && owned_by_us(&metadata)
    {
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0
            && let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o700))
        {
            tracing::warn!("Failed to tighten permissions on {}: {e}", path.display());
        }
    }
}

#[cfg(unix)]
fn tighten_file_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = fs::metadata(path)
        && owned_by_us(&metadata)
    {
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0
            && let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        {
            tracing::warn!("Failed to tighten permissions on {}: {e}", path.display());
        }
    }
}

#[cfg(not(unix))]
fn tighten_dir_permissions(_path: &Path) {}

#[cfg(not(unix))]
fn tighten_file_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::at(dir.path().join("settings.json"))
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = store_in(&dir).load();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{not json").unwrap();
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut settings = Settings::default();
        settings.add_channel(Login::parse("somechannel").unwrap(), UserId::new("42"));
        settings.identity = Some(Identity {
            login: Login::parse("me").unwrap(),
            id: UserId::new("7"),
        });
        store.save(&settings).unwrap();

        assert_eq!(store.load(), settings);
    }

    #[test]
    fn save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("nested").join("settings.json"));
        store.save(&Settings::default()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&Settings::default()).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
    }

    #[test]
    fn remove_channel_reports_presence() {
        let mut settings = Settings::default();
        let login = Login::parse("gone").unwrap();
        settings.add_channel(login.clone(), UserId::new("1"));
        assert!(settings.remove_channel(&login));
        assert!(!settings.remove_channel(&login));
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_user_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&Settings::default()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode & 0o077, 0, "group/other bits set: {mode:o}");
    }
}

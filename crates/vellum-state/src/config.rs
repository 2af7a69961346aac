// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sync configuration and the storage port it is loaded through.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What [`SceneState`](crate::SceneState) does when the tessellator fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the failing op and return an error; the op is not applied.
    #[default]
    Abort,
    /// Apply the op's structural part, keep the node's previous buffer,
    /// mark it stale and report it in [`ApplyReport`](crate::ApplyReport).
    Continue,
}

/// Behaviour switches for [`SceneState`](crate::SceneState).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Reaction to tessellation failures.
    pub failure_policy: FailurePolicy,
    /// Reject diffs whose `version_from` differs from the state's version.
    pub enforce_versions: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Abort,
            enforce_versions: true,
        }
    }
}

impl SyncConfig {
    /// Key under which the config is stored.
    pub const KEY: &'static str = "vellum-sync";

    /// Reads the config from `store`. An absent or empty entry yields the
    /// defaults; a malformed one is an error.
    pub fn load_or_default(store: &impl ConfigStore) -> Result<Self, ConfigError> {
        match store.load_raw(Self::KEY) {
            Ok(bytes) if bytes.is_empty() => Ok(Self::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(ConfigError::NotFound) => Ok(Self::default()),
            Err(err) => Err(err),
        }
    }

    /// Writes the config to `store` as pretty-printed JSON.
    pub fn save(&self, store: &impl ConfigStore) -> Result<(), ConfigError> {
        store.save_raw(Self::KEY, &serde_json::to_vec_pretty(self)?)
    }
}

/// Byte-level storage for config entries, keyed by name.
pub trait ConfigStore {
    /// Raw bytes stored under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces the bytes stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failure loading or saving a [`SyncConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing is stored under the key.
    #[error("config entry not found")]
    NotFound,
    /// Key cannot be mapped onto the store.
    #[error("invalid config key {0:?}")]
    InvalidKey(String),
    /// Filesystem failure in a file-backed store.
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    /// Stored bytes are not a valid config document.
    #[error("malformed config: {0}")]
    Serde(#[from] serde_json::Error),
    /// Store-specific failure.
    #[error("config backend: {0}")]
    Backend(String),
}

/// Stores each key as `<key>.json` under one directory.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    base: PathBuf,
}

impl JsonDirStore {
    /// Store rooted at `base`. The directory is created on first save.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Directory holding the files.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ConfigError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(ConfigError::InvalidKey(key.to_owned()));
        }
        Ok(self.base.join(format!("{key}.json")))
    }
}

impl ConfigStore for JsonDirStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.base)?;
        fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: SyncConfig = serde_json::from_str(r#"{"failure_policy":"continue"}"#).unwrap();
        assert_eq!(cfg.failure_policy, FailurePolicy::Continue);
        assert!(cfg.enforce_versions);
    }

    #[test]
    fn keys_with_separators_are_rejected() {
        let store = JsonDirStore::new("unused");
        assert!(matches!(
            store.load_raw("../escape"),
            Err(ConfigError::InvalidKey(_))
        ));
        assert!(matches!(store.load_raw(""), Err(ConfigError::InvalidKey(_))));
    }

    enum Fixed {
        Missing,
        Down,
        Bytes(&'static [u8]),
    }

    impl ConfigStore for Fixed {
        fn load_raw(&self, _key: &str) -> Result<Vec<u8>, ConfigError> {
            match self {
                Self::Missing => Err(ConfigError::NotFound),
                Self::Down => Err(ConfigError::Backend("down".into())),
                Self::Bytes(bytes) => Ok(bytes.to_vec()),
            }
        }

        fn save_raw(&self, _key: &str, _data: &[u8]) -> Result<(), ConfigError> {
            Ok(())
        }
    }

    #[test]
    fn absent_or_empty_entries_load_defaults() {
        for store in [Fixed::Missing, Fixed::Bytes(b"")] {
            assert_eq!(SyncConfig::load_or_default(&store).unwrap(), SyncConfig::default());
        }
    }

    #[test]
    fn backend_and_parse_failures_propagate() {
        assert!(matches!(
            SyncConfig::load_or_default(&Fixed::Down),
            Err(ConfigError::Backend(_))
        ));
        assert!(matches!(
            SyncConfig::load_or_default(&Fixed::Bytes(b"{not json")),
            Err(ConfigError::Serde(_))
        ));
    }
}

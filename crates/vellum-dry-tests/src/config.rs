// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use vellum_state::{ConfigError, ConfigStore, SyncConfig};

/// In-memory implementation of [`ConfigStore`] for testing.
///
/// Clones share one backing map, so a test can keep a handle after moving
/// a clone into the code under test. Loads and saves are counted, and
/// either can be made to fail.
///
/// # Example
///
/// ```
/// use vellum_dry_tests::InMemoryConfigStore;
/// use vellum_state::{FailurePolicy, SyncConfig};
///
/// let store = InMemoryConfigStore::new();
///
/// let cfg = SyncConfig { failure_policy: FailurePolicy::Continue, ..SyncConfig::default() };
/// cfg.save(&store).unwrap();
/// assert_eq!(SyncConfig::load_or_default(&store).unwrap(), cfg);
/// assert_eq!(store.save_count(), 1);
/// assert_eq!(store.load_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    data: HashMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
    fail_on_save: bool,
}

impl InMemoryConfigStore {
    /// Create a new empty in-memory config store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `config` under [`SyncConfig::KEY`], written through
    /// [`SyncConfig::save`].
    pub fn with_sync_config(config: &SyncConfig) -> Result<Self, ConfigError> {
        let store = Self::new();
        config.save(&store)?;
        store.lock().save_count = 0;
        Ok(store)
    }

    /// Store holding `raw` bytes under `key`, valid JSON or not.
    pub fn with_raw(key: &str, raw: &[u8]) -> Self {
        let store = Self::new();
        store.lock().data.insert(key.to_owned(), raw.to_vec());
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Configure the store to fail on load operations.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.lock().fail_on_load = fail;
    }

    /// Configure the store to fail on save operations.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.lock().fail_on_save = fail;
    }

    /// Number of `load_raw` attempts, failed ones included.
    pub fn load_count(&self) -> usize {
        self.lock().load_count
    }

    /// Number of `save_raw` attempts, failed ones included.
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    /// Raw bytes stored under `key`.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().data.get(key).cloned()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut inner = self.lock();
        inner.load_count += 1;
        if inner.fail_on_load {
            return Err(ConfigError::Backend("simulated load failure".into()));
        }
        inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.lock();
        inner.save_count += 1;
        if inner.fail_on_save {
            return Err(ConfigError::Backend("simulated save failure".into()));
        }
        inner.data.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vellum_state::FailurePolicy;

    #[test]
    fn missing_key_loads_defaults() {
        assert_eq!(
            SyncConfig::load_or_default(&InMemoryConfigStore::new()).unwrap(),
            SyncConfig::default()
        );
    }

    #[test]
    fn stored_config_round_trips() {
        let cfg = SyncConfig {
            failure_policy: FailurePolicy::Continue,
            enforce_versions: false,
        };
        let store = InMemoryConfigStore::with_sync_config(&cfg).unwrap();
        assert_eq!(SyncConfig::load_or_default(&store).unwrap(), cfg);
        assert_eq!(store.load_count(), 1);
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn load_failure_propagates() {
        let store = InMemoryConfigStore::new();
        store.set_fail_on_load(true);
        assert!(matches!(
            SyncConfig::load_or_default(&store),
            Err(ConfigError::Backend(_))
        ));
    }

    #[test]
    fn save_failure_stores_nothing() {
        let store = InMemoryConfigStore::new();
        store.set_fail_on_save(true);
        assert!(SyncConfig::default().save(&store).is_err());
        assert_eq!(store.save_count(), 1);
        assert!(store.raw(SyncConfig::KEY).is_none());
    }

    #[test]
    fn saved_config_is_stored_under_its_key() {
        let store = InMemoryConfigStore::new();
        let cfg = SyncConfig {
            failure_policy: FailurePolicy::Continue,
            enforce_versions: false,
        };
        cfg.save(&store).unwrap();
        let raw = store.raw(SyncConfig::KEY).unwrap();
        assert_eq!(serde_json::from_slice::<SyncConfig>(&raw).unwrap(), cfg);
        assert_eq!(SyncConfig::load_or_default(&store).unwrap(), cfg);
    }

    #[test]
    fn malformed_json_is_a_serde_error() {
        let store = InMemoryConfigStore::with_raw(SyncConfig::KEY, b"{not json");
        assert!(matches!(
            SyncConfig::load_or_default(&store),
            Err(ConfigError::Serde(_))
        ));
    }
}

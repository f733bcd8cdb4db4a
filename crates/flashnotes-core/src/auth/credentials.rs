use std::collections::HashMap;

use anyhow::{Context, Result};
use keyring::Entry;

use super::store::SessionStore;

const SERVICE_NAME: &str = "flashnotes";

/// Session fields kept in the OS keychain, one entry per key.
///
/// Entries written through this store are kept open so later reads go
/// through the same credential handle.
pub struct KeyringStore {
    service: String,
    entries: HashMap<String, Entry>,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a custom keychain service name
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: HashMap::new(),
        }
    }

    fn open(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }

    fn entry_mut(&mut self, key: &str) -> Result<&mut Entry> {
        if !self.entries.contains_key(key) {
            let entry = self.open(key)?;
            self.entries.insert(key.to_string(), entry);
        }
        self.entries
            .get_mut(key)
            .context("Keyring entry missing after insert")
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let result = match self.entries.get(key) {
            Some(entry) => entry.get_password(),
            None => self.open(key)?.get_password(),
        };
        match result {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve value from keychain"),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entry_mut(key)?
            .set_password(value)
            .context("Failed to store value in keychain")
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let result = match self.entries.remove(key) {
            Some(entry) => entry.delete_credential(),
            None => self.open(key)?.delete_credential(),
        };
        match result {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete value from keychain"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

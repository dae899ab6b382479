// src/context.rs

//! Shared per-build state handed to every plugin.
//!
//! The data map is what content plugins (e.g. the data loader) accumulate
//! during the watch phase and what later consumers read after the loader's
//! completion callback has run. There is no ambient global; the context is
//! constructed by the caller and passed explicitly.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde_json::Value;

/// Accumulated site data for one build, keyed by logical name
/// (usually the source file's stem, e.g. `data/songs.yaml` -> `songs`).
#[derive(Debug, Default)]
pub struct BuildContext {
    data: Mutex<BTreeMap<String, Value>>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a record set under `key`.
    ///
    /// When both the existing and the new value are arrays the records are
    /// concatenated (several files may feed one collection); anything else
    /// replaces the previous value.
    pub fn merge_data(&self, key: &str, value: Value) {
        let mut data = self.data.lock();
        match (data.get_mut(key), value) {
            (Some(Value::Array(existing)), Value::Array(new)) => {
                existing.extend(new);
            }
            (_, value) => {
                data.insert(key.to_string(), value);
            }
        }
    }

    /// Fetch a copy of the record set stored under `key`.
    pub fn data(&self, key: &str) -> Option<Value> {
        self.data.lock().get(key).cloned()
    }

    /// Number of distinct data keys loaded so far.
    pub fn data_len(&self) -> usize {
        self.data.lock().len()
    }
}

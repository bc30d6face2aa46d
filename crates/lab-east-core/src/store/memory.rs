//! In-memory storage backend.

use std::collections::HashMap;

use super::{StorageBackend, StoreError, StoreResult};

/// `HashMap`-backed storage with an optional quota.
///
/// Usage is counted as the byte length of every key plus its value, which is
/// how browsers account `localStorage` quota.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    items: HashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    /// Unlimited in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory storage that rejects writes beyond `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: HashMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Change the quota. Existing items are kept even if they exceed it.
    pub fn set_quota(&mut self, quota_bytes: Option<usize>) {
        self.quota_bytes = quota_bytes;
    }

    /// Bytes currently used.
    pub fn usage_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        if let Some(quota) = self.quota_bytes {
            let replaced = self.items.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let available = quota.saturating_sub(self.usage_bytes() - replaced);
            let needed = key.len() + value.len();
            if needed > available {
                return Err(StoreError::QuotaExceeded { needed, available });
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StoreResult<()> {
        self.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.items.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut backend = MemoryBackend::new();
        backend.set_item("a", "1").unwrap();
        assert_eq!(backend.get_item("a").unwrap(), Some("1".into()));

        backend.remove_item("a").unwrap();
        assert_eq!(backend.get_item("a").unwrap(), None);
        // Removing again is fine
        backend.remove_item("a").unwrap();
    }

    #[test]
    fn test_quota_counts_replacement() {
        let mut backend = MemoryBackend::with_quota(10);
        backend.set_item("key", "12345").unwrap(); // 8 bytes
        assert_eq!(backend.usage_bytes(), 8);

        // Replacing the same key only needs room for the new value
        backend.set_item("key", "1234567").unwrap(); // 10 bytes

        let err = backend.set_item("x", "1").unwrap_err();
        match err {
            StoreError::QuotaExceeded { needed, available } => {
                assert_eq!(needed, 2);
                assert_eq!(available, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Failed write leaves state unchanged
        assert_eq!(backend.get_item("x").unwrap(), None);
        assert_eq!(backend.len(), 1);
    }
}

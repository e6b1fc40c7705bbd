//! In-memory object store
//!
//! Backs tests and single-process deployments. Range semantics match an
//! S3-style store: out-of-bounds ranges are an error, not a truncation.

use crate::error::{PorterError, PorterResult};
use crate::store::ObjectStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Mutex;

/// Object store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Bytes>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the store holds no objects
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove an object, returning whether it existed
    pub fn remove(&self, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key)
            .is_some()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, bytes: Bytes) -> PorterResult<()> {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, key: &str, range: Option<Range<u64>>) -> PorterResult<Bytes> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        let object = objects
            .get(key)
            .ok_or_else(|| PorterError::ObjectNotFound(key.to_string()))?;

        match range {
            None => Ok(object.clone()),
            Some(range) => {
                let len = object.len() as u64;
                if range.start > range.end || range.end > len {
                    return Err(PorterError::RangeOutOfBounds {
                        key: key.to_string(),
                        start: range.start,
                        end: range.end,
                        len,
                    });
                }
                Ok(object.slice(range.start as usize..range.end as usize))
            }
        }
    }

    async fn list(&self, prefix: &str) -> PorterResult<Vec<String>> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        Ok(objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

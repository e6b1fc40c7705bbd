//! Object storage capability
//!
//! The transfer engine consumes an S3-like store through this trait:
//! whole-object puts, optionally ranged gets, prefix listing. The concrete
//! transport (S3, filesystem, memory) lives behind the seam.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::PorterResult;
use async_trait::async_trait;
use bytes::Bytes;
use std::ops::Range;

/// Byte-range-capable object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object under a key, replacing any existing object
    async fn put(&self, key: &str, bytes: Bytes) -> PorterResult<()>;

    /// Fetch an object, or a byte range of it
    async fn get(&self, key: &str, range: Option<Range<u64>>) -> PorterResult<Bytes>;

    /// List keys under a prefix, in lexicographic order
    async fn list(&self, prefix: &str) -> PorterResult<Vec<String>>;
}

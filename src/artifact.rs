//! Build artifact model and cache key utilities

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;

/// A named, immutable byte-blob produced by a build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildArtifact {
    /// Artifact name
    pub name: String,

    /// Size in bytes
    pub size: u64,

    /// SHA-256 checksum, lowercase hex
    pub checksum: String,

    /// When the artifact was built
    pub build_time: DateTime<Utc>,

    /// Region the artifact was fetched from, if cached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_from: Option<String>,

    /// Whether the stored bytes are compressed
    #[serde(default)]
    pub compressed: bool,

    /// compressed size / original size, when compressed
    #[serde(default)]
    pub compression_ratio: f64,
}

impl BuildArtifact {
    /// Create an uncompressed artifact record
    pub fn new(name: impl Into<String>, size: u64, checksum: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            checksum: checksum.into(),
            build_time: Utc::now(),
            cached_from: None,
            compressed: false,
            compression_ratio: 0.0,
        }
    }
}

/// Generate the cache key for an artifact.
///
/// The `{service}/{version}/{platform}` layout is shared with existing
/// caches and must stay bit-exact: three path segments, literal forward
/// slashes, no escaping.
pub fn cache_key(service: &str, version: &str, platform: &str) -> String {
    format!("{}/{}/{}", service, version, platform)
}

/// Check if a cache entry produced at `timestamp` has outlived `ttl`
pub fn is_expired(timestamp: DateTime<Utc>, ttl: StdDuration) -> bool {
    let age = Utc::now() - timestamp;
    age > Duration::from_std(ttl).unwrap_or(Duration::MAX)
}

/// Compression ratio: compressed size over original size
pub fn compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    compressed_size as f64 / original_size as f64
}

/// Percentage of bytes saved by compression
pub fn savings_percent(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    (1.0 - compression_ratio(original_size, compressed_size)) * 100.0
}

/// Estimate wall-clock time to move `size_bytes` over a link of
/// `bandwidth_mbps`. Returns zero for nonsensical bandwidth.
pub fn estimate_transfer_time(size_bytes: u64, bandwidth_mbps: f64) -> StdDuration {
    if bandwidth_mbps <= 0.0 {
        return StdDuration::ZERO;
    }
    let bytes_per_second = (bandwidth_mbps * 1024.0 * 1024.0) / 8.0;
    StdDuration::from_secs_f64(size_bytes as f64 / bytes_per_second)
}

/// Format bytes as human-readable size (e.g., "1.5 GB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format bandwidth as human-readable rate
pub fn format_bandwidth(mbps: f64) -> String {
    if mbps >= 1000.0 {
        format!("{:.1} Gbps", mbps / 1000.0)
    } else {
        format!("{:.1} Mbps", mbps)
    }
}

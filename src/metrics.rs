//! Per-region cache metrics
//!
//! Accumulated observability for each region over time. All updates are
//! read-modify-write (counter bumps, running averages), so the registry
//! serializes them behind one lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// Accumulated metrics for one region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetrics {
    /// Region name
    pub region: String,

    /// Last measured latency
    pub latency_ms: u32,

    /// Last measured bandwidth
    pub bandwidth_mbps: f64,

    /// Cache hits recorded against this region
    pub cache_hits: u64,

    /// Cache misses recorded against this region
    pub cache_misses: u64,

    /// Total bytes moved to or from this region
    pub total_bytes_transferred: u64,

    /// Mean observed transfer speed
    pub avg_transfer_speed_mbps: f64,

    /// Healthy probes as a percentage of all probes
    pub availability_percent: f64,

    /// Last time a probe or transfer touched this region
    pub last_sync: DateTime<Utc>,

    #[serde(skip)]
    probes_total: u64,
    #[serde(skip)]
    probes_healthy: u64,
    #[serde(skip)]
    transfer_count: u64,
}

impl CacheMetrics {
    fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
            latency_ms: 0,
            bandwidth_mbps: 0.0,
            cache_hits: 0,
            cache_misses: 0,
            total_bytes_transferred: 0,
            avg_transfer_speed_mbps: 0.0,
            availability_percent: 0.0,
            last_sync: Utc::now(),
            probes_total: 0,
            probes_healthy: 0,
            transfer_count: 0,
        }
    }
}

/// Registry of per-region metrics, updates serialized behind a lock
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    inner: Mutex<HashMap<String, CacheMetrics>>,
}

impl MetricsRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn update<F: FnOnce(&mut CacheMetrics)>(&self, region: &str, f: F) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let metrics = inner
            .entry(region.to_string())
            .or_insert_with(|| CacheMetrics::new(region));
        f(metrics);
        metrics.last_sync = Utc::now();
    }

    /// Record the outcome of one completed probe cycle
    pub fn record_probe(&self, region: &str, latency_ms: u32, bandwidth_mbps: f64, healthy: bool) {
        self.update(region, |m| {
            m.probes_total += 1;
            if healthy {
                m.probes_healthy += 1;
                m.latency_ms = latency_ms;
                m.bandwidth_mbps = bandwidth_mbps;
            }
            m.availability_percent = (m.probes_healthy as f64 / m.probes_total as f64) * 100.0;
        });
    }

    /// Record a cache hit
    pub fn record_hit(&self, region: &str) {
        self.update(region, |m| m.cache_hits += 1);
    }

    /// Record a cache miss
    pub fn record_miss(&self, region: &str) {
        self.update(region, |m| m.cache_misses += 1);
    }

    /// Record a completed transfer: bytes moved and observed speed
    pub fn record_transfer(&self, region: &str, bytes: u64, speed_mbps: f64) {
        self.update(region, |m| {
            m.total_bytes_transferred += bytes;
            m.transfer_count += 1;
            // Running mean over completed transfers
            let n = m.transfer_count as f64;
            m.avg_transfer_speed_mbps += (speed_mbps - m.avg_transfer_speed_mbps) / n;
        });
    }

    /// Snapshot one region's metrics
    pub fn snapshot(&self, region: &str) -> Option<CacheMetrics> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.get(region).cloned()
    }

    /// Snapshot all regions, sorted by name for stable output
    pub fn snapshot_all(&self) -> Vec<CacheMetrics> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<CacheMetrics> = inner.values().cloned().collect();
        all.sort_by(|a, b| a.region.cmp(&b.region));
        all
    }
}

//! Network topology snapshot model
//!
//! A topology is a point-in-time, scored view of every configured cache
//! region. It is built fresh on each detection request; callers that want
//! to reuse one across requests own the TTL (see `artifact::is_expired`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cache endpoint candidate with its measured characteristics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionInfo {
    /// Unique region name
    pub name: String,

    /// Connection address
    pub endpoint: String,

    /// Measured round-trip latency
    pub latency_ms: u32,

    /// Measured bandwidth estimate
    pub bandwidth_mbps: f64,

    /// Composite score, lower is better. Always recomputed from the
    /// latency/bandwidth fields, never set independently.
    pub score: f64,

    /// Outcome of the liveness check
    pub healthy: bool,
}

/// Point-in-time snapshot of all known regions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkTopology {
    /// The region this node lives in
    pub local_region: String,

    /// All probed regions, in probe (input) order
    pub regions: Vec<RegionInfo>,

    /// Name of the best healthy region, empty when none is healthy
    pub primary_cache: String,

    /// Remaining healthy regions, best to worst
    pub fallback_caches: Vec<String>,

    /// When this snapshot was taken
    pub detected_at: DateTime<Utc>,
}

impl NetworkTopology {
    /// True when no healthy region was found. A degraded topology is
    /// reportable, not a crash; selection against it fails with
    /// `NoHealthyRegion`.
    pub fn is_degraded(&self) -> bool {
        self.primary_cache.is_empty()
    }

    /// Look up a region by name
    pub fn region(&self, name: &str) -> Option<&RegionInfo> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Healthy regions in selection order: primary first, then fallbacks
    pub fn ranked(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_cache.as_str())
            .filter(|name| !name.is_empty())
            .chain(self.fallback_caches.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_topology() -> NetworkTopology {
        NetworkTopology {
            local_region: "us-east".to_string(),
            regions: vec![
                RegionInfo {
                    name: "us-east".to_string(),
                    endpoint: "localhost:4566".to_string(),
                    latency_ms: 50,
                    bandwidth_mbps: 100.0,
                    score: 2.0,
                    healthy: true,
                },
                RegionInfo {
                    name: "us-west".to_string(),
                    endpoint: "localhost:4567".to_string(),
                    latency_ms: 120,
                    bandwidth_mbps: 50.0,
                    score: 7.8,
                    healthy: true,
                },
            ],
            primary_cache: "us-east".to_string(),
            fallback_caches: vec!["us-west".to_string()],
            detected_at: Utc::now(),
        }
    }

    #[test]
    fn ranked_order() {
        let topo = sample_topology();
        let ranked: Vec<&str> = topo.ranked().collect();
        assert_eq!(ranked, vec!["us-east", "us-west"]);
    }

    #[test]
    fn degraded_when_primary_empty() {
        let mut topo = sample_topology();
        assert!(!topo.is_degraded());

        topo.primary_cache = String::new();
        topo.fallback_caches.clear();
        assert!(topo.is_degraded());
        assert_eq!(topo.ranked().count(), 0);
    }

    #[test]
    fn region_lookup() {
        let topo = sample_topology();
        assert_eq!(topo.region("us-west").unwrap().latency_ms, 120);
        assert!(topo.region("eu-central").is_none());
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let topo = sample_topology();
        let json = serde_json::to_string(&topo).unwrap();
        assert!(json.contains("\"latency_ms\""));
        assert!(json.contains("\"bandwidth_mbps\""));
        assert!(json.contains("\"primary_cache\""));
        assert!(json.contains("\"fallback_caches\""));
    }
}

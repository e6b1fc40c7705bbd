//! Region selection
//!
//! Probes all configured regions concurrently, scores the healthy ones and
//! exposes primary/fallback choices. Probe failures are absorbed into
//! `healthy = false` for that detection cycle; they never abort the whole
//! selection. Dropping the returned future cancels the in-flight probes
//! and discards all partial results.

use crate::config::RegionEndpoint;
use crate::error::{PorterError, PorterResult};
use crate::metrics::MetricsRegistry;
use crate::probe::NetworkProbe;
use crate::score;
use crate::topology::{NetworkTopology, RegionInfo};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Caller-replaceable clock, defaults to `Utc::now`
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Builds scored topology snapshots and picks regions from them
pub struct RegionSelector {
    probe: Arc<dyn NetworkProbe>,
    latency_samples: u32,
    metrics: Option<Arc<MetricsRegistry>>,
    clock: Clock,
}

impl RegionSelector {
    /// Create a selector over a probe implementation
    pub fn new(probe: Arc<dyn NetworkProbe>) -> Self {
        Self {
            probe,
            latency_samples: 1,
            metrics: None,
            clock: Box::new(Utc::now),
        }
    }

    /// Average latency over this many probe calls per detection
    pub fn with_latency_samples(mut self, samples: u32) -> Self {
        self.latency_samples = samples.max(1);
        self
    }

    /// Record probe outcomes into a metrics registry
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Replace the wall clock (for deterministic snapshots in tests)
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Build a fresh topology snapshot by probing every candidate.
    ///
    /// One concurrent probe set per candidate, joined before scoring.
    /// Healthy regions are sorted ascending by score; ties resolve to
    /// candidate input order, so selection is deterministic for equal
    /// scores. A topology with zero healthy regions is returned with an
    /// empty `primary_cache`, not an error.
    pub async fn detect_topology(
        &self,
        local_region: &str,
        candidates: &[RegionEndpoint],
    ) -> NetworkTopology {
        let probes = candidates.iter().map(|c| self.probe_candidate(c));
        let regions: Vec<RegionInfo> = join_all(probes).await;

        if let Some(metrics) = &self.metrics {
            for region in &regions {
                metrics.record_probe(
                    &region.name,
                    region.latency_ms,
                    region.bandwidth_mbps,
                    region.healthy,
                );
            }
        }

        // Stable sort keeps input order for equal scores
        let mut healthy: Vec<&RegionInfo> = regions.iter().filter(|r| r.healthy).collect();
        healthy.sort_by(|a, b| a.score.total_cmp(&b.score));

        let primary_cache = healthy
            .first()
            .map(|r| r.name.clone())
            .unwrap_or_default();
        let fallback_caches: Vec<String> =
            healthy.iter().skip(1).map(|r| r.name.clone()).collect();

        if primary_cache.is_empty() {
            warn!(local_region, "Topology detection found no healthy region");
        } else {
            info!(
                local_region,
                primary = %primary_cache,
                fallbacks = fallback_caches.len(),
                "Topology detected"
            );
        }

        NetworkTopology {
            local_region: local_region.to_string(),
            regions,
            primary_cache,
            fallback_caches,
            detected_at: (self.clock)(),
        }
    }

    /// Probe one candidate: health check and measurements run together.
    /// Any probe failure marks the region unhealthy for this cycle; the
    /// error itself is logged and absorbed. An unhealthy-but-reachable
    /// region still reports its measured latency and bandwidth in the
    /// snapshot, only measurement errors zero the readings.
    async fn probe_candidate(&self, candidate: &RegionEndpoint) -> RegionInfo {
        let (health, measured) = tokio::join!(
            self.probe.check_health(&candidate.endpoint),
            self.measure(candidate)
        );

        let alive = match health {
            Ok(true) => true,
            Ok(false) => {
                debug!(region = %candidate.name, "Health check negative");
                false
            }
            Err(e) => {
                debug!(region = %candidate.name, error = %e, "Health check failed");
                false
            }
        };

        let (latency_ms, bandwidth_mbps, measured_ok) = match measured {
            Ok((lat, bw)) => (lat, bw, true),
            Err(e) => {
                debug!(region = %candidate.name, error = %e, "Measurement failed");
                (0, 0.0, false)
            }
        };

        let healthy = alive && measured_ok;

        RegionInfo {
            name: candidate.name.clone(),
            endpoint: candidate.endpoint.clone(),
            latency_ms,
            bandwidth_mbps,
            score: score::score(latency_ms, bandwidth_mbps),
            healthy,
        }
    }

    /// Latency (averaged over the configured sample count) and bandwidth
    async fn measure(&self, candidate: &RegionEndpoint) -> PorterResult<(u32, f64)> {
        let mut total_ms = 0u64;
        for _ in 0..self.latency_samples {
            total_ms += u64::from(self.probe.measure_latency(&candidate.endpoint).await?);
        }
        let latency_ms = (total_ms / u64::from(self.latency_samples)) as u32;

        let bandwidth_mbps = self.probe.measure_bandwidth(&candidate.endpoint).await?;
        Ok((latency_ms, bandwidth_mbps))
    }

    /// Pick the best-ranked region not in `excluding`.
    ///
    /// Scans primary, then fallbacks, without re-probing. Used to fail
    /// over after a transfer error against the previously chosen region.
    pub fn select_region(
        &self,
        topology: &NetworkTopology,
        excluding: &HashSet<String>,
    ) -> PorterResult<String> {
        topology
            .ranked()
            .find(|name| !excluding.contains(*name))
            .map(str::to_string)
            .ok_or(PorterError::NoHealthyRegion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FixedProbe;

    fn candidates() -> Vec<RegionEndpoint> {
        vec![
            RegionEndpoint::new("us-east", "localhost:4566"),
            RegionEndpoint::new("us-west", "localhost:4567"),
            RegionEndpoint::new("eu-central", "localhost:4568"),
        ]
    }

    fn three_region_probe() -> Arc<FixedProbe> {
        Arc::new(
            FixedProbe::new()
                .with_endpoint("localhost:4566", 50, 100.0, true)
                .with_endpoint("localhost:4567", 120, 50.0, true)
                .with_endpoint("localhost:4568", 160, 25.0, false),
        )
    }

    #[tokio::test]
    async fn detects_primary_and_fallbacks() {
        let selector = RegionSelector::new(three_region_probe());
        let topo = selector.detect_topology("us-east", &candidates()).await;

        // A: 0.4*5 + 0.6*0 = 2.0, B: 0.4*12 + 0.6*5 = 7.8, C unhealthy
        assert_eq!(topo.primary_cache, "us-east");
        assert_eq!(topo.fallback_caches, vec!["us-west".to_string()]);
        assert!((topo.region("us-east").unwrap().score - 2.0).abs() < 1e-9);
        assert!((topo.region("us-west").unwrap().score - 7.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn regions_keep_probe_order() {
        let selector = RegionSelector::new(three_region_probe());
        let topo = selector.detect_topology("us-east", &candidates()).await;

        let names: Vec<&str> = topo.regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["us-east", "us-west", "eu-central"]);
    }

    #[tokio::test]
    async fn unhealthy_region_never_in_fallbacks() {
        // eu-central would score best but is unhealthy
        let probe = Arc::new(
            FixedProbe::new()
                .with_endpoint("localhost:4566", 200, 20.0, true)
                .with_endpoint("localhost:4567", 220, 15.0, true)
                .with_endpoint("localhost:4568", 5, 1000.0, false),
        );
        let selector = RegionSelector::new(probe);
        let topo = selector.detect_topology("us-east", &candidates()).await;

        assert_eq!(topo.primary_cache, "us-east");
        assert!(!topo.fallback_caches.contains(&"eu-central".to_string()));
    }

    #[tokio::test]
    async fn all_unhealthy_is_degraded_not_error() {
        let probe = Arc::new(
            FixedProbe::new()
                .with_endpoint("localhost:4566", 50, 100.0, false)
                .with_endpoint("localhost:4567", 120, 50.0, false)
                .with_endpoint("localhost:4568", 160, 25.0, false),
        );
        let selector = RegionSelector::new(probe);
        let topo = selector.detect_topology("us-east", &candidates()).await;

        assert!(topo.is_degraded());
        assert_eq!(topo.primary_cache, "");
        assert!(topo.fallback_caches.is_empty());

        let err = selector
            .select_region(&topo, &HashSet::new())
            .unwrap_err();
        assert!(matches!(err, PorterError::NoHealthyRegion));
    }

    #[tokio::test]
    async fn unhealthy_region_keeps_measured_values() {
        let selector = RegionSelector::new(three_region_probe());
        let topo = selector.detect_topology("us-east", &candidates()).await;

        // eu-central reports unhealthy but is still reachable; the
        // snapshot carries what was actually measured, not zeros
        let region = topo.region("eu-central").unwrap();
        assert!(!region.healthy);
        assert_eq!(region.latency_ms, 160);
        assert!((region.bandwidth_mbps - 25.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn probe_errors_absorbed_as_unhealthy() {
        // Only one endpoint has a reading; the others error out
        let probe = Arc::new(FixedProbe::new().with_endpoint("localhost:4566", 50, 100.0, true));
        let selector = RegionSelector::new(probe);
        let topo = selector.detect_topology("us-east", &candidates()).await;

        assert_eq!(topo.primary_cache, "us-east");
        assert_eq!(topo.regions.len(), 3);
        assert!(!topo.region("us-west").unwrap().healthy);
        assert!(!topo.region("eu-central").unwrap().healthy);
    }

    #[tokio::test]
    async fn score_ties_resolve_to_input_order() {
        let probe = Arc::new(
            FixedProbe::new()
                .with_endpoint("localhost:4566", 100, 60.0, true)
                .with_endpoint("localhost:4567", 100, 60.0, true)
                .with_endpoint("localhost:4568", 100, 60.0, true),
        );
        let selector = RegionSelector::new(probe);
        let topo = selector.detect_topology("us-east", &candidates()).await;

        assert_eq!(topo.primary_cache, "us-east");
        assert_eq!(
            topo.fallback_caches,
            vec!["us-west".to_string(), "eu-central".to_string()]
        );
    }

    #[tokio::test]
    async fn select_region_respects_exclusions() {
        let selector = RegionSelector::new(three_region_probe());
        let topo = selector.detect_topology("us-east", &candidates()).await;

        let mut excluding = HashSet::new();
        assert_eq!(
            selector.select_region(&topo, &excluding).unwrap(),
            "us-east"
        );

        excluding.insert("us-east".to_string());
        assert_eq!(
            selector.select_region(&topo, &excluding).unwrap(),
            "us-west"
        );

        excluding.insert("us-west".to_string());
        let err = selector.select_region(&topo, &excluding).unwrap_err();
        assert!(matches!(err, PorterError::NoHealthyRegion));
    }

    #[tokio::test]
    async fn records_probe_metrics() {
        let metrics = Arc::new(MetricsRegistry::new());
        let selector =
            RegionSelector::new(three_region_probe()).with_metrics(Arc::clone(&metrics));
        selector.detect_topology("us-east", &candidates()).await;

        let m = metrics.snapshot("us-east").unwrap();
        assert_eq!(m.latency_ms, 50);
        assert_eq!(m.availability_percent, 100.0);

        let unhealthy = metrics.snapshot("eu-central").unwrap();
        assert_eq!(unhealthy.availability_percent, 0.0);
    }

    #[tokio::test]
    async fn empty_candidate_list_is_degraded() {
        let selector = RegionSelector::new(Arc::new(FixedProbe::new()));
        let topo = selector.detect_topology("us-east", &[]).await;
        assert!(topo.is_degraded());
        assert!(topo.regions.is_empty());
    }
}

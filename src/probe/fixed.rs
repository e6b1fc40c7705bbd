//! Deterministic probe double
//!
//! Returns pre-configured readings per endpoint. Used by tests and by
//! deployments that pin region characteristics instead of measuring them.

use crate::error::{PorterError, PorterResult};
use crate::probe::NetworkProbe;
use async_trait::async_trait;
use std::collections::HashMap;

/// A pinned measurement for one endpoint
#[derive(Debug, Clone, Copy)]
pub struct FixedReading {
    pub latency_ms: u32,
    pub bandwidth_mbps: f64,
    pub healthy: bool,
}

/// Probe that answers from a static table, keyed by endpoint
#[derive(Debug, Default)]
pub struct FixedProbe {
    readings: HashMap<String, FixedReading>,
}

impl FixedProbe {
    /// Create an empty probe; unknown endpoints are unreachable
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a reading for an endpoint
    pub fn with_endpoint(
        mut self,
        endpoint: impl Into<String>,
        latency_ms: u32,
        bandwidth_mbps: f64,
        healthy: bool,
    ) -> Self {
        self.readings.insert(
            endpoint.into(),
            FixedReading {
                latency_ms,
                bandwidth_mbps,
                healthy,
            },
        );
        self
    }

    fn reading(&self, endpoint: &str) -> PorterResult<FixedReading> {
        self.readings
            .get(endpoint)
            .copied()
            .ok_or_else(|| PorterError::unreachable(endpoint, "no fixed reading configured"))
    }
}

#[async_trait]
impl NetworkProbe for FixedProbe {
    async fn measure_latency(&self, endpoint: &str) -> PorterResult<u32> {
        Ok(self.reading(endpoint)?.latency_ms)
    }

    async fn measure_bandwidth(&self, endpoint: &str) -> PorterResult<f64> {
        Ok(self.reading(endpoint)?.bandwidth_mbps)
    }

    async fn check_health(&self, endpoint: &str) -> PorterResult<bool> {
        Ok(self.reading(endpoint)?.healthy)
    }
}

//! HTTP-based network probe
//!
//! Real measurements against a cache endpoint: latency from a timed HEAD
//! request, bandwidth from a bounded ranged download, liveness from the
//! endpoint's health route.

use crate::error::{PorterError, PorterResult};
use crate::probe::NetworkProbe;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default bandwidth sample size: 1 MiB
const DEFAULT_SAMPLE_BYTES: u64 = 1024 * 1024;

/// Probe implementation backed by plain HTTP requests
pub struct HttpProbe {
    client: reqwest::Client,
    timeout: Duration,
    sample_bytes: u64,
}

impl HttpProbe {
    /// Create a probe with default timeout and sample size
    pub fn new() -> PorterResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a probe with a custom per-request timeout
    pub fn with_timeout(timeout: Duration) -> PorterResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PorterError::Internal(format!("building HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout,
            sample_bytes: DEFAULT_SAMPLE_BYTES,
        })
    }

    /// Override the bandwidth sample size in bytes
    pub fn with_sample_bytes(mut self, bytes: u64) -> Self {
        self.sample_bytes = bytes;
        self
    }

    /// Endpoints come from config as either `host:port` or a full URL
    fn base_url(endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", endpoint)
        }
    }

    fn map_error(endpoint: &str, err: reqwest::Error) -> PorterError {
        if err.is_timeout() {
            PorterError::ProbeTimeout {
                endpoint: endpoint.to_string(),
            }
        } else {
            PorterError::unreachable(endpoint, err.to_string())
        }
    }
}

#[async_trait]
impl NetworkProbe for HttpProbe {
    async fn measure_latency(&self, endpoint: &str) -> PorterResult<u32> {
        let url = format!("{}/", Self::base_url(endpoint));

        let started = Instant::now();
        self.client
            .head(&url)
            .send()
            .await
            .map_err(|e| Self::map_error(endpoint, e))?;
        let elapsed = started.elapsed();

        let ms = elapsed.as_millis().min(u128::from(u32::MAX)) as u32;
        debug!(endpoint, latency_ms = ms, "Measured latency");
        Ok(ms)
    }

    async fn measure_bandwidth(&self, endpoint: &str) -> PorterResult<f64> {
        let url = format!("{}/", Self::base_url(endpoint));
        let range = format!("bytes=0-{}", self.sample_bytes.saturating_sub(1));

        let started = Instant::now();
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::RANGE, range)
            .send()
            .await
            .map_err(|e| Self::map_error(endpoint, e))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(endpoint, e))?;
        let elapsed = started.elapsed();

        let seconds = elapsed.as_secs_f64().max(1e-6);
        let bits = body.len() as f64 * 8.0;
        let mbps = bits / seconds / 1_000_000.0;

        debug!(
            endpoint,
            sample_bytes = body.len(),
            bandwidth_mbps = mbps,
            "Measured bandwidth"
        );
        Ok(mbps)
    }

    async fn check_health(&self, endpoint: &str) -> PorterResult<bool> {
        let url = format!("{}/health", Self::base_url(endpoint));

        // A dead endpoint is a normal health outcome, not a probe error
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                debug!(endpoint, error = %e, "Health check failed");
                Ok(false)
            }
        }
    }
}

impl std::fmt::Debug for HttpProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProbe")
            .field("timeout", &self.timeout)
            .field("sample_bytes", &self.sample_bytes)
            .finish_non_exhaustive()
    }
}

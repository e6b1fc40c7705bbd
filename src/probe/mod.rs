//! Network probing capability
//!
//! Measures latency, bandwidth and liveness for a region endpoint. The
//! trait is the seam: production uses [`http::HttpProbe`] (real timing and
//! data-rate sampling), tests use [`fixed::FixedProbe`]. No implementation
//! is allowed to fake measurements with randomness.

pub mod fixed;
pub mod http;

pub use fixed::FixedProbe;
pub use http::HttpProbe;

use crate::error::PorterResult;
use async_trait::async_trait;

/// Abstract network measurement interface
///
/// Each call may block up to an implementation-defined timeout; callers
/// needing a hard bound must apply their own timeout or cancellation. No
/// retries live at this layer — retry policy belongs to the selector.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    /// Single round-trip latency measurement in milliseconds.
    /// Callers may average repeated calls.
    async fn measure_latency(&self, endpoint: &str) -> PorterResult<u32>;

    /// Bandwidth estimate in Mbps from a bounded-size sample transfer
    async fn measure_bandwidth(&self, endpoint: &str) -> PorterResult<f64>;

    /// Liveness check, independent of performance
    async fn check_health(&self, endpoint: &str) -> PorterResult<bool>;
}

//! Region scoring
//!
//! Combines a latency and a bandwidth measurement into a single comparable
//! score. Lower is better. Pure computation, no side effects.

/// Weight of the latency term in the composite score
pub const LATENCY_WEIGHT: f64 = 0.4;

/// Weight of the bandwidth term in the composite score
pub const BANDWIDTH_WEIGHT: f64 = 0.6;

/// Compute the composite score for a region.
///
/// `score = 0.4 * (latency_ms / 10) + 0.6 * ((100 - bandwidth_mbps) / 10)`
///
/// Bandwidth above 100 Mbps drives the bandwidth term negative. That is
/// deliberate, not a clamping bug: a very high bandwidth region must be
/// able to out-rank a merely low-latency one.
pub fn score(latency_ms: u32, bandwidth_mbps: f64) -> f64 {
    let latency_term = f64::from(latency_ms) / 10.0;
    let bandwidth_term = (100.0 - bandwidth_mbps) / 10.0;

    LATENCY_WEIGHT * latency_term + BANDWIDTH_WEIGHT * bandwidth_term
}

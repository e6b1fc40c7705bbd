//! Compression policy selection
//!
//! Chooses a compression strategy from measured bandwidth. This module only
//! names the strategy; the actual codecs live with the transport, not here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bandwidth above this skips compression entirely (Mbps)
pub const NO_COMPRESSION_THRESHOLD_MBPS: f64 = 100.0;

/// Bandwidth above this uses fast compression, below maximum (Mbps)
pub const FAST_COMPRESSION_THRESHOLD_MBPS: f64 = 50.0;

/// Named compression strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    /// No compression
    None,
    /// Fast, low-ratio compression
    Fast,
    /// Maximum-ratio compression
    Max,
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Fast => write!(f, "fast"),
            Self::Max => write!(f, "max"),
        }
    }
}

/// Outcome of a compression policy decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionDecision {
    /// Whether to compress at all
    pub enabled: bool,
    /// Which strategy to use
    pub algorithm: CompressionAlgorithm,
}

/// Decide the compression strategy for a link of the given bandwidth.
///
/// Three tiers with hard boundaries at 100 and 50 Mbps:
/// - above 100 Mbps the CPU cost of compression is not justified
/// - between 50 (exclusive) and 100 (inclusive) fast compression wins
/// - at or below 50 Mbps maximum compression wins
pub fn decide(bandwidth_mbps: f64) -> CompressionDecision {
    if bandwidth_mbps > NO_COMPRESSION_THRESHOLD_MBPS {
        CompressionDecision {
            enabled: false,
            algorithm: CompressionAlgorithm::None,
        }
    } else if bandwidth_mbps > FAST_COMPRESSION_THRESHOLD_MBPS {
        CompressionDecision {
            enabled: true,
            algorithm: CompressionAlgorithm::Fast,
        }
    } else {
        CompressionDecision {
            enabled: true,
            algorithm: CompressionAlgorithm::Max,
        }
    }
}

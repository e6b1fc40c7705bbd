//! Configuration schema for Porter
//!
//! Configuration is stored at `~/.config/porter/config.toml`

use crate::error::{PorterError, PorterResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Region topology
    pub topology: TopologyConfig,

    /// Network probing settings
    pub probe: ProbeConfig,

    /// Artifact transfer settings
    pub transfer: TransferConfig,
}

impl Config {
    /// Validate cross-field constraints not expressible in the schema
    pub fn validate(&self, path: &std::path::Path) -> PorterResult<()> {
        let invalid = |reason: String| PorterError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        };

        if self.topology.local_region.is_empty() {
            return Err(invalid("topology.local_region must not be empty".to_string()));
        }

        let mut seen = HashSet::new();
        for region in &self.topology.regions {
            if region.name.is_empty() {
                return Err(invalid("region with empty name".to_string()));
            }
            if region.endpoint.is_empty() {
                return Err(invalid(format!("region {} has empty endpoint", region.name)));
            }
            if !seen.insert(region.name.as_str()) {
                return Err(invalid(format!("duplicate region name: {}", region.name)));
            }
        }

        if self.transfer.chunk_size_bytes == 0 {
            return Err(invalid("transfer.chunk_size_bytes must be > 0".to_string()));
        }
        if self.probe.latency_samples == 0 {
            return Err(invalid("probe.latency_samples must be > 0".to_string()));
        }

        Ok(())
    }
}

/// One configured cache region candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEndpoint {
    /// Unique region name
    pub name: String,

    /// Connection address (`host:port` or full URL)
    pub endpoint: String,
}

impl RegionEndpoint {
    /// Convenience constructor
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Region topology: ordered candidates plus the local region name.
/// Candidate order matters — it breaks score ties during selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// The region this node lives in
    pub local_region: String,

    /// Cache region candidates, in priority order for tie-breaking
    pub regions: Vec<RegionEndpoint>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            local_region: "local".to_string(),
            regions: vec![],
        }
    }
}

/// Network probing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// How many latency samples to average per detection
    pub latency_samples: u32,

    /// Bandwidth sample transfer size in bytes
    pub bandwidth_sample_bytes: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            latency_samples: 3,
            bandwidth_sample_bytes: 1024 * 1024,
        }
    }
}

/// Artifact transfer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Chunk size in bytes (default: 1 MiB)
    pub chunk_size_bytes: u64,

    /// Where job state files live (default: platform state dir)
    pub state_dir: Option<PathBuf>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: 1024 * 1024,
            state_dir: None,
        }
    }
}

//! Error types for Porter
//!
//! All modules use `PorterResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Porter operations
pub type PorterResult<T> = Result<T, PorterError>;

/// All errors that can occur in Porter
#[derive(Error, Debug)]
pub enum PorterError {
    // Probe errors
    #[error("Probe timed out for endpoint {endpoint}")]
    ProbeTimeout { endpoint: String },

    #[error("Endpoint unreachable: {endpoint}: {reason}")]
    ProbeUnreachable { endpoint: String, reason: String },

    // Selection errors
    #[error("No healthy cache region available")]
    NoHealthyRegion,

    // Transfer errors
    #[error("Chunk {chunk} of job {job_id} failed: {reason}")]
    ChunkTransferFailed {
        job_id: String,
        chunk: u64,
        reason: String,
    },

    #[error("Checksum mismatch for {artifact}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        artifact: String,
        expected: String,
        actual: String,
    },

    #[error("Transfer job not found: {0}")]
    JobNotFound(String),

    #[error("Job {id} cannot be resumed: {reason}")]
    JobNotResumable { id: String, reason: String },

    #[error("Job {id} is {status}, expected {expected}")]
    InvalidJobState {
        id: String,
        status: String,
        expected: String,
    },

    #[error("Invalid chunk size: {0}. Must be greater than zero")]
    InvalidChunkSize(u64),

    // Checksum errors
    #[error("Cannot read checksum source: {context}")]
    ChecksumSourceUnreadable {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Object store errors
    #[error("Object not found in store: {0}")]
    ObjectNotFound(String),

    #[error("Requested range {start}..{end} is outside object {key} ({len} bytes)")]
    RangeOutOfBounds {
        key: String,
        start: u64,
        end: u64,
        len: u64,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PorterError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a probe-unreachable error
    pub fn unreachable(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProbeUnreachable {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Create a chunk transfer failure
    pub fn chunk_failed(job_id: impl Into<String>, chunk: u64, reason: impl Into<String>) -> Self {
        Self::ChunkTransferFailed {
            job_id: job_id.into(),
            chunk,
            reason: reason.into(),
        }
    }

    /// Check if error is retryable.
    ///
    /// Probe failures only poison one detection cycle, and chunk failures
    /// are recoverable by resume or region fallback. An integrity mismatch
    /// is never retryable: the transferred bytes cannot be trusted, the job
    /// must restart from chunk 0.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProbeTimeout { .. }
                | Self::ProbeUnreachable { .. }
                | Self::ChunkTransferFailed { .. }
        )
    }
}

//! Transfer job state and persistence
//!
//! A `TransferJob` is checkpointed to disk after every committed chunk so
//! an interrupted process can reload it by id and resume at the recorded
//! chunk boundary.

use crate::artifact::BuildArtifact;
use crate::error::{PorterError, PorterResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tokio::fs;

/// Transfer job status
///
/// `Pending -> Active -> {Completed | Paused | Failed}`, with
/// `Paused -> Active` on resume. A `Failed` job re-enters `Active` via
/// resume while it stays resumable; an integrity failure clears the
/// resumable flag and makes `Failed` terminal for that job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Active,
    Paused,
    Completed,
    Failed,
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The unit of work for the transfer manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferJob {
    /// Unique job id
    pub id: String,

    /// Name of the artifact being moved
    pub artifact_name: String,

    /// Region the bytes come from
    pub source_region: String,

    /// Region the bytes go to
    pub target_region: String,

    /// Total artifact size in bytes
    pub total_size: u64,

    /// Bytes committed so far; never decreases within a job
    pub transferred: u64,

    /// Chunk size in bytes (the final chunk may be shorter)
    pub chunk_size: u64,

    /// Next chunk to send
    pub current_chunk: u64,

    /// ceil(total_size / chunk_size)
    pub total_chunks: u64,

    /// Expected SHA-256 of the whole artifact, lowercase hex
    pub checksum: String,

    /// Current status
    pub status: TransferStatus,

    /// Whether the job may be resumed. Cleared on integrity failure.
    pub resumable: bool,

    /// When the job was created
    pub start_time: DateTime<Utc>,
}

impl TransferJob {
    /// Create a pending job for an artifact
    pub fn new(
        id: String,
        artifact: &BuildArtifact,
        source_region: &str,
        target_region: &str,
        chunk_size: u64,
        start_time: DateTime<Utc>,
    ) -> PorterResult<Self> {
        if chunk_size == 0 {
            return Err(PorterError::InvalidChunkSize(chunk_size));
        }

        Ok(Self {
            id,
            artifact_name: artifact.name.clone(),
            source_region: source_region.to_string(),
            target_region: target_region.to_string(),
            total_size: artifact.size,
            transferred: 0,
            chunk_size,
            current_chunk: 0,
            total_chunks: artifact.size.div_ceil(chunk_size),
            checksum: artifact.checksum.clone(),
            status: TransferStatus::Pending,
            resumable: true,
            start_time,
        })
    }

    /// Whether the job has reached a state no transition leaves
    pub fn is_terminal(&self) -> bool {
        self.status == TransferStatus::Completed
            || (self.status == TransferStatus::Failed && !self.resumable)
    }

    /// Completed fraction in percent
    pub fn progress_percent(&self) -> f64 {
        if self.total_size == 0 {
            return 100.0;
        }
        (self.transferred as f64 / self.total_size as f64) * 100.0
    }

    /// Byte offset and length of the given chunk
    pub fn chunk_span(&self, chunk: u64) -> (u64, u64) {
        let offset = chunk * self.chunk_size;
        let len = self.chunk_size.min(self.total_size.saturating_sub(offset));
        (offset, len)
    }
}

/// On-disk job store: one JSON file per job id
pub struct JobStore {
    dir: PathBuf,
}

impl JobStore {
    /// Create a store rooted at `dir` (created lazily on first save)
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn job_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Persist a job, creating the store directory if needed
    pub async fn save(&self, job: &TransferJob) -> PorterResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PorterError::io("creating job state directory", e))?;

        let path = self.job_path(&job.id);
        let content = serde_json::to_string_pretty(job)?;
        fs::write(&path, content)
            .await
            .map_err(|e| PorterError::io(format!("writing job file {}", path.display()), e))?;

        Ok(())
    }

    /// Load a job by id
    pub async fn load(&self, id: &str) -> PorterResult<Option<TransferJob>> {
        let path = self.job_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| PorterError::io(format!("reading job file {}", path.display()), e))?;

        let job: TransferJob = serde_json::from_str(&content)?;
        Ok(Some(job))
    }

    /// Delete a job's state file
    pub async fn delete(&self, id: &str) -> PorterResult<()> {
        let path = self.job_path(id);
        if path.exists() {
            fs::remove_file(&path)
                .await
                .map_err(|e| PorterError::io(format!("deleting job file {}", path.display()), e))?;
        }
        Ok(())
    }

    /// List all persisted jobs, newest first
    pub async fn list_all(&self) -> PorterResult<Vec<TransferJob>> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }

        let mut jobs = vec![];
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| PorterError::io("reading job state directory", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PorterError::io("reading job entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Ok(content) = fs::read_to_string(&path).await {
                    if let Ok(job) = serde_json::from_str::<TransferJob>(&content) {
                        jobs.push(job);
                    }
                }
            }
        }

        jobs.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(jobs)
    }
}

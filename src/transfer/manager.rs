//! Resumable chunked artifact transfer
//!
//! Moves an artifact between two object stores chunk by chunk. Each chunk
//! commit (bytes written, counters advanced, job persisted) is the resume
//! checkpoint: chunk n+1 is never sent before chunk n commits, and resume
//! re-enters the loop at the persisted `current_chunk` without re-sending
//! committed data. On the final chunk the reassembled artifact is verified
//! against the expected checksum.

use crate::artifact::BuildArtifact;
use crate::checksum::StreamingChecksum;
use crate::error::{PorterError, PorterResult};
use crate::metrics::MetricsRegistry;
use crate::store::ObjectStore;
use crate::transfer::job::{JobStore, TransferJob, TransferStatus};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Caller-replaceable clock, defaults to `Utc::now`
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Caller-replaceable job id generator, defaults to UUID v4
pub type IdGenerator = Box<dyn Fn() -> String + Send + Sync>;

/// Cooperative pause flag shared with a running transfer.
///
/// Pause takes effect at the next chunk boundary, never mid-chunk.
#[derive(Debug, Default)]
pub struct TransferControl {
    paused: AtomicBool,
}

impl TransferControl {
    /// Create a control in the running state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a pause at the next chunk boundary
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Clear a pause request (done automatically on resume)
    pub fn clear(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Whether a pause has been requested
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

/// Drives resumable chunked transfers between a source and a target store
pub struct TransferManager {
    source: Arc<dyn ObjectStore>,
    target: Arc<dyn ObjectStore>,
    jobs: JobStore,
    metrics: Option<Arc<MetricsRegistry>>,
    clock: Clock,
    id_gen: IdGenerator,
}

impl TransferManager {
    /// Create a manager over a source store, a target store and a job store
    pub fn new(source: Arc<dyn ObjectStore>, target: Arc<dyn ObjectStore>, jobs: JobStore) -> Self {
        Self {
            source,
            target,
            jobs,
            metrics: None,
            clock: Box::new(Utc::now),
            id_gen: Box::new(|| uuid::Uuid::new_v4().to_string()),
        }
    }

    /// Record completed transfers into a metrics registry
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Replace the wall clock (for deterministic job timestamps in tests)
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the job id generator (for deterministic ids in tests)
    pub fn with_id_generator(mut self, id_gen: IdGenerator) -> Self {
        self.id_gen = id_gen;
        self
    }

    /// The key a chunk is stored under in the target. Stable across a
    /// resume: the scheme is part of the persisted-job contract.
    fn chunk_key(artifact: &str, index: u64) -> String {
        format!("{}/chunk/{:08}", artifact, index)
    }

    /// Create and persist a pending job for an artifact
    pub async fn create_job(
        &self,
        artifact: &BuildArtifact,
        source_region: &str,
        target_region: &str,
        chunk_size: u64,
    ) -> PorterResult<TransferJob> {
        let job = TransferJob::new(
            (self.id_gen)(),
            artifact,
            source_region,
            target_region,
            chunk_size,
            (self.clock)(),
        )?;

        self.jobs.save(&job).await?;
        info!(
            job_id = %job.id,
            artifact = %job.artifact_name,
            total_chunks = job.total_chunks,
            "Transfer job created"
        );
        Ok(job)
    }

    /// Reload a persisted job by id (after a process restart)
    pub async fn load_job(&self, id: &str) -> PorterResult<TransferJob> {
        self.jobs
            .load(id)
            .await?
            .ok_or_else(|| PorterError::JobNotFound(id.to_string()))
    }

    /// Start a pending job.
    ///
    /// The progress sink is invoked with the committed `transferred` value
    /// after each chunk. It must be cheap; long synchronous work in the
    /// sink stalls the transfer loop.
    pub async fn start<F>(
        &self,
        job: &mut TransferJob,
        ctrl: &TransferControl,
        on_progress: F,
    ) -> PorterResult<()>
    where
        F: FnMut(u64) + Send,
    {
        if job.status != TransferStatus::Pending {
            return Err(PorterError::InvalidJobState {
                id: job.id.clone(),
                status: job.status.to_string(),
                expected: TransferStatus::Pending.to_string(),
            });
        }
        self.run(job, ctrl, on_progress).await
    }

    /// Resume a paused or transiently failed job at its last checkpoint.
    ///
    /// Chunks `0..current_chunk` are already committed and are never
    /// re-sent. A job that failed integrity verification is not resumable;
    /// it must be recreated and restarted from chunk 0 with a freshly read
    /// source.
    pub async fn resume<F>(
        &self,
        job: &mut TransferJob,
        ctrl: &TransferControl,
        on_progress: F,
    ) -> PorterResult<()>
    where
        F: FnMut(u64) + Send,
    {
        if !job.resumable {
            return Err(PorterError::JobNotResumable {
                id: job.id.clone(),
                reason: "integrity check failed, restart from chunk 0".to_string(),
            });
        }
        match job.status {
            TransferStatus::Paused | TransferStatus::Failed | TransferStatus::Active => {}
            status => {
                return Err(PorterError::InvalidJobState {
                    id: job.id.clone(),
                    status: status.to_string(),
                    expected: "paused or failed".to_string(),
                });
            }
        }

        ctrl.clear();
        debug!(job_id = %job.id, chunk = job.current_chunk, "Resuming transfer");
        self.run(job, ctrl, on_progress).await
    }

    /// The sequential chunk loop. Single writer: the caller must not share
    /// one job between concurrent runs.
    async fn run<F>(
        &self,
        job: &mut TransferJob,
        ctrl: &TransferControl,
        mut on_progress: F,
    ) -> PorterResult<()>
    where
        F: FnMut(u64) + Send,
    {
        job.status = TransferStatus::Active;
        self.jobs.save(job).await?;

        let started = Instant::now();
        let resumed_from = job.transferred;

        while job.current_chunk < job.total_chunks {
            // Cooperative pause, chunk granularity only
            if ctrl.is_paused() {
                job.status = TransferStatus::Paused;
                self.jobs.save(job).await?;
                info!(job_id = %job.id, chunk = job.current_chunk, "Transfer paused");
                return Ok(());
            }

            let chunk = job.current_chunk;
            let (offset, len) = job.chunk_span(chunk);

            let bytes = match self
                .source
                .get(&job.artifact_name, Some(offset..offset + len))
                .await
            {
                Ok(bytes) => bytes,
                Err(e) => return self.chunk_failure(job, chunk, "read", e).await,
            };

            let key = Self::chunk_key(&job.artifact_name, chunk);
            if let Err(e) = self.target.put(&key, bytes).await {
                return self.chunk_failure(job, chunk, "write", e).await;
            }

            // Commit point: counters advance and the job is persisted only
            // after the chunk is fully written
            job.transferred += len;
            job.current_chunk += 1;
            self.jobs.save(job).await?;
            on_progress(job.transferred);
        }

        self.finish(job, resumed_from, started).await
    }

    /// Record a chunk-level I/O failure. No partial-chunk credit:
    /// `current_chunk` and `transferred` stay at the last commit.
    async fn chunk_failure(
        &self,
        job: &mut TransferJob,
        chunk: u64,
        action: &str,
        cause: PorterError,
    ) -> PorterResult<()> {
        job.status = TransferStatus::Failed;
        self.jobs.save(job).await?;

        warn!(
            job_id = %job.id,
            chunk,
            action,
            error = %cause,
            "Chunk transfer failed"
        );
        Err(PorterError::chunk_failed(
            &job.id,
            chunk,
            format!("{} failed: {}", action, cause),
        ))
    }

    /// All chunks committed: verify the reassembled artifact, then settle
    /// the job.
    async fn finish(
        &self,
        job: &mut TransferJob,
        resumed_from: u64,
        started: Instant,
    ) -> PorterResult<()> {
        let actual = self.target_checksum(job).await?;

        if actual != job.checksum {
            // The transferred bytes cannot be trusted; resuming would
            // re-verify the same corrupt data, so the job is terminal
            job.status = TransferStatus::Failed;
            job.resumable = false;
            self.jobs.save(job).await?;

            warn!(job_id = %job.id, "Integrity verification failed");
            return Err(PorterError::IntegrityMismatch {
                artifact: job.artifact_name.clone(),
                expected: job.checksum.clone(),
                actual,
            });
        }

        job.status = TransferStatus::Completed;
        self.jobs.save(job).await?;

        if let Some(metrics) = &self.metrics {
            let moved = job.transferred - resumed_from;
            let seconds = started.elapsed().as_secs_f64().max(1e-6);
            let mbps = (moved as f64 * 8.0) / seconds / 1_000_000.0;
            metrics.record_transfer(&job.target_region, moved, mbps);
        }

        info!(
            job_id = %job.id,
            artifact = %job.artifact_name,
            bytes = job.transferred,
            "Transfer completed and verified"
        );
        Ok(())
    }

    /// Stream the target's chunks in order through the hasher
    async fn target_checksum(&self, job: &TransferJob) -> PorterResult<String> {
        let mut hasher = StreamingChecksum::new();
        for chunk in 0..job.total_chunks {
            let key = Self::chunk_key(&job.artifact_name, chunk);
            let bytes = self.target.get(&key, None).await?;
            hasher.update(&bytes);
        }
        Ok(hasher.finalize())
    }
}

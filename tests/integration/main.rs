//! Integration tests for Porter
//!
//! Exercises the full pipeline: topology detection over a deterministic
//! probe, compression policy from the selected region's bandwidth, and a
//! resumable chunked transfer with failover.

use bytes::Bytes;
use porter::artifact::BuildArtifact;
use porter::checksum::StreamingChecksum;
use porter::compression::{self, CompressionAlgorithm};
use porter::config::RegionEndpoint;
use porter::metrics::MetricsRegistry;
use porter::probe::FixedProbe;
use porter::selector::RegionSelector;
use porter::store::{MemoryStore, ObjectStore};
use porter::transfer::{JobStore, TransferControl, TransferManager, TransferStatus};
use porter::PorterError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn three_region_setup() -> (Arc<FixedProbe>, Vec<RegionEndpoint>) {
    let probe = Arc::new(
        FixedProbe::new()
            .with_endpoint("localhost:4566", 50, 100.0, true)
            .with_endpoint("localhost:4567", 120, 50.0, true)
            .with_endpoint("localhost:4568", 160, 25.0, false),
    );
    let candidates = vec![
        RegionEndpoint::new("us-east", "localhost:4566"),
        RegionEndpoint::new("us-west", "localhost:4567"),
        RegionEndpoint::new("eu-central", "localhost:4568"),
    ];
    (probe, candidates)
}

fn seeded_artifact(data: &[u8], name: &str) -> BuildArtifact {
    let mut hasher = StreamingChecksum::new();
    hasher.update(data);
    BuildArtifact::new(name, data.len() as u64, hasher.finalize())
}

#[tokio::test]
async fn select_then_compress_then_transfer() {
    init_tracing();
    let (probe, candidates) = three_region_setup();
    let metrics = Arc::new(MetricsRegistry::new());

    // 1. Detect topology and pick the primary region
    let selector = RegionSelector::new(probe).with_metrics(Arc::clone(&metrics));
    let topology = selector.detect_topology("us-east", &candidates).await;

    assert_eq!(topology.primary_cache, "us-east");
    assert_eq!(topology.fallback_caches, vec!["us-west".to_string()]);

    let primary = topology.region(&topology.primary_cache).unwrap();

    // 2. Pick a compression strategy from the primary's bandwidth
    let decision = compression::decide(primary.bandwidth_mbps);
    assert!(decision.enabled);
    assert_eq!(decision.algorithm, CompressionAlgorithm::Fast);

    // 3. Move an artifact toward the primary region
    let source = Arc::new(MemoryStore::new());
    let target = Arc::new(MemoryStore::new());
    let temp = TempDir::new().unwrap();

    let data: Vec<u8> = (0..50_000u32).map(|i| (i % 239) as u8).collect();
    source
        .put("frontend", Bytes::copy_from_slice(&data))
        .await
        .unwrap();
    let artifact = seeded_artifact(&data, "frontend");

    let manager = TransferManager::new(
        source as Arc<dyn ObjectStore>,
        target as Arc<dyn ObjectStore>,
        JobStore::new(temp.path().to_path_buf()),
    )
    .with_metrics(Arc::clone(&metrics));

    let mut job = manager
        .create_job(&artifact, "us-west", &topology.primary_cache, 8_192)
        .await
        .unwrap();

    let last_progress = Mutex::new(0u64);
    manager
        .start(&mut job, &TransferControl::new(), |transferred| {
            let mut last = last_progress.lock().unwrap();
            // Progress is monotonically non-decreasing
            assert!(transferred >= *last);
            *last = transferred;
        })
        .await
        .unwrap();

    assert_eq!(job.status, TransferStatus::Completed);
    assert_eq!(job.transferred, 50_000);
    assert_eq!(*last_progress.lock().unwrap(), 50_000);

    // Metrics saw both the probes and the transfer
    let m = metrics.snapshot("us-east").unwrap();
    assert_eq!(m.total_bytes_transferred, 50_000);
    assert_eq!(m.availability_percent, 100.0);
}

#[tokio::test]
async fn restart_resumes_at_chunk_four() {
    init_tracing();
    // 10 MB artifact, 1 MB chunks, process dies after 4 committed chunks
    let source = Arc::new(MemoryStore::new());
    let target = Arc::new(MemoryStore::new());
    let temp = TempDir::new().unwrap();

    let data: Vec<u8> = (0..10_000_000u32).map(|i| (i % 253) as u8).collect();
    source
        .put("big-artifact", Bytes::copy_from_slice(&data))
        .await
        .unwrap();
    let artifact = seeded_artifact(&data, "big-artifact");

    let job_id;
    {
        let manager = TransferManager::new(
            Arc::clone(&source) as Arc<dyn ObjectStore>,
            Arc::clone(&target) as Arc<dyn ObjectStore>,
            JobStore::new(temp.path().to_path_buf()),
        );
        let mut job = manager
            .create_job(&artifact, "us-east", "us-west", 1_000_000)
            .await
            .unwrap();
        assert_eq!(job.total_chunks, 10);
        job_id = job.id.clone();

        let ctrl = TransferControl::new();
        manager
            .start(&mut job, &ctrl, |transferred| {
                if transferred >= 4_000_000 {
                    ctrl.pause();
                }
            })
            .await
            .unwrap();
    }

    // Fresh manager over the same persisted state
    let manager = TransferManager::new(
        source as Arc<dyn ObjectStore>,
        target as Arc<dyn ObjectStore>,
        JobStore::new(temp.path().to_path_buf()),
    );

    let mut job = manager.load_job(&job_id).await.unwrap();
    assert_eq!(job.current_chunk, 4);
    assert_eq!(job.transferred, 4_000_000);

    let chunks_sent = Mutex::new(0u32);
    manager
        .resume(&mut job, &TransferControl::new(), |_| {
            *chunks_sent.lock().unwrap() += 1;
        })
        .await
        .unwrap();

    assert_eq!(job.status, TransferStatus::Completed);
    assert_eq!(job.transferred, 10_000_000);
    // Exactly chunks 4..9 were re-sent, never 0..3
    assert_eq!(*chunks_sent.lock().unwrap(), 6);
}

#[tokio::test]
async fn failed_transfer_fails_over_to_next_region() {
    init_tracing();
    let (probe, candidates) = three_region_setup();
    let selector = RegionSelector::new(probe);
    let topology = selector.detect_topology("us-east", &candidates).await;

    // The transfer against the primary failed; exclude it and re-select
    // without re-probing
    let mut excluding = HashSet::new();
    excluding.insert(topology.primary_cache.clone());

    let fallback = selector.select_region(&topology, &excluding).unwrap();
    assert_eq!(fallback, "us-west");

    // The unhealthy region is never offered, so the next exclusion
    // exhausts the topology
    excluding.insert(fallback);
    let err = selector.select_region(&topology, &excluding).unwrap_err();
    assert!(matches!(err, PorterError::NoHealthyRegion));
}

#[tokio::test]
async fn corrupted_target_rejects_resume_and_restarts_clean() {
    init_tracing();
    let source = Arc::new(MemoryStore::new());
    let target = Arc::new(MemoryStore::new());
    let temp = TempDir::new().unwrap();

    let data: Vec<u8> = (0..6_000u32).map(|i| (i % 101) as u8).collect();
    source
        .put("artifact-x", Bytes::copy_from_slice(&data))
        .await
        .unwrap();
    let artifact = seeded_artifact(&data, "artifact-x");

    let manager = TransferManager::new(
        Arc::clone(&source) as Arc<dyn ObjectStore>,
        Arc::clone(&target) as Arc<dyn ObjectStore>,
        JobStore::new(temp.path().to_path_buf()),
    );

    // Transfer most of the artifact, then corrupt a committed chunk
    let mut job = manager
        .create_job(&artifact, "us-east", "us-west", 1_000)
        .await
        .unwrap();
    let ctrl = TransferControl::new();
    manager
        .start(&mut job, &ctrl, |transferred| {
            if transferred >= 5_000 {
                ctrl.pause();
            }
        })
        .await
        .unwrap();
    assert_eq!(job.status, TransferStatus::Paused);

    target
        .put("artifact-x/chunk/00000002", Bytes::from_static(b"bitrot"))
        .await
        .unwrap();

    let err = manager
        .resume(&mut job, &ctrl, |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, PorterError::IntegrityMismatch { .. }));
    assert!(job.is_terminal());

    // Resume is rejected; the only way forward is a new job from chunk 0
    let err = manager
        .resume(&mut job, &TransferControl::new(), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, PorterError::JobNotResumable { .. }));

    let mut fresh = manager
        .create_job(&artifact, "us-east", "us-west", 1_000)
        .await
        .unwrap();
    manager
        .start(&mut fresh, &TransferControl::new(), |_| {})
        .await
        .unwrap();
    assert_eq!(fresh.status, TransferStatus::Completed);
}

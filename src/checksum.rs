//! Artifact checksum computation and verification
//!
//! SHA-256 digests, lowercase hex encoded (64 characters). All hashing is
//! streaming so arbitrarily large artifacts never need a whole-buffer load.

use crate::error::{PorterError, PorterResult};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read buffer size for streaming hashes
const HASH_BUF_SIZE: usize = 64 * 1024;

/// Compute the SHA-256 digest of a byte source, streaming.
///
/// Returns the lowercase hex encoding of the digest.
pub async fn compute<R: AsyncRead + Unpin>(reader: &mut R) -> PorterResult<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BUF_SIZE];

    loop {
        let n = reader
            .read(&mut buf)
            .await
            .map_err(|e| PorterError::ChecksumSourceUnreadable {
                context: "reading bytes for checksum".to_string(),
                source: e,
            })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Verify a byte source against an expected digest.
///
/// A mismatch is a normal outcome (`Ok(false)`), not an error. Only an
/// unreadable source produces an `Err`.
pub async fn verify<R: AsyncRead + Unpin>(
    reader: &mut R,
    expected: &str,
) -> PorterResult<bool> {
    let actual = compute(reader).await?;
    Ok(actual == expected)
}

/// Incremental SHA-256 hasher for callers that already hold bytes in
/// memory chunk by chunk (e.g. the transfer loop verifying a reassembled
/// artifact without re-buffering it).
#[derive(Default)]
pub struct StreamingChecksum {
    hasher: Sha256,
}

impl StreamingChecksum {
    /// Create a fresh hasher
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of bytes
    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Finish and return the lowercase hex digest
    pub fn finalize(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

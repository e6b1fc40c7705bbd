//! Resumable artifact transfer between cache regions
//!
//! Jobs are chunked, checkpointed after every committed chunk, and
//! verified against the artifact checksum on completion.

pub mod job;
pub mod manager;

pub use job::{JobStore, TransferJob, TransferStatus};
pub use manager::{TransferControl, TransferManager};

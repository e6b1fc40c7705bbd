//! Porter - network-aware build cache engine
//!
//! Decides which of several geographically distributed cache regions a
//! build should talk to, and moves artifacts between regions with
//! resumable chunked transfers.

pub mod artifact;
pub mod checksum;
pub mod compression;
pub mod config;
pub mod error;
pub mod metrics;
pub mod probe;
pub mod score;
pub mod selector;
pub mod store;
pub mod topology;
pub mod transfer;

pub use error::{PorterError, PorterResult};

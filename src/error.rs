//! Error types for memory statistics collection.
//!
//! Only `SourceUnavailable` is fatal. Per-process and discovery failures are
//! reported through the same type so callers can log them, but the aggregation
//! layer recovers from them instead of aborting the report.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemvizError {
    /// The global memory-info source could not be opened or read.
    #[error("memory info source {} is unavailable: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The per-process memory map vanished (process exited after discovery).
    #[error("process {pid} not found")]
    ProcessNotFound { pid: u32 },

    /// The per-process memory map exists but could not be read.
    #[error("memory map of process {pid} is unreadable: {source}")]
    ProcessUnreadable {
        pid: u32,
        #[source]
        source: io::Error,
    },

    /// Total memory is zero, so no usage fraction can be computed.
    #[error("total memory is zero, usage fraction is undefined")]
    InvalidSnapshot,

    /// The external process-discovery utility failed.
    #[error("process discovery for '{program}' failed: {reason}")]
    Discovery { program: String, reason: String },
}

pub type Result<T> = std::result::Result<T, MemvizError>;

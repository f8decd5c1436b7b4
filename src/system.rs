//! System-wide memory statistics from the /proc filesystem.
//!
//! This module owns the handle to the proc root (`ProcFs`) and reads the
//! aggregate memory counters exposed in `/proc/meminfo`.

use ahash::AHashMap as HashMap;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::error::{MemvizError, Result};

/// Default mount point of the proc filesystem.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Fields of /proc/meminfo the aggregator needs.
pub const MEMINFO_FIELDS: [&str; 4] = ["MemTotal", "MemFree", "SwapFree", "MemAvailable"];

/// Parsed meminfo counters in KiB, keyed by field name.
pub type MemInfo = HashMap<&'static str, u64>;

/// Read buffer sizes (KB) for /proc readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    pub io_kb: usize,
    pub smaps_kb: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            io_kb: 64,
            smaps_kb: 256,
        }
    }
}

/// Handle to a proc filesystem tree.
///
/// Every read opens its source fresh and releases it before returning, so
/// a `ProcFs` carries no state besides its location and buffer sizes.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
    buffers: BufferConfig,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT, BufferConfig::default())
    }
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>, buffers: BufferConfig) -> Self {
        Self {
            root: root.into(),
            buffers,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn buffers(&self) -> BufferConfig {
        self.buffers
    }

    pub fn meminfo_path(&self) -> PathBuf {
        self.root.join("meminfo")
    }

    /// Reads the tracked counters from `<root>/meminfo`.
    ///
    /// Fails with `SourceUnavailable` if the file cannot be opened or read.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn read_system_memory_info(&self) -> Result<MemInfo> {
        let path = self.meminfo_path();
        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(source) => return Err(MemvizError::SourceUnavailable { path, source }),
        };
        let reader = BufReader::with_capacity(self.buffers.io_kb * 1024, file);

        let info = parse_meminfo(reader)
            .map_err(|source| MemvizError::SourceUnavailable { path, source })?;
        debug!("Read {} meminfo fields", info.len());
        Ok(info)
    }
}

/// Scans meminfo-formatted text for the fields in `MEMINFO_FIELDS`.
///
/// A line matches a field when it starts with the field name. The first
/// occurrence of a field wins; matched lines without a numeric value are skipped.
pub fn parse_meminfo<R: BufRead>(reader: R) -> io::Result<MemInfo> {
    let mut info = MemInfo::new();

    for line in reader.lines() {
        let line = line?;
        let Some(field) = MEMINFO_FIELDS.iter().find(|f| line.starts_with(**f)) else {
            continue;
        };
        match parse_field_value(&line) {
            Some(kib) => {
                info.entry(*field).or_insert(kib);
            }
            None => debug!("Skipping malformed meminfo line: {:?}", line),
        }
    }

    Ok(info)
}

/// Parses the value of a `<Field>: <value> kB` line (second whitespace token).
pub fn parse_field_value(line: &str) -> Option<u64> {
    line.split_whitespace().nth(1)?.parse().ok()
}

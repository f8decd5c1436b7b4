//! Per-process memory maps and process discovery.
//!
//! Resident memory is read from `/proc/<pid>/smaps`, which carries one `Rss:`
//! line per mapped region. Process ids are discovered by running an external
//! utility (`pidof` by default) instead of walking /proc by name.

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, error, instrument, warn};

use crate::error::{MemvizError, Result};
use crate::system::{parse_field_value, ProcFs};

/// Default process-discovery utility.
pub const DEFAULT_PIDOF_COMMAND: &str = "pidof";

const RSS_FIELD: &str = "Rss";

impl ProcFs {
    pub fn smaps_path(&self, pid: u32) -> PathBuf {
        self.root().join(pid.to_string()).join("smaps")
    }

    /// Collects the `Rss` value (KiB) of every mapped region of `pid`.
    ///
    /// A missing smaps file means the process is gone and yields
    /// `ProcessNotFound`; other I/O failures yield `ProcessUnreadable`.
    #[instrument(skip(self))]
    pub fn read_process_memory_map(&self, pid: u32) -> Result<Vec<u64>> {
        let path = self.smaps_path(pid);
        let file = fs::File::open(&path).map_err(|e| pid_read_error(pid, e))?;
        let reader = BufReader::with_capacity(self.buffers().smaps_kb * 1024, file);

        let regions = parse_smaps_rss(reader).map_err(|e| pid_read_error(pid, e))?;
        debug!("PID {}: {} Rss entries", pid, regions.len());
        Ok(regions)
    }
}

fn pid_read_error(pid: u32, source: io::Error) -> MemvizError {
    match source.kind() {
        io::ErrorKind::NotFound => MemvizError::ProcessNotFound { pid },
        _ => MemvizError::ProcessUnreadable { pid, source },
    }
}

/// Returns the values of all lines starting with `Rss`, in file order.
pub fn parse_smaps_rss<R: BufRead>(reader: R) -> io::Result<Vec<u64>> {
    let mut regions = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if !line.starts_with(RSS_FIELD) {
            continue;
        }
        match parse_field_value(&line) {
            Some(kib) => regions.push(kib),
            None => debug!("Skipping malformed smaps line: {:?}", line),
        }
    }

    Ok(regions)
}

/// Runs `command <program>` and parses the process ids it prints.
///
/// `pidof` exits with status 1 and prints nothing when no process matches;
/// that case is an empty result, not an error.
#[instrument]
pub fn discover_pids(command: &str, program: &str) -> Result<Vec<u32>> {
    let output = Command::new(command)
        .arg(program)
        .output()
        .map_err(|e| MemvizError::Discovery {
            program: program.to_string(),
            reason: format!("failed to run '{}': {}", command, e),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);

    match output.status.code() {
        Some(0) => Ok(parse_pid_list(&stdout)),
        Some(1) if stdout.trim().is_empty() => {
            debug!("No running processes named {}", program);
            Ok(Vec::new())
        }
        _ => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = if stderr.trim().is_empty() {
                format!("'{}' exited with {}", command, output.status)
            } else {
                stderr.trim().to_string()
            };
            Err(MemvizError::Discovery {
                program: program.to_string(),
                reason,
            })
        }
    }
}

/// Parses whitespace-separated pids in output order, skipping bad tokens.
pub fn parse_pid_list(output: &str) -> Vec<u32> {
    output
        .split_whitespace()
        .filter_map(|token| match token.parse() {
            Ok(pid) => Some(pid),
            Err(_) => {
                warn!("Ignoring invalid pid token: {:?}", token);
                None
            }
        })
        .collect()
}

/// Like `discover_pids`, but a failing discovery is logged and treated as
/// "no processes found".
pub fn pids_of_program(command: &str, program: &str) -> Vec<u32> {
    match discover_pids(command, program) {
        Ok(pids) => pids,
        Err(e) => {
            error!("Error finding processes for {}: {}", program, e);
            Vec::new()
        }
    }
}

//! Memory aggregation: system totals and per-process resident memory.

use tracing::{debug, warn};

use crate::error::{MemvizError, Result};
use crate::system::{MemInfo, ProcFs};

/// Total and available system memory in KiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub total_kib: u64,
    pub available_kib: u64,
}

impl MemorySnapshot {
    /// Builds a snapshot from parsed meminfo fields.
    ///
    /// `MemAvailable` is used when present and non-zero; otherwise available
    /// memory is `MemFree + SwapFree`. A missing `MemTotal` gives a total of 0.
    pub fn from_meminfo(info: &MemInfo) -> Self {
        let field = |name: &str| info.get(name).copied().unwrap_or(0);

        let available_kib = match field("MemAvailable") {
            0 => {
                debug!("MemAvailable missing, falling back to MemFree + SwapFree");
                field("MemFree").saturating_add(field("SwapFree"))
            }
            available => available,
        };

        Self {
            total_kib: field("MemTotal"),
            available_kib,
        }
    }

    /// Used memory; saturates at 0 if available exceeds total.
    pub fn used_kib(&self) -> u64 {
        self.total_kib.saturating_sub(self.available_kib)
    }
}

/// Resident memory of a single process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessMemorySample {
    pub pid: u32,
    pub resident_kib: u64,
}

/// All running instances of a named program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessGroupSample {
    pub name: String,
    pub samples: Vec<ProcessMemorySample>,
    pub total_resident_kib: u64,
}

impl ProcessGroupSample {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Computes snapshots and resident totals on top of a `ProcFs`.
pub struct MemoryAggregator<'a> {
    source: &'a ProcFs,
}

impl<'a> MemoryAggregator<'a> {
    pub fn new(source: &'a ProcFs) -> Self {
        Self { source }
    }

    pub fn compute_total(&self) -> Result<MemorySnapshot> {
        let info = self.source.read_system_memory_info()?;
        let snapshot = MemorySnapshot::from_meminfo(&info);
        debug!(
            "Memory snapshot: total={} KiB available={} KiB",
            snapshot.total_kib, snapshot.available_kib
        );
        Ok(snapshot)
    }

    /// Sum of all `Rss` entries of `pid`. Processes that cannot be read
    /// count as 0 so the rest of the report still renders.
    pub fn compute_process_resident(&self, pid: u32) -> u64 {
        match self.source.read_process_memory_map(pid) {
            Ok(regions) => saturating_sum(regions),
            Err(e) => {
                warn!("{}", e);
                0
            }
        }
    }

    pub fn compute_group_resident(&self, name: &str, pids: &[u32]) -> ProcessGroupSample {
        let samples: Vec<ProcessMemorySample> = pids
            .iter()
            .map(|&pid| ProcessMemorySample {
                pid,
                resident_kib: self.compute_process_resident(pid),
            })
            .collect();
        let total_resident_kib = saturating_sum(samples.iter().map(|s| s.resident_kib));

        debug!(
            "Group {}: {} processes, {} KiB resident",
            name,
            samples.len(),
            total_resident_kib
        );

        ProcessGroupSample {
            name: name.to_string(),
            samples,
            total_resident_kib,
        }
    }
}

/// Sums KiB counts, saturating at `u64::MAX` instead of overflowing.
pub fn saturating_sum<I: IntoIterator<Item = u64>>(values: I) -> u64 {
    values.into_iter().fold(0u64, u64::saturating_add)
}

/// Fraction of total memory in use.
pub fn compute_used_fraction(snapshot: &MemorySnapshot) -> Result<f64> {
    compute_fraction(snapshot.used_kib(), snapshot.total_kib)
}

/// `used / total`, or `InvalidSnapshot` when total is 0.
pub fn compute_fraction(used_kib: u64, total_kib: u64) -> Result<f64> {
    if total_kib == 0 {
        return Err(MemvizError::InvalidSnapshot);
    }
    Ok(used_kib as f64 / total_kib as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::BufferConfig;
    use std::fs;
    use std::path::Path;

    fn meminfo(fields: &[(&'static str, u64)]) -> MemInfo {
        fields.iter().copied().collect()
    }

    fn write_smaps(root: &Path, pid: u32, rss: &[u64]) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        let content: String = rss
            .iter()
            .map(|kb| format!("Size: {} kB\nRss: {} kB\nPss: 1 kB\n", kb * 2, kb))
            .collect();
        fs::write(dir.join("smaps"), content).unwrap();
    }

    #[test]
    fn test_snapshot_prefers_mem_available() {
        let info = meminfo(&[
            ("MemTotal", 1000),
            ("MemFree", 100),
            ("SwapFree", 50),
            ("MemAvailable", 600),
        ]);
        let snapshot = MemorySnapshot::from_meminfo(&info);
        assert_eq!(snapshot.total_kib, 1000);
        assert_eq!(snapshot.available_kib, 600);
    }

    #[test]
    fn test_snapshot_falls_back_to_free_plus_swap() {
        let info = meminfo(&[("MemTotal", 1000), ("MemFree", 100), ("SwapFree", 50)]);
        assert_eq!(MemorySnapshot::from_meminfo(&info).available_kib, 150);

        // A zero MemAvailable is treated as missing.
        let info = meminfo(&[
            ("MemTotal", 1000),
            ("MemFree", 100),
            ("SwapFree", 50),
            ("MemAvailable", 0),
        ]);
        assert_eq!(MemorySnapshot::from_meminfo(&info).available_kib, 150);
    }

    #[test]
    fn test_used_saturates_when_available_exceeds_total() {
        let snapshot = MemorySnapshot {
            total_kib: 100,
            available_kib: 250,
        };
        assert_eq!(snapshot.used_kib(), 0);
        assert_eq!(compute_used_fraction(&snapshot).unwrap(), 0.0);
    }

    #[test]
    fn test_used_fraction() {
        let snapshot = MemorySnapshot {
            total_kib: 1000,
            available_kib: 200,
        };
        assert!((compute_used_fraction(&snapshot).unwrap() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_zero_total_is_invalid_snapshot() {
        let snapshot = MemorySnapshot {
            total_kib: 0,
            available_kib: 0,
        };
        assert!(matches!(
            compute_used_fraction(&snapshot),
            Err(MemvizError::InvalidSnapshot)
        ));
        assert!(matches!(
            compute_fraction(10, 0),
            Err(MemvizError::InvalidSnapshot)
        ));
    }

    #[test]
    fn test_compute_total_from_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("meminfo"),
            "MemTotal: 1000 kB\nMemFree: 200 kB\nSwapFree: 0 kB\n",
        )
        .unwrap();
        let procfs = ProcFs::new(dir.path(), BufferConfig::default());

        let snapshot = MemoryAggregator::new(&procfs).compute_total().unwrap();
        assert_eq!(
            snapshot,
            MemorySnapshot {
                total_kib: 1000,
                available_kib: 200
            }
        );
        assert_eq!(snapshot.used_kib(), 800);
    }

    #[test]
    fn test_process_resident_sums_regions() {
        let dir = tempfile::tempdir().unwrap();
        write_smaps(dir.path(), 10, &[4, 8, 100]);
        let procfs = ProcFs::new(dir.path(), BufferConfig::default());

        assert_eq!(MemoryAggregator::new(&procfs).compute_process_resident(10), 112);
    }

    #[test]
    fn test_huge_rss_values_saturate() {
        let dir = tempfile::tempdir().unwrap();
        write_smaps(dir.path(), 5, &[u64::MAX / 2, u64::MAX / 2, 10]);
        write_smaps(dir.path(), 6, &[7]);
        let procfs = ProcFs::new(dir.path(), BufferConfig::default());
        let aggregator = MemoryAggregator::new(&procfs);

        assert_eq!(aggregator.compute_process_resident(5), u64::MAX);

        let group = aggregator.compute_group_resident("app", &[5, 6]);
        assert_eq!(group.samples[1].resident_kib, 7);
        assert_eq!(group.total_resident_kib, u64::MAX);
    }

    #[test]
    fn test_group_of_no_pids_is_empty() {
        let procfs = ProcFs::default();
        let group = MemoryAggregator::new(&procfs).compute_group_resident("ghost", &[]);
        assert_eq!(group.name, "ghost");
        assert!(group.is_empty());
        assert_eq!(group.total_resident_kib, 0);
    }

    #[test]
    fn test_vanished_pid_counts_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        write_smaps(dir.path(), 1, &[10, 20]);
        write_smaps(dir.path(), 3, &[5]);
        let procfs = ProcFs::new(dir.path(), BufferConfig::default());

        let group = MemoryAggregator::new(&procfs).compute_group_resident("app", &[3, 2, 1]);
        let pids: Vec<u32> = group.samples.iter().map(|s| s.pid).collect();
        assert_eq!(pids, vec![3, 2, 1]);
        assert_eq!(group.samples[1].resident_kib, 0);
        assert_eq!(group.total_resident_kib, 35);
    }
}

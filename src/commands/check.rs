//! System check command implementation.
//!
//! Verifies that every source the report depends on is reachable.

use anyhow::{bail, Result};
use std::io::Write;
use tracing::debug;

use crate::aggregate::{saturating_sum, MemoryAggregator};
use crate::config::{validate_effective_config, Config};
use crate::format::kib_to_display_string;
use crate::process::discover_pids;

/// Name looked up to exercise the discovery utility; not expected to be running.
const DISCOVERY_SAMPLE_NAME: &str = "memviz-discovery-check";

/// Validates system requirements and configuration.
///
/// Checks the memory map of `pid`, or of this process when `pid` is `None`.
pub fn command_check<W: Write>(out: &mut W, config: &Config, pid: Option<u32>) -> Result<()> {
    writeln!(out, "memviz - System Check")?;
    writeln!(out, "=====================")?;

    let procfs = config.proc_fs();
    let aggregator = MemoryAggregator::new(&procfs);
    let human = config.human_readable();
    let mut all_ok = true;

    writeln!(out, "\nChecking proc filesystem...")?;
    if procfs.root().is_dir() {
        writeln!(out, "   ✅ {} accessible", procfs.root().display())?;
    } else {
        writeln!(out, "   ❌ {} not found", procfs.root().display())?;
        all_ok = false;
    }

    writeln!(out, "\nChecking system memory info...")?;
    match aggregator.compute_total() {
        Ok(snapshot) if snapshot.total_kib > 0 => {
            writeln!(
                out,
                "   ✅ {} readable: total={}, available={}",
                procfs.meminfo_path().display(),
                kib_to_display_string(snapshot.total_kib, human),
                kib_to_display_string(snapshot.available_kib, human)
            )?;
        }
        Ok(_) => {
            writeln!(out, "   ❌ MemTotal missing or zero")?;
            all_ok = false;
        }
        Err(e) => {
            writeln!(out, "   ❌ {}", e)?;
            all_ok = false;
        }
    }

    let pid = pid.unwrap_or_else(std::process::id);
    writeln!(out, "\nChecking memory map of PID {}...", pid)?;
    match procfs.read_process_memory_map(pid) {
        Ok(regions) => {
            let rss = saturating_sum(regions.iter().copied());
            writeln!(
                out,
                "   ✅ {} regions, RSS={}",
                regions.len(),
                kib_to_display_string(rss, human)
            )?;
        }
        Err(e) => {
            writeln!(out, "   ❌ {}", e)?;
            all_ok = false;
        }
    }

    writeln!(out, "\nChecking process discovery...")?;
    match discover_pids(config.pidof_command(), DISCOVERY_SAMPLE_NAME) {
        Ok(pids) => {
            debug!("Discovery check returned {} pids", pids.len());
            writeln!(out, "   ✅ '{}' is usable", config.pidof_command())?;
        }
        Err(e) => {
            writeln!(out, "   ❌ {}", e)?;
            all_ok = false;
        }
    }

    writeln!(out, "\nChecking configuration...")?;
    match validate_effective_config(config) {
        Ok(()) => writeln!(out, "   ✅ Configuration is valid")?,
        Err(e) => {
            writeln!(out, "   ❌ Configuration invalid: {}", e)?;
            all_ok = false;
        }
    }

    writeln!(out, "\nSummary:")?;
    if all_ok {
        writeln!(out, "   ✅ All checks passed - system is ready")?;
        Ok(())
    } else {
        writeln!(out, "   ❌ Some checks failed - please review the output above")?;
        bail!("system check failed")
    }
}

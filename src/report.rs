//! Report assembly: turns a snapshot and an optional process group into the
//! lines printed on stdout.
//!
//! Line layout:
//!
//! ```text
//! Memory         [################    | 80%] 800 KiB/1000 KiB
//! firefox        [###                 ] 150 KiB/1000 KiB
//! 4242         [##                  ] 100 KiB/1000 KiB
//! ```

use tracing::{debug, warn};

use crate::aggregate::{
    compute_fraction, compute_used_fraction, MemoryAggregator, MemorySnapshot, ProcessGroupSample,
};
use crate::error::Result;
use crate::format::{format_percent, kib_to_display_string, UsageBar};
use crate::system::ProcFs;

/// Label of the system memory line.
pub const MEMORY_LABEL: &str = "Memory";

/// Bar length used when none is configured.
pub const DEFAULT_BAR_LENGTH: usize = 20;

/// Output options: the only two knobs the report exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub bar_length: usize,
    pub human_readable: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            bar_length: DEFAULT_BAR_LENGTH,
            human_readable: false,
        }
    }
}

impl DisplayOptions {
    fn size(&self, kib: u64) -> String {
        kib_to_display_string(kib, self.human_readable)
    }

    fn bar(&self, fraction: f64) -> UsageBar {
        UsageBar::from_fraction(fraction, self.bar_length)
    }
}

/// Composes the report lines. `group` is the sample of the requested program,
/// if any; an empty group renders as `<name> not found.`
pub fn render_report(
    snapshot: &MemorySnapshot,
    group: Option<&ProcessGroupSample>,
    options: &DisplayOptions,
) -> Vec<String> {
    let total = options.size(snapshot.total_kib);

    let used_fraction = compute_used_fraction(snapshot).unwrap_or_else(|e| {
        warn!("{}; reporting 0% usage", e);
        0.0
    });

    let mut lines = vec![format!(
        "{}         [{} | {}%] {}/{}",
        MEMORY_LABEL,
        options.bar(used_fraction),
        format_percent(used_fraction),
        options.size(snapshot.used_kib()),
        total
    )];

    let Some(group) = group else {
        return lines;
    };

    if group.is_empty() {
        lines.push(format!("{} not found.", group.name));
        return lines;
    }

    lines.push(format!(
        "{}        [{}] {}/{}",
        group.name,
        options.bar(resident_fraction(group.total_resident_kib, snapshot)),
        options.size(group.total_resident_kib),
        total
    ));

    for sample in &group.samples {
        lines.push(format!(
            "{}         [{}] {}/{}",
            sample.pid,
            options.bar(resident_fraction(sample.resident_kib, snapshot)),
            options.size(sample.resident_kib),
            total
        ));
    }

    lines
}

fn resident_fraction(resident_kib: u64, snapshot: &MemorySnapshot) -> f64 {
    compute_fraction(resident_kib, snapshot.total_kib).unwrap_or_else(|e| {
        debug!("{}; using 0 for resident fraction", e);
        0.0
    })
}

/// Reads everything the report needs from `source` and renders it.
///
/// `discover` maps a program name to its running pids; it is only called when
/// `program` is given. Fails only if the system memory source is unavailable.
pub fn generate_report<F>(
    source: &ProcFs,
    program: Option<&str>,
    discover: F,
    options: &DisplayOptions,
) -> Result<Vec<String>>
where
    F: FnOnce(&str) -> Vec<u32>,
{
    let aggregator = MemoryAggregator::new(source);
    let snapshot = aggregator.compute_total()?;

    let group = program.map(|name| {
        let pids = discover(name);
        debug!("Discovered {} processes for {}", pids.len(), name);
        aggregator.compute_group_resident(name, &pids)
    });

    Ok(render_report(&snapshot, group.as_ref(), options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ProcessMemorySample;

    fn snapshot() -> MemorySnapshot {
        MemorySnapshot {
            total_kib: 1000,
            available_kib: 200,
        }
    }

    fn group(name: &str, samples: &[(u32, u64)]) -> ProcessGroupSample {
        let samples: Vec<ProcessMemorySample> = samples
            .iter()
            .map(|&(pid, resident_kib)| ProcessMemorySample { pid, resident_kib })
            .collect();
        ProcessGroupSample {
            name: name.to_string(),
            total_resident_kib: samples.iter().map(|s| s.resident_kib).sum(),
            samples,
        }
    }

    #[test]
    fn test_system_line_only() {
        let lines = render_report(&snapshot(), None, &DisplayOptions::default());
        assert_eq!(
            lines,
            vec![format!(
                "Memory         [{}{} | 80%] 800 KiB/1000 KiB",
                "#".repeat(16),
                " ".repeat(4)
            )]
        );
    }

    #[test]
    fn test_not_found_is_a_single_line() {
        let lines = render_report(
            &snapshot(),
            Some(&group("nginx", &[])),
            &DisplayOptions::default(),
        );
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "nginx not found.");
    }

    #[test]
    fn test_group_and_pid_lines() {
        let options = DisplayOptions {
            bar_length: 10,
            human_readable: false,
        };
        let lines = render_report(
            &snapshot(),
            Some(&group("app", &[(42, 300), (7, 100)])),
            &options,
        );
        assert_eq!(
            lines[1..],
            [
                "app        [####      ] 400 KiB/1000 KiB".to_string(),
                "42         [###       ] 300 KiB/1000 KiB".to_string(),
                "7         [#         ] 100 KiB/1000 KiB".to_string(),
            ]
        );
    }

    #[test]
    fn test_human_readable_sizes() {
        let snapshot = MemorySnapshot {
            total_kib: 4 * 1024 * 1024,
            available_kib: 3 * 1024 * 1024,
        };
        let options = DisplayOptions {
            bar_length: 4,
            human_readable: true,
        };
        let lines = render_report(&snapshot, Some(&group("db", &[(1, 512)])), &options);
        assert_eq!(lines[0], "Memory         [#    | 25%] 1.00 GiB/4.00 GiB");
        assert_eq!(lines[1], "db        [    ] 512.00 KiB/4.00 GiB");
    }

    #[test]
    fn test_zero_total_reports_zero_usage() {
        let empty = MemorySnapshot {
            total_kib: 0,
            available_kib: 0,
        };
        let options = DisplayOptions {
            bar_length: 5,
            human_readable: false,
        };
        let lines = render_report(&empty, Some(&group("app", &[(1, 50)])), &options);
        assert_eq!(lines[0], "Memory         [      | 0%] 0 KiB/0 KiB");
        assert_eq!(lines[1], "app        [     ] 50 KiB/0 KiB");
    }

    #[test]
    fn test_over_full_process_bar_is_not_clamped() {
        let options = DisplayOptions {
            bar_length: 4,
            human_readable: false,
        };
        let lines = render_report(&snapshot(), Some(&group("hog", &[(9, 1500)])), &options);
        assert_eq!(lines[1], "hog        [######] 1500 KiB/1000 KiB");
    }
}

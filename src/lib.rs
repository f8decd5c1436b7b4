//! memviz: system and per-process memory usage as text bar charts.
//!
//! The report is a single pass over the proc filesystem:
//! [`system`] and [`process`] read the raw counters, [`aggregate`] turns them
//! into snapshots and resident totals, [`format`] renders bars and sizes, and
//! [`report`] assembles the output lines.

pub mod aggregate;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod process;
pub mod report;
pub mod system;

pub use aggregate::{MemoryAggregator, MemorySnapshot, ProcessGroupSample, ProcessMemorySample};
pub use error::MemvizError;
pub use format::UsageBar;
pub use report::{generate_report, render_report, DisplayOptions};
pub use system::ProcFs;

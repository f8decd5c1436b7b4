//! CLI arguments and subcommands for memviz.
//!
//! This module defines the command-line interface structure using the clap library,
//! including the report options, configuration flags, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "memviz",
    about = "Memory Visualizer -- Easily see how memory is being used!",
    long_about = "Memory Visualizer -- Easily see how memory is being used!\n\n\
                  Prints total system memory usage as a bar chart. When a program name \
                  is given, also prints the resident memory (RSS) of all its running \
                  instances, read from /proc/<pid>/smaps.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// The name of a program to check memory usage for. If omitted, shows total memory usage.
    /// Use `memviz -- check` for a program named like a subcommand.
    pub program: Option<String>,

    /// Display memory sizes in a more readable format (e.g., MiB)
    #[arg(short = 'H', long)]
    pub human_readable: bool,

    /// Set the length of the bar graph [default: 20]
    #[arg(short = 'l', long)]
    pub length: Option<usize>,

    /// Log level [default: warn]
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Root of the proc filesystem [default: /proc]
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Utility used to look up process ids by name [default: pidof]
    #[arg(long)]
    pub pidof_command: Option<String>,

    /// Override IO buffer size (KB) for /proc/meminfo
    #[arg(long)]
    pub io_buffer_kb: Option<usize>,

    /// Override buffer size (KB) for /proc/<pid>/smaps
    #[arg(long)]
    pub smaps_buffer_kb: Option<usize>,
}

impl Args {
    /// The program to report on; an empty name counts as none.
    pub fn program_name(&self) -> Option<&str> {
        self.program.as_deref().filter(|p| !p.is_empty())
    }
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Validate system requirements (proc filesystem, memory sources, process lookup)
    Check {
        /// Check the memory map of this pid instead of our own
        #[arg(long)]
        pid: Option<u32>,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["memviz"]);
        assert_eq!(args.program, None);
        assert!(!args.human_readable);
        assert_eq!(args.length, None);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_program_and_short_flags() {
        let args = Args::parse_from(["memviz", "-H", "-l", "40", "firefox"]);
        assert_eq!(args.program.as_deref(), Some("firefox"));
        assert!(args.human_readable);
        assert_eq!(args.length, Some(40));
    }

    #[test]
    fn test_long_flags() {
        let args = Args::parse_from(["memviz", "--human-readable", "--length", "5", "sshd"]);
        assert!(args.human_readable);
        assert_eq!(args.length, Some(5));
        assert_eq!(args.program.as_deref(), Some("sshd"));
    }

    #[test]
    fn test_empty_program_is_no_program() {
        let args = Args::parse_from(["memviz", ""]);
        assert_eq!(args.program.as_deref(), Some(""));
        assert_eq!(args.program_name(), None);

        let args = Args::parse_from(["memviz", "sshd"]);
        assert_eq!(args.program_name(), Some("sshd"));
    }

    #[test]
    fn test_double_dash_reports_program_named_like_subcommand() {
        let args = Args::parse_from(["memviz", "check"]);
        assert_eq!(args.command, Some(Commands::Check { pid: None }));
        assert_eq!(args.program_name(), None);

        let args = Args::parse_from(["memviz", "--", "check"]);
        assert!(args.command.is_none());
        assert_eq!(args.program_name(), Some("check"));
    }

    #[test]
    fn test_negative_length_is_rejected() {
        assert!(Args::try_parse_from(["memviz", "-l", "-3"]).is_err());
    }

    #[test]
    fn test_subcommands() {
        let args = Args::parse_from(["memviz", "check", "--pid", "1"]);
        assert_eq!(args.command, Some(Commands::Check { pid: Some(1) }));

        let args = Args::parse_from(["memviz", "config", "-o", "-", "--format", "toml"]);
        assert_eq!(
            args.command,
            Some(Commands::Config {
                output: Some(PathBuf::from("-")),
                format: ConfigFormat::Toml,
                commented: false,
            })
        );
    }
}

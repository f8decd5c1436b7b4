//! Config generation command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates a configuration file with default values.
///
/// An output path of `-` prints to stdout.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(default_file_name(format)));
    let content = generate_config(format, commented)?;

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

fn default_file_name(format: ConfigFormat) -> &'static str {
    match format {
        ConfigFormat::Yaml => "memviz.yaml",
        ConfigFormat::Json => "memviz.json",
        ConfigFormat::Toml => "memviz.toml",
    }
}

/// Renders the default config; YAML output can carry explanatory comments.
pub fn generate_config(format: ConfigFormat, commented: bool) -> Result<String> {
    let content = render_config(&Config::default(), format)?;
    if commented && format == ConfigFormat::Yaml {
        return Ok(add_config_comments(content));
    }
    Ok(content)
}

/// Adds comments to YAML configuration
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# memviz Configuration
# =====================
#
# Report
# ------
# bar_length: 20               # Length of the bar graph
# human_readable: false        # Show sizes as B/KiB/MiB/GiB/TiB
#
# Logging
# -------
# log_level: "warn"            # off, error, warn, info, debug, trace (written to stderr)
#
# Sources
# -------
# proc_root: "/proc"           # Root of the proc filesystem
# pidof_command: "pidof"       # Utility used to look up process ids by name
#
# Performance Tuning
# ------------------
# io_buffer_kb: 64             # Buffer size for /proc/meminfo
# smaps_buffer_kb: 256         # Buffer size for /proc/<pid>/smaps
"#;

    format!("{comments}\n{yaml}")
}

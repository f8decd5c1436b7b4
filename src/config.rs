//! Configuration loading, merging and validation.
//!
//! Precedence: CLI (if provided) > config file > default.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::{Args, ConfigFormat};
use crate::process::DEFAULT_PIDOF_COMMAND;
use crate::report::{DisplayOptions, DEFAULT_BAR_LENGTH};
use crate::system::{BufferConfig, ProcFs, DEFAULT_PROC_ROOT};

pub const DEFAULT_LOG_LEVEL: &str = "warn";

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Config files tried when no --config is given, in order.
pub const DEFAULT_CONFIG_PATHS: [&str; 8] = [
    "/etc/memviz/memviz.yaml",
    "/etc/memviz/memviz.yml",
    "/etc/memviz/memviz.json",
    "/etc/memviz/memviz.toml",
    "./memviz.yaml",
    "./memviz.yml",
    "./memviz.json",
    "./memviz.toml",
];

/// Effective configuration. Unset fields fall back to the defaults through
/// the accessor methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    // Report
    #[serde(alias = "length")]
    pub bar_length: Option<usize>,
    #[serde(alias = "human-readable")]
    pub human_readable: Option<bool>,

    // Logging
    pub log_level: Option<String>,

    // Sources
    pub proc_root: Option<PathBuf>,
    #[serde(alias = "pidof-command")]
    pub pidof_command: Option<String>,

    // Performance tuning
    pub io_buffer_kb: Option<usize>,
    pub smaps_buffer_kb: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        let buffers = BufferConfig::default();
        Self {
            bar_length: Some(DEFAULT_BAR_LENGTH),
            human_readable: Some(false),
            log_level: Some(DEFAULT_LOG_LEVEL.into()),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            pidof_command: Some(DEFAULT_PIDOF_COMMAND.into()),
            io_buffer_kb: Some(buffers.io_kb),
            smaps_buffer_kb: Some(buffers.smaps_kb),
        }
    }
}

impl Config {
    pub fn bar_length(&self) -> usize {
        self.bar_length.unwrap_or(DEFAULT_BAR_LENGTH)
    }

    pub fn human_readable(&self) -> bool {
        self.human_readable.unwrap_or(false)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn proc_root(&self) -> &Path {
        self.proc_root
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_PROC_ROOT))
    }

    pub fn pidof_command(&self) -> &str {
        self.pidof_command.as_deref().unwrap_or(DEFAULT_PIDOF_COMMAND)
    }

    pub fn buffer_config(&self) -> BufferConfig {
        let defaults = BufferConfig::default();
        BufferConfig {
            io_kb: self.io_buffer_kb.unwrap_or(defaults.io_kb),
            smaps_kb: self.smaps_buffer_kb.unwrap_or(defaults.smaps_kb),
        }
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            bar_length: self.bar_length(),
            human_readable: self.human_readable(),
        }
    }

    pub fn proc_fs(&self) -> ProcFs {
        ProcFs::new(self.proc_root(), self.buffer_config())
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<()> {
    let level = cfg.log_level();
    if !LOG_LEVELS.contains(&level) {
        bail!(
            "Invalid log_level '{}', expected one of: {}",
            level,
            LOG_LEVELS.join(", ")
        );
    }

    if cfg.proc_root().as_os_str().is_empty() {
        bail!("proc_root must not be empty");
    }

    if cfg.pidof_command().trim().is_empty() {
        bail!("pidof_command must not be empty");
    }

    let buffers = cfg.buffer_config();
    if buffers.io_kb == 0 || buffers.smaps_kb == 0 {
        bail!("io_buffer_kb and smaps_buffer_kb must be greater than 0");
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults
pub fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(length) = args.length {
        config.bar_length = Some(length);
    }
    // A bare flag can only switch human-readable output on.
    if args.human_readable {
        config.human_readable = Some(true);
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(cmd) = &args.pidof_command {
        config.pidof_command = Some(cmd.clone());
    }
    if args.io_buffer_kb.is_some() {
        config.io_buffer_kb = args.io_buffer_kb;
    }
    if args.smaps_buffer_kb.is_some() {
        config.smaps_buffer_kb = args.smaps_buffer_kb;
    }

    Ok(config)
}

/// Loads the given config file, or the first existing default location.
/// Returns the defaults when no file is found.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                bail!("Config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => match DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(p) => p.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?,
        // Default to YAML
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?,
    };

    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Serializes a config in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> Result<String> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

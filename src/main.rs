// memviz - version 0.1.0
// Memory usage bar charts from /proc with tracing logging
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};

use memviz::cli::{Args, Commands};
use memviz::commands::{command_check, command_config};
use memviz::config::{render_config, resolve_config, validate_effective_config, Config};
use memviz::process::pids_of_program;
use memviz::report::generate_report;

/// Initializes tracing logging subsystem with configured log level.
/// Logs go to stderr; stdout carries only the report.
fn setup_logging(config: &Config) {
    let level = match config.log_level() {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "info" => LevelFilter::INFO,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::WARN,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {}", level);
}

/// Reads memory statistics, renders the report and prints it.
fn run_report(program: Option<&str>, config: &Config) -> Result<()> {
    let procfs = config.proc_fs();
    let options = config.display_options();
    debug!("Report options: {:?}, proc root {}", options, procfs.root().display());

    let lines = generate_report(
        &procfs,
        program,
        |name| pids_of_program(config.pidof_command(), name),
        &options,
    )
    .context("Cannot read system memory statistics")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = resolve_config(&args)?;

    // Early exits for config inspection
    if args.check_config {
        validate_effective_config(&config).context("Configuration invalid")?;
        println!("✅ Configuration is valid");
        return Ok(());
    }
    if args.show_config {
        println!("{}", render_config(&config, args.config_format)?);
        return Ok(());
    }

    validate_effective_config(&config).context("Configuration invalid")?;

    setup_logging(&config);

    if let Some(command) = &args.command {
        return match command {
            Commands::Check { pid } => command_check(&mut io::stdout().lock(), &config, *pid),
            Commands::Config {
                output,
                format,
                commented,
            } => command_config(output.clone(), *format, *commented),
        };
    }

    run_report(args.program_name(), &config)
}

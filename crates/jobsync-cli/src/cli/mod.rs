use crate::logging::format_millis;
use crate::status_sink::StatusSink;
use anyhow::Context;
use clap::Parser;
use jobsync_core::config::{AppConfig, RecorderOptions, default_config_path};
use jobsync_core::replay::{ReplayPlan, ReplayReport, run_plan};
use jobsync_core::{JobProgressRecorder, JobState, JobStatus, ProgressError};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

mod args;
mod config_cmd;
mod run_cmd;
#[cfg(test)]
mod tests;

use args::*;

use config_cmd::handle_config;
use run_cmd::handle_run;

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    info!(command = command_label(&cli.command), "Running command");
    match cli.command {
        Commands::Run(args) => handle_run(args),
        Commands::Config(args) => handle_config(args),
    }
}

fn command_label(command: &Commands) -> &'static str {
    match command {
        Commands::Run(_) => "run",
        Commands::Config(args) => match args.command {
            ConfigCommands::Init(_) => "config.init",
            ConfigCommands::Show(_) => "config.show",
        },
    }
}

fn resolve_config_path(path: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => default_config_path(),
    }
}

use super::*;
#[derive(Parser)]
#[command(author, version, about)]
pub(super) struct Cli {
    #[command(subcommand)]
    pub(super) command: Commands,
}

#[derive(clap::Subcommand)]
pub(super) enum Commands {
    #[command(about = "Replay an operation plan and report the job status")]
    Run(RunArgs),
    #[command(about = "Manage config")]
    Config(ConfigArgs),
}

#[derive(Parser)]
pub(super) struct RunArgs {
    #[arg(long, help = "JSON plan of operations and their outcomes")]
    pub(super) plan: PathBuf,
    #[arg(long, help = "Worker threads for file operations (overrides config)")]
    pub(super) workers: Option<usize>,
    #[arg(long, help = "Write each published status to this file (overrides config)")]
    pub(super) status: Option<PathBuf>,
    #[arg(long, help = "Stop dispatching after this many errors (overrides config)")]
    pub(super) strict_max_errors: Option<usize>,
    #[arg(long)]
    pub(super) config: Option<PathBuf>,
}

#[derive(Parser)]
pub(super) struct ConfigArgs {
    #[command(subcommand)]
    pub(super) command: ConfigCommands,
}

#[derive(clap::Subcommand)]
pub(super) enum ConfigCommands {
    #[command(about = "Write a config file with defaults and the given overrides")]
    Init(InitArgs),
    #[command(about = "Print the effective config")]
    Show(ShowArgs),
}

#[derive(Parser)]
pub(super) struct InitArgs {
    #[arg(long)]
    pub(super) workers: Option<usize>,
    #[arg(long)]
    pub(super) status: Option<PathBuf>,
    #[arg(long)]
    pub(super) max_error_messages: Option<usize>,
    #[arg(long)]
    pub(super) strict_max_errors: Option<usize>,
    #[arg(long)]
    pub(super) checkpoint_interval_ms: Option<u64>,
    #[arg(long)]
    pub(super) config: Option<PathBuf>,
}

#[derive(Parser)]
pub(super) struct ShowArgs {
    #[arg(long)]
    pub(super) config: Option<PathBuf>,
}

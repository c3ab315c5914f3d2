use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cwagent-confgen",
    version,
    about = "Generate monitoring agent configs from baselines and control files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process a notification batch against a local object store.
    Run(RunOpts),
    /// Merge one control file into one baseline and print the result.
    Merge(MergeOpts),
    Config(ConfigOpts),
    Version,
}

#[derive(clap::Args)]
pub struct RunOpts {
    #[arg(short, long, env = "CONFGEN_CONFIG")]
    pub config: Option<PathBuf>,
    /// Notification batch (JSON event records).
    #[arg(short, long)]
    pub events: PathBuf,
    /// Root directory of the local object store.
    #[arg(short, long, env = "CONFGEN_STORE_ROOT")]
    pub root: PathBuf,
}

#[derive(clap::Args)]
pub struct MergeOpts {
    #[arg(short, long)]
    pub baseline: PathBuf,
    #[arg(long)]
    pub os: crate::control::OsFamily,
    #[arg(long)]
    pub control: PathBuf,
    /// Create `metrics.metrics_collected` when a PROCESS directive needs it.
    #[arg(long)]
    pub create_missing: bool,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    #[arg(short, long, env = "CONFGEN_CONFIG")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    Validate,
}

mod platform;

use std::path::PathBuf;

use clap::Parser;

/// Extract page snippets for the configured monitors.
#[derive(Debug, Parser)]
#[command(name = "snippet-monitor", version)]
pub struct Args {
    /// RON file with `monitors` and optional `engine` settings.
    pub config: PathBuf,

    /// Re-run every N seconds instead of once.
    #[arg(long, value_name = "SECS")]
    pub watch: Option<u64>,

    /// Directory holding the last result of every monitor.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub state_dir: PathBuf,

    /// Append per-invocation diagnostics to this file instead of the log.
    #[arg(long, value_name = "FILE")]
    pub diagnostics: Option<PathBuf>,

    /// Also write the application log to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log debug output.
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> anyhow::Result<()> {
    platform::run_app(Args::parse())
}

//! CLI argument parsing module for pkgscout

use clap::Parser;
use std::path::PathBuf;

/// Package version tool server
#[derive(Parser, Debug, Clone)]
#[command(name = "pkgscout", version, about = "Tool server for checking package versions")]
pub struct CliArgs {
    /// Registry cache TTL in hours
    #[arg(long, default_value_t = 12)]
    pub ttl_hours: u64,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Directory for rotated log files (default: ~/.pkgscout/logs)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Mirror logs to stderr in addition to the log file
    #[arg(long)]
    pub log_stderr: bool,
}

impl CliArgs {
    /// Resolves the log directory, falling back to the current
    /// directory when no home directory is available.
    pub fn resolved_log_dir(&self) -> PathBuf {
        if let Some(dir) = &self.log_dir {
            return dir.clone();
        }
        match dirs::home_dir() {
            Some(home) => home.join(".pkgscout").join("logs"),
            None => PathBuf::from("."),
        }
    }
}

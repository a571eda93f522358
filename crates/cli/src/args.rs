//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Bulk-import a CSV backlog into a GitHub repository as labelled issues.
#[derive(Parser, Debug)]
#[command(name = "backlog-import", author, version, about, long_about = None)]
pub struct Cli {
    /// Target repository as OWNER/REPO
    #[arg(long, value_name = "OWNER/REPO")]
    pub repo: String,

    /// Backlog CSV file
    #[arg(long, value_name = "PATH")]
    pub csv: PathBuf,

    /// GitHub token (not needed with --dry-run)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = github::DEFAULT_API_URL)]
    pub api_url: String,

    /// TOML catalog replacing the built-in epics, labels and sprints
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Pause after every N issues
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub pace_every: usize,

    /// Length of each pause in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 2000)]
    pub pace_delay_ms: u64,

    /// Run against an in-memory tracker instead of GitHub
    #[arg(long)]
    pub dry_run: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// OTLP collector endpoint for trace export
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

/// Format of log lines written to stderr.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event, with the current span attached.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_the_documented_schedule() {
        let cli = Cli::try_parse_from([
            "backlog-import",
            "--repo",
            "acme/shop",
            "--csv",
            "backlog.csv",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.pace_every, 10);
        assert_eq!(cli.pace_delay_ms, 2000);
        assert_eq!(cli.log_format, LogFormat::Text);
        assert!(cli.dry_run);
    }

    #[test]
    fn repo_and_csv_are_required() {
        assert!(Cli::try_parse_from(["backlog-import", "--csv", "b.csv"]).is_err());
        assert!(Cli::try_parse_from(["backlog-import", "--repo", "a/b"]).is_err());
    }

    #[test]
    fn verbosity_counts_repeats() {
        let cli = Cli::try_parse_from([
            "backlog-import",
            "--repo",
            "a/b",
            "--csv",
            "b.csv",
            "-vv",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}

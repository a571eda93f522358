//! Resolves parsed arguments into validated run settings.
//!
//! Every check here is fatal: a problem found at this stage stops the run
//! before any remote object is touched.

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use backlog::{Catalog, PacingPolicy, RepositoryId};

use crate::args::Cli;

/// Where issues are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerTarget {
    /// The GitHub REST API.
    Github {
        /// REST API base URL.
        api_url: String,
        /// Credential sent as a bearer token. Never empty.
        token: String,
    },
    /// An in-memory tracker; nothing leaves the process.
    DryRun,
}

/// Everything a run needs, checked up front.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Repository issues are created in.
    pub repository: RepositoryId,
    /// Backlog CSV file; known to exist.
    pub csv: PathBuf,
    /// Validated taxonomy catalog, built-in unless `--catalog` was given.
    pub catalog: Catalog,
    /// Pause schedule for issue creation.
    pub pacing: PacingPolicy,
    /// Where issues are sent.
    pub target: TrackerTarget,
}

impl Settings {
    /// Resolves and checks `cli`. No network I/O.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let repository = RepositoryId::parse(&cli.repo)
            .ok_or_else(|| anyhow!("repository must be OWNER/REPO, got '{}'", cli.repo))?;

        let target = if cli.dry_run {
            TrackerTarget::DryRun
        } else {
            let token = cli
                .token
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| {
                    anyhow!("GitHub token required: pass --token or set GITHUB_TOKEN")
                })?;
            TrackerTarget::Github {
                api_url: cli.api_url.clone(),
                token: token.to_string(),
            }
        };

        if !cli.csv.is_file() {
            bail!("CSV file not found: {}", cli.csv.display());
        }

        let catalog = match &cli.catalog {
            Some(path) => load_catalog(path)?,
            None => Catalog::builtin(),
        };

        let every = NonZeroUsize::new(cli.pace_every)
            .ok_or_else(|| anyhow!("--pace-every must be at least 1"))?;

        Ok(Self {
            repository,
            csv: cli.csv.clone(),
            catalog,
            pacing: PacingPolicy {
                every,
                delay: Duration::from_millis(cli.pace_delay_ms),
            },
            target,
        })
    }
}

/// Reads and validates a TOML catalog file.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("cannot read catalog {}", path.display()))?;
    Catalog::from_toml_str(&source).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn cli(csv: &Path, extra: &[&str]) -> Cli {
        let mut argv = vec![
            "backlog-import".to_string(),
            "--repo".into(),
            "acme/shop".into(),
            "--csv".into(),
            csv.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Cli::try_parse_from(argv).unwrap()
    }

    fn csv_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Epic ID,PBI ID,PBI Title,Story Points,Description,Sprint").unwrap();
        file
    }

    #[test]
    fn dry_run_needs_no_token() {
        let csv = csv_file();
        let mut args = cli(csv.path(), &["--dry-run"]);
        args.token = None;

        let settings = Settings::from_cli(&args).unwrap();

        assert_eq!(settings.target, TrackerTarget::DryRun);
        assert_eq!(settings.pacing, PacingPolicy::default());
        assert_eq!(settings.catalog, Catalog::builtin());
    }

    #[test]
    fn live_run_requires_a_token() {
        let csv = csv_file();
        let mut args = cli(csv.path(), &[]);
        args.token = Some("   ".into());

        let err = Settings::from_cli(&args).unwrap_err();

        assert!(err.to_string().contains("token required"));
    }

    #[test]
    fn live_run_carries_the_token_and_api_url() {
        let csv = csv_file();
        let mut args = cli(csv.path(), &["--api-url", "https://ghe.example.com/api/v3"]);
        args.token = Some("ghp_abc".into());

        let settings = Settings::from_cli(&args).unwrap();

        assert_eq!(
            settings.target,
            TrackerTarget::Github {
                api_url: "https://ghe.example.com/api/v3".into(),
                token: "ghp_abc".into(),
            }
        );
    }

    #[test]
    fn missing_csv_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let args = cli(&dir.path().join("nope.csv"), &["--dry-run"]);

        let err = Settings::from_cli(&args).unwrap_err();

        assert!(err.to_string().contains("CSV file not found"));
    }

    #[test]
    fn malformed_repository_is_fatal() {
        let csv = csv_file();
        let mut args = cli(csv.path(), &["--dry-run"]);
        args.repo = "just-a-name".into();

        assert!(Settings::from_cli(&args).is_err());
    }

    #[test]
    fn pacing_comes_from_flags() {
        let csv = csv_file();
        let args = cli(
            csv.path(),
            &["--dry-run", "--pace-every", "25", "--pace-delay-ms", "500"],
        );

        let settings = Settings::from_cli(&args).unwrap();

        assert_eq!(settings.pacing.every.get(), 25);
        assert_eq!(settings.pacing.delay, Duration::from_millis(500));
    }

    #[test]
    fn zero_pace_interval_is_rejected() {
        let csv = csv_file();
        let args = cli(csv.path(), &["--dry-run", "--pace-every", "0"]);

        assert!(Settings::from_cli(&args).is_err());
    }

    #[test]
    fn catalog_file_replaces_the_builtin_tables() {
        let csv = csv_file();
        let mut catalog = tempfile::NamedTempFile::new().unwrap();
        write!(
            catalog,
            r##"
[[epics]]
key = "Epic A"
name = "Epic A: Onboarding"
color = "#0E8A16"
description = "Sign-up flows"

[[sprints]]
key = "Sprint 1"
title = "Sprint 1: Foundations"
description = "Week 1"
"##
        )
        .unwrap();
        let path = catalog.path().display().to_string();
        let args = cli(csv.path(), &["--dry-run", "--catalog", &path]);

        let settings = Settings::from_cli(&args).unwrap();

        assert_eq!(settings.catalog.epics.len(), 1);
        assert_eq!(settings.catalog.epics[0].key.as_str(), "Epic A");
        assert_eq!(settings.catalog.sprints.len(), 1);
    }

    #[test]
    fn invalid_catalog_file_is_fatal() {
        let csv = csv_file();
        let mut catalog = tempfile::NamedTempFile::new().unwrap();
        write!(catalog, "epics = []\n").unwrap();
        let path = catalog.path().display().to_string();
        let args = cli(csv.path(), &["--dry-run", "--catalog", &path]);

        assert!(Settings::from_cli(&args).is_err());
    }
}

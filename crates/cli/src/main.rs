//! `backlog-import` entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: command-line flags and environment, resolved
//!    into [`config::Settings`]. Any problem here is fatal.
//! 2. **Wire observability**: `tracing-subscriber` with a text or JSON layer
//!    on stderr and an optional OTLP exporter. The root span carries the
//!    run's [`ImportRunId`].
//! 3. **Construct infrastructure**: a [`GithubClient`] or, for `--dry-run`,
//!    an [`InMemoryTracker`].
//! 4. **Run**: reconcile the catalog, create one issue per CSV row, print the
//!    report to stdout.
//!
//! Exit status is 1 for setup failures only. Records that fail to import are
//! reported and counted but do not change the exit status.

use std::process::ExitCode;

use anyhow::{Context, Result};
use backlog::{
    reconcile_catalog, BatchExecutor, ImportRunId, InMemoryTracker, IssueTracker, RecordOutcome,
    RunOutcome, RunReport, TaxonomySummary, TokioPacer, WorkItemRecord,
};
use clap::Parser;
use github::{GithubClient, GithubConfig};
use tracing::{info, info_span, warn, Instrument};

mod args;
mod config;
mod loader;
mod observability;

use args::Cli;
use config::{Settings, TrackerTarget};

const USER_AGENT: &str = concat!("backlog-import/", env!("CARGO_PKG_VERSION"));

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _telemetry =
        match observability::init(cli.verbose, cli.log_format, cli.otlp_endpoint.as_deref()) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Error: {e:#}");
                return ExitCode::FAILURE;
            }
        };

    let run_id = ImportRunId::new_random();
    let span = info_span!("import", %run_id, repository = %cli.repo);

    match run(&cli).instrument(span).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::from_cli(cli)?;
    let records = loader::load_records(&settings.csv)?;
    info!(records = records.len(), csv = %settings.csv.display(), "Loaded backlog");

    println!("Repository: {}", settings.repository);
    println!("CSV File: {}", settings.csv.display());

    let report = match &settings.target {
        TrackerTarget::Github { api_url, token } => {
            let client = GithubClient::new(GithubConfig {
                api_url: api_url.clone(),
                token: token.clone(),
                repository: settings.repository.clone(),
                user_agent: USER_AGENT.to_string(),
            })?;
            let repository = client
                .repository()
                .await
                .with_context(|| format!("cannot access repository {}", settings.repository))?;
            import(&client, &settings, &records)
                .await
                .with_repository_url(repository.html_url)
        }
        TrackerTarget::DryRun => {
            println!("Dry run: nothing will be sent to GitHub");
            import(&InMemoryTracker::new(), &settings, &records).await
        }
    };

    println!("\n{report}");
    Ok(())
}

/// Reconciles the catalog, then creates one issue per record.
async fn import<T>(tracker: &T, settings: &Settings, records: &[WorkItemRecord]) -> RunReport
where
    T: IssueTracker + ?Sized,
{
    let taxonomy = reconcile_catalog(tracker, &settings.catalog).await;
    println!("{}", TaxonomySummary(&taxonomy));
    if taxonomy.resolved.is_empty() && !records.is_empty() {
        warn!("No catalog entry resolved; every record will fail");
    }

    println!("Creating {} issues...", records.len());
    let outcome = BatchExecutor::new(tracker, TokioPacer, settings.pacing)
        .run(records, &taxonomy.resolved)
        .await;
    print_results(&outcome);

    RunReport::new(&outcome)
}

fn print_results(outcome: &RunOutcome) {
    for result in &outcome.results {
        let prefix = format!("[{}/{}]", result.position, outcome.total);
        match &result.outcome {
            RecordOutcome::Created(issue) => {
                println!("{prefix} Created #{}: {}", issue.number, result.item_id);
            }
            RecordOutcome::Failed(reason) => println!(
                "{prefix} Failed {} (line {}): {reason}",
                result.item_id, result.source_line
            ),
        }
    }
}

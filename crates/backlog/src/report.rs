//! Terminal summaries of a run. Purely presentational.

use std::fmt;

use crate::{RunOutcome, TaxonomyReport};

/// Final summary of an import: created, failed and total counts.
///
/// Failed records are named in the log where they happen and are not
/// re-listed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Issues created.
    pub created: usize,
    /// Records that failed.
    pub failed: usize,
    /// Records attempted.
    pub total: usize,
    /// Browser URL of the repository, if known.
    pub repository_url: Option<String>,
}

impl RunReport {
    /// Copies the counters of `outcome`.
    pub fn new(outcome: &RunOutcome) -> Self {
        Self {
            created: outcome.created,
            failed: outcome.failed,
            total: outcome.total,
            repository_url: None,
        }
    }

    /// Adds the repository URL so the summary can point at its issue list.
    #[must_use]
    pub fn with_repository_url(mut self, url: impl Into<String>) -> Self {
        self.repository_url = Some(url.into());
        self
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Import complete!")?;
        writeln!(f, "  Created: {}", self.created)?;
        writeln!(f, "  Failed: {}", self.failed)?;
        write!(f, "  Total: {}", self.total)?;
        if let Some(url) = &self.repository_url {
            write!(f, "\n\nCheck your repository:\n   {}/issues", url.trim_end_matches('/'))?;
        }
        Ok(())
    }
}

/// One-line summary of a taxonomy pass.
pub struct TaxonomySummary<'a>(pub &'a TaxonomyReport);

impl fmt::Display for TaxonomySummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        write!(
            f,
            "Taxonomy: {} created, {} already present, {} failed",
            report.created,
            report.existing,
            report.failures.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RecordOutcome, RecordResult};

    #[test]
    fn renders_counters_verbatim() {
        let outcome: RunOutcome = (1..=3)
            .map(|i| RecordResult {
                position: i,
                source_line: i as u64 + 1,
                item_id: format!("PBI-{i}"),
                outcome: RecordOutcome::Failed("x".into()),
            })
            .collect();

        let text = RunReport::new(&outcome).to_string();

        assert_eq!(text, "Import complete!\n  Created: 0\n  Failed: 3\n  Total: 3");
    }

    #[test]
    fn points_at_the_issue_list_when_the_repository_is_known() {
        let text = RunReport::new(&RunOutcome::default())
            .with_repository_url("https://github.com/acme/shop/")
            .to_string();

        assert!(text.ends_with("https://github.com/acme/shop/issues"));
    }

    #[test]
    fn taxonomy_summary_counts_failures() {
        let report = TaxonomyReport {
            created: 2,
            existing: 5,
            ..TaxonomyReport::default()
        };

        assert_eq!(
            TaxonomySummary(&report).to_string(),
            "Taxonomy: 2 created, 5 already present, 0 failed"
        );
    }
}

//! Batch execution: one issue per record, strictly in input order, with a
//! fixed pause every few records to stay under the remote's request-rate
//! ceiling.
//!
//! Every record is attempted exactly once. A record that cannot be built or
//! whose creation fails is counted and logged; the batch carries on.

use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, info_span, warn, Instrument};

use crate::{
    build_issue_request, ImportError, IssueTracker, RecordOutcome, RecordResult,
    ResolvedTaxonomy, RunOutcome, WorkItemRecord,
};

/// How often, and for how long, the engine pauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    /// Pause after every `every`-th record (1-indexed).
    pub every: NonZeroUsize,
    /// Length of each pause.
    pub delay: Duration,
}

impl PacingPolicy {
    /// Pause after every 10th record.
    pub const DEFAULT_EVERY: NonZeroUsize = match NonZeroUsize::new(10) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Pause for two seconds.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

    /// Returns `true` if the engine pauses after the record at 1-based `position`.
    pub fn pauses_after(&self, position: usize) -> bool {
        position % self.every.get() == 0
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            every: Self::DEFAULT_EVERY,
            delay: Self::DEFAULT_DELAY,
        }
    }
}

/// Suspends the batch between groups of records.
///
/// The pause is unconditional; the remote's throttling feedback is not
/// consulted.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Pauses after the record at 1-based `position`.
    async fn pause(&self, position: usize, delay: Duration);
}

/// [`Pacer`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, _position: usize, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Drives issue creation for a sequence of records.
pub struct BatchExecutor<'a, T: ?Sized, P> {
    tracker: &'a T,
    pacer: P,
    policy: PacingPolicy,
}

impl<'a, T, P> BatchExecutor<'a, T, P>
where
    T: IssueTracker + ?Sized,
    P: Pacer,
{
    /// Creates an executor submitting to `tracker` and pausing through `pacer`.
    pub fn new(tracker: &'a T, pacer: P, policy: PacingPolicy) -> Self {
        Self {
            tracker,
            pacer,
            policy,
        }
    }

    /// Creates one issue per record and returns the accumulated outcome.
    ///
    /// Records are processed one at a time in slice order. After every
    /// `policy.every`-th record the pacer is invoked, so a batch of `N`
    /// records pauses exactly `N / every` times.
    pub async fn run(
        &self,
        records: &[WorkItemRecord],
        resolved: &ResolvedTaxonomy,
    ) -> RunOutcome {
        let total = records.len();
        let mut outcome = RunOutcome::default();

        for (index, record) in records.iter().enumerate() {
            let position = index + 1;
            let span = info_span!(
                "record",
                position,
                total,
                line = record.source_line,
                item = %record.item_id
            );
            let result = self.process(record, resolved).instrument(span).await;

            outcome.record(RecordResult {
                position,
                source_line: record.source_line,
                item_id: record.item_id.clone(),
                outcome: result,
            });

            if self.policy.pauses_after(position) {
                info!(
                    position,
                    total,
                    delay_ms = self.policy.delay.as_millis() as u64,
                    "Pausing for rate limit"
                );
                self.pacer.pause(position, self.policy.delay).await;
            }
        }
        outcome
    }

    async fn process(
        &self,
        record: &WorkItemRecord,
        resolved: &ResolvedTaxonomy,
    ) -> RecordOutcome {
        let request = match build_issue_request(record, resolved) {
            Ok(request) => request,
            Err(error) => {
                warn!(error = %error, "Skipping record");
                return RecordOutcome::Failed(error.to_string());
            }
        };

        match self.tracker.create_issue(&request).await {
            Ok(issue) => {
                info!(
                    number = %issue.number,
                    url = %issue.html_url,
                    title = %request.title,
                    "Created"
                );
                RecordOutcome::Created(issue)
            }
            Err(error) => {
                let error = ImportError::from(error);
                warn!(error = %error, title = %request.title, "Could not create issue");
                RecordOutcome::Failed(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::tracker::MockIssueTracker;
    use crate::{
        CatalogKey, Issue, IssueNumber, RemoteId, ResolvedIdentity, StoryPoints, TaxonomyRole,
        TrackerError,
    };

    /// Records the positions it was asked to pause after.
    #[derive(Clone, Default)]
    struct RecordingPacer {
        pauses: Arc<Mutex<Vec<usize>>>,
    }

    #[async_trait]
    impl Pacer for RecordingPacer {
        async fn pause(&self, position: usize, _delay: Duration) {
            self.pauses.lock().unwrap().push(position);
        }
    }

    fn resolved() -> ResolvedTaxonomy {
        let mut resolved = ResolvedTaxonomy::new();
        resolved.insert(ResolvedIdentity {
            key: CatalogKey::new("Epic 1").unwrap(),
            role: TaxonomyRole::Epic,
            remote_id: RemoteId::new(1),
            remote_name: "Epic 1: Product Domain".into(),
        });
        resolved
    }

    fn records(n: usize) -> Vec<WorkItemRecord> {
        (1..=n)
            .map(|i| WorkItemRecord {
                epic_key: "Epic 1".into(),
                item_id: format!("PBI-1.{i}"),
                title: format!("Item {i}"),
                story_points: StoryPoints::new(3),
                description: String::new(),
                sprint_key: String::new(),
                source_line: i as u64 + 1,
            })
            .collect()
    }

    fn accepting_tracker() -> MockIssueTracker {
        let mut tracker = MockIssueTracker::new();
        tracker.expect_create_issue().returning(|_| {
            Ok(Issue {
                number: IssueNumber::new(1),
                html_url: "https://example.test/issues/1".into(),
            })
        });
        tracker
    }

    #[test]
    fn default_policy_pauses_every_ten_records_for_two_seconds() {
        let policy = PacingPolicy::default();
        assert_eq!(policy.every.get(), 10);
        assert_eq!(policy.delay, Duration::from_secs(2));
        assert!(!policy.pauses_after(9));
        assert!(policy.pauses_after(10));
        assert!(policy.pauses_after(20));
    }

    #[tokio::test]
    async fn pauses_floor_n_over_ten_times() {
        let cases = [
            (0, vec![]),
            (9, vec![]),
            (10, vec![10]),
            (25, vec![10, 20]),
            (30, vec![10, 20, 30]),
        ];
        for (n, expected) in cases {
            let tracker = accepting_tracker();
            let pacer = RecordingPacer::default();
            let executor = BatchExecutor::new(&tracker, pacer.clone(), PacingPolicy::default());

            let outcome = executor.run(&records(n), &resolved()).await;

            assert_eq!(outcome.total, n);
            assert_eq!(*pacer.pauses.lock().unwrap(), expected, "batch of {n}");
        }
    }

    #[tokio::test]
    async fn remote_failures_do_not_stop_the_batch() {
        let mut tracker = MockIssueTracker::new();
        tracker.expect_create_issue().returning(|request| {
            if request.title.starts_with("[PBI-1.2]") {
                Err(TrackerError::Api {
                    status: 500,
                    message: "boom".into(),
                })
            } else {
                Ok(Issue {
                    number: IssueNumber::new(9),
                    html_url: "https://example.test/issues/9".into(),
                })
            }
        });
        let executor =
            BatchExecutor::new(&tracker, RecordingPacer::default(), PacingPolicy::default());

        let outcome = executor.run(&records(3), &resolved()).await;

        assert_eq!((outcome.created, outcome.failed, outcome.total), (2, 1, 3));
        let failed: Vec<_> = outcome.failures().map(|r| r.item_id.as_str()).collect();
        assert_eq!(failed, vec!["PBI-1.2"]);
        assert_eq!(outcome.results[1].source_line, 3);
    }

    #[tokio::test]
    async fn unbuildable_records_never_reach_the_remote() {
        let mut tracker = MockIssueTracker::new();
        tracker.expect_create_issue().times(1).returning(|_| {
            Ok(Issue {
                number: IssueNumber::new(1),
                html_url: "https://example.test/issues/1".into(),
            })
        });
        let mut input = records(2);
        input[0].epic_key = "Epic 404".into();
        let executor =
            BatchExecutor::new(&tracker, RecordingPacer::default(), PacingPolicy::default());

        let outcome = executor.run(&input, &resolved()).await;

        assert_eq!((outcome.created, outcome.failed), (1, 1));
        assert!(matches!(
            &outcome.results[0].outcome,
            RecordOutcome::Failed(reason) if reason.starts_with("configuration error")
        ));
    }
}

//! The issue tracker port.
//!
//! Infrastructure crates implement [`IssueTracker`] for a concrete remote
//! (see the `github` crate). The domain only ever talks to this trait, so the
//! reconciler and the batch engine are exercised against
//! [`crate::InMemoryTracker`] or a mock in tests.

use async_trait::async_trait;

use crate::{Issue, IssueRequest, Label, Milestone, NewLabel, NewMilestone, TrackerError};

/// Remote operations the importer needs.
///
/// Every call is a single request/response exchange. Implementations must
/// report "already exists" on create as [`TrackerError::Conflict`] and a
/// missing object on lookup as [`TrackerError::NotFound`]; reconciliation
/// depends on both.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Creates a label.
    async fn create_label(&self, label: &NewLabel) -> Result<Label, TrackerError>;

    /// Fetches a label by exact name.
    async fn get_label(&self, name: &str) -> Result<Label, TrackerError>;

    /// Creates a milestone.
    async fn create_milestone(&self, milestone: &NewMilestone) -> Result<Milestone, TrackerError>;

    /// Lists every open milestone.
    async fn list_open_milestones(&self) -> Result<Vec<Milestone>, TrackerError>;

    /// Creates an issue. Never deduplicated.
    async fn create_issue(&self, request: &IssueRequest) -> Result<Issue, TrackerError>;
}

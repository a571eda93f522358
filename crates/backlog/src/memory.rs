//! In-memory [`IssueTracker`] backend.
//!
//! Suitable for:
//! - `--dry-run` imports that validate the input and catalog without touching
//!   a remote
//! - Tests of reconciliation and batch execution
//!
//! Uniqueness follows the remote's rules: label names are unique ignoring
//! case, milestone titles are unique across open *and* closed milestones, and
//! issues are never deduplicated.
//!
//! # Thread Safety
//!
//! State lives behind a `tokio::sync::Mutex`; every operation takes the lock
//! for its whole duration.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    Issue, IssueNumber, IssueRequest, IssueTracker, Label, LabelColor, LabelId, Milestone,
    MilestoneNumber, MilestoneState, NewLabel, NewMilestone, TrackerError,
};

/// Number of calls made to each tracker operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `create_label` calls.
    pub create_label: usize,
    /// `get_label` calls.
    pub get_label: usize,
    /// `create_milestone` calls.
    pub create_milestone: usize,
    /// `list_open_milestones` calls.
    pub list_open_milestones: usize,
    /// `create_issue` calls.
    pub create_issue: usize,
}

#[derive(Debug, Default)]
struct TrackerState {
    labels: Vec<Label>,
    milestones: Vec<Milestone>,
    issues: Vec<(Issue, IssueRequest)>,
    next_label_id: u64,
    next_milestone: u64,
    next_issue: u64,
    calls: CallCounts,
    failing_labels: HashSet<String>,
    failing_milestones: HashSet<String>,
    failing_issues: HashSet<String>,
}

impl TrackerState {
    fn find_label(&self, name: &str) -> Option<&Label> {
        let wanted = name.to_lowercase();
        self.labels.iter().find(|l| l.name.to_lowercase() == wanted)
    }

    fn insert_label(&mut self, name: &str, color: &LabelColor, description: &str) -> Label {
        self.next_label_id += 1;
        let label = Label {
            id: LabelId::new(self.next_label_id),
            name: name.to_string(),
            color: color.as_str().to_string(),
            description: Some(description.to_string()).filter(|d| !d.is_empty()),
        };
        self.labels.push(label.clone());
        label
    }

    fn insert_milestone(&mut self, title: &str, description: &str, state: MilestoneState) -> Milestone {
        self.next_milestone += 1;
        let milestone = Milestone {
            number: MilestoneNumber::new(self.next_milestone),
            title: title.to_string(),
            description: Some(description.to_string()).filter(|d| !d.is_empty()),
            state,
        };
        self.milestones.push(milestone.clone());
        milestone
    }
}

fn injected(resource: String) -> TrackerError {
    TrackerError::Api {
        status: 500,
        message: format!("injected failure for {resource}"),
    }
}

/// An [`IssueTracker`] that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct InMemoryTracker {
    state: Mutex<TrackerState>,
}

impl InMemoryTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pre-existing label, as if created by an earlier run or by hand.
    pub async fn seed_label(&self, name: &str, color: &LabelColor) -> Label {
        self.state.lock().await.insert_label(name, color, "")
    }

    /// Adds a pre-existing milestone in the given state.
    pub async fn seed_milestone(&self, title: &str, state: MilestoneState) -> Milestone {
        self.state.lock().await.insert_milestone(title, "", state)
    }

    /// Closes the milestone titled `title`, as a maintainer would once its
    /// sprint ends. Returns `false` if there is no such milestone.
    pub async fn close_milestone(&self, title: &str) -> bool {
        let mut state = self.state.lock().await;
        match state.milestones.iter_mut().find(|m| m.title == title) {
            Some(milestone) => {
                milestone.state = MilestoneState::Closed;
                true
            }
            None => false,
        }
    }

    /// Makes `create_label` fail with a server error for `name`.
    pub async fn fail_label(&self, name: &str) {
        self.state.lock().await.failing_labels.insert(name.to_string());
    }

    /// Makes `create_milestone` fail with a server error for `title`.
    pub async fn fail_milestone(&self, title: &str) {
        self.state.lock().await.failing_milestones.insert(title.to_string());
    }

    /// Makes `create_issue` fail with a server error for issues titled `title`.
    pub async fn fail_issue(&self, title: &str) {
        self.state.lock().await.failing_issues.insert(title.to_string());
    }

    /// Snapshot of all labels.
    pub async fn labels(&self) -> Vec<Label> {
        self.state.lock().await.labels.clone()
    }

    /// Snapshot of all milestones, open and closed.
    pub async fn milestones(&self) -> Vec<Milestone> {
        self.state.lock().await.milestones.clone()
    }

    /// Snapshot of the requests of every issue created so far.
    pub async fn issues(&self) -> Vec<IssueRequest> {
        self.state
            .lock()
            .await
            .issues
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    /// Number of calls made to each operation so far.
    pub async fn calls(&self) -> CallCounts {
        self.state.lock().await.calls
    }
}

#[async_trait]
impl IssueTracker for InMemoryTracker {
    async fn create_label(&self, label: &NewLabel) -> Result<Label, TrackerError> {
        let mut state = self.state.lock().await;
        state.calls.create_label += 1;

        if state.failing_labels.contains(&label.name) {
            return Err(injected(format!("label '{}'", label.name)));
        }
        if state.find_label(&label.name).is_some() {
            return Err(TrackerError::Conflict {
                resource: format!("label '{}'", label.name),
            });
        }
        Ok(state.insert_label(&label.name, &label.color, &label.description))
    }

    async fn get_label(&self, name: &str) -> Result<Label, TrackerError> {
        let mut state = self.state.lock().await;
        state.calls.get_label += 1;

        state
            .find_label(name)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound {
                resource: format!("label '{name}'"),
            })
    }

    async fn create_milestone(&self, milestone: &NewMilestone) -> Result<Milestone, TrackerError> {
        let mut state = self.state.lock().await;
        state.calls.create_milestone += 1;

        if state.failing_milestones.contains(&milestone.title) {
            return Err(injected(format!("milestone '{}'", milestone.title)));
        }
        if state.milestones.iter().any(|m| m.title == milestone.title) {
            return Err(TrackerError::Conflict {
                resource: format!("milestone '{}'", milestone.title),
            });
        }
        Ok(state.insert_milestone(&milestone.title, &milestone.description, MilestoneState::Open))
    }

    async fn list_open_milestones(&self) -> Result<Vec<Milestone>, TrackerError> {
        let mut state = self.state.lock().await;
        state.calls.list_open_milestones += 1;

        Ok(state
            .milestones
            .iter()
            .filter(|m| m.state == MilestoneState::Open)
            .cloned()
            .collect())
    }

    async fn create_issue(&self, request: &IssueRequest) -> Result<Issue, TrackerError> {
        let mut state = self.state.lock().await;
        state.calls.create_issue += 1;

        if state.failing_issues.contains(&request.title) {
            return Err(injected(format!("issue '{}'", request.title)));
        }
        if let Some(missing) = request
            .labels
            .iter()
            .find(|name| state.find_label(name).is_none())
        {
            return Err(TrackerError::Validation {
                message: format!("label '{missing}' does not exist"),
            });
        }
        if let Some(number) = request.milestone {
            if !state.milestones.iter().any(|m| m.number == number) {
                return Err(TrackerError::Validation {
                    message: format!("milestone {number} does not exist"),
                });
            }
        }

        state.next_issue += 1;
        let number = IssueNumber::new(state.next_issue);
        let issue = Issue {
            number,
            html_url: format!("memory://issues/{number}"),
        };
        state.issues.push((issue.clone(), request.clone()));
        Ok(issue)
    }
}

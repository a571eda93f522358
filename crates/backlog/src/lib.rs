//! Core domain for backlog import.
//!
//! Bulk-populates an issue tracker from tabular work items. Before any issue
//! is created, a fixed catalog of labels and milestones is reconciled so it
//! exists exactly once on the remote; each record is then turned into an
//! issue request referencing those objects and submitted under a fixed pacing
//! schedule, with per-record failures counted rather than fatal.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate performs no network or
//! file I/O. Infrastructure crates implement [`IssueTracker`]; the CLI loads
//! input and wires everything together.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`CatalogKey`, `MilestoneNumber`, etc.) |
//! | [`types`] | Value types (`WorkItemRecord`, `IssueRequest`, `RunOutcome`, etc.) |
//! | [`errors`] | `TrackerError` and `ImportError` |
//! | [`catalog`] | Built-in and TOML-loaded taxonomy tables |
//! | [`tracker`] | The `IssueTracker` port |
//! | [`memory`] | In-memory `IssueTracker` |
//! | [`reconcile`] | Create-or-fetch for labels and milestones |
//! | [`request`] | Record → issue request |
//! | [`engine`] | Paced batch execution |
//! | [`report`] | Run summaries |

pub mod catalog;
pub mod engine;
pub mod errors;
pub mod identifiers;
pub mod memory;
pub mod reconcile;
pub mod report;
pub mod request;
pub mod tracker;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use catalog::{
    story_point_color, Catalog, EpicDefinition, LabelDefinition, SprintDefinition,
};
pub use engine::{BatchExecutor, Pacer, PacingPolicy, TokioPacer};
pub use errors::{ImportError, TrackerError};
pub use identifiers::{
    CatalogKey, ImportRunId, IssueNumber, LabelId, MilestoneNumber, RemoteId, RepositoryId,
};
pub use memory::{CallCounts, InMemoryTracker};
pub use reconcile::{
    ensure_exists, ensure_label, ensure_milestone, reconcile_catalog, Ensured, TaxonomyFailure,
    TaxonomyReport,
};
pub use report::{RunReport, TaxonomySummary};
pub use request::{build_issue_request, BACKLOG_STATUS_LABEL};
pub use tracker::IssueTracker;
pub use types::{
    Issue, IssueRequest, Label, LabelColor, Milestone, MilestoneState, NewLabel, NewMilestone,
    RecordOutcome, RecordResult, Repository, ResolvedIdentity, ResolvedTaxonomy, RunOutcome,
    StoryPoints, TaxonomyEntry, TaxonomyKind, TaxonomyRole, TaxonomySpec, WorkItemRecord,
};

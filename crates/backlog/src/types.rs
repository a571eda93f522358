//! Shared value types for the backlog import domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! values with invariants (colours are six hex digits, a key resolves at most
//! once) and participate in domain computations.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{CatalogKey, IssueNumber, LabelId, MilestoneNumber, RemoteId};

// ---------------------------------------------------------------------------
// Scalar value types
// ---------------------------------------------------------------------------

/// A label colour: six hexadecimal digits without the leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LabelColor(pub(crate) String);

impl LabelColor {
    /// Creates a [`LabelColor`], returning `None` unless `value` is exactly six
    /// hex digits. A leading `#` is accepted and stripped; digits are upper-cased.
    #[must_use]
    pub fn new(value: &str) -> Option<Self> {
        let hex = value.strip_prefix('#').unwrap_or(value);
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(hex.to_ascii_uppercase()))
        } else {
            None
        }
    }

    /// Returns the colour as a string slice (no `#`).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LabelColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value).ok_or_else(|| format!("'{value}' is not a six-digit hex colour"))
    }
}

impl From<LabelColor> for String {
    fn from(color: LabelColor) -> Self {
        color.0
    }
}

impl std::fmt::Display for LabelColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------

/// Effort estimate attached to a work item. Non-negative by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub struct StoryPoints(u32);

impl StoryPoints {
    /// Creates a [`StoryPoints`] value.
    pub fn new(points: u32) -> Self {
        Self(points)
    }

    /// Returns the underlying integer value.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for StoryPoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

/// The kind of taxonomy object a catalog entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyKind {
    /// A label, referenced from issues by name.
    Label,
    /// A milestone, referenced from issues by number.
    Milestone,
}

impl std::fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Label => f.write_str("label"),
            Self::Milestone => f.write_str("milestone"),
        }
    }
}

/// The catalog section an entry comes from.
///
/// Records reference taxonomy by key, and each reference only accepts the
/// matching section: an `Epic ID` must name an epic, never a story-point
/// bucket that happens to share the key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyRole {
    /// An epic label.
    Epic,
    /// A story-point bucket label.
    StoryPoints,
    /// A status label.
    Status,
    /// A priority label.
    Priority,
    /// A sprint milestone.
    Sprint,
}

impl TaxonomyRole {
    /// Kind of remote object entries of this role become.
    pub fn kind(self) -> TaxonomyKind {
        match self {
            Self::Sprint => TaxonomyKind::Milestone,
            Self::Epic | Self::StoryPoints | Self::Status | Self::Priority => TaxonomyKind::Label,
        }
    }

    /// Whether records look entries of this role up by key.
    ///
    /// Status and priority labels are ensured but never indexed because no
    /// record references them by key.
    pub fn is_indexed(self) -> bool {
        matches!(self, Self::Epic | Self::StoryPoints | Self::Sprint)
    }
}

impl std::fmt::Display for TaxonomyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Epic => f.write_str("epic"),
            Self::StoryPoints => f.write_str("story points"),
            Self::Status => f.write_str("status"),
            Self::Priority => f.write_str("priority"),
            Self::Sprint => f.write_str("sprint"),
        }
    }
}

/// Kind-specific attributes of a [`TaxonomyEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxonomySpec {
    /// Attributes of a label.
    Label {
        /// Display colour.
        color: LabelColor,
        /// Short description shown next to the label.
        description: String,
    },
    /// Attributes of a milestone.
    Milestone {
        /// Milestone description.
        description: String,
    },
}

/// One taxonomy object that must exist on the remote before issues are created.
///
/// Produced by [`crate::Catalog::entries`]; immutable for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyEntry {
    /// Stable local key records use to reference this entry.
    pub key: CatalogKey,

    /// Label name or milestone title on the remote.
    pub display_name: String,

    /// Kind-specific attributes.
    pub spec: TaxonomySpec,

    /// Catalog section the entry comes from.
    pub role: TaxonomyRole,
}

impl TaxonomyEntry {
    /// Returns which kind of object this entry describes.
    pub fn kind(&self) -> TaxonomyKind {
        match self.spec {
            TaxonomySpec::Label { .. } => TaxonomyKind::Label,
            TaxonomySpec::Milestone { .. } => TaxonomyKind::Milestone,
        }
    }

    /// Whether the resolved identity is kept for record lookups.
    pub fn indexed(&self) -> bool {
        self.role.is_indexed()
    }
}

// ---------------------------------------------------------------------------

/// The remote identity a [`TaxonomyEntry`] resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Catalog key of the entry.
    pub key: CatalogKey,
    /// Catalog section the entry came from.
    pub role: TaxonomyRole,
    /// Remote identity (label id or milestone number).
    pub remote_id: RemoteId,
    /// Name (label) or title (milestone) as stored on the remote.
    pub remote_name: String,
}

/// Mapping from catalog key to resolved remote identity, held for the whole run.
///
/// Each key resolves at most once; a second insert for the same key is
/// rejected and the first identity is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTaxonomy {
    entries: BTreeMap<CatalogKey, ResolvedIdentity>,
}

impl ResolvedTaxonomy {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `identity` under its key.
    ///
    /// Returns `false` (and leaves the map unchanged) if the key was already
    /// resolved.
    pub fn insert(&mut self, identity: ResolvedIdentity) -> bool {
        match self.entries.entry(identity.key.clone()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(identity);
                true
            }
        }
    }

    /// Looks up the identity resolved for `key`.
    pub fn get(&self, key: &str) -> Option<&ResolvedIdentity> {
        self.entries.get(key)
    }

    /// Looks up `key`, returning it only if it came from the `role` section
    /// of the catalog.
    pub fn get_role(&self, key: &str, role: TaxonomyRole) -> Option<&ResolvedIdentity> {
        self.get(key).filter(|identity| identity.role == role)
    }

    /// Number of resolved keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over resolved identities in key order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedIdentity> {
        self.entries.values()
    }
}

// ---------------------------------------------------------------------------
// Input records and issue requests
// ---------------------------------------------------------------------------

/// One input row describing a unit of work that becomes one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItemRecord {
    /// Catalog key of the epic this item belongs to (e.g. `"Epic 1"`).
    pub epic_key: String,
    /// Work item identifier (e.g. `"PBI-1.1"`).
    pub item_id: String,
    /// Short title.
    pub title: String,
    /// Effort estimate.
    pub story_points: StoryPoints,
    /// Free-text description.
    pub description: String,
    /// Catalog key of the sprint (e.g. `"Sprint 1-2"`); may be unknown.
    pub sprint_key: String,
    /// 1-based line of the row in the input file.
    pub source_line: u64,
}

/// A fully formed issue creation payload.
///
/// Built fresh per record by [`crate::build_issue_request`]; never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    /// Issue title.
    pub title: String,
    /// Markdown body.
    pub body: String,
    /// Names of labels to apply.
    pub labels: BTreeSet<String>,
    /// Milestone to attach, if the record's sprint resolved.
    pub milestone: Option<MilestoneNumber>,
}

// ---------------------------------------------------------------------------
// Remote model
// ---------------------------------------------------------------------------

/// Payload for creating a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLabel {
    /// Label name.
    pub name: String,
    /// Display colour.
    pub color: LabelColor,
    /// Short description.
    pub description: String,
}

/// A label as stored on the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Remote identifier.
    pub id: LabelId,
    /// Label name.
    pub name: String,
    /// Display colour as reported by the remote.
    pub color: String,
    /// Description, if any.
    pub description: Option<String>,
}

/// Payload for creating a milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMilestone {
    /// Milestone title.
    pub title: String,
    /// Milestone description.
    pub description: String,
}

/// Whether a milestone is still accepting work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneState {
    /// Open milestone.
    Open,
    /// Closed milestone.
    Closed,
}

/// A milestone as stored on the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    /// Per-repository milestone number.
    pub number: MilestoneNumber,
    /// Milestone title.
    pub title: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Open or closed.
    pub state: MilestoneState,
}

/// An issue as created on the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Per-repository issue number.
    pub number: IssueNumber,
    /// Browser URL of the issue.
    pub html_url: String,
}

/// The repository issues are imported into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// `"owner/repo"` as reported by the remote.
    pub full_name: String,
    /// Browser URL of the repository.
    pub html_url: String,
}

// ---------------------------------------------------------------------------
// Run outcome
// ---------------------------------------------------------------------------

/// Result of attempting to create one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The issue was created.
    Created(Issue),
    /// The record could not be turned into an issue.
    Failed(String),
}

/// Outcome of one record, with enough context to trace it back to the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordResult {
    /// 1-based position of the record in the batch.
    pub position: usize,
    /// 1-based line of the record in the input file.
    pub source_line: u64,
    /// Work item identifier of the record.
    pub item_id: String,
    /// What happened.
    pub outcome: RecordOutcome,
}

/// Accumulated result of a batch run.
///
/// Counters only ever increase; the final state is read once at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Issues created.
    pub created: usize,
    /// Records that failed.
    pub failed: usize,
    /// Records attempted.
    pub total: usize,
    /// Per-record results in input order.
    pub results: Vec<RecordResult>,
}

impl RunOutcome {
    /// Folds one record result into the outcome.
    pub fn record(&mut self, result: RecordResult) {
        match result.outcome {
            RecordOutcome::Created(_) => self.created += 1,
            RecordOutcome::Failed(_) => self.failed += 1,
        }
        self.total += 1;
        self.results.push(result);
    }

    /// Iterates over the failed records.
    pub fn failures(&self) -> impl Iterator<Item = &RecordResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, RecordOutcome::Failed(_)))
    }
}

impl FromIterator<RecordResult> for RunOutcome {
    fn from_iter<I: IntoIterator<Item = RecordResult>>(iter: I) -> Self {
        let mut outcome = Self::default();
        for result in iter {
            outcome.record(result);
        }
        outcome
    }
}

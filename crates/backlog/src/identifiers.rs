//! Newtype domain identifiers.
//!
//! Every concept with an identity is a distinct newtype wrapping a primitive.
//! This prevents accidentally passing a [`MilestoneNumber`] where an
//! [`IssueNumber`] is expected even though both are `u64` under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub(crate) String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (remote-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: remote-integer-backed
// ---------------------------------------------------------------------------

u64_id! {
    /// Identifies a label on the remote tracker.
    LabelId
}

u64_id! {
    /// Identifies a milestone by its per-repository number.
    ///
    /// This is the value issues reference, not the global database id.
    MilestoneNumber
}

u64_id! {
    /// Identifies an issue by its per-repository number.
    IssueNumber
}

u64_id! {
    /// Opaque remote identity of a reconciled taxonomy object.
    ///
    /// Holds a [`LabelId`] for labels and a [`MilestoneNumber`] for milestones.
    RemoteId
}

impl From<LabelId> for RemoteId {
    fn from(id: LabelId) -> Self {
        Self(id.as_u64())
    }
}

impl From<MilestoneNumber> for RemoteId {
    fn from(number: MilestoneNumber) -> Self {
        Self(number.as_u64())
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// Stable local key used to cross-reference catalog entries from input
    /// records (e.g. `"Epic 3"`, `"Sprint 12"`, `"SP5"`).
    CatalogKey
}

// Lets resolved-identity maps be queried with the raw `&str` read from input.
impl std::borrow::Borrow<str> for CatalogKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifies a repository in `"owner/repo"` format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryId(String);

impl RepositoryId {
    /// Parses an `"owner/repo"` string.
    ///
    /// Returns `None` unless the value contains exactly one `/` separating a
    /// non-empty owner from a non-empty name.
    pub fn parse(value: &str) -> Option<Self> {
        let (owner, name) = value.trim().split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self(format!("{owner}/{name}")))
    }

    /// Returns the owning user or organisation.
    pub fn owner(&self) -> &str {
        self.0.split_once('/').map_or("", |(owner, _)| owner)
    }

    /// Returns the repository name.
    pub fn name(&self) -> &str {
        self.0.split_once('/').map_or("", |(_, name)| name)
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single import run (one invocation of the CLI).
///
/// Attached to the root tracing span so all activity from one run can be
/// correlated across log lines and exported traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportRunId(Uuid);

impl ImportRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ImportRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

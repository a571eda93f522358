//! Taxonomy catalog: the labels and milestones that must exist before issues
//! are created.
//!
//! The catalog is plain data. [`Catalog::builtin`] carries the e-commerce
//! roadmap tables; [`Catalog::from_toml_str`] loads a replacement so the
//! taxonomy can change without touching reconciliation code.
//!
//! ## TOML layout
//!
//! ```toml
//! story_points = [1, 2, 3, 5, 8, 13, 21, 34]   # optional
//!
//! [[epics]]
//! key = "Epic 1"
//! name = "Epic 1: Product Domain"
//! color = "FF6B6B"
//! description = "Enhanced Product Domain & Design Patterns"
//!
//! [[sprints]]
//! key = "Sprint 1-2"
//! title = "Sprint 1-2: Product Type System"
//! description = "PBI 1.1, 1.2"
//! ```
//!
//! `statuses` and `priorities` are optional arrays of `{ name, color,
//! description }` tables and default to the built-in lists.

use std::collections::HashSet;

use serde::Deserialize;

use crate::{
    CatalogKey, ImportError, LabelColor, StoryPoints, TaxonomyEntry, TaxonomyRole, TaxonomySpec,
};

// ---------------------------------------------------------------------------
// Built-in tables
// ---------------------------------------------------------------------------

/// `(key, label name, colour, description)`
const EPICS: &[(&str, &str, &str, &str)] = &[
    ("Epic 1", "Epic 1: Product Domain", "FF6B6B", "Enhanced Product Domain & Design Patterns"),
    ("Epic 2", "Epic 2: Order Management", "4ECDC4", "Advanced Order Management & Patterns"),
    ("Epic 3", "Epic 3: Payment & Checkout", "45B7D1", "Advanced Payment & Checkout"),
    ("Epic 4", "Epic 4: Frontend Architecture", "FFA07A", "Frontend Architecture & React Patterns"),
    ("Epic 5", "Epic 5: Testing Strategy", "98D8C8", "Testing Strategy"),
    ("Epic 6", "Epic 6: CI/CD Pipeline", "F7B731", "CI/CD Pipeline"),
    ("Epic 7", "Epic 7: Kubernetes", "5F27CD", "Kubernetes Deployment"),
    ("Epic 8", "Epic 8: Observability", "00D2D3", "Observability & Monitoring"),
    ("Epic 9", "Epic 9: Advanced Features", "FF9FF3", "Advanced Features"),
    ("Epic 10", "Epic 10: Performance & Security", "54A0FF", "Performance & Security"),
];

/// `(key, milestone title, description)`
const SPRINTS: &[(&str, &str, &str)] = &[
    ("Sprint 1-2", "Sprint 1-2: Product Type System", "PBI 1.1, 1.2"),
    ("Sprint 3", "Sprint 3: Pricing & Attributes", "PBI 1.3, 1.4"),
    ("Sprint 4", "Sprint 4: Media & Search", "PBI 1.5, 1.6"),
    ("Sprint 5", "Sprint 5: Inventory & Reviews", "PBI 1.7, 1.8"),
    ("Sprint 6", "Sprint 6: Wishlist & Comparison", "PBI 1.9, 1.10"),
    ("Sprint 7", "Sprint 7: Order State Machine", "PBI 2.1, 2.2"),
    ("Sprint 8", "Sprint 8: Cancellation & Modification", "PBI 2.3, 2.4"),
    ("Sprint 9", "Sprint 9: Saga & Invoice", "PBI 2.5, 2.6"),
    ("Sprint 10", "Sprint 10: Payment Methods", "PBI 3.1, 3.2"),
    ("Sprint 11", "Sprint 11: Retry & Discounts", "PBI 3.3, 3.4"),
    ("Sprint 12", "Sprint 12: Server State & Global State", "PBI 4.1, 4.2"),
    ("Sprint 13", "Sprint 13: Forms & Optimization", "PBI 4.3, 4.4"),
    ("Sprint 14", "Sprint 14: PWA & Accessibility", "PBI 4.5, 4.6"),
    ("Sprint 15", "Sprint 15: Animation & Quality", "PBI 4.7, 4.8"),
    ("Sprint 16", "Sprint 16: Component Library & Performance", "PBI 4.9, 4.10"),
    ("Sprint 17", "Sprint 17: Backend Tests", "PBI 5.1, 5.2"),
    ("Sprint 18", "Sprint 18: Frontend & E2E Tests", "PBI 5.3, 5.4"),
    ("Sprint 19", "Sprint 19: CI Setup", "PBI 6.1, 6.2"),
    ("Sprint 20", "Sprint 20: Versioning & Quality", "PBI 6.3, 6.4, 6.5, 6.6"),
    ("Sprint 21", "Sprint 21: K8s Setup", "PBI 7.1, 7.2"),
    ("Sprint 22", "Sprint 22: Helm & Ingress", "PBI 7.3, 7.4"),
    ("Sprint 23", "Sprint 23: Storage & Autoscaling", "PBI 7.5, 7.6, 7.7"),
    ("Sprint 24", "Sprint 24: Advanced K8s (Optional)", "PBI 7.8, 7.9"),
    ("Sprint 25", "Sprint 25: Logging", "PBI 8.1, 8.2"),
    ("Sprint 26", "Sprint 26: Metrics & Dashboards", "PBI 8.3, 8.4"),
    ("Sprint 27", "Sprint 27: Tracing", "PBI 8.5"),
    ("Sprint 28", "Sprint 28: Notifications", "PBI 9.1"),
    ("Sprint 29", "Sprint 29: Recommendations", "PBI 9.2"),
    ("Sprint 30-31", "Sprint 30-31: Admin Dashboard", "PBI 9.3"),
    ("Sprint 32", "Sprint 32: Search & Real-time", "PBI 9.4, 9.5"),
    ("Sprint 33", "Sprint 33: Caching & Rate Limiting", "PBI 10.1, 10.2"),
    ("Sprint 34", "Sprint 34: Security Hardening", "PBI 10.3, 10.4, 10.5"),
    ("Sprint 35", "Sprint 35: Security Testing", "PBI 10.6"),
];

/// Story-point values that get a label.
const STORY_POINT_LADDER: &[u32] = &[1, 2, 3, 5, 8, 13, 21, 34];

/// `(name, colour, description)`
const STATUSES: &[(&str, &str, &str)] = &[
    ("status: backlog", "DDDDDD", "In backlog"),
    ("status: in-progress", "FFA500", "In progress"),
    ("status: in-review", "800080", "In review"),
    ("status: done", "00FF00", "Done"),
];

/// `(name, colour, description)`
const PRIORITIES: &[(&str, &str, &str)] = &[
    ("priority: critical", "FF0000", "Critical priority"),
    ("priority: high", "FFA500", "High priority"),
    ("priority: medium", "FFFF00", "Medium priority"),
    ("priority: low", "00FF00", "Low priority"),
];

// ---------------------------------------------------------------------------
// Story points
// ---------------------------------------------------------------------------

/// Colour of a story-point label: a fixed four-tier severity ramp.
pub fn story_point_color(points: StoryPoints) -> LabelColor {
    let hex = match points.as_u32() {
        0..=3 => "C2E0C6",
        4..=8 => "FFFFBA",
        9..=21 => "FFDFBA",
        _ => "FFB3BA",
    };
    LabelColor(hex.to_string())
}

/// Catalog key of the story-point bucket for `points` (e.g. `"SP5"`).
pub fn story_point_key(points: StoryPoints) -> String {
    format!("SP{points}")
}

/// Label name of the story-point bucket for `points` (e.g. `"SP: 5"`).
pub fn story_point_label(points: StoryPoints) -> String {
    format!("SP: {points}")
}

// ---------------------------------------------------------------------------
// Catalog definitions
// ---------------------------------------------------------------------------

/// An epic: a label every record must reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EpicDefinition {
    /// Key used in the input's `Epic ID` column.
    pub key: CatalogKey,
    /// Label name.
    pub name: String,
    /// Label colour.
    pub color: LabelColor,
    /// Label description.
    pub description: String,
}

/// A label created unconditionally and never referenced by key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabelDefinition {
    /// Label name.
    pub name: String,
    /// Label colour.
    pub color: LabelColor,
    /// Label description.
    pub description: String,
}

/// A sprint, realised as a milestone.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SprintDefinition {
    /// Key used in the input's `Sprint` column.
    pub key: CatalogKey,
    /// Milestone title.
    pub title: String,
    /// Milestone description.
    pub description: String,
}

/// The complete set of taxonomy objects to ensure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    /// Epic labels.
    pub epics: Vec<EpicDefinition>,

    /// Story-point values that get a bucket label.
    #[serde(default = "default_story_points")]
    pub story_points: Vec<StoryPoints>,

    /// Status labels.
    #[serde(default = "default_statuses")]
    pub statuses: Vec<LabelDefinition>,

    /// Priority labels.
    #[serde(default = "default_priorities")]
    pub priorities: Vec<LabelDefinition>,

    /// Sprint milestones.
    #[serde(default)]
    pub sprints: Vec<SprintDefinition>,
}

fn default_story_points() -> Vec<StoryPoints> {
    STORY_POINT_LADDER.iter().copied().map(StoryPoints::new).collect()
}

fn label_table(rows: &[(&str, &str, &str)]) -> Vec<LabelDefinition> {
    rows.iter()
        .map(|&(name, color, description)| LabelDefinition {
            name: name.to_string(),
            color: LabelColor(color.to_string()),
            description: description.to_string(),
        })
        .collect()
}

fn default_statuses() -> Vec<LabelDefinition> {
    label_table(STATUSES)
}

fn default_priorities() -> Vec<LabelDefinition> {
    label_table(PRIORITIES)
}

impl Catalog {
    /// The built-in e-commerce roadmap catalog.
    pub fn builtin() -> Self {
        let epics = EPICS
            .iter()
            .map(|&(key, name, color, description)| EpicDefinition {
                key: CatalogKey(key.to_string()),
                name: name.to_string(),
                color: LabelColor(color.to_string()),
                description: description.to_string(),
            })
            .collect();

        let sprints = SPRINTS
            .iter()
            .map(|&(key, title, description)| SprintDefinition {
                key: CatalogKey(key.to_string()),
                title: title.to_string(),
                description: description.to_string(),
            })
            .collect();

        Self {
            epics,
            story_points: default_story_points(),
            statuses: default_statuses(),
            priorities: default_priorities(),
            sprints,
        }
    }

    /// Parses and validates a catalog from TOML.
    pub fn from_toml_str(source: &str) -> Result<Self, ImportError> {
        let catalog: Self = toml::from_str(source).map_err(|e| ImportError::Catalog {
            message: e.to_string(),
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Checks the catalog is internally consistent.
    ///
    /// Rejects an empty epic list, empty keys or names, duplicate keys,
    /// duplicate label names (case-insensitive, as the remote compares them)
    /// and duplicate milestone titles.
    pub fn validate(&self) -> Result<(), ImportError> {
        if self.epics.is_empty() {
            return Err(catalog_error("at least one epic is required"));
        }

        let mut keys = HashSet::new();
        let mut label_names = HashSet::new();
        let mut titles = HashSet::new();

        for entry in self.entries() {
            if entry.key.as_str().trim().is_empty() || entry.display_name.trim().is_empty() {
                return Err(catalog_error("keys and names must not be empty"));
            }
            if entry.indexed() && !keys.insert(entry.key.clone()) {
                return Err(catalog_error(format!("duplicate key '{}'", entry.key)));
            }
            let unique = match entry.spec {
                TaxonomySpec::Label { .. } => {
                    label_names.insert(entry.display_name.to_lowercase())
                }
                TaxonomySpec::Milestone { .. } => titles.insert(entry.display_name.clone()),
            };
            if !unique {
                return Err(catalog_error(format!(
                    "duplicate {} '{}'",
                    entry.kind(),
                    entry.display_name
                )));
            }
        }
        Ok(())
    }

    /// Taxonomy entries in processing order: epics, story-point buckets,
    /// statuses, priorities, then sprints.
    pub fn entries(&self) -> Vec<TaxonomyEntry> {
        let epics = self.epics.iter().map(|epic| TaxonomyEntry {
            key: epic.key.clone(),
            display_name: epic.name.clone(),
            spec: TaxonomySpec::Label {
                color: epic.color.clone(),
                description: epic.description.clone(),
            },
            role: TaxonomyRole::Epic,
        });

        let points = self.story_points.iter().map(|&points| TaxonomyEntry {
            key: CatalogKey(story_point_key(points)),
            display_name: story_point_label(points),
            spec: TaxonomySpec::Label {
                color: story_point_color(points),
                description: format!("Story Points: {points}"),
            },
            role: TaxonomyRole::StoryPoints,
        });

        let fixed = |labels: &[LabelDefinition], role: TaxonomyRole| -> Vec<TaxonomyEntry> {
            labels
                .iter()
                .map(|label| TaxonomyEntry {
                    key: CatalogKey(label.name.clone()),
                    display_name: label.name.clone(),
                    spec: TaxonomySpec::Label {
                        color: label.color.clone(),
                        description: label.description.clone(),
                    },
                    role,
                })
                .collect()
        };
        let statuses = fixed(&self.statuses, TaxonomyRole::Status);
        let priorities = fixed(&self.priorities, TaxonomyRole::Priority);

        let sprints = self.sprints.iter().map(|sprint| TaxonomyEntry {
            key: sprint.key.clone(),
            display_name: sprint.title.clone(),
            spec: TaxonomySpec::Milestone {
                description: sprint.description.clone(),
            },
            role: TaxonomyRole::Sprint,
        });

        epics
            .chain(points)
            .chain(statuses)
            .chain(priorities)
            .chain(sprints)
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn catalog_error(message: impl Into<String>) -> ImportError {
    ImportError::Catalog {
        message: message.into(),
    }
}

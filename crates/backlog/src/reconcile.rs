//! Taxonomy reconciliation: make every catalog entry exist exactly once on the
//! remote and remember its identity.
//!
//! Labels and milestones share one create-or-fetch shape, [`ensure_exists`]:
//! try to create; on a conflict, look the existing object up and use that.
//! Running the pass twice against the same remote converges on the same
//! identities without creating duplicates.
//!
//! Milestone lookups scan *open* milestones only. A closed milestone with a
//! colliding title still blocks creation, so that sprint is left unresolved
//! and logged.

use std::future::Future;

use tracing::{info, instrument, warn};

use crate::{
    Catalog, CatalogKey, IssueTracker, Label, Milestone, NewLabel, NewMilestone, RemoteId,
    ResolvedIdentity, ResolvedTaxonomy, TaxonomyEntry, TaxonomyKind, TaxonomySpec, TrackerError,
};

/// Result of a successful create-or-fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ensured<T> {
    /// The object did not exist and was created.
    Created(T),
    /// The object already existed and was fetched.
    Existing(T),
}

impl<T> Ensured<T> {
    /// Returns `true` if this call created the object.
    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    /// Returns the object regardless of how it was obtained.
    pub fn into_inner(self) -> T {
        match self {
            Self::Created(value) | Self::Existing(value) => value,
        }
    }
}

/// Creates an object, falling back to a lookup when it already exists.
///
/// - `create` is the creation call.
/// - `is_conflict` classifies a creation error as "already exists".
/// - `lookup` fetches the existing object; `Ok(None)` means it could not be
///   found, which is reported as [`TrackerError::NotFound`] for `resource`.
///
/// Any error `is_conflict` rejects is returned unchanged without a lookup.
pub async fn ensure_exists<T, Create, Lookup, LookupFut>(
    resource: &str,
    create: Create,
    is_conflict: impl Fn(&TrackerError) -> bool,
    lookup: Lookup,
) -> Result<Ensured<T>, TrackerError>
where
    Create: Future<Output = Result<T, TrackerError>>,
    Lookup: FnOnce() -> LookupFut,
    LookupFut: Future<Output = Result<Option<T>, TrackerError>>,
{
    match create.await {
        Ok(created) => Ok(Ensured::Created(created)),
        Err(err) if is_conflict(&err) => match lookup().await? {
            Some(existing) => Ok(Ensured::Existing(existing)),
            None => Err(TrackerError::NotFound {
                resource: resource.to_string(),
            }),
        },
        Err(err) => Err(err),
    }
}

/// Ensures a label exists, fetching it by name on conflict.
pub async fn ensure_label<T>(tracker: &T, label: &NewLabel) -> Result<Ensured<Label>, TrackerError>
where
    T: IssueTracker + ?Sized,
{
    let resource = format!("label '{}'", label.name);
    ensure_exists(
        &resource,
        tracker.create_label(label),
        TrackerError::is_conflict,
        move || async move {
            match tracker.get_label(&label.name).await {
                Ok(existing) => Ok(Some(existing)),
                Err(TrackerError::NotFound { .. }) => Ok(None),
                Err(err) => Err(err),
            }
        },
    )
    .await
}

/// Ensures a milestone exists, scanning open milestones for an exact title
/// match on conflict.
pub async fn ensure_milestone<T>(
    tracker: &T,
    milestone: &NewMilestone,
) -> Result<Ensured<Milestone>, TrackerError>
where
    T: IssueTracker + ?Sized,
{
    let resource = format!("open milestone '{}'", milestone.title);
    ensure_exists(
        &resource,
        tracker.create_milestone(milestone),
        TrackerError::is_conflict,
        move || async move {
            let open = tracker.list_open_milestones().await?;
            Ok(open.into_iter().find(|m| m.title == milestone.title))
        },
    )
    .await
}

// ---------------------------------------------------------------------------
// Catalog pass
// ---------------------------------------------------------------------------

/// A catalog entry that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyFailure {
    /// Catalog key of the entry.
    pub key: CatalogKey,
    /// Kind of object.
    pub kind: TaxonomyKind,
    /// Label name or milestone title.
    pub name: String,
    /// Why it failed.
    pub error: TrackerError,
}

/// Result of reconciling a whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyReport {
    /// Identities of indexed entries that resolved.
    pub resolved: ResolvedTaxonomy,
    /// Objects this pass created.
    pub created: usize,
    /// Objects that already existed.
    pub existing: usize,
    /// Entries left unresolved.
    pub failures: Vec<TaxonomyFailure>,
}

async fn ensure_entry<T>(
    tracker: &T,
    entry: &TaxonomyEntry,
) -> Result<(bool, ResolvedIdentity), TrackerError>
where
    T: IssueTracker + ?Sized,
{
    let (created, remote_id, remote_name) = match &entry.spec {
        TaxonomySpec::Label { color, description } => {
            let label = NewLabel {
                name: entry.display_name.clone(),
                color: color.clone(),
                description: description.clone(),
            };
            let ensured = ensure_label(tracker, &label).await?;
            let created = ensured.was_created();
            let label = ensured.into_inner();
            (created, RemoteId::from(label.id), label.name)
        }
        TaxonomySpec::Milestone { description } => {
            let milestone = NewMilestone {
                title: entry.display_name.clone(),
                description: description.clone(),
            };
            let ensured = ensure_milestone(tracker, &milestone).await?;
            let created = ensured.was_created();
            let milestone = ensured.into_inner();
            (created, RemoteId::from(milestone.number), milestone.title)
        }
    };

    Ok((
        created,
        ResolvedIdentity {
            key: entry.key.clone(),
            role: entry.role,
            remote_id,
            remote_name,
        },
    ))
}

/// Ensures every catalog entry exists: all labels first, then all milestones.
///
/// Entries are processed one at a time in catalog order. A failing entry is
/// logged and recorded in [`TaxonomyReport::failures`]; it never stops the
/// pass.
#[instrument(skip_all, fields(entries = tracing::field::Empty))]
pub async fn reconcile_catalog<T>(tracker: &T, catalog: &Catalog) -> TaxonomyReport
where
    T: IssueTracker + ?Sized,
{
    let entries = catalog.entries();
    tracing::Span::current().record("entries", entries.len());

    let mut report = TaxonomyReport::default();
    for entry in &entries {
        match ensure_entry(tracker, entry).await {
            Ok((created, identity)) => {
                if created {
                    report.created += 1;
                    info!(
                        kind = %entry.kind(),
                        key = %entry.key,
                        name = %identity.remote_name,
                        "Created"
                    );
                } else {
                    report.existing += 1;
                    info!(
                        kind = %entry.kind(),
                        key = %entry.key,
                        name = %identity.remote_name,
                        "Exists"
                    );
                }

                if entry.indexed() && !report.resolved.insert(identity) {
                    warn!(key = %entry.key, "Key already resolved; keeping the first identity");
                }
            }
            Err(error) => {
                warn!(
                    kind = %entry.kind(),
                    key = %entry.key,
                    name = %entry.display_name,
                    error = %error,
                    "Could not ensure taxonomy object"
                );
                report.failures.push(TaxonomyFailure {
                    key: entry.key.clone(),
                    kind: entry.kind(),
                    name: entry.display_name.clone(),
                    error,
                });
            }
        }
    }
    report
}

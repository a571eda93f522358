//! Turns one [`WorkItemRecord`] into an [`IssueRequest`].

use std::collections::BTreeSet;

use crate::catalog::story_point_key;
use crate::{
    ImportError, IssueRequest, MilestoneNumber, ResolvedTaxonomy, TaxonomyRole, WorkItemRecord,
};

/// Status label applied to every imported issue.
pub const BACKLOG_STATUS_LABEL: &str = "status: backlog";

/// Builds the issue creation payload for `record`.
///
/// - Title: `"[{item_id}] {title}"`.
/// - Labels: the epic label, the story-point label if that bucket resolved,
///   and [`BACKLOG_STATUS_LABEL`].
/// - Milestone: the record's sprint if it resolved, otherwise none.
///
/// # Errors
///
/// [`ImportError::Configuration`] if the record's epic key does not name a
/// resolved epic. Keys of other catalog sections (`"SP5"`, `"Sprint 3"`) are
/// not epics. Unlike story points and sprints, every record must carry a
/// valid epic.
pub fn build_issue_request(
    record: &WorkItemRecord,
    resolved: &ResolvedTaxonomy,
) -> Result<IssueRequest, ImportError> {
    let epic = resolved
        .get_role(&record.epic_key, TaxonomyRole::Epic)
        .ok_or_else(|| ImportError::Configuration {
            message: format!(
                "epic '{}' of {} is not in the catalog or could not be resolved",
                record.epic_key, record.item_id
            ),
        })?;

    let mut labels = BTreeSet::new();
    labels.insert(epic.remote_name.clone());
    if let Some(points) =
        resolved.get_role(&story_point_key(record.story_points), TaxonomyRole::StoryPoints)
    {
        labels.insert(points.remote_name.clone());
    }
    labels.insert(BACKLOG_STATUS_LABEL.to_string());

    let milestone = resolved
        .get_role(&record.sprint_key, TaxonomyRole::Sprint)
        .map(|sprint| MilestoneNumber::new(sprint.remote_id.as_u64()));

    Ok(IssueRequest {
        title: format!("[{}] {}", record.item_id, record.title),
        body: render_body(record, &epic.remote_name),
        labels,
        milestone,
    })
}

fn render_body(record: &WorkItemRecord, epic_name: &str) -> String {
    format!(
        r#"## 📝 Description
{description}

## 🎯 Epic
{epic_name}

## 📊 Story Points
{points}

## 🎯 Acceptance Criteria
- [ ] See description for detailed acceptance criteria

## 🔧 Technical Tasks
- [ ] See description for technical tasks

## 📚 Documentation
- [ ] Update API documentation
- [ ] Update service documentation
- [ ] Add code comments
- [ ] Update user flow documentation (if applicable)

## 🔗 Dependencies
Check roadmap document for dependencies

## ✅ Definition of Done
- [ ] Code complete and reviewed
- [ ] Unit tests written (>80% coverage for new code)
- [ ] Integration tests (if applicable)
- [ ] Documentation updated
- [ ] PR approved and merged to main
- [ ] Deployed to development environment
- [ ] Functionality verified

---

**For detailed acceptance criteria and technical tasks, see:**
- `docs/PROJECT_ROADMAP.md`
- `docs/ITERATION_CHECKLIST.md`
"#,
        description = record.description,
        points = record.story_points,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CatalogKey, RemoteId, ResolvedIdentity, StoryPoints};
    use proptest::prelude::*;

    const LADDER: [u32; 8] = [1, 2, 3, 5, 8, 13, 21, 34];

    fn resolved() -> ResolvedTaxonomy {
        let mut resolved = ResolvedTaxonomy::new();
        let mut add = |key: &str, role, id, name: &str| {
            resolved.insert(ResolvedIdentity {
                key: CatalogKey::new(key).unwrap(),
                role,
                remote_id: RemoteId::new(id),
                remote_name: name.to_string(),
            });
        };
        add("Epic 1", TaxonomyRole::Epic, 1, "Epic 1: Product Domain");
        add("Epic 2", TaxonomyRole::Epic, 2, "Epic 2: Order Management");
        for (i, n) in LADDER.iter().enumerate() {
            add(&format!("SP{n}"), TaxonomyRole::StoryPoints, 10 + i as u64, &format!("SP: {n}"));
        }
        add("Sprint 1-2", TaxonomyRole::Sprint, 4, "Sprint 1-2: Product Type System");
        resolved
    }

    fn record(epic: &str, points: u32, sprint: &str) -> WorkItemRecord {
        WorkItemRecord {
            epic_key: epic.to_string(),
            item_id: "PBI-1.1".to_string(),
            title: "X".to_string(),
            story_points: StoryPoints::new(points),
            description: "Model product types".to_string(),
            sprint_key: sprint.to_string(),
            source_line: 2,
        }
    }

    #[test]
    fn builds_the_full_request_for_a_resolved_record() {
        let request = build_issue_request(&record("Epic 1", 5, "Sprint 1-2"), &resolved()).unwrap();

        assert_eq!(request.title, "[PBI-1.1] X");
        let expected: BTreeSet<String> = ["Epic 1: Product Domain", "SP: 5", "status: backlog"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(request.labels, expected);
        assert_eq!(request.milestone, Some(MilestoneNumber::new(4)));
    }

    #[test]
    fn body_interpolates_description_epic_and_points() {
        let request = build_issue_request(&record("Epic 1", 8, "Sprint 1-2"), &resolved()).unwrap();

        assert!(request.body.starts_with("## 📝 Description\nModel product types\n"));
        assert!(request.body.contains("## 🎯 Epic\nEpic 1: Product Domain\n"));
        assert!(request.body.contains("## 📊 Story Points\n8\n"));
        assert!(request.body.contains("## ✅ Definition of Done"));
    }

    #[test]
    fn unknown_sprint_leaves_the_milestone_empty() {
        let request = build_issue_request(&record("Epic 1", 5, "Sprint 99"), &resolved()).unwrap();
        assert_eq!(request.milestone, None);
    }

    #[test]
    fn unknown_epic_is_a_configuration_error() {
        let err = build_issue_request(&record("Epic 42", 5, "Sprint 1-2"), &resolved()).unwrap_err();
        assert!(matches!(err, ImportError::Configuration { .. }));
    }

    #[test]
    fn a_milestone_key_is_not_accepted_as_an_epic() {
        let err = build_issue_request(&record("Sprint 1-2", 5, ""), &resolved()).unwrap_err();
        assert!(matches!(err, ImportError::Configuration { .. }));
    }

    #[test]
    fn a_story_point_key_is_not_accepted_as_an_epic() {
        let err = build_issue_request(&record("SP5", 3, "Sprint 1-2"), &resolved()).unwrap_err();
        assert!(matches!(err, ImportError::Configuration { .. }));
    }

    #[test]
    fn an_epic_key_is_not_accepted_as_a_sprint() {
        let request = build_issue_request(&record("Epic 1", 5, "Epic 2"), &resolved()).unwrap();
        assert_eq!(request.milestone, None);
    }

    proptest! {
        #[test]
        fn ladder_points_get_exactly_one_point_label(index in 0usize..LADDER.len()) {
            let points = LADDER[index];
            let request = build_issue_request(&record("Epic 2", points, ""), &resolved()).unwrap();
            let expected = format!("SP: {points}");
            let point_labels: Vec<&String> =
                request.labels.iter().filter(|l| l.starts_with("SP: ")).collect();
            prop_assert_eq!(point_labels, vec![&expected]);
        }

        #[test]
        fn off_ladder_points_get_no_point_label(points in any::<u32>()) {
            prop_assume!(!LADDER.contains(&points));
            let request = build_issue_request(&record("Epic 2", points, ""), &resolved()).unwrap();
            prop_assert!(request.labels.iter().all(|l| !l.starts_with("SP: ")));
        }

        #[test]
        fn every_request_has_backlog_status_and_one_epic_label(points in any::<u32>(), epic in 1u32..=2) {
            let epic_key = format!("Epic {epic}");
            let request = build_issue_request(&record(&epic_key, points, ""), &resolved()).unwrap();
            let expected_epic = resolved().get(&epic_key).unwrap().remote_name.clone();

            prop_assert!(request.labels.contains(BACKLOG_STATUS_LABEL));
            let epics: Vec<&String> =
                request.labels.iter().filter(|l| l.starts_with("Epic ")).collect();
            prop_assert_eq!(epics, vec![&expected_epic]);
        }
    }
}

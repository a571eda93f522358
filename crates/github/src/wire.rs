//! GitHub REST payloads and error classification.

use backlog::{
    Issue, IssueNumber, IssueRequest, Label, LabelId, Milestone, MilestoneNumber, MilestoneState,
    NewLabel, NewMilestone, Repository, TrackerError,
};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct CreateLabelBody<'a> {
    pub name: &'a str,
    pub color: &'a str,
    pub description: &'a str,
}

impl<'a> From<&'a NewLabel> for CreateLabelBody<'a> {
    fn from(label: &'a NewLabel) -> Self {
        Self {
            name: &label.name,
            color: label.color.as_str(),
            description: &label.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateMilestoneBody<'a> {
    pub title: &'a str,
    pub description: &'a str,
}

impl<'a> From<&'a NewMilestone> for CreateMilestoneBody<'a> {
    fn from(milestone: &'a NewMilestone) -> Self {
        Self {
            title: &milestone.title,
            description: &milestone.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateIssueBody<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub labels: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
}

impl<'a> From<&'a IssueRequest> for CreateIssueBody<'a> {
    fn from(request: &'a IssueRequest) -> Self {
        Self {
            title: &request.title,
            body: &request.body,
            labels: request.labels.iter().map(String::as_str).collect(),
            milestone: request.milestone.map(MilestoneNumber::as_u64),
        }
    }
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct LabelDto {
    id: u64,
    name: String,
    color: String,
    #[serde(default)]
    description: Option<String>,
}

impl From<LabelDto> for Label {
    fn from(dto: LabelDto) -> Self {
        Self {
            id: LabelId::new(dto.id),
            name: dto.name,
            color: dto.color,
            description: dto.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MilestoneDto {
    number: u64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    state: MilestoneState,
}

impl From<MilestoneDto> for Milestone {
    fn from(dto: MilestoneDto) -> Self {
        Self {
            number: MilestoneNumber::new(dto.number),
            title: dto.title,
            description: dto.description,
            state: dto.state,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueDto {
    number: u64,
    html_url: String,
}

impl From<IssueDto> for Issue {
    fn from(dto: IssueDto) -> Self {
        Self {
            number: IssueNumber::new(dto.number),
            html_url: dto.html_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryDto {
    full_name: String,
    html_url: String,
}

impl From<RepositoryDto> for Repository {
    fn from(dto: RepositoryDto) -> Self {
        Self {
            full_name: dto.full_name,
            html_url: dto.html_url,
        }
    }
}

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiErrorDetail {
    fn describe(&self) -> String {
        match (&self.message, &self.field, &self.code) {
            (Some(message), _, _) => message.clone(),
            (None, Some(field), Some(code)) => format!("{field}: {code}"),
            (None, None, Some(code)) => code.clone(),
            _ => "unspecified".to_string(),
        }
    }
}

/// Whether the object a request creates must have a unique name.
///
/// Only then can a validation failure mean "already exists".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Uniqueness {
    /// Labels and milestones.
    UniqueName,
    /// Issues, which are never deduplicated, and reads.
    NotUnique,
}

/// `true` when the response carried `Retry-After` or
/// `x-ratelimit-remaining: 0`.
pub(crate) fn is_rate_limited(headers: &HeaderMap) -> bool {
    headers.contains_key(RETRY_AFTER)
        || headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|remaining| remaining.trim() == "0")
}

/// Maps an unsuccessful response to a [`TrackerError`].
///
/// `rate_limited` comes from [`is_rate_limited`]. `resource` names the object
/// the request was about and is used for `Conflict` and `NotFound`. A 422 is
/// a `Conflict` only for [`Uniqueness::UniqueName`] requests.
pub(crate) fn classify_failure(
    status: u16,
    rate_limited: bool,
    body: &str,
    resource: &str,
    uniqueness: Uniqueness,
) -> TrackerError {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = if parsed.message.is_empty() {
        body.trim().to_string()
    } else {
        parsed.message.clone()
    };

    match status {
        401 => TrackerError::Unauthorized { message },
        403 | 429 if rate_limited || status == 429 => TrackerError::RateLimited { message },
        403 => TrackerError::Unauthorized { message },
        404 => TrackerError::NotFound {
            resource: resource.to_string(),
        },
        422 => {
            let already_exists = parsed
                .errors
                .iter()
                .any(|e| e.code.as_deref() == Some("already_exists"));
            let bare = parsed.errors.is_empty();
            if uniqueness == Uniqueness::UniqueName && (already_exists || bare) {
                TrackerError::Conflict {
                    resource: resource.to_string(),
                }
            } else if bare {
                TrackerError::Validation { message }
            } else {
                let details: Vec<_> = parsed.errors.iter().map(ApiErrorDetail::describe).collect();
                TrackerError::Validation {
                    message: format!("{message} ({})", details.join("; ")),
                }
            }
        }
        _ => TrackerError::Api { status, message },
    }
}

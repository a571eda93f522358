//! The `reqwest`-backed GitHub client.

use std::time::Duration;

use async_trait::async_trait;
use backlog::{
    Issue, IssueRequest, IssueTracker, Label, Milestone, NewLabel, NewMilestone, Repository,
    RepositoryId, TrackerError,
};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::wire::{
    classify_failure, is_rate_limited, CreateIssueBody, CreateLabelBody, CreateMilestoneBody,
    IssueDto, LabelDto, MilestoneDto, RepositoryDto, Uniqueness,
};

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while constructing a [`GithubClient`].
#[derive(Debug, Error)]
pub enum GithubError {
    /// The API base URL could not be parsed or cannot carry a path.
    #[error("invalid API URL '{url}'")]
    InvalidApiUrl {
        /// The rejected URL.
        url: String,
    },

    /// The token contains characters not allowed in an HTTP header.
    #[error("token is not a valid header value")]
    InvalidToken,

    /// The HTTP client could not be built.
    #[error("could not build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Connection settings for [`GithubClient`].
#[derive(Clone)]
pub struct GithubConfig {
    /// REST API base URL (e.g. [`DEFAULT_API_URL`] or `https://ghe.example.com/api/v3`).
    pub api_url: String,
    /// Personal access token or installation token.
    pub token: String,
    /// Target repository.
    pub repository: RepositoryId,
    /// `User-Agent` header value; GitHub rejects requests without one.
    pub user_agent: String,
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("repository", &self.repository)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// [`IssueTracker`] for one GitHub repository.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: Url,
    repository: RepositoryId,
}

impl GithubClient {
    /// Builds a client. Performs no network I/O.
    pub fn new(config: GithubConfig) -> Result<Self, GithubError> {
        let api_url = Url::parse(&config.api_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| GithubError::InvalidApiUrl {
                url: config.api_url.clone(),
            })?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| GithubError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_url,
            repository: config.repository,
        })
    }

    /// Fetches the target repository. Used at startup to validate the token
    /// and repository before any object is created.
    #[instrument(skip(self), fields(repository = %self.repository))]
    pub async fn repository(&self) -> Result<Repository, TrackerError> {
        let url = self.endpoint(&[]);
        let resource = format!("repository '{}'", self.repository);
        let dto: RepositoryDto = self
            .send(self.http.get(url), &resource, Uniqueness::NotUnique)
            .await?;
        Ok(dto.into())
    }

    /// `{api_url}/repos/{owner}/{repo}/{tail...}` with every segment
    /// percent-encoded.
    fn endpoint(&self, tail: &[&str]) -> Url {
        repo_endpoint(&self.api_url, &self.repository, tail)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "GitHub request");
        self.http.request(method, url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
        uniqueness: Uniqueness,
    ) -> Result<T, TrackerError> {
        let response = request.send().await.map_err(|e| TrackerError::Transport {
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| TrackerError::Decode {
                message: e.to_string(),
            });
        }

        let rate_limited = is_rate_limited(response.headers());
        let body = response.text().await.unwrap_or_default();

        let error = classify_failure(status.as_u16(), rate_limited, &body, resource, uniqueness);
        debug!(status = status.as_u16(), error = %error, "GitHub request failed");
        Err(error)
    }
}

fn repo_endpoint(base: &Url, repository: &RepositoryId, tail: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(["repos", repository.owner(), repository.name()])
            .extend(tail);
    }
    url
}

#[async_trait]
impl IssueTracker for GithubClient {
    async fn create_label(&self, label: &NewLabel) -> Result<Label, TrackerError> {
        let request = self
            .request(Method::POST, self.endpoint(&["labels"]))
            .json(&CreateLabelBody::from(label));
        let dto: LabelDto = self
            .send(request, &format!("label '{}'", label.name), Uniqueness::UniqueName)
            .await?;
        Ok(dto.into())
    }

    async fn get_label(&self, name: &str) -> Result<Label, TrackerError> {
        let request = self.request(Method::GET, self.endpoint(&["labels", name]));
        let dto: LabelDto = self
            .send(request, &format!("label '{name}'"), Uniqueness::NotUnique)
            .await?;
        Ok(dto.into())
    }

    async fn create_milestone(&self, milestone: &NewMilestone) -> Result<Milestone, TrackerError> {
        let request = self
            .request(Method::POST, self.endpoint(&["milestones"]))
            .json(&CreateMilestoneBody::from(milestone));
        let dto: MilestoneDto = self
            .send(
                request,
                &format!("milestone '{}'", milestone.title),
                Uniqueness::UniqueName,
            )
            .await?;
        Ok(dto.into())
    }

    async fn list_open_milestones(&self) -> Result<Vec<Milestone>, TrackerError> {
        let mut milestones = Vec::new();
        for page in 1.. {
            let page_param = page.to_string();
            let per_page = PAGE_SIZE.to_string();
            let request = self
                .request(Method::GET, self.endpoint(&["milestones"]))
                .query(&[
                    ("state", "open"),
                    ("per_page", per_page.as_str()),
                    ("page", page_param.as_str()),
                ]);
            let batch: Vec<MilestoneDto> = self
                .send(request, "open milestones", Uniqueness::NotUnique)
                .await?;
            let last = batch.len() < PAGE_SIZE;
            milestones.extend(batch.into_iter().map(Milestone::from));
            if last {
                break;
            }
        }
        Ok(milestones)
    }

    async fn create_issue(&self, request: &IssueRequest) -> Result<Issue, TrackerError> {
        let http_request = self
            .request(Method::POST, self.endpoint(&["issues"]))
            .json(&CreateIssueBody::from(request));
        let dto: IssueDto = self
            .send(
                http_request,
                &format!("issue '{}'", request.title),
                Uniqueness::NotUnique,
            )
            .await?;
        Ok(dto.into())
    }
}

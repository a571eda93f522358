//! GitHub infrastructure adapter.
//!
//! Implements the [`backlog::IssueTracker`] port over the GitHub REST API
//! (v3, `X-GitHub-Api-Version: 2022-11-28`) with `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! All GitHub API details (authentication, pagination, status-code mapping)
//! are handled here; the [`backlog`] crate never sees them.
//!
//! ## Status mapping
//!
//! | Response | [`backlog::TrackerError`] |
//! |----------|---------------------------|
//! | 401 | `Unauthorized` |
//! | 429, or 403 with rate-limit headers | `RateLimited` |
//! | 403 otherwise | `Unauthorized` |
//! | 404 | `NotFound` |
//! | 422 `already_exists` (or no detail) on label/milestone create | `Conflict` |
//! | 422 otherwise | `Validation` |
//! | anything else | `Api` |

mod client;
mod wire;

pub use client::{GithubClient, GithubConfig, GithubError, DEFAULT_API_URL};

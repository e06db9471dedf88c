//! GitHub Releases API client.
//!
//! Queries the REST v3 releases endpoints for a repository's release list
//! and for a single release's detail. Requests carry a bearer token when
//! `GITHUB_TOKEN` is set, which raises the unauthenticated rate limit.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::debug;

use crate::error::QueryError;
use crate::types::{ReleaseDetail, ReleaseSummary, RepoCoordinate};

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Releases fetched per session; one page, newest first.
pub const RELEASE_PAGE_SIZE: usize = 30;

/// Client for the GitHub releases endpoints.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: HttpClient,
    base_url: String,
    token: Option<String>,
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GithubClient {
    /// Creates a client against the public API, picking up `GITHUB_TOKEN`
    /// from the environment when present.
    pub fn new() -> Self {
        let mut client = Self::with_base_url(DEFAULT_BASE_URL);
        client.token = std::env::var("GITHUB_TOKEN").ok();
        client
    }

    /// Creates an unauthenticated client against a custom endpoint (used by
    /// tests to point at a mock server).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.into(),
            token: None,
        }
    }

    /// Fetches one page of a repository's releases, newest first.
    ///
    /// Drafts are skipped. `is_latest` is derived as the first non-prerelease
    /// entry of the page, which matches GitHub's definition of the latest
    /// release (the REST list endpoint carries no such flag itself).
    pub async fn list_releases(
        &self,
        repo: &RepoCoordinate,
        limit: usize,
    ) -> Result<Vec<ReleaseSummary>, QueryError> {
        let url = format!(
            "{}/repos/{}/{}/releases?per_page={}",
            self.base_url,
            repo.owner,
            repo.name,
            limit.min(100)
        );
        let releases: Vec<GithubRelease> = self.get_json(&url).await?;

        let mut latest_seen = false;
        let summaries = releases
            .into_iter()
            .filter(|release| !release.draft)
            .map(|release| {
                let is_latest = !latest_seen && !release.prerelease;
                latest_seen |= is_latest;
                release.into_summary(is_latest)
            })
            .collect::<Vec<_>>();

        debug!(repo = %repo, count = summaries.len(), "fetched release list");
        Ok(summaries)
    }

    /// Fetches the detail (markdown body, author) of one release by tag.
    pub async fn release_detail(
        &self,
        repo: &RepoCoordinate,
        tag: &str,
    ) -> Result<ReleaseDetail, QueryError> {
        let url = format!(
            "{}/repos/{}/{}/releases/tags/{}",
            self.base_url, repo.owner, repo.name, tag
        );
        let release: GithubRelease = self.get_json(&url).await?;

        debug!(repo = %repo, tag, "fetched release detail");
        Ok(ReleaseDetail {
            author_login: release
                .author
                .as_ref()
                .map(|author| author.login.clone())
                .unwrap_or_default(),
            description: release.body.clone().unwrap_or_default(),
            // Whether this tag is the latest release is list-page knowledge;
            // the detail response cannot tell.
            summary: release.into_summary(false),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, QueryError> {
        let mut request = self
            .http
            .get(url)
            .header("User-Agent", "relnotes")
            .header("Accept", "application/vnd.github+json")
            .timeout(REQUEST_TIMEOUT);

        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send().await?;

        if response.status().as_u16() == 429 {
            return Err(QueryError::RateLimited);
        }
        if let Some(remaining) = response.headers().get("X-RateLimit-Remaining")
            && let Ok(remaining) = remaining.to_str()
            && remaining.parse::<u32>() == Ok(0)
        {
            return Err(QueryError::RateLimited);
        }

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GithubError>(&body)
                .map(|error| error.message)
                .unwrap_or(body);
            return Err(QueryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// A release as returned by the REST API.
#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    html_url: String,
    body: Option<String>,
    published_at: Option<String>,
    prerelease: bool,
    #[serde(default)]
    draft: bool,
    author: Option<GithubAuthor>,
}

#[derive(Debug, Deserialize)]
struct GithubAuthor {
    login: String,
}

/// GitHub API error response body.
#[derive(Debug, Deserialize)]
struct GithubError {
    message: String,
}

impl GithubRelease {
    fn into_summary(self, is_latest: bool) -> ReleaseSummary {
        ReleaseSummary {
            tag_name: self.tag_name,
            url: self.html_url,
            published_at: self
                .published_at
                .as_deref()
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                .map(|ts| ts.with_timezone(&Utc)),
            is_latest,
            is_prerelease: self.prerelease,
        }
    }
}

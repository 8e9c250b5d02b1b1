//! GitHub pull request polling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Public GitHub API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors fetching pull requests.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Transport failure, including timeouts
    #[error("GitHub request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-200 response
    #[error("GitHub API returned status: {0}")]
    Status(reqwest::StatusCode),

    /// Body was not a pull request list
    #[error("Error decoding GitHub response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A GitHub user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

/// A pull request as returned by the pulls endpoint.
///
/// Only `number` and `title` feed into issues; the rest is passthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub html_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Anything that can list the open pull requests of one repository.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// `owner/repo`
    fn repository(&self) -> String;

    async fn open_pull_requests(&self) -> Result<Vec<PullRequest>, GitHubError>;
}

/// Repository coordinates and credentials.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    pub token: Option<String>,
}

/// REST client for the GitHub pulls endpoint.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    config: GitHubConfig,
    client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self, GitHubError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("clusterbulb/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, client })
    }

    fn pulls_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/pulls?state=open",
            self.config.api_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repo
        )
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    fn repository(&self) -> String {
        format!("{}/{}", self.config.owner, self.config.repo)
    }

    async fn open_pull_requests(&self) -> Result<Vec<PullRequest>, GitHubError> {
        let mut request = self
            .client
            .get(self.pulls_url())
            .header("Accept", "application/vnd.github+json");

        if let Some(token) = &self.config.token {
            request = request.header("Authorization", format!("token {token}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(GitHubError::Status(status));
        }

        let body = response.bytes().await?;
        let pulls: Vec<PullRequest> = serde_json::from_slice(&body)?;
        debug!(repo = %self.repository(), count = pulls.len(), "Fetched open pull requests");
        Ok(pulls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, token: Option<&str>) -> GitHubClient {
        GitHubClient::new(GitHubConfig {
            api_url: server.uri(),
            owner: "clustershed".to_string(),
            repo: "homelab".to_string(),
            token: token.map(str::to_string),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetches_open_pull_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/clustershed/homelab/pulls"))
            .and(query_param("state", "open"))
            .and(header("Authorization", "token secret"))
            .and(header("Accept", "application/vnd.github+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "number": 12,
                    "title": "Bump cilium",
                    "user": {"login": "renovate"},
                    "state": "open",
                    "html_url": "https://github.com/clustershed/homelab/pull/12",
                    "created_at": "2025-01-02T03:04:05Z",
                    "updated_at": "2025-01-02T03:04:05Z"
                }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let pulls = client(&server, Some("secret"))
            .open_pull_requests()
            .await
            .unwrap();
        assert_eq!(pulls.len(), 1);
        assert_eq!(pulls[0].number, 12);
        assert_eq!(pulls[0].title, "Bump cilium");
        assert_eq!(pulls[0].user.login, "renovate");
    }

    #[tokio::test]
    async fn test_non_200_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client(&server, None).open_pull_requests().await.unwrap_err();
        assert!(matches!(err, GitHubError::Status(s) if s.as_u16() == 403));
    }

    #[tokio::test]
    async fn test_bad_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"message\":\"nope\"}"))
            .mount(&server)
            .await;

        let err = client(&server, None).open_pull_requests().await.unwrap_err();
        assert!(matches!(err, GitHubError::Decode(_)));
    }

    #[test]
    fn test_repository_name() {
        let gh = GitHubClient::new(GitHubConfig {
            api_url: "https://ghe.example.com/api/v3/".to_string(),
            owner: "o".to_string(),
            repo: "r".to_string(),
            token: None,
        })
        .unwrap();
        assert_eq!(gh.repository(), "o/r");
        assert_eq!(
            gh.pulls_url(),
            "https://ghe.example.com/api/v3/repos/o/r/pulls?state=open"
        );
    }
}

//! # GitHub Issue Client
//!
//! REST client for the issue operations the triage agent needs. Failures are
//! returned to the caller untouched; retry and rate-limit handling are left to
//! whoever runs the agent.

use crate::error::{ConfigError, TrackerError};
use crate::tracker::{IssueState, IssueTracker};
use async_trait::async_trait;
use reqwest::{header, Client as HttpClient, Method, Response, Url};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = "triage-agent/1.0";
const EVENTS_PER_PAGE: usize = 100;
const MAX_EVENT_PAGES: u32 = 10;

/// Repository coordinates in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoRef {
    type Err = ConfigError;

    /// Accepts `owner/repo`, `https://github.com/owner/repo` and
    /// `git@github.com:owner/repo.git`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let cleaned = raw
            .trim()
            .trim_end_matches(".git")
            .replace("git@github.com:", "https://github.com/")
            .replace("https://github.com/", "");

        match cleaned.split('/').collect::<Vec<_>>().as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: (*owner).to_string(),
                name: (*name).to_string(),
            }),
            _ => Err(ConfigError::InvalidRepository(raw.to_string())),
        }
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Deserialize)]
struct GitHubError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GitHubIssue {
    number: u64,
    assignee: Option<GitHubUser>,
    #[serde(default)]
    assignees: Vec<GitHubUser>,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
}

#[derive(Debug, Deserialize)]
struct GitHubIssueEvent {
    event: String,
    assignee: Option<GitHubUser>,
    actor: Option<GitHubUser>,
}

/// GitHub API client for issue triage operations
#[derive(Clone)]
pub struct GitHubIssueClient {
    http_client: HttpClient,
    base_url: Url,
    token: String,
    repo: RepoRef,
}

impl GitHubIssueClient {
    /// Create a new client.
    ///
    /// # Errors
    /// Returns `TrackerError::Other` if `api_url` is not a valid URL and
    /// `TrackerError::Http` if the HTTP client cannot be built.
    pub fn new(token: String, repo: RepoRef, api_url: &str) -> Result<Self, TrackerError> {
        let base_url = Url::parse(api_url)
            .map_err(|e| TrackerError::Other(format!("Invalid API URL '{api_url}': {e}")))?;

        let http_client = HttpClient::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            token,
            repo,
        })
    }

    /// Build `{base}/repos/{owner}/{repo}/{segments...}` with each segment
    /// percent-encoded.
    fn repo_url(&self, segments: &[&str]) -> Result<Url, TrackerError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                TrackerError::Other(format!("API URL cannot be a base: {}", self.base_url))
            })?;
            path.pop_if_empty()
                .extend(["repos", self.repo.owner.as_str(), self.repo.name.as_str()])
                .extend(segments);
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<Response, TrackerError> {
        let mut request = self
            .http_client
            .request(method, url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::ACCEPT, "application/vnd.github+json");

        if let Some(body) = body {
            request = request.json(&body);
        }

        Ok(request.send().await?)
    }

    /// Send a request and fail on any non-success status.
    async fn send_ok(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<Response, TrackerError> {
        let response = self.send(method, url, body).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(api_error(response).await)
        }
    }
}

/// Convert an error response into `TrackerError::Api`, keeping GitHub's
/// message when the body carries one.
async fn api_error(response: Response) -> TrackerError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GitHubError>(&text)
        .map(|e| e.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });
    TrackerError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl IssueTracker for GitHubIssueClient {
    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn get_issue(&self, number: u64) -> Result<IssueState, TrackerError> {
        let url = self.repo_url(&["issues", &number.to_string()])?;
        let issue: GitHubIssue = self.send_ok(Method::GET, url, None).await?.json().await?;

        let current_assignee = issue
            .assignee
            .or_else(|| issue.assignees.into_iter().next())
            .map(|user| user.login);

        Ok(IssueState {
            number: issue.number,
            current_assignee,
            current_labels: issue.labels.into_iter().map(|l| l.name).collect(),
        })
    }

    #[instrument(skip(self))]
    async fn label_exists(&self, name: &str) -> Result<bool, TrackerError> {
        let url = self.repo_url(&["labels", name])?;
        let response = self.send(Method::GET, url, None).await?;

        match response.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => Err(api_error(response).await),
        }
    }

    #[instrument(skip(self))]
    async fn create_label(&self, name: &str, color: &str) -> Result<(), TrackerError> {
        let url = self.repo_url(&["labels"])?;
        let body = serde_json::json!({ "name": name, "color": color });
        let response = self.send(Method::POST, url, Some(body)).await?;

        match response.status().as_u16() {
            200 | 201 => {
                info!(label = name, "Created label");
                Ok(())
            }
            422 => {
                // Someone else created it between our check and this call
                debug!(label = name, "Label already exists");
                Ok(())
            }
            _ => Err(api_error(response).await),
        }
    }

    #[instrument(skip(self))]
    async fn add_label(&self, number: u64, label: &str) -> Result<(), TrackerError> {
        let url = self.repo_url(&["issues", &number.to_string(), "labels"])?;
        let body = serde_json::json!({ "labels": [label] });
        self.send_ok(Method::POST, url, Some(body)).await?;
        debug!(issue = number, label, "Added label");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_assignee(&self, number: u64, login: &str) -> Result<(), TrackerError> {
        let url = self.repo_url(&["issues", &number.to_string(), "assignees"])?;
        let body = serde_json::json!({ "assignees": [login] });
        self.send_ok(Method::POST, url, Some(body)).await?;
        debug!(issue = number, assignee = login, "Added assignee");
        Ok(())
    }

    #[instrument(skip(self, body))]
    async fn post_comment(&self, number: u64, body: &str) -> Result<(), TrackerError> {
        let url = self.repo_url(&["issues", &number.to_string(), "comments"])?;
        let payload = serde_json::json!({ "body": body });
        self.send_ok(Method::POST, url, Some(payload)).await?;
        debug!(issue = number, "Posted comment");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_assignment(
        &self,
        number: u64,
        login: &str,
    ) -> Result<Option<String>, TrackerError> {
        for page in 1..=MAX_EVENT_PAGES {
            let mut url = self.repo_url(&["issues", &number.to_string(), "events"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &EVENTS_PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let events: Vec<GitHubIssueEvent> =
                self.send_ok(Method::GET, url, None).await?.json().await?;

            let found = events.iter().find(|e| {
                e.event == "assigned" && e.assignee.as_ref().is_some_and(|a| a.login == login)
            });
            if let Some(event) = found {
                // Deleted accounts show up as "ghost"
                let actor = event
                    .actor
                    .as_ref()
                    .map_or_else(|| "ghost".to_string(), |a| a.login.clone());
                return Ok(Some(actor));
            }

            if events.len() < EVENTS_PER_PAGE {
                return Ok(None);
            }
        }

        warn!(issue = number, pages = MAX_EVENT_PAGES, "Event history exceeds scan limit");
        Err(TrackerError::Other(format!(
            "issue #{number} has more than {} events, assignment history incomplete",
            EVENTS_PER_PAGE * MAX_EVENT_PAGES as usize
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_ref() {
        let expected = RepoRef {
            owner: "owner".to_string(),
            name: "repo".to_string(),
        };
        assert_eq!("owner/repo".parse::<RepoRef>().unwrap(), expected);
        assert_eq!(
            "https://github.com/owner/repo.git"
                .parse::<RepoRef>()
                .unwrap(),
            expected
        );
        assert_eq!(
            "git@github.com:owner/repo.git".parse::<RepoRef>().unwrap(),
            expected
        );
        assert!("invalid".parse::<RepoRef>().is_err());
        assert!("a/b/c".parse::<RepoRef>().is_err());
        assert!("/repo".parse::<RepoRef>().is_err());
    }

    #[test]
    fn test_repo_url_encodes_segments() {
        let client = GitHubIssueClient::new(
            "token".to_string(),
            "owner/repo".parse().unwrap(),
            "https://example.test/api/v3/",
        )
        .unwrap();

        let url = client.repo_url(&["labels", "needs triage"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/api/v3/repos/owner/repo/labels/needs%20triage"
        );
    }
}

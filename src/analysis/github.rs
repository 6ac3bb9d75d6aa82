use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::source::{ActivitySource, REPOS_PER_PAGE};
use crate::config::Config;
use crate::error::{ActivityError, Result};
use crate::types::{Contributor, IssueRecord, RepoSummary};

#[derive(Debug, Deserialize)]
struct ApiContributor {
    login: String,
    contributions: u64,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiIssue {
    title: String,
    user: Option<ApiUser>,
    created_at: DateTime<Utc>,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiProfile {
    location: Option<String>,
}

/// [`ActivitySource`] backed by the GitHub REST API and the W3C list archive.
pub struct HttpSource {
    client: reqwest::Client,
    github_api: String,
    archive_base: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .default_headers(default_headers(config)?)
            .build()
            .map_err(|source| ActivityError::Request {
                url: config.github_api.clone(),
                source,
            })?;

        Ok(Self {
            client,
            github_api: config.github_api.trim_end_matches('/').to_string(),
            archive_base: config.archive_base.trim_end_matches('/').to_string(),
            timeout: config.fetch_timeout,
        })
    }

    async fn get_text(&self, url: &str, headers: HeaderMap) -> Result<Option<String>> {
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|source| self.request_error(url, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ActivityError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        response
            .text()
            .await
            .map(Some)
            .map_err(|source| self.request_error(url, source))
    }

    fn request_error(&self, url: &str, source: reqwest::Error) -> ActivityError {
        if source.is_timeout() {
            ActivityError::Timeout {
                operation: format!("GET {}", url),
                timeout: self.timeout,
            }
        } else {
            ActivityError::Request {
                url: url.to_string(),
                source,
            }
        }
    }

    async fn get_api<T: DeserializeOwned + Default>(&self, url: &str) -> Result<T> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        match self.get_text(url, headers).await? {
            Some(body) => decode(url, &body),
            None => Ok(T::default()),
        }
    }

    async fn get_archive(&self, url: &str) -> Result<String> {
        Ok(self
            .get_text(url, HeaderMap::new())
            .await?
            .unwrap_or_default())
    }
}

fn default_headers(config: &Config) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let agent = HeaderValue::from_str(&config.user_agent).map_err(|e| ActivityError::Decode {
        url: config.github_api.clone(),
        message: format!("invalid user agent: {}", e),
    })?;
    headers.insert(USER_AGENT, agent);

    if let Some(token) = config.github_token.as_deref().filter(|t| !t.is_empty()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
            ActivityError::Decode {
                url: config.github_api.clone(),
                message: format!("invalid auth header: {}", e),
            }
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ActivityError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl ActivitySource for HttpSource {
    async fn org_repos(&self, org: &str, page: u32) -> Result<Vec<RepoSummary>> {
        let url = format!(
            "{}/orgs/{}/repos?per_page={}&page={}",
            self.github_api, org, REPOS_PER_PAGE, page
        );
        self.get_api(&url).await
    }

    async fn contributors(&self, repository: &str, limit: usize) -> Result<Vec<Contributor>> {
        let url = format!(
            "{}/repos/{}/contributors?per_page={}",
            self.github_api, repository, limit
        );
        let contributors: Vec<ApiContributor> = self.get_api(&url).await?;
        Ok(contributors
            .into_iter()
            .take(limit)
            .map(|c| Contributor::new(c.login, c.contributions))
            .collect())
    }

    async fn open_issues(&self, repository: &str, limit: usize) -> Result<Vec<IssueRecord>> {
        let url = format!(
            "{}/repos/{}/issues?state=open&sort=created&direction=desc&per_page={}",
            self.github_api, repository, limit
        );
        let issues: Vec<ApiIssue> = self.get_api(&url).await?;
        Ok(issues
            .into_iter()
            .take(limit)
            .map(|issue| IssueRecord {
                title: issue.title,
                author: issue
                    .user
                    .map(|u| u.login)
                    .unwrap_or_else(|| "ghost".to_string()),
                created_at: issue.created_at,
                url: issue.html_url,
            })
            .collect())
    }

    async fn user_location(&self, login: &str) -> Result<Option<String>> {
        let url = format!("{}/users/{}", self.github_api, login);
        let profile: Option<ApiProfile> = self.get_api(&url).await?;
        Ok(profile
            .and_then(|p| p.location)
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty()))
    }

    async fn mailing_feed(&self, list: &str) -> Result<String> {
        let url = format!("{}/{}/feed.atom", self.archive_base, list);
        self.get_archive(&url).await
    }

    async fn archive_index(&self, list: &str) -> Result<String> {
        let url = format!("{}/{}/", self.archive_base, list);
        self.get_archive(&url).await
    }
}

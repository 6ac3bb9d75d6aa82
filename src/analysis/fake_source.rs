//! In-memory [`ActivitySource`] for tests and offline runs.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::source::{ActivitySource, REPOS_PER_PAGE};
use crate::error::{ActivityError, Result};
use crate::types::{Contributor, IssueRecord, RepoSummary};

#[derive(Default)]
pub struct FakeSource {
    pub repos: Vec<RepoSummary>,
    pub contributors: HashMap<String, Vec<Contributor>>,
    pub issues: HashMap<String, Vec<IssueRecord>>,
    pub locations: HashMap<String, String>,
    pub feeds: HashMap<String, String>,
    pub archives: HashMap<String, String>,
    /// Repositories or lists whose requests fail
    pub failing: HashSet<String>,
    /// Organization listing pages whose requests fail
    pub failing_pages: HashSet<u32>,
    /// Delay applied to every request
    pub latency: Option<Duration>,
    pub calls: AtomicU64,
}

impl FakeSource {
    async fn enter(&self, key: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.contains(key) {
            return Err(ActivityError::Status {
                url: format!("fake://{}", key),
                status: 500,
            });
        }
        Ok(())
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

fn missing(key: &str) -> ActivityError {
    ActivityError::Status {
        url: format!("fake://{}", key),
        status: 404,
    }
}

#[async_trait]
impl ActivitySource for FakeSource {
    async fn org_repos(&self, org: &str, page: u32) -> Result<Vec<RepoSummary>> {
        self.enter(org).await?;
        if self.failing_pages.contains(&page) {
            return Err(ActivityError::Status {
                url: format!("fake://{}?page={}", org, page),
                status: 502,
            });
        }
        Ok(self
            .repos
            .chunks(REPOS_PER_PAGE as usize)
            .nth(page.saturating_sub(1) as usize)
            .map(<[RepoSummary]>::to_vec)
            .unwrap_or_default())
    }

    async fn contributors(&self, repository: &str, limit: usize) -> Result<Vec<Contributor>> {
        self.enter(repository).await?;
        let mut contributors = self.contributors.get(repository).cloned().unwrap_or_default();
        contributors.truncate(limit);
        Ok(contributors)
    }

    async fn open_issues(&self, repository: &str, limit: usize) -> Result<Vec<IssueRecord>> {
        self.enter(repository).await?;
        let mut issues = self.issues.get(repository).cloned().unwrap_or_default();
        issues.truncate(limit);
        Ok(issues)
    }

    async fn user_location(&self, login: &str) -> Result<Option<String>> {
        self.enter(login).await?;
        Ok(self.locations.get(login).cloned())
    }

    async fn mailing_feed(&self, list: &str) -> Result<String> {
        self.enter(list).await?;
        self.feeds.get(list).cloned().ok_or_else(|| missing(list))
    }

    async fn archive_index(&self, list: &str) -> Result<String> {
        self.enter(list).await?;
        self.archives.get(list).cloned().ok_or_else(|| missing(list))
    }
}

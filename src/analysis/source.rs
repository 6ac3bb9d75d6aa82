use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Contributor, IssueRecord, RepoSummary};

/// Page size of organization repository listings; a shorter page is the last one.
pub const REPOS_PER_PAGE: u32 = 100;

/// The remote endpoints activity data is collected from.
///
/// Repositories are addressed as `owner/repo`; mailing lists by their archive
/// identifier.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// One page of an organization's repository listing (1-based).
    async fn org_repos(&self, org: &str, page: u32) -> Result<Vec<RepoSummary>>;

    /// Top contributors of a repository, most active first.
    async fn contributors(&self, repository: &str, limit: usize) -> Result<Vec<Contributor>>;

    /// Most recently created open issues of a repository.
    async fn open_issues(&self, repository: &str, limit: usize) -> Result<Vec<IssueRecord>>;

    /// Public profile location of a user, if they set one.
    async fn user_location(&self, login: &str) -> Result<Option<String>>;

    /// Raw Atom feed document of a mailing list.
    async fn mailing_feed(&self, list: &str) -> Result<String>;

    /// Raw HTML of a mailing list's archive index page.
    async fn archive_index(&self, list: &str) -> Result<String>;
}

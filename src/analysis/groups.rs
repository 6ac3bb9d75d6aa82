//! Resolution of the community groups whose activity is tracked.

use async_trait::async_trait;
use std::sync::Arc;

use super::source::{ActivitySource, REPOS_PER_PAGE};
use crate::error::Result;
use crate::types::{Group, RepoSummary, NO_MAILING_LIST};

/// Safety cap on organization listing pages.
const MAX_REPO_PAGES: u32 = 10;

/// Repository name to mailing-list identifier.
const MAILING_LISTS: &[(&str, &str)] = &[
    ("csswg-drafts", "www-style"),
    ("wcag", "w3c-wai-gl"),
    ("aria", "public-aria"),
    ("webappsec", "public-webappsec"),
    ("webauthn", "public-webauthn"),
    ("i18n-activity", "www-international"),
    ("html-aria", "public-aria"),
    ("wot", "public-wot-ig"),
    ("webrtc-pc", "public-webrtc"),
    ("epub-specs", "public-epub-wg"),
    ("fxtf-drafts", "public-fx"),
    ("svgwg", "www-svg"),
];

/// Produces the ordered list of groups to track.
#[async_trait]
pub trait GroupResolver: Send + Sync {
    /// Name used in cache keys and logs.
    fn name(&self) -> &'static str;

    async fn resolve(&self) -> Result<Vec<Group>>;
}

/// The hand-curated group table.
#[derive(Debug, Clone, Default)]
pub struct StaticGroups;

impl StaticGroups {
    pub fn groups() -> Vec<Group> {
        vec![
            Group::new("CSS Working Group", "w3c/csswg-drafts", "www-style"),
            Group::new("Accessibility Guidelines", "w3c/wcag", "w3c-wai-gl"),
            Group::new("ARIA Working Group", "w3c/aria", "public-aria"),
            Group::new("Web Application Security", "w3c/webappsec", "public-webappsec"),
            Group::new("Web Authentication", "w3c/webauthn", "public-webauthn"),
            Group::new("Internationalization", "w3c/i18n-activity", "www-international"),
        ]
    }
}

#[async_trait]
impl GroupResolver for StaticGroups {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn resolve(&self) -> Result<Vec<Group>> {
        Ok(Self::groups())
    }
}

/// The organization's repositories ranked by open issues and pull requests.
pub struct DynamicGroups<S> {
    source: Arc<S>,
    org: String,
    top_n: usize,
}

impl<S: ActivitySource> DynamicGroups<S> {
    pub fn new(source: Arc<S>, org: impl Into<String>, top_n: usize) -> Self {
        Self {
            source,
            org: org.into(),
            top_n,
        }
    }

    async fn list_repos(&self) -> Result<Vec<RepoSummary>> {
        let mut repos = Vec::new();
        for page in 1..=MAX_REPO_PAGES {
            let batch = self.source.org_repos(&self.org, page).await?;
            let short_page = batch.len() < REPOS_PER_PAGE as usize;
            repos.extend(batch);
            if short_page {
                break;
            }
        }
        Ok(repos)
    }
}

#[async_trait]
impl<S: ActivitySource> GroupResolver for DynamicGroups<S> {
    fn name(&self) -> &'static str {
        "dynamic"
    }

    async fn resolve(&self) -> Result<Vec<Group>> {
        let repos = self.list_repos().await?;
        let groups = rank_repositories(&self.org, repos, self.top_n);
        tracing::info!(org = %self.org, groups = groups.len(), "resolved groups");
        Ok(groups)
    }
}

/// Keep the `top_n` most active unarchived repositories as groups.
pub fn rank_repositories(org: &str, mut repos: Vec<RepoSummary>, top_n: usize) -> Vec<Group> {
    repos.retain(|r| !r.archived);
    repos.sort_by(|a, b| b.open_issues_count.cmp(&a.open_issues_count));
    repos
        .into_iter()
        .take(top_n)
        .map(|repo| {
            let repository = if repo.full_name.is_empty() {
                format!("{}/{}", org, repo.name)
            } else {
                repo.full_name.clone()
            };
            Group::new(
                display_name(&repo.name),
                repository,
                mailing_list_for(&repo.name),
            )
        })
        .collect()
}

/// "i18n-activity" becomes "I18n Activity".
pub fn display_name(repo: &str) -> String {
    repo.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn mailing_list_for(repo: &str) -> &'static str {
    MAILING_LISTS
        .iter()
        .find(|(name, _)| *name == repo)
        .map(|(_, list)| *list)
        .unwrap_or(NO_MAILING_LIST)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fake_source::FakeSource;
    use crate::error::ActivityError;
    use pretty_assertions::assert_eq;

    fn repo(name: &str, open: u64) -> RepoSummary {
        RepoSummary {
            name: name.to_string(),
            full_name: format!("w3c/{}", name),
            open_issues_count: open,
            archived: false,
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("csswg-drafts"), "Csswg Drafts");
        assert_eq!(display_name("i18n-activity"), "I18n Activity");
        assert_eq!(display_name("wcag"), "Wcag");
    }

    #[test]
    fn test_mailing_list_lookup() {
        assert_eq!(mailing_list_for("csswg-drafts"), "www-style");
        assert_eq!(mailing_list_for("some-new-repo"), NO_MAILING_LIST);
    }

    #[test]
    fn test_rank_repositories() {
        let mut archived = repo("old-stuff", 9000);
        archived.archived = true;
        let repos = vec![
            repo("wcag", 800),
            archived,
            repo("csswg-drafts", 3000),
            repo("tiny", 1),
            repo("aria", 800),
        ];

        let groups = rank_repositories("w3c", repos, 3);
        let names: Vec<_> = groups.iter().map(|g| g.repository.as_str()).collect();
        assert_eq!(names, vec!["w3c/csswg-drafts", "w3c/wcag", "w3c/aria"]);
        assert_eq!(groups[0].name, "Csswg Drafts");
        assert_eq!(groups[0].mailing_list, "www-style");
    }

    fn org_source(count: usize) -> FakeSource {
        FakeSource {
            repos: (0..count).map(|i| repo(&format!("repo-{}", i), i as u64 % 50)).collect(),
            ..FakeSource::default()
        }
    }

    #[tokio::test]
    async fn test_dynamic_ranks_across_pages() {
        let mut source = org_source(150);
        source.repos[120] = repo("csswg-drafts", 3000);
        let source = Arc::new(source);

        let groups = DynamicGroups::new(source.clone(), "w3c", 8).resolve().await.unwrap();
        assert_eq!(groups.len(), 8);
        assert_eq!(groups[0].repository, "w3c/csswg-drafts");
        assert_eq!(groups[0].mailing_list, "www-style");
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_dynamic_full_page_requests_next() {
        let source = Arc::new(org_source(100));

        let groups = DynamicGroups::new(source.clone(), "w3c", 8).resolve().await.unwrap();
        assert_eq!(groups.len(), 8);
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_dynamic_later_page_failure_is_fatal() {
        let mut source = org_source(150);
        source.failing_pages.insert(2);

        let err = DynamicGroups::new(Arc::new(source), "w3c", 8)
            .resolve()
            .await
            .unwrap_err();
        assert!(matches!(err, ActivityError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_static_groups() {
        let groups = StaticGroups.resolve().await.unwrap();
        assert_eq!(groups.len(), 6);
        assert!(groups.iter().all(|g| g.mailing_list().is_some()));
    }
}

use futures::future::{join_all, try_join_all};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

use super::feed::{archive_message_count, parse_feed};
use super::source::ActivitySource;
use crate::config::Config;
use crate::error::{ActivityError, Result};
use crate::types::{
    ActivityRow, Contributor, Group, IssueRecord, MailingPost, ViewModel,
};
use crate::utils::aggregation::{
    diversity_breakdown, estimate_prs, merge_contributors, normalize, top_discussions,
    top_mailing,
};
use crate::utils::clock::{Clock, SystemClock};

/// Label for placeholder posts when no group was resolved.
const FALLBACK_GROUP: &str = "W3C";

/// Everything fetched for one group.
#[derive(Debug, Clone)]
struct GroupActivity {
    group: Group,
    contributors: Vec<Contributor>,
    issues: Vec<IssueRecord>,
    posts: Vec<MailingPost>,
    mailing_count: u64,
}

/// Collects activity for a set of groups and builds the [`ViewModel`].
pub struct Aggregator<S, C = SystemClock> {
    source: Arc<S>,
    clock: C,
    config: Config,
}

impl<S: ActivitySource> Aggregator<S, SystemClock> {
    pub fn new(source: Arc<S>, config: Config) -> Self {
        Self::with_clock(source, config, SystemClock)
    }
}

impl<S: ActivitySource, C: Clock> Aggregator<S, C> {
    pub fn with_clock(source: Arc<S>, config: Config, clock: C) -> Self {
        Self {
            source,
            clock,
            config,
        }
    }

    /// Fetch every group concurrently and assemble the view model.
    ///
    /// Contributor and issue fetches are required: one failure aborts the whole
    /// aggregation. Mailing data is optional and degrades to empty per group.
    pub async fn aggregate(&self, groups: &[Group]) -> Result<ViewModel> {
        let start_time = Instant::now();
        let now = self.clock.now();

        let fetched = try_join_all(groups.iter().map(|group| self.fetch_group(group, now))).await?;

        let mut contributors =
            merge_contributors(fetched.iter().map(|g| g.contributors.as_slice()));
        if self.config.resolve_locations {
            self.resolve_locations(&mut contributors).await;
        }

        let activity = activity_rows(&fetched);
        let per_group_issues: Vec<(Group, Vec<IssueRecord>)> = fetched
            .iter()
            .map(|g| (g.group.clone(), g.issues.clone()))
            .collect();
        let discussions = top_discussions(&per_group_issues, self.config.discussion_limit);

        let fallback_group = groups
            .first()
            .map(|g| g.name.as_str())
            .unwrap_or(FALLBACK_GROUP);
        let posts: Vec<MailingPost> = fetched.into_iter().flat_map(|g| g.posts).collect();
        let mailing = top_mailing(posts, self.config.mailing_limit, fallback_group, now);

        let diversity = diversity_breakdown(&contributors);

        tracing::info!(
            groups = groups.len(),
            contributors = contributors.len(),
            elapsed_secs = start_time.elapsed().as_secs_f64(),
            "aggregation complete"
        );

        Ok(ViewModel {
            activity,
            discussions,
            diversity,
            mailing,
            generated_at: now,
        })
    }

    async fn fetch_group(&self, group: &Group, now: DateTime<Utc>) -> Result<GroupActivity> {
        let repository = group.repository.as_str();
        let contributors = self.timed(
            format!("contributors of {}", repository),
            self.source
                .contributors(repository, self.config.contributors_per_group),
        );
        let issues = self.timed(
            format!("issues of {}", repository),
            self.source
                .open_issues(repository, self.config.issues_per_group),
        );
        let mailing = self.fetch_mailing(group, now);

        let (contributors, issues, (posts, mailing_count)) =
            tokio::join!(contributors, issues, mailing);

        Ok(GroupActivity {
            group: group.clone(),
            contributors: contributors.map_err(|e| ActivityError::for_group(repository, e))?,
            issues: issues.map_err(|e| ActivityError::for_group(repository, e))?,
            posts,
            mailing_count,
        })
    }

    /// Posts and monthly message count for a group; failures degrade to empty.
    async fn fetch_mailing(&self, group: &Group, now: DateTime<Utc>) -> (Vec<MailingPost>, u64) {
        let Some(list) = group.mailing_list() else {
            return (Vec::new(), 0);
        };

        let (feed, index) = tokio::join!(
            self.timed(format!("feed of {}", list), self.source.mailing_feed(list)),
            self.timed(format!("archive of {}", list), self.source.archive_index(list)),
        );

        let posts = match feed {
            Ok(document) => parse_feed(&document, &group.name, now, Some(self.config.feed_entries)),
            Err(e) => {
                tracing::warn!(group = %group.repository, list, error = %e, "mailing feed unavailable");
                return (Vec::new(), 0);
            }
        };

        let archived = match index {
            Ok(page) => archive_message_count(&page, now),
            Err(e) => {
                tracing::warn!(group = %group.repository, list, error = %e, "archive index unavailable");
                None
            }
        };
        let count = archived.unwrap_or(posts.len() as u64);

        (posts, count)
    }

    /// Fill in profile locations; a failed lookup leaves the location empty.
    async fn resolve_locations(&self, contributors: &mut [Contributor]) {
        let lookups = contributors.iter().map(|contributor| async move {
            if contributor.location.is_some() {
                return contributor.location.clone();
            }
            let login = contributor.login.as_str();
            match self
                .timed(format!("profile of {}", login), self.source.user_location(login))
                .await
            {
                Ok(location) => location,
                Err(e) => {
                    tracing::warn!(login, error = %e, "profile lookup failed");
                    None
                }
            }
        });
        let locations = join_all(lookups).await;

        for (contributor, location) in contributors.iter_mut().zip(locations) {
            contributor.location = location;
        }
    }

    async fn timed<T>(
        &self,
        operation: String,
        fetch: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let timeout = self.config.fetch_timeout;
        match tokio::time::timeout(timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(ActivityError::Timeout { operation, timeout }),
        }
    }
}

fn activity_rows(fetched: &[GroupActivity]) -> Vec<ActivityRow> {
    let prs: Vec<u64> = fetched.iter().map(|g| estimate_prs(&g.contributors)).collect();
    let mailing: Vec<u64> = fetched.iter().map(|g| g.mailing_count).collect();
    let pr_percentages = normalize(&prs);
    let mailing_percentages = normalize(&mailing);

    fetched
        .iter()
        .enumerate()
        .map(|(i, g)| ActivityRow {
            group: g.group.clone(),
            estimated_prs: prs[i],
            mailing_count: mailing[i],
            pr_percentage: pr_percentages[i],
            mailing_percentage: mailing_percentages[i],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fake_source::FakeSource;
    use crate::types::{Region, NO_MAILING_LIST};
    use crate::utils::clock::FixedClock;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn feed(title: &str, published: &str) -> String {
        format!(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><title>{}</title><published>{}</published><author><name>Ann</name></author></entry></feed>"#,
            title, published
        )
    }

    fn groups() -> Vec<Group> {
        vec![
            Group::new("Group X", "w3c/x", "public-x"),
            Group::new("Group Y", "w3c/y", NO_MAILING_LIST),
        ]
    }

    fn source() -> FakeSource {
        let mut source = FakeSource::default();
        source.contributors.insert(
            "w3c/x".to_string(),
            vec![Contributor::new("a", 120), Contributor::new("b", 30)],
        );
        source
            .contributors
            .insert("w3c/y".to_string(), vec![Contributor::new("a", 10)]);
        source.issues.insert(
            "w3c/y".to_string(),
            vec![IssueRecord {
                title: "Define focus order".to_string(),
                author: "b".to_string(),
                created_at: now(),
                url: "https://github.com/w3c/y/issues/7".to_string(),
            }],
        );
        source
            .feeds
            .insert("public-x".to_string(), feed("Agenda", "2024-03-15T06:00:00Z"));
        source.archives.insert(
            "public-x".to_string(),
            "<li>March 2024: 12 messages</li>".to_string(),
        );
        source.locations.insert("a".to_string(), "Seattle, USA".to_string());
        source
    }

    fn aggregator(source: FakeSource) -> Aggregator<FakeSource, FixedClock> {
        Aggregator::with_clock(Arc::new(source), Config::default(), FixedClock(now()))
    }

    #[tokio::test]
    async fn test_activity_rows() {
        let view = aggregator(source()).aggregate(&groups()).await.unwrap();

        assert_eq!(view.activity.len(), 2);
        let x = &view.activity[0];
        let y = &view.activity[1];
        assert_eq!((x.estimated_prs, x.pr_percentage), (15, 83));
        assert_eq!((y.estimated_prs, y.pr_percentage), (1, 6));
        assert_eq!((x.mailing_count, x.mailing_percentage), (12, 83));
        assert_eq!((y.mailing_count, y.mailing_percentage), (0, 0));
        assert_eq!(view.generated_at, now());
    }

    #[tokio::test]
    async fn test_sections_are_populated() {
        let view = aggregator(source()).aggregate(&groups()).await.unwrap();

        assert_eq!(view.discussions.len(), 1);
        assert_eq!(view.discussions[0].group, "Group Y");

        assert_eq!(view.mailing.len(), 1);
        assert_eq!(view.mailing[0].title, "Agenda");
        assert!(view.mailing[0].is_new);
        assert!(!view.mailing[0].sample);

        assert_eq!(view.diversity.len(), 1);
        assert_eq!(view.diversity[0].region, Region::NorthAmerica);
        assert_eq!(view.diversity[0].percentage, 100);
    }

    #[tokio::test]
    async fn test_archive_failure_falls_back_to_feed_count() {
        let mut source = source();
        source.archives.clear();
        let view = aggregator(source).aggregate(&groups()).await.unwrap();
        assert_eq!(view.activity[0].mailing_count, 1);
    }

    #[tokio::test]
    async fn test_mailing_failure_is_soft() {
        let mut source = source();
        source.failing.insert("public-x".to_string());
        let view = aggregator(source).aggregate(&groups()).await.unwrap();

        assert_eq!(view.activity[0].mailing_count, 0);
        assert!(view.mailing.iter().all(|p| p.sample));
        assert_eq!(view.mailing[0].group, "Group X");
    }

    #[tokio::test]
    async fn test_feed_failure_ignores_archive_count() {
        let mut source = source();
        source.feeds.clear();
        source.archives.insert(
            "public-x".to_string(),
            "March 2024: 12 messages".to_string(),
        );
        let view = aggregator(source).aggregate(&groups()).await.unwrap();

        assert_eq!(view.activity[0].mailing_count, 0);
        assert_eq!(view.activity[0].mailing_percentage, 0);
        assert!(view.mailing.iter().all(|p| p.sample));
    }

    #[tokio::test]
    async fn test_contributor_failure_aborts() {
        let mut source = source();
        source.failing.insert("w3c/y".to_string());
        let err = aggregator(source).aggregate(&groups()).await.unwrap_err();
        assert!(matches!(err, ActivityError::Group { ref repository, .. } if repository == "w3c/y"));
    }

    #[tokio::test]
    async fn test_profile_failure_is_soft() {
        let mut source = source();
        source.failing.insert("a".to_string());
        let view = aggregator(source).aggregate(&groups()).await.unwrap();
        assert_eq!(view.diversity, crate::utils::aggregation::fallback_diversity());
    }

    #[tokio::test]
    async fn test_hung_fetch_times_out() {
        let mut source = source();
        source.latency = Some(Duration::from_millis(500));
        let config = Config {
            fetch_timeout: Duration::from_millis(20),
            ..Config::default()
        };
        let aggregator = Aggregator::with_clock(Arc::new(source), config, FixedClock(now()));

        let err = aggregator.aggregate(&groups()).await.unwrap_err();
        match err {
            ActivityError::Group { source, .. } => {
                assert!(matches!(*source, ActivityError::Timeout { .. }))
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_no_groups() {
        let view = aggregator(FakeSource::default()).aggregate(&[]).await.unwrap();
        assert!(view.activity.is_empty());
        assert!(view.discussions.is_empty());
        assert!(view.mailing.iter().all(|p| p.sample && p.group == FALLBACK_GROUP));
    }
}

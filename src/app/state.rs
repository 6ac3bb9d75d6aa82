use std::fmt;

use crate::analysis::cache::{cache_key, CacheManager, SessionStore};
use crate::analysis::groups::GroupResolver;
use crate::analysis::pipeline::Aggregator;
use crate::analysis::source::ActivitySource;
use crate::types::ViewModel;
use crate::utils::clock::Clock;

/// A display section of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Activity,
    Discussions,
    Diversity,
    Mailing,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Activity,
        Section::Discussions,
        Section::Diversity,
        Section::Mailing,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Section::Activity => "Group Activity",
            Section::Discussions => "Recent Discussions",
            Section::Diversity => "Contributor Diversity",
            Section::Mailing => "Mailing Lists",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Error signal for one section when the aggregation was aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionError {
    pub section: Section,
    pub message: String,
}

/// What the presenter gets to show for one run.
#[derive(Debug, Clone, PartialEq)]
pub enum PageState {
    Ready { view: ViewModel, from_cache: bool },
    Failed(Vec<SectionError>),
}

impl PageState {
    fn failed(error: &dyn std::error::Error) -> Self {
        PageState::Failed(
            Section::ALL
                .iter()
                .map(|&section| SectionError {
                    section,
                    message: format!("Unable to load {}: {}", section.title().to_lowercase(), error),
                })
                .collect(),
        )
    }

    pub fn view(&self) -> Option<&ViewModel> {
        match self {
            PageState::Ready { view, .. } => Some(view),
            PageState::Failed(_) => None,
        }
    }
}

/// Main application state: cache check, group resolution, aggregation, cache store.
pub struct App<S, C, St> {
    resolver: Box<dyn GroupResolver>,
    aggregator: Aggregator<S, C>,
    cache: CacheManager<St>,
    /// Skip the cache read; the result is still stored
    pub refresh: bool,
}

impl<S, C, St> App<S, C, St>
where
    S: ActivitySource,
    C: Clock,
    St: SessionStore,
{
    pub fn new(
        resolver: Box<dyn GroupResolver>,
        aggregator: Aggregator<S, C>,
        cache: CacheManager<St>,
    ) -> Self {
        Self {
            resolver,
            aggregator,
            cache,
            refresh: false,
        }
    }

    pub fn cache(&self) -> &CacheManager<St> {
        &self.cache
    }

    /// Produce the page state, from the cache when possible.
    pub async fn load(&self) -> PageState {
        let key = cache_key(self.resolver.name());

        if !self.refresh {
            if let Some(view) = self.cache.get(&key) {
                tracing::info!(key = %key, "serving cached view model");
                return PageState::Ready {
                    view,
                    from_cache: true,
                };
            }
        }
        tracing::debug!(key = %key, refresh = self.refresh, "cache miss");

        let groups = match self.resolver.resolve().await {
            Ok(groups) => groups,
            Err(e) => {
                tracing::error!(error = %e, "group resolution failed");
                return PageState::failed(&e);
            }
        };

        let view = match self.aggregator.aggregate(&groups).await {
            Ok(view) => view,
            Err(e) => {
                tracing::error!(error = %e, "aggregation failed");
                return PageState::failed(&e);
            }
        };

        if let Err(e) = self.cache.store(&key, &view) {
            tracing::warn!(key = %key, error = %e, "failed to cache view model");
        }

        PageState::Ready {
            view,
            from_cache: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::cache::MemoryStore;
    use crate::analysis::fake_source::FakeSource;
    use crate::analysis::groups::{DynamicGroups, StaticGroups};
    use crate::config::Config;
    use crate::types::{Contributor, RepoSummary};
    use crate::utils::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap())
    }

    fn static_app(source: FakeSource) -> (Arc<FakeSource>, App<FakeSource, FixedClock, MemoryStore>) {
        let source = Arc::new(source);
        let aggregator = Aggregator::with_clock(source.clone(), Config::default(), clock());
        let app = App::new(
            Box::new(StaticGroups),
            aggregator,
            CacheManager::new(MemoryStore::new()),
        );
        (source, app)
    }

    #[tokio::test]
    async fn test_second_load_is_served_from_cache() {
        let (source, app) = static_app(FakeSource::default());

        let first = app.load().await;
        assert!(matches!(first, PageState::Ready { from_cache: false, .. }));
        let calls = source.call_count();

        let second = app.load().await;
        assert!(matches!(second, PageState::Ready { from_cache: true, .. }));
        assert_eq!(source.call_count(), calls);
        assert_eq!(first.view(), second.view());
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() {
        let (source, mut app) = static_app(FakeSource::default());
        app.load().await;
        let calls = source.call_count();

        app.refresh = true;
        let state = app.load().await;
        assert!(matches!(state, PageState::Ready { from_cache: false, .. }));
        assert!(source.call_count() > calls);
    }

    #[tokio::test]
    async fn test_fatal_error_fails_every_section() {
        let mut source = FakeSource::default();
        source.failing.insert("w3c/aria".to_string());
        let (_, app) = static_app(source);

        match app.load().await {
            PageState::Failed(errors) => {
                let sections: Vec<_> = errors.iter().map(|e| e.section).collect();
                assert_eq!(sections, Section::ALL.to_vec());
                assert!(errors.iter().all(|e| e.message.contains("w3c/aria")));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(app.cache().get(&cache_key("static")).is_none());
    }

    #[tokio::test]
    async fn test_dynamic_resolution_failure_is_fatal() {
        let mut source = FakeSource::default();
        source.failing.insert("w3c".to_string());
        let source = Arc::new(source);
        let aggregator = Aggregator::with_clock(source.clone(), Config::default(), clock());
        let app = App::new(
            Box::new(DynamicGroups::new(source.clone(), "w3c", 8)),
            aggregator,
            CacheManager::new(MemoryStore::new()),
        );

        assert!(matches!(app.load().await, PageState::Failed(ref errors) if errors.len() == 4));
    }

    #[tokio::test]
    async fn test_dynamic_groups_feed_the_aggregation() {
        let mut source = FakeSource::default();
        source.repos = vec![
            RepoSummary {
                name: "csswg-drafts".to_string(),
                full_name: "w3c/csswg-drafts".to_string(),
                open_issues_count: 3000,
                archived: false,
            },
            RepoSummary {
                name: "quiet".to_string(),
                full_name: "w3c/quiet".to_string(),
                open_issues_count: 2,
                archived: false,
            },
        ];
        source
            .contributors
            .insert("w3c/csswg-drafts".to_string(), vec![Contributor::new("a", 200)]);
        let source = Arc::new(source);
        let aggregator = Aggregator::with_clock(source.clone(), Config::default(), clock());
        let app = App::new(
            Box::new(DynamicGroups::new(source.clone(), "w3c", 1)),
            aggregator,
            CacheManager::new(MemoryStore::new()),
        );

        let state = app.load().await;
        let view = state.view().expect("view model");
        assert_eq!(view.activity.len(), 1);
        assert_eq!(view.activity[0].group.name, "Csswg Drafts");
        assert_eq!(view.activity[0].estimated_prs, 20);
        assert!(app.cache().get(&cache_key("dynamic")).is_some());
    }
}

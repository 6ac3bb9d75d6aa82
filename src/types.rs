//! # Common Types
//!
//! This module contains the common types used throughout the application for
//! representing tracked groups, the raw records fetched for them, and the
//! display-ready view model that is cached between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel mailing-list identifier for groups without a public list.
pub const NO_MAILING_LIST: &str = "none";

/// A community group whose activity is tracked.
///
/// Identity is the repository identifier (`owner/repo`). Groups are created by a
/// resolver and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Group {
    /// Human readable name shown in the activity table
    pub name: String,
    /// Repository identifier in `owner/repo` form
    pub repository: String,
    /// Mailing-list identifier, or [`NO_MAILING_LIST`]
    pub mailing_list: String,
}

impl Group {
    pub fn new(
        name: impl Into<String>,
        repository: impl Into<String>,
        mailing_list: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            repository: repository.into(),
            mailing_list: mailing_list.into(),
        }
    }

    /// The mailing list to fetch, if the group has one.
    pub fn mailing_list(&self) -> Option<&str> {
        match self.mailing_list.as_str() {
            "" | NO_MAILING_LIST => None,
            list => Some(list),
        }
    }
}

/// A repository contributor as reported by the hosting API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub login: String,
    pub contributions: u64,
    #[serde(default)]
    pub location: Option<String>,
}

impl Contributor {
    pub fn new(login: impl Into<String>, contributions: u64) -> Self {
        Self {
            login: login.into(),
            contributions,
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// An open issue fetched for a repository, before it is tagged with its group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
}

/// A mailing-list post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailingPost {
    pub title: String,
    pub author: String,
    pub link: String,
    /// `None` when the feed entry carried no parseable timestamp
    pub published: Option<DateTime<Utc>>,
    /// Display name of the group the post came from
    pub group: String,
    /// Published less than 24 hours before aggregation
    pub is_new: bool,
    /// Placeholder content shown when no real posts were found
    #[serde(default)]
    pub sample: bool,
}

/// A repository entry from an organization listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    /// Open issues and pull requests combined
    pub open_issues_count: u64,
    #[serde(default)]
    pub archived: bool,
}

/// Coarse geographic region a contributor location is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "North America")]
    NorthAmerica,
    Europe,
    Asia,
    Other,
}

impl Region {
    pub fn label(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "North America",
            Region::Europe => "Europe",
            Region::Asia => "Asia",
            Region::Other => "Other",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the activity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub group: Group,
    /// Contribution total / 10, rounded. A proxy, not an exact PR count.
    pub estimated_prs: u64,
    pub mailing_count: u64,
    pub pr_percentage: u8,
    pub mailing_percentage: u8,
}

/// Share of located contributors in one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiversityRow {
    pub region: Region,
    pub percentage: u8,
}

/// An open issue tagged with the group it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
    pub group: String,
}

/// The display-ready snapshot of every section for one run.
///
/// This is the unit stored in the session cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModel {
    pub activity: Vec<ActivityRow>,
    pub discussions: Vec<Discussion>,
    pub diversity: Vec<DiversityRow>,
    pub mailing: Vec<MailingPost>,
    pub generated_at: DateTime<Utc>,
}

/// A key used for caching view models.
///
/// The key carries an explicit schema version so that a change to the shape of
/// [`ViewModel`] never reads back entries written by older code.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct CacheKey {
    /// Name of the group resolution strategy that produced the entry
    pub strategy: String,
    /// Schema version of the serialized view model
    pub version: u32,
}

impl CacheKey {
    pub const PREFIX: &'static str = "w3c-activity";

    pub fn new(strategy: impl Into<String>, version: u32) -> Self {
        Self {
            strategy: strategy.into(),
            version,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:v{}", Self::PREFIX, self.strategy, self.version)
    }
}

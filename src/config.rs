//! Runtime configuration shared by the resolver, the HTTP source and the
//! aggregation pipeline.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How the list of tracked groups is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// A fixed, hand-curated table of groups
    Static,
    /// The organization's most active repositories by open issue count
    #[default]
    Dynamic,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Static => "static",
            Strategy::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "static" => Ok(Strategy::Static),
            "dynamic" => Ok(Strategy::Dynamic),
            other => Err(format!("unknown group strategy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub github_api: String,
    pub archive_base: String,
    pub org: String,
    pub strategy: Strategy,
    pub github_token: Option<String>,
    pub user_agent: String,
    /// Number of repositories kept by dynamic resolution
    pub top_groups: usize,
    pub contributors_per_group: usize,
    pub issues_per_group: usize,
    /// Feed entries parsed per mailing list
    pub feed_entries: usize,
    pub discussion_limit: usize,
    pub mailing_limit: usize,
    pub fetch_timeout: Duration,
    pub resolve_locations: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_api: "https://api.github.com".to_string(),
            archive_base: "https://lists.w3.org/Archives/Public".to_string(),
            org: "w3c".to_string(),
            strategy: Strategy::default(),
            github_token: None,
            user_agent: concat!("w3c-activity/", env!("CARGO_PKG_VERSION")).to_string(),
            top_groups: 8,
            contributors_per_group: 10,
            issues_per_group: 5,
            feed_entries: 5,
            discussion_limit: 8,
            mailing_limit: 20,
            fetch_timeout: Duration::from_secs(15),
            resolve_locations: true,
        }
    }
}

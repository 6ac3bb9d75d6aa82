//! Pure aggregation steps that turn per-group fetch results into view-model rows.

use chrono::{DateTime, Duration, Utc};
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::analysis::region;
use crate::types::{Contributor, Discussion, DiversityRow, Group, IssueRecord, MailingPost, Region};

/// Multiplier applied to the largest raw value so no bar reaches full width.
pub const SCALE_HEADROOM: f64 = 1.2;

/// Merge contributor lists by login, summing contribution counts.
///
/// Logins keep the position of their first appearance. The first non-empty
/// location seen for a login is kept.
pub fn merge_contributors<'a, I>(lists: I) -> Vec<Contributor>
where
    I: IntoIterator<Item = &'a [Contributor]>,
{
    let mut merged: Vec<Contributor> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for contributor in lists.into_iter().flatten() {
        match index.get(&contributor.login) {
            Some(&i) => {
                let existing = &mut merged[i];
                existing.contributions += contributor.contributions;
                if existing.location.is_none() {
                    existing.location = contributor.location.clone();
                }
            }
            None => {
                index.insert(contributor.login.clone(), merged.len());
                merged.push(contributor.clone());
            }
        }
    }

    merged
}

/// Contribution total divided by ten, rounded half up.
pub fn estimate_prs(contributors: &[Contributor]) -> u64 {
    let total: u64 = contributors.iter().map(|c| c.contributions).sum();
    (total + 5) / 10
}

/// Percentage of `value` against `1.2 × max`, clamped to `0..=100`.
///
/// A zero `max` yields 0 instead of dividing by zero.
pub fn headroom_percentage(value: u64, max: u64) -> u8 {
    if max == 0 {
        return 0;
    }
    let scale = max as f64 * SCALE_HEADROOM;
    (100.0 * value as f64 / scale).round().clamp(0.0, 100.0) as u8
}

/// Normalize a metric across groups against its own maximum.
pub fn normalize(values: &[u64]) -> Vec<u8> {
    let max = values.iter().copied().max().unwrap_or(0);
    values
        .iter()
        .map(|&value| headroom_percentage(value, max))
        .collect()
}

/// Flatten every group's issues, newest first, keeping at most `limit`.
pub fn top_discussions(per_group: &[(Group, Vec<IssueRecord>)], limit: usize) -> Vec<Discussion> {
    let mut discussions: Vec<Discussion> = per_group
        .iter()
        .flat_map(|(group, issues)| {
            issues.iter().map(move |issue| Discussion {
                title: issue.title.clone(),
                author: issue.author.clone(),
                created_at: issue.created_at,
                url: issue.url.clone(),
                group: group.name.clone(),
            })
        })
        .collect();

    discussions.sort_by_key(|d| Reverse(d.created_at));
    discussions.truncate(limit);
    discussions
}

/// Newest posts first, keeping at most `limit`; posts without a timestamp sort last.
///
/// An empty result is replaced with [`sample_posts`].
pub fn top_mailing(
    mut posts: Vec<MailingPost>,
    limit: usize,
    fallback_group: &str,
    now: DateTime<Utc>,
) -> Vec<MailingPost> {
    posts.sort_by_key(|p| Reverse(p.published));
    posts.truncate(limit);
    if posts.is_empty() {
        return sample_posts(fallback_group, now);
    }
    posts
}

/// Placeholder posts shown when no mailing list produced anything.
pub fn sample_posts(group: &str, now: DateTime<Utc>) -> Vec<MailingPost> {
    let samples = [
        ("Sample: Weekly teleconference agenda", "Sample Chair", 1),
        ("Sample: Call for review of the editor's draft", "Sample Editor", 3),
        ("Sample: Minutes from the last meeting", "Sample Scribe", 7),
    ];

    samples
        .iter()
        .map(|(title, author, days_ago)| MailingPost {
            title: title.to_string(),
            author: author.to_string(),
            link: String::new(),
            published: Some(now - Duration::days(*days_ago)),
            group: group.to_string(),
            is_new: false,
            sample: true,
        })
        .collect()
}

/// Share of located contributors per region, largest first.
///
/// Contributors without a location are left out of the denominator. Ties keep
/// the order in which regions were first encountered. When nobody has a
/// location the fixed [`fallback_diversity`] is returned.
pub fn diversity_breakdown(contributors: &[Contributor]) -> Vec<DiversityRow> {
    let mut counts: Vec<(Region, u64)> = Vec::new();
    let mut located = 0u64;

    for location in contributors
        .iter()
        .filter_map(|c| c.location.as_deref())
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        located += 1;
        let region = region::classify(location);
        match counts.iter_mut().find(|(r, _)| *r == region) {
            Some((_, count)) => *count += 1,
            None => counts.push((region, 1)),
        }
    }

    if located == 0 {
        return fallback_diversity();
    }

    let mut rows: Vec<DiversityRow> = counts
        .into_iter()
        .map(|(region, count)| DiversityRow {
            region,
            percentage: (100.0 * count as f64 / located as f64).round().clamp(0.0, 100.0) as u8,
        })
        .collect();
    rows.sort_by_key(|row| Reverse(row.percentage));
    rows
}

pub fn fallback_diversity() -> Vec<DiversityRow> {
    [
        (Region::NorthAmerica, 35),
        (Region::Europe, 30),
        (Region::Asia, 25),
        (Region::Other, 10),
    ]
    .into_iter()
    .map(|(region, percentage)| DiversityRow { region, percentage })
    .collect()
}

//! Mailing-list archive parsing: Atom feeds and the monthly index page.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::types::MailingPost;

pub const UNTITLED_POST: &str = "(no subject)";
pub const UNKNOWN_AUTHOR: &str = "Unknown";

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern"));

#[derive(Clone, Copy, PartialEq)]
enum Field {
    None,
    Title,
    Published,
    Updated,
    AuthorName,
}

#[derive(Default)]
struct EntryBuilder {
    title: Option<String>,
    link: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    author: Option<String>,
}

impl EntryBuilder {
    fn push_text(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::None => return,
            Field::Title => &mut self.title,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
            Field::AuthorName => &mut self.author,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    fn set_link(&mut self, element: &BytesStart<'_>) {
        if self.link.is_some() {
            return;
        }
        let rel = element
            .try_get_attribute("rel")
            .ok()
            .flatten()
            .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
        if matches!(rel.as_deref(), Some(rel) if rel != "alternate") {
            return;
        }
        if let Ok(Some(href)) = element.try_get_attribute("href") {
            if let Ok(value) = href.unescape_value() {
                self.link = Some(value.into_owned());
            }
        }
    }

    fn build(self, group: &str, now: DateTime<Utc>) -> MailingPost {
        let title = non_empty(self.title).unwrap_or_else(|| UNTITLED_POST.to_string());
        let published = non_empty(self.published)
            .or_else(|| non_empty(self.updated))
            .and_then(|raw| parse_timestamp(&raw));
        let is_new = published
            .map(|at| now.signed_duration_since(at) < Duration::hours(24))
            .unwrap_or(false);

        MailingPost {
            title,
            author: non_empty(self.author).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            link: self.link.unwrap_or_default(),
            published,
            group: group.to_string(),
            is_new,
            sample: false,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an RFC 3339 (Atom) or RFC 2822 timestamp.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Parse an Atom feed into posts attributed to `group`.
///
/// Entries keep document order. At most `limit` entries are returned when a
/// limit is given. A document that is not well-formed yields no posts.
pub fn parse_feed(
    document: &str,
    group: &str,
    now: DateTime<Utc>,
    limit: Option<usize>,
) -> Vec<MailingPost> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(true);

    let mut posts = Vec::new();
    let mut entry: Option<EntryBuilder> = None;
    let mut field = Field::None;
    let mut in_author = false;

    loop {
        if limit.is_some_and(|limit| posts.len() >= limit) {
            break;
        }
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"entry" => {
                    entry = Some(EntryBuilder::default());
                    field = Field::None;
                    in_author = false;
                }
                b"author" if entry.is_some() => in_author = true,
                b"name" if in_author => field = Field::AuthorName,
                b"title" if entry.is_some() && !in_author => field = Field::Title,
                b"published" if entry.is_some() => field = Field::Published,
                b"updated" if entry.is_some() => field = Field::Updated,
                b"link" => {
                    if let Some(entry) = entry.as_mut() {
                        entry.set_link(&e);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"link" {
                    if let Some(entry) = entry.as_mut() {
                        entry.set_link(&e);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(entry), Ok(text)) = (entry.as_mut(), t.unescape()) {
                    entry.push_text(field, &text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(entry) = entry.as_mut() {
                    entry.push_text(field, &String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"entry" => {
                    if let Some(done) = entry.take() {
                        posts.push(done.build(group, now));
                    }
                    field = Field::None;
                    in_author = false;
                }
                b"author" => in_author = false,
                b"title" | b"published" | b"updated" | b"name" => field = Field::None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(group, error = %e, "discarding malformed feed document");
                return Vec::new();
            }
        }
    }

    posts
}

/// Extract the "<Month> <Year>: N messages" count for the month containing `now`
/// from an archive index page.
pub fn archive_message_count(page: &str, now: DateTime<Utc>) -> Option<u64> {
    let text = TAG.replace_all(page, " ");
    let pattern = format!(
        r"(?i){}\s+{}\s*:\s*(\d+)\s+messages?",
        now.format("%B"),
        now.format("%Y")
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

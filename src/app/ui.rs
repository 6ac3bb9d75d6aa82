use chrono::{DateTime, Utc};
use std::io::{self, Write};

use super::state::{PageState, Section, SectionError};
use crate::types::{ActivityRow, Discussion, DiversityRow, MailingPost};
use crate::utils::clock::relative_time;

const BAR_WIDTH: usize = 30;

/// Rendering surface for the page sections.
///
/// The pipeline hands over plain data; implementations decide how it looks.
pub trait Presenter {
    fn activity(&mut self, rows: &[ActivityRow]) -> io::Result<()>;
    fn discussions(&mut self, items: &[Discussion], now: DateTime<Utc>) -> io::Result<()>;
    fn diversity(&mut self, rows: &[DiversityRow]) -> io::Result<()>;
    fn mailing(&mut self, posts: &[MailingPost], now: DateTime<Utc>) -> io::Result<()>;
    fn error(&mut self, error: &SectionError) -> io::Result<()>;
}

/// Draw every section of `state`.
pub fn draw_ui<P: Presenter>(presenter: &mut P, state: &PageState, now: DateTime<Utc>) -> io::Result<()> {
    match state {
        PageState::Ready { view, .. } => {
            presenter.activity(&view.activity)?;
            presenter.discussions(&view.discussions, now)?;
            presenter.diversity(&view.diversity)?;
            presenter.mailing(&view.mailing, now)
        }
        PageState::Failed(errors) => errors.iter().try_for_each(|e| presenter.error(e)),
    }
}

/// Plain text output for terminals.
pub struct TextPresenter<W> {
    out: W,
}

impl<W: Write> TextPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn heading(&mut self, section: Section) -> io::Result<()> {
        writeln!(self.out, "\n{}", section.title())?;
        writeln!(self.out, "{}", "=".repeat(section.title().len()))
    }
}

fn bar(percentage: u8) -> String {
    let filled = BAR_WIDTH * percentage.min(100) as usize / 100;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn activity(&mut self, rows: &[ActivityRow]) -> io::Result<()> {
        self.heading(Section::Activity)?;
        if rows.is_empty() {
            return writeln!(self.out, "No groups tracked.");
        }
        for row in rows {
            writeln!(self.out, "{}", row.group.name)?;
            writeln!(
                self.out,
                "  PRs   {} ~{}",
                bar(row.pr_percentage),
                row.estimated_prs
            )?;
            writeln!(
                self.out,
                "  Mail  {} {}",
                bar(row.mailing_percentage),
                row.mailing_count
            )?;
        }
        Ok(())
    }

    fn discussions(&mut self, items: &[Discussion], now: DateTime<Utc>) -> io::Result<()> {
        self.heading(Section::Discussions)?;
        if items.is_empty() {
            return writeln!(self.out, "No open discussions.");
        }
        for item in items {
            writeln!(self.out, "- {} [{}]", item.title, item.group)?;
            writeln!(
                self.out,
                "  by {}, {}  {}",
                item.author,
                relative_time(Some(item.created_at), now),
                item.url
            )?;
        }
        Ok(())
    }

    fn diversity(&mut self, rows: &[DiversityRow]) -> io::Result<()> {
        self.heading(Section::Diversity)?;
        for row in rows {
            writeln!(
                self.out,
                "{:<14} {} {:>3}%",
                row.region.label(),
                bar(row.percentage),
                row.percentage
            )?;
        }
        Ok(())
    }

    fn mailing(&mut self, posts: &[MailingPost], now: DateTime<Utc>) -> io::Result<()> {
        self.heading(Section::Mailing)?;
        for post in posts {
            let marker = if post.sample {
                " (sample)"
            } else if post.is_new {
                " NEW"
            } else {
                ""
            };
            writeln!(self.out, "- {}{} [{}]", post.title, marker, post.group)?;
            writeln!(
                self.out,
                "  {}, {}",
                post.author,
                relative_time(post.published, now)
            )?;
            if !post.link.is_empty() {
                writeln!(self.out, "  {}", post.link)?;
            }
        }
        Ok(())
    }

    fn error(&mut self, error: &SectionError) -> io::Result<()> {
        self.heading(error.section)?;
        writeln!(self.out, "Error: {}", error.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Group, Region, ViewModel};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn render(state: &PageState) -> String {
        let mut presenter = TextPresenter::new(Vec::new());
        draw_ui(&mut presenter, state, now()).unwrap();
        String::from_utf8(presenter.into_inner()).unwrap()
    }

    #[test]
    fn test_bar_width() {
        assert_eq!(bar(0), ".".repeat(BAR_WIDTH));
        assert_eq!(bar(100), "#".repeat(BAR_WIDTH));
        assert_eq!(bar(50).matches('#').count(), 15);
    }

    #[test]
    fn test_render_ready_view() {
        let view = ViewModel {
            activity: vec![ActivityRow {
                group: Group::new("CSS Working Group", "w3c/csswg-drafts", "www-style"),
                estimated_prs: 15,
                mailing_count: 12,
                pr_percentage: 83,
                mailing_percentage: 83,
            }],
            discussions: Vec::new(),
            diversity: vec![DiversityRow {
                region: Region::Asia,
                percentage: 100,
            }],
            mailing: vec![MailingPost {
                title: "Agenda".to_string(),
                author: "Ann".to_string(),
                link: String::new(),
                published: Some(now() - chrono::Duration::hours(2)),
                group: "CSS Working Group".to_string(),
                is_new: true,
                sample: false,
            }],
            generated_at: now(),
        };

        let text = render(&PageState::Ready {
            view,
            from_cache: false,
        });
        assert!(text.contains("CSS Working Group"));
        assert!(text.contains("~15"));
        assert!(text.contains("No open discussions."));
        assert!(text.contains("Asia"));
        assert!(text.contains("Agenda NEW"));
        assert!(text.contains("2 hours ago"));
    }

    #[test]
    fn test_render_errors_per_section() {
        let errors = Section::ALL
            .iter()
            .map(|&section| SectionError {
                section,
                message: "offline".to_string(),
            })
            .collect();

        let text = render(&PageState::Failed(errors));
        assert_eq!(text.matches("Error: offline").count(), 4);
        assert!(text.contains("Mailing Lists"));
    }
}

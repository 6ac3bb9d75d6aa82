use chrono::{DateTime, Duration, Utc};

/// Source of the current time.
///
/// Aggregation and rendering read "now" through this trait so tests can pin it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Format `then` relative to `now` for display.
pub fn relative_time(then: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(then) = then else {
        return "unknown date".to_string();
    };

    let elapsed = now.signed_duration_since(then);
    if elapsed < Duration::minutes(1) {
        "just now".to_string()
    } else if elapsed < Duration::hours(1) {
        plural(elapsed.num_minutes(), "minute")
    } else if elapsed < Duration::days(1) {
        plural(elapsed.num_hours(), "hour")
    } else if elapsed < Duration::days(30) {
        plural(elapsed.num_days(), "day")
    } else {
        then.format("%Y-%m-%d").to_string()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

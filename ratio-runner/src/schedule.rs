//! Daily schedule arithmetic for the worker.

use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};

/// Next instant strictly after `now` whose UTC wall-clock time is `daily_at`.
pub fn next_run_after(now: DateTime<Utc>, daily_at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(daily_at).and_utc();
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// How long to sleep from `now` until the next run.
pub fn until_next_run(now: DateTime<Utc>, daily_at: NaiveTime) -> Duration {
    (next_run_after(now, daily_at) - now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

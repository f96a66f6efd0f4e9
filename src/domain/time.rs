//! Date/time helpers: local "now", Arabic display formatting, deadline parsing and the
//! remaining-time phrase shown next to each assignment.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt::Display;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Current time in the configured zone.
pub fn now_in(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

/// `2025-10-20 الساعة 23:59`, or just the date when `include_time` is false.
pub fn format_datetime<T: TimeZone>(dt: &DateTime<T>, include_time: bool) -> String
where
    T::Offset: Display,
{
    let date = dt.format(DATE_FORMAT).to_string();
    if include_time {
        format!("{} الساعة {}", date, dt.format(TIME_FORMAT))
    } else {
        date
    }
}

/// Parse `YYYY-MM-DD` plus optional `HH:MM` as a local time in `tz`.
/// Returns None on malformed input or a nonexistent local time (DST gap).
pub fn parse_datetime(date: &str, time: Option<&str>, tz: Tz) -> Option<DateTime<FixedOffset>> {
    let date = date.trim();
    let naive = match time.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => {
            NaiveDateTime::parse_from_str(&format!("{} {}", date, t), DATETIME_FORMAT).ok()?
        }
        None => chrono::NaiveDate::parse_from_str(date, DATE_FORMAT)
            .ok()?
            .and_hms_opt(0, 0, 0)?,
    };
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

/// Read a stored timestamp: RFC 3339 (deadlines) or SQLite `CURRENT_TIMESTAMP` (UTC).
pub fn parse_stored_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|n| Utc.from_utc_datetime(&n).fixed_offset())
}

pub fn is_deadline_passed<A: TimeZone, B: TimeZone>(
    deadline: &DateTime<A>,
    now: &DateTime<B>,
) -> bool {
    now > deadline
}

fn plural(n: i64, one: &str, two: &str, few: &str, many: &str) -> String {
    match n {
        1 => one.to_string(),
        2 => two.to_string(),
        3..=10 => format!("{} {}", n, few),
        _ => format!("{} {}", n, many),
    }
}

/// Arabic phrase for the time left until `deadline`, e.g. `يومان و 5 ساعات`.
/// Minutes are only shown when less than a day remains.
pub fn remaining_time<A: TimeZone, B: TimeZone>(deadline: &DateTime<A>, now: &DateTime<B>) -> String {
    if is_deadline_passed(deadline, now) {
        return "انتهى الموعد".to_string();
    }
    let secs = deadline
        .clone()
        .with_timezone(&Utc)
        .signed_duration_since(now.clone().with_timezone(&Utc))
        .num_seconds();
    let days = secs / 86_400;
    let rest = secs % 86_400;
    let hours = rest / 3600;
    let minutes = (rest % 3600) / 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(plural(days, "يوم واحد", "يومان", "أيام", "يوماً"));
    }
    if hours > 0 {
        parts.push(plural(hours, "ساعة واحدة", "ساعتان", "ساعات", "ساعة"));
    }
    if days == 0 && minutes > 0 {
        parts.push(plural(minutes, "دقيقة واحدة", "دقيقتان", "دقائق", "دقيقة"));
    }
    if parts.is_empty() {
        return "أقل من دقيقة".to_string();
    }
    parts.join(" و ")
}

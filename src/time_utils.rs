// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and calendar bucketing.
//!
//! Two different "this week" definitions coexist on purpose: visit
//! summaries use a rolling week anchored at today, the task list uses the
//! Sunday-to-Saturday calendar week. Do not unify them; clients render
//! different numbers depending on which screen asked.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, SecondsFormat, TimeZone, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC3339 timestamp into UTC. Returns None on malformed input
/// (old documents occasionally carry bare dates).
pub fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Half-open UTC time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }
}

/// Local midnight of the given instant, expressed in UTC.
fn local_midnight_utc(now: DateTime<FixedOffset>) -> DateTime<Utc> {
    let offset_secs = i64::from(now.offset().local_minus_utc());
    let midnight_local = now.date_naive().and_time(NaiveTime::MIN);
    Utc.from_utc_datetime(&(midnight_local - Duration::seconds(offset_secs)))
}

/// "Today": `[local midnight, local midnight + 24h)`.
pub fn today_range(now: DateTime<FixedOffset>) -> DateRange {
    let start = local_midnight_utc(now);
    DateRange {
        start,
        end: start + Duration::days(1),
    }
}

/// "This week" as the visit summary screens define it: the seven days
/// starting today, anchored to the query moment rather than the calendar.
pub fn rolling_week_range(now: DateTime<FixedOffset>) -> DateRange {
    let start = local_midnight_utc(now);
    DateRange {
        start,
        end: start + Duration::days(7),
    }
}

/// "This week" as the task list defines it: Sunday through Saturday of
/// the current calendar week.
pub fn calendar_week_range(now: DateTime<FixedOffset>) -> DateRange {
    let today = local_midnight_utc(now);
    let days_from_sunday = i64::from(now.weekday().num_days_from_sunday());
    let start = today - Duration::days(days_from_sunday);
    DateRange {
        start,
        end: start + Duration::days(7),
    }
}

/// "This month": from today through the end of the calendar month.
pub fn month_range(now: DateTime<FixedOffset>) -> DateRange {
    let start = local_midnight_utc(now);

    let date = now.date_naive();
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let first_of_next = chrono::NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or(date)
        .and_time(NaiveTime::MIN);
    let offset_secs = i64::from(now.offset().local_minus_utc());
    let end = Utc.from_utc_datetime(&(first_of_next - Duration::seconds(offset_secs)));

    DateRange { start, end }
}

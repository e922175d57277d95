//! Bucket arithmetic shared by the write and the read path.
//!
//! All boundaries are laid out on the local timeline of the store's time
//! zone, minute/hour/day buckets are fixed-width while month/year buckets
//! follow the calendar, so stepping between them never assumes a number of
//! days.

use chrono::{
    DateTime, Datelike, FixedOffset, Months, NaiveDate, NaiveDateTime,
    NaiveTime, TimeDelta, Utc,
};

use crate::Resolution;

/// Returns the start of the `resolution` bucket which contains `instant`,
/// `None` if the instant or its bucket start can't be expressed on the
/// zone's local timeline
pub fn aligned_start(
    instant: DateTime<Utc>,
    resolution: Resolution,
    zone: FixedOffset,
) -> Option<DateTime<Utc>> {
    let local = instant.naive_utc().checked_add_offset(zone)?;
    let start = match resolution.fixed_width() {
        Some(width) => truncate_fixed(local, width)?,
        None if resolution == Resolution::Month => month_start(local.date())?,
        None => year_start(local.date())?,
    };
    to_utc(start, zone)
}

/// Returns the start of the bucket preceding the one containing
/// `bucket_start`, `None` if that would leave the representable calendar
pub fn previous(
    bucket_start: DateTime<Utc>,
    resolution: Resolution,
    zone: FixedOffset,
) -> Option<DateTime<Utc>> {
    let start = aligned_start(bucket_start, resolution, zone)?;
    if let Some(width) = resolution.fixed_width() {
        return start.checked_sub_signed(width);
    }
    let months = match resolution {
        Resolution::Month => 1,
        _ => 12,
    };
    let local = start.naive_utc().checked_add_offset(zone)?;
    to_utc(local.checked_sub_months(Months::new(months))?, zone)
}

/// Returns `count` consecutive bucket starts ordered oldest to newest, the
/// last one being the bucket which contains `end`.
///
/// `None` is returned if the window reaches past the representable calendar.
pub fn sequence(
    end: DateTime<Utc>,
    resolution: Resolution,
    count: usize,
    zone: FixedOffset,
) -> Option<Vec<DateTime<Utc>>> {
    let mut buckets = Vec::with_capacity(count);
    if count == 0 {
        return Some(buckets);
    }
    let mut current = aligned_start(end, resolution, zone)?;
    buckets.push(current);
    for _ in 1..count {
        current = previous(current, resolution, zone)?;
        buckets.push(current);
    }
    buckets.reverse();
    Some(buckets)
}

fn truncate_fixed(
    local: NaiveDateTime,
    width: TimeDelta,
) -> Option<NaiveDateTime> {
    let secs = local.and_utc().timestamp();
    let aligned = secs - secs.rem_euclid(width.num_seconds());
    DateTime::from_timestamp(aligned, 0).map(|t| t.naive_utc())
}

fn month_start(date: NaiveDate) -> Option<NaiveDateTime> {
    Some(date.with_day(1)?.and_time(NaiveTime::MIN))
}

fn year_start(date: NaiveDate) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(date.year(), 1, 1)
        .map(|date| date.and_time(NaiveTime::MIN))
}

fn to_utc(local: NaiveDateTime, zone: FixedOffset) -> Option<DateTime<Utc>> {
    local.checked_sub_offset(zone).map(|utc| utc.and_utc())
}

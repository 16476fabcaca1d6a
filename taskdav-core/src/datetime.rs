//! Conversion between local millisecond timestamps and iCalendar date values.
//!
//! All conversions take the local zone explicitly so results do not depend on
//! the machine running them.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use tracing::warn;

use crate::vtodo::TodoTime;

/// The zone local timestamps are interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalZone(Tz);

impl LocalZone {
    pub const UTC: LocalZone = LocalZone(Tz::UTC);

    pub fn new(tz: Tz) -> Self {
        LocalZone(tz)
    }

    /// Look up an IANA zone name, falling back to UTC when it is unknown.
    pub fn from_name(name: &str) -> Self {
        match name.parse::<Tz>() {
            Ok(tz) => LocalZone(tz),
            Err(_) => {
                warn!(zone = name, "Unknown time zone, using UTC");
                LocalZone::UTC
            }
        }
    }

    /// The zone configured on this machine, or UTC if it can't be determined.
    pub fn system() -> Self {
        match iana_time_zone::get_timezone() {
            Ok(name) => Self::from_name(&name),
            Err(e) => {
                warn!(error = %e, "Could not determine system time zone, using UTC");
                LocalZone::UTC
            }
        }
    }

    pub fn tz(&self) -> Tz {
        self.0
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    pub fn is_utc(&self) -> bool {
        matches!(
            self.0.name(),
            "UTC" | "Etc/UTC" | "UCT" | "Etc/UCT" | "Zulu" | "Etc/Zulu" | "Universal" | "Etc/Universal"
        )
    }

    /// Local wall-clock time of a timestamp.
    pub fn naive_local(&self, millis: i64) -> NaiveDateTime {
        utc_from_millis(millis)
            .with_timezone(&self.0)
            .naive_local()
    }

    /// Timestamp of a local wall-clock time. Times skipped by a DST jump are
    /// moved forward by the size of the gap.
    pub fn millis_from_local(&self, naive: &NaiveDateTime) -> i64 {
        resolve_local(&self.0, naive)
            .map(|dt| dt.timestamp_millis())
            .unwrap_or_else(|| naive.and_utc().timestamp_millis())
    }
}

fn resolve_local(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz
            .from_local_datetime(&(*naive + Duration::hours(1)))
            .earliest(),
    }
}

pub fn utc_from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// Local midnight at the start of the day containing `millis`.
pub fn start_of_day(millis: i64, zone: &LocalZone) -> i64 {
    if millis <= 0 {
        return millis;
    }
    let date = zone.naive_local(millis).date();
    local_midnight(date, zone)
}

pub fn start_of_minute(millis: i64) -> i64 {
    if millis <= 0 {
        return millis;
    }
    millis - millis.rem_euclid(60_000)
}

fn local_midnight(date: NaiveDate, zone: &LocalZone) -> i64 {
    zone.millis_from_local(&date.and_time(NaiveTime::default()))
}

/// Encode a local timestamp as a DUE/DTSTART value.
///
/// Returns `None` for unset timestamps. All-day values become a DATE on the
/// local calendar day; timed values carry the local zone (or a UTC `Z` value
/// when the local zone is UTC).
pub fn to_remote_time(millis: i64, all_day: bool, zone: &LocalZone) -> Option<TodoTime> {
    if millis <= 0 {
        return None;
    }
    if all_day {
        return Some(TodoTime::Date(zone.naive_local(millis).date()));
    }
    let utc = utc_from_millis(millis).with_nanosecond(0)?;
    if zone.is_utc() {
        Some(TodoTime::DateTimeUtc(utc))
    } else {
        Some(TodoTime::DateTimeZoned {
            datetime: utc.with_timezone(&zone.tz()).naive_local(),
            tzid: zone.name().to_string(),
        })
    }
}

/// Decode a DUE/DTSTART value into a local timestamp, `0` when absent.
///
/// Dates map to local midnight. Floating times and TZIDs chrono-tz doesn't
/// know are read as local wall-clock time.
pub fn to_local_millis(time: Option<&TodoTime>, zone: &LocalZone) -> i64 {
    match time {
        None => 0,
        Some(TodoTime::Date(date)) => local_midnight(*date, zone),
        Some(TodoTime::DateTimeUtc(dt)) => dt.timestamp_millis(),
        Some(TodoTime::DateTimeFloating(naive)) => zone.millis_from_local(naive),
        Some(TodoTime::DateTimeZoned { datetime, tzid }) => match tzid.parse::<Tz>() {
            Ok(tz) => LocalZone(tz).millis_from_local(datetime),
            Err(_) => zone.millis_from_local(datetime),
        },
    }
}

/// The TZID of a zoned value when chrono-tz doesn't know it, meaning
/// `to_local_millis` reads it as local time.
pub fn unknown_tzid(time: &TodoTime) -> Option<&str> {
    match time {
        TodoTime::DateTimeZoned { tzid, .. } if tzid.parse::<Tz>().is_err() => Some(tzid.as_str()),
        _ => None,
    }
}

/// Parse a bare DATE or DATE-TIME literal (no TZID parameter available).
pub fn parse_date_value(value: &str) -> Option<TodoTime> {
    let value = value.trim();
    if value.len() == 8 {
        return NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .map(TodoTime::Date);
    }
    match value.strip_suffix('Z') {
        Some(utc) => NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .ok()
            .map(|dt| TodoTime::DateTimeUtc(dt.and_utc())),
        None => NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
            .ok()
            .map(TodoTime::DateTimeFloating),
    }
}

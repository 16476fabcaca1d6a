//! RRULE translation.
//!
//! Local tasks keep the rule text and its end bound separately: the rule in
//! `recurrence`, the bound in `repeat_until`. Remotely the bound lives in the
//! rule's UNTIL part.

use rrule::{RRule, Unvalidated};

use crate::datetime::{LocalZone, parse_date_value, to_local_millis, utc_from_millis};
use crate::error::{TaskDavError, TaskDavResult};

fn strip_prefix(rule: &str) -> &str {
    let rule = rule.trim();
    match rule.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("RRULE:") => &rule[6..],
        _ => rule,
    }
}

fn is_part(part: &str, name: &str) -> bool {
    part.split_once('=')
        .is_some_and(|(key, _)| key.trim().eq_ignore_ascii_case(name))
}

/// Build the RRULE value for a local rule, replacing any UNTIL with
/// `repeat_until` (UTC) when it is set.
///
/// COUNT is dropped when an UNTIL is written; RFC 5545 forbids both.
pub fn to_remote_rrule(rule: &str, repeat_until: i64) -> TaskDavResult<String> {
    let mut parts: Vec<&str> = strip_prefix(rule)
        .split(';')
        .filter(|p| !p.trim().is_empty() && !is_part(p, "UNTIL"))
        .collect();

    if repeat_until > 0 {
        parts.retain(|p| !is_part(p, "COUNT"));
    }

    let base = parts.join(";");
    base.parse::<RRule<Unvalidated>>()
        .map_err(|e| TaskDavError::Recurrence(format!("'{}': {}", rule, e)))?;

    if repeat_until > 0 {
        let until = utc_from_millis(repeat_until).format("%Y%m%dT%H%M%SZ");
        Ok(format!("{};UNTIL={}", base, until))
    } else {
        Ok(base)
    }
}

/// Local form of a remote RRULE: the rule text as received and the UNTIL
/// bound as a local timestamp (0 when there is none).
pub fn from_remote_rrule(rrule: &str, zone: &LocalZone) -> (String, i64) {
    let rule = strip_prefix(rrule);
    let repeat_until = rule
        .split(';')
        .find(|p| is_part(p, "UNTIL"))
        .and_then(|p| p.split_once('='))
        .and_then(|(_, value)| parse_date_value(value))
        .map(|until| to_local_millis(Some(&until), zone))
        .unwrap_or(0);

    (rule.to_string(), repeat_until)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_rule_without_bound_is_unchanged() {
        assert_eq!(
            to_remote_rrule("RRULE:FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE", 0).unwrap(),
            "FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE"
        );
    }

    #[test]
    fn test_repeat_until_replaces_existing_until() {
        let until = Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap();
        let rule = to_remote_rrule(
            "FREQ=DAILY;UNTIL=20240301T000000Z",
            until.timestamp_millis(),
        )
        .unwrap();
        assert_eq!(rule, "FREQ=DAILY;UNTIL=20241231T230000Z");
    }

    #[test]
    fn test_cleared_repeat_until_removes_until() {
        assert_eq!(
            to_remote_rrule("FREQ=DAILY;UNTIL=20240301T000000Z", 0).unwrap(),
            "FREQ=DAILY"
        );
    }

    #[test]
    fn test_until_replaces_count() {
        let until = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let rule = to_remote_rrule("FREQ=DAILY;COUNT=5", until.timestamp_millis()).unwrap();
        assert_eq!(rule, "FREQ=DAILY;UNTIL=20250101T000000Z");
    }

    #[test]
    fn test_malformed_rule_is_an_error() {
        assert!(matches!(
            to_remote_rrule("FREQ=SOMETIMES", 0),
            Err(TaskDavError::Recurrence(_))
        ));
        assert!(to_remote_rrule("", 0).is_err());
    }

    #[test]
    fn test_remote_until_becomes_local_repeat_until() {
        let zone = LocalZone::from_name("Europe/Berlin");
        let (rule, until) = from_remote_rrule("FREQ=WEEKLY;UNTIL=20240630T220000Z", &zone);
        assert_eq!(rule, "FREQ=WEEKLY;UNTIL=20240630T220000Z");
        assert_eq!(
            until,
            Utc.with_ymd_and_hms(2024, 6, 30, 22, 0, 0)
                .unwrap()
                .timestamp_millis()
        );
        // 22:00 UTC is midnight on July 1st in Berlin
        assert_eq!(
            zone.naive_local(until).date(),
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
        );
    }

    #[test]
    fn test_date_until_is_local_midnight() {
        let zone = LocalZone::from_name("America/Chicago");
        let (_, until) = from_remote_rrule("FREQ=DAILY;UNTIL=20240315", &zone);
        let local = zone.naive_local(until);
        assert_eq!(local.date(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn test_rule_without_until_has_no_bound() {
        let (rule, until) = from_remote_rrule("RRULE:FREQ=MONTHLY", &LocalZone::UTC);
        assert_eq!(rule, "FREQ=MONTHLY");
        assert_eq!(until, 0);
    }
}

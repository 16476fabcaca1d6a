//! ICS parsing using the icalendar crate's parser.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};

use crate::error::{TaskDavError, TaskDavResult};
use crate::extensions::Extensions;
use crate::location::Geo;
use crate::vtodo::{RawProperty, RelType, RelatedTo, TodoStatus, TodoTime, Vtodo};

/// Properties with a typed field on `Vtodo`. DTSTAMP is regenerated on write.
const HANDLED_KEYS: &[&str] = &[
    "UID",
    "SUMMARY",
    "DESCRIPTION",
    "DUE",
    "DTSTART",
    "COMPLETED",
    "STATUS",
    "PERCENT-COMPLETE",
    "PRIORITY",
    "RRULE",
    "CREATED",
    "LAST-MODIFIED",
    "GEO",
    "CATEGORIES",
    "RELATED-TO",
    "DTSTAMP",
];

/// Parse ICS content holding exactly one master VTODO.
///
/// Overrides of recurring instances (VTODOs with RECURRENCE-ID) are skipped.
pub fn parse_vtodo(content: &str) -> TaskDavResult<Vtodo> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| TaskDavError::IcsParse(e.to_string()))?;

    let mut masters = calendar
        .components
        .iter()
        .flat_map(|c| {
            if is_named(c.name.as_ref(), "VCALENDAR") {
                c.components.iter().collect::<Vec<_>>()
            } else {
                vec![c]
            }
        })
        .filter(|c| is_named(c.name.as_ref(), "VTODO"))
        .enumerate()
        .filter(|(_, c)| find(c, "RECURRENCE-ID").is_none());

    let (index, todo) = masters
        .next()
        .ok_or_else(|| TaskDavError::IcsParse("No VTODO found".into()))?;
    if masters.next().is_some() {
        return Err(TaskDavError::IcsParse("More than one VTODO found".into()));
    }

    Ok(to_vtodo(todo, categories(&unfolded, index)))
}

fn to_vtodo(todo: &Component, categories: Vec<String>) -> Vtodo {
    let text = |name: &str| find(todo, name).map(|p| p.val.to_string());
    let date = |name: &str| {
        find(todo, name)
            .and_then(|p| DatePerhapsTime::try_from(p).ok())
            .map(to_todo_time)
    };
    let timestamp = |name: &str| date(name).map(to_utc);

    let priority = find(todo, "PRIORITY")
        .and_then(|p| p.val.as_ref().trim().parse().ok())
        .unwrap_or(0);

    let percent_complete = find(todo, "PERCENT-COMPLETE")
        .and_then(|p| p.val.as_ref().trim().parse().ok());

    let status = find(todo, "STATUS").and_then(|p| TodoStatus::from_ics_str(p.val.as_ref()));

    let rrule = find(todo, "RRULE")
        .map(|p| p.val.as_ref().trim().to_string())
        .filter(|r| !r.is_empty());

    let geo = find(todo, "GEO").and_then(|p| parse_geo(p.val.as_ref()));

    let related_to: Vec<RelatedTo> = todo
        .properties
        .iter()
        .filter(|p| is_named(p.name.as_ref(), "RELATED-TO"))
        .map(|p| RelatedTo {
            value: p.val.as_ref().trim().to_string(),
            reltype: param(p, "RELTYPE").and_then(|v| RelType::from_ics_str(&v)),
        })
        .collect();

    // Everything else is kept verbatim for round-tripping
    let extensions: Vec<RawProperty> = todo
        .properties
        .iter()
        .filter(|p| {
            !HANDLED_KEYS
                .iter()
                .any(|key| is_named(p.name.as_ref(), key))
        })
        .map(|p| RawProperty {
            name: p.name.to_string(),
            value: p.val.to_string(),
            params: p
                .params
                .iter()
                .map(|param| {
                    (
                        param.key.to_string(),
                        param.val.as_ref().map(|v| v.to_string()).unwrap_or_default(),
                    )
                })
                .collect(),
        })
        .collect();

    Vtodo {
        uid: find(todo, "UID")
            .map(|p| p.val.as_ref().trim().to_string())
            .filter(|uid| !uid.is_empty()),
        summary: text("SUMMARY"),
        description: text("DESCRIPTION"),
        due: date("DUE"),
        dtstart: date("DTSTART"),
        completed_at: timestamp("COMPLETED"),
        status,
        percent_complete,
        priority,
        rrule,
        created_at: timestamp("CREATED"),
        last_modified: timestamp("LAST-MODIFIED"),
        geo,
        categories,
        related_to,
        extensions: Extensions::from(extensions),
    }
}

fn is_named(name: &str, expected: &str) -> bool {
    name.eq_ignore_ascii_case(expected)
}

fn find<'a>(component: &'a Component<'a>, name: &str) -> Option<&'a Property<'a>> {
    component
        .properties
        .iter()
        .find(|p| is_named(p.name.as_ref(), name))
}

fn param(prop: &Property, key: &str) -> Option<String> {
    prop.params
        .iter()
        .find(|p| is_named(p.key.as_ref(), key))
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()))
}

/// Convert icalendar's DatePerhapsTime to our TodoTime, preserving timezone info
fn to_todo_time(dpt: DatePerhapsTime) -> TodoTime {
    match dpt {
        DatePerhapsTime::Date(d) => TodoTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => TodoTime::DateTimeUtc(dt),
            CalendarDateTime::Floating(naive) => TodoTime::DateTimeFloating(naive),
            CalendarDateTime::WithTimezone { date_time, tzid } => TodoTime::DateTimeZoned {
                datetime: date_time,
                tzid,
            },
        },
    }
}

/// COMPLETED, CREATED and LAST-MODIFIED must be UTC; other forms written by
/// lenient clients are read as UTC wall-clock time.
fn to_utc(time: TodoTime) -> DateTime<Utc> {
    match time {
        TodoTime::DateTimeUtc(dt) => dt,
        TodoTime::Date(d) => d.and_time(chrono::NaiveTime::default()).and_utc(),
        TodoTime::DateTimeFloating(naive) => naive.and_utc(),
        TodoTime::DateTimeZoned { datetime, tzid } => match tzid.parse::<Tz>() {
            Ok(tz) => datetime
                .and_local_timezone(tz)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| datetime.and_utc()),
            Err(_) => datetime.and_utc(),
        },
    }
}

/// GEO is "latitude;longitude"
fn parse_geo(value: &str) -> Option<Geo> {
    let (lat, lon) = value.split_once([';', ','])?;
    Some(Geo::new(lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

/// CATEGORIES of the `index`-th VTODO, deduplicated in order.
///
/// Read from the unfolded text: the parser unescapes `\,` before the list
/// can be split, so "Smith\, John" would turn into two names.
fn categories(unfolded: &str, index: usize) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for raw in raw_values(unfolded, index, "CATEGORIES") {
        for name in split_unescaped(raw, ',') {
            let name = unescape_text(name.trim());
            if !name.is_empty() && !categories.contains(&name) {
                categories.push(name);
            }
        }
    }
    categories
}

/// Escaped values of every `property` line directly inside the `index`-th
/// VTODO. Lines of nested components such as VALARM are skipped.
fn raw_values<'a>(unfolded: &'a str, index: usize, property: &str) -> Vec<&'a str> {
    let mut values = Vec::new();
    let mut seen = 0;
    let mut inside = false;
    let mut nested = 0usize;

    for line in unfolded.lines() {
        let Some((name, value)) = split_content_line(line) else {
            continue;
        };
        if is_named(name, "BEGIN") {
            if inside {
                nested += 1;
            } else if is_named(value.trim(), "VTODO") {
                inside = seen == index;
                seen += 1;
            }
        } else if is_named(name, "END") {
            if !inside {
                continue;
            }
            if nested > 0 {
                nested -= 1;
            } else {
                break;
            }
        } else if inside && nested == 0 && is_named(name, property) {
            values.push(value);
        }
    }
    values
}

/// Split a content line into its name and raw value. The value starts at
/// the first colon outside a quoted parameter.
fn split_content_line(line: &str) -> Option<(&str, &str)> {
    let name_end = line.find([';', ':'])?;
    let mut quoted = false;
    for (i, c) in line[name_end..].char_indices() {
        match c {
            '"' => quoted = !quoted,
            ':' if !quoted => {
                let value = &line[name_end + i + 1..];
                return Some((&line[..name_end], value.trim_end_matches('\r')));
            }
            _ => {}
        }
    }
    None
}

/// Split on `separator` unless it is escaped with a backslash.
fn split_unescaped(value: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == separator {
            parts.push(&value[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&value[start..]);
    parts
}

/// Unescape one TEXT list item. Unknown escapes are kept verbatim, as the
/// parser does for whole values.
fn unescape_text(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some(escaped @ (',' | ';' | ':' | '\\')) => result.push(escaped),
            Some('n' | 'N') => result.push('\n'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

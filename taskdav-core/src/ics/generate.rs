//! ICS file generation.

use icalendar::{Calendar, Component, Property, ValueType};

use crate::error::{TaskDavError, TaskDavResult};
use crate::vtodo::{TodoTime, Vtodo};

pub const PRODID: &str = "-//taskdav//EN";

/// Generate .ics content for a VTODO
pub fn generate_ics(vtodo: &Vtodo) -> TaskDavResult<String> {
    let uid = vtodo
        .uid
        .as_deref()
        .filter(|uid| !uid.trim().is_empty())
        .ok_or_else(|| TaskDavError::IcsGenerate("VTODO has no UID".into()))?;

    let mut cal = Calendar::new();
    let mut todo = icalendar::Todo::new();
    todo.uid(uid);

    // DTSTAMP - required by RFC 5545, use last modification or current time
    let dtstamp = format_utc(&vtodo.last_modified.unwrap_or_else(chrono::Utc::now));
    todo.add_property("DTSTAMP", &dtstamp);

    if let Some(created) = &vtodo.created_at {
        todo.add_property("CREATED", format_utc(created));
    }
    if let Some(modified) = &vtodo.last_modified {
        todo.add_property("LAST-MODIFIED", format_utc(modified));
    }

    if let Some(summary) = &vtodo.summary {
        todo.summary(summary);
    }
    if let Some(desc) = &vtodo.description {
        todo.description(desc);
    }

    if let Some(due) = &vtodo.due {
        add_datetime_property(&mut todo, "DUE", due);
    }
    if let Some(start) = &vtodo.dtstart {
        add_datetime_property(&mut todo, "DTSTART", start);
    }

    if let Some(completed) = &vtodo.completed_at {
        todo.add_property("COMPLETED", format_utc(completed));
    }
    if let Some(status) = vtodo.status {
        todo.add_property("STATUS", status.as_ics_str());
    }
    if let Some(percent) = vtodo.percent_complete {
        todo.add_property("PERCENT-COMPLETE", percent.to_string());
    }

    // PRIORITY 0 means undefined, same as leaving it out
    if vtodo.priority > 0 {
        todo.add_property("PRIORITY", vtodo.priority.to_string());
    }

    if let Some(rrule) = &vtodo.rrule {
        todo.add_property("RRULE", rrule);
    }

    if let Some(geo) = &vtodo.geo {
        todo.add_property("GEO", format!("{};{}", geo.latitude, geo.longitude));
    }

    for category in &vtodo.categories {
        todo.append_multi_property(Property::new("CATEGORIES", category));
    }

    for related in &vtodo.related_to {
        let mut prop = Property::new("RELATED-TO", &related.value);
        if let Some(reltype) = &related.reltype {
            prop.add_parameter("RELTYPE", reltype.as_ics_str());
        }
        todo.append_multi_property(prop);
    }

    // Unknown properties, written back as they were read
    for raw in vtodo.extensions.iter() {
        let mut prop = Property::new(&raw.name, &raw.value);
        for (key, value) in &raw.params {
            prop.add_parameter(key, value);
        }
        todo.append_multi_property(prop);
    }

    let todo = todo.done();
    cal.push(todo);
    let cal = cal.done();

    Ok(strip_ics_bloat(&cal.to_string()))
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with our own
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

fn format_utc(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Add a datetime property with proper formatting based on TodoTime variant
fn add_datetime_property(todo: &mut icalendar::Todo, name: &str, time: &TodoTime) {
    match time {
        TodoTime::Date(d) => {
            let mut prop = Property::new(name, d.format("%Y%m%d").to_string());
            prop.append_parameter(ValueType::Date);
            todo.append_property(prop);
        }
        TodoTime::DateTimeUtc(dt) => {
            todo.add_property(name, format_utc(dt));
        }
        TodoTime::DateTimeFloating(dt) => {
            todo.add_property(name, dt.format("%Y%m%dT%H%M%S").to_string());
        }
        TodoTime::DateTimeZoned { datetime, tzid } => {
            let mut prop = Property::new(name, datetime.format("%Y%m%dT%H%M%S").to_string());
            prop.add_parameter("TZID", tzid);
            todo.append_property(prop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::parse_vtodo;
    use crate::location::Geo;
    use crate::vtodo::{RawProperty, RelType, RelatedTo, TodoStatus};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn sample() -> Vtodo {
        let mut vtodo = Vtodo {
            uid: Some("sample-uid".into()),
            summary: Some("Buy milk".into()),
            due: Some(TodoTime::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())),
            priority: 1,
            last_modified: Some(Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap()),
            ..Default::default()
        };
        vtodo.categories = vec!["groceries".into(), "home".into()];
        vtodo
    }

    #[test]
    fn test_missing_uid_is_an_error() {
        let vtodo = Vtodo::default();
        assert!(matches!(
            generate_ics(&vtodo),
            Err(TaskDavError::IcsGenerate(_))
        ));
    }

    #[test]
    fn test_generate_basic_vtodo() {
        let ics = generate_ics(&sample()).expect("Should generate");

        assert!(ics.contains("BEGIN:VTODO"));
        assert!(ics.contains("UID:sample-uid"));
        assert!(ics.contains("SUMMARY:Buy milk"));
        assert!(ics.contains("DUE;VALUE=DATE:20240105"));
        assert!(ics.contains("PRIORITY:1"));
        assert!(ics.contains("DTSTAMP:20240102T100000Z"));
        assert!(ics.contains("PRODID:-//taskdav//EN"));
        assert!(!ics.contains("CALSCALE"));
        assert!(!ics.contains("STATUS:"));
    }

    #[test]
    fn test_zoned_start_keeps_tzid() {
        let mut vtodo = sample();
        vtodo.dtstart = Some(TodoTime::DateTimeZoned {
            datetime: NaiveDate::from_ymd_opt(2024, 1, 3)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            tzid: "Europe/Berlin".into(),
        });

        let ics = generate_ics(&vtodo).expect("Should generate");
        assert!(ics.contains("DTSTART;TZID=Europe/Berlin:20240103T080000"));
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let mut vtodo = sample();
        vtodo.completed_at = Some(Utc.with_ymd_and_hms(2024, 1, 4, 18, 30, 0).unwrap());
        vtodo.status = Some(TodoStatus::Completed);
        vtodo.percent_complete = Some(100);
        vtodo.rrule = Some("FREQ=WEEKLY;BYDAY=FR".into());
        vtodo.geo = Some(Geo::new(52.52, 13.405));
        vtodo.related_to = vec![
            RelatedTo::parent("parent-uid"),
            RelatedTo {
                value: "other-uid".into(),
                reltype: Some(RelType::Sibling),
            },
        ];
        vtodo.extensions.push(RawProperty::new("X-APPLE-SORT-ORDER", "7"));
        vtodo.extensions.push(RawProperty {
            name: "X-CUSTOM".into(),
            value: "kept".into(),
            params: vec![("X-PARAM".into(), "yes".into())],
        });

        let ics = generate_ics(&vtodo).expect("Should generate");
        let parsed = parse_vtodo(&ics).expect("Should parse generated output");

        assert_eq!(parsed, vtodo);
    }

    #[test]
    fn test_round_trip_keeps_special_characters_in_text() {
        let mut vtodo = sample();
        vtodo.summary = Some("C:\\new folder, part; two".into());
        vtodo.description = Some("a, b; c\nd \\ e \\n".into());

        let ics = generate_ics(&vtodo).expect("Should generate");
        let parsed = parse_vtodo(&ics).expect("Should parse generated output");

        assert_eq!(parsed.summary, vtodo.summary);
        assert_eq!(parsed.description, vtodo.description);
    }

    #[test]
    fn test_round_trip_keeps_comma_inside_tag() {
        let mut vtodo = sample();
        vtodo.categories = vec!["a,b".into(), "semi;colon".into(), "back\\slash".into()];

        let ics = generate_ics(&vtodo).expect("Should generate");
        let parsed = parse_vtodo(&ics).expect("Should parse generated output");

        assert_eq!(parsed.categories, vec!["a,b", "semi;colon", "back\\slash"]);
    }
}

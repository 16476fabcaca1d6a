//! Field-level mapping between a local task and a VTODO.
//!
//! Both directions are pure: storage side effects (tags, geofences, link
//! records) happen in the translator.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::datetime::{
    LocalZone, start_of_day, start_of_minute, to_local_millis, to_remote_time, unknown_tzid,
    utc_from_millis,
};
use crate::link::LinkRecord;
use crate::priority;
use crate::recurrence::{from_remote_rrule, to_remote_rrule};
use crate::task::Task;
use crate::vtodo::{TodoStatus, Vtodo};

fn timestamp(millis: i64) -> Option<DateTime<Utc>> {
    (millis > 0).then(|| utc_from_millis(millis))
}

/// Write the task's fields onto `vtodo`, keeping everything the task doesn't
/// own (unknown properties, non-parent relations, finer PRIORITY values).
pub fn apply_local(vtodo: &mut Vtodo, link: &LinkRecord, task: &Task, zone: &LocalZone, now: DateTime<Utc>) {
    if let Some(created) = timestamp(task.creation_date) {
        vtodo.created_at = Some(created);
    }
    if let Some(modified) = timestamp(task.modification_date) {
        vtodo.last_modified = Some(modified);
    }
    vtodo.summary = task.title.clone();
    vtodo.description = task.notes.clone();

    let all_day = !task.has_due_time() && !task.has_start_time();
    let due = if task.has_due_time() {
        task.due_date
    } else {
        start_of_day(task.due_date, zone)
    };
    let mut start = if task.has_start_time() {
        start_of_minute(task.hide_until)
    } else {
        start_of_day(task.hide_until, zone)
    };
    // A task can't start after it is due
    if due > 0 && start > due {
        start = due;
    }
    vtodo.due = to_remote_time(due, all_day, zone);
    vtodo.dtstart = to_remote_time(start, all_day, zone);

    if task.is_completed() {
        vtodo.completed_at = timestamp(task.completion_date);
        vtodo.status = Some(TodoStatus::Completed);
        vtodo.percent_complete = Some(100);
    } else if vtodo.completed_at.is_some() || vtodo.status == Some(TodoStatus::Completed) {
        vtodo.completed_at = None;
        vtodo.status = None;
        vtodo.percent_complete = None;
    }

    vtodo.priority = priority::to_remote(task.priority, vtodo.priority);

    vtodo.rrule = match task.recurrence.as_deref() {
        Some(rule) if task.is_recurring() => match to_remote_rrule(rule, task.repeat_until) {
            Ok(rrule) => Some(rrule),
            Err(e) => {
                warn!(task = task.id, error = %e, "Dropping recurrence");
                None
            }
        },
        _ => None,
    };

    let parent = if task.parent == Task::NO_ID {
        None
    } else {
        link.remote_parent.as_deref()
    };
    vtodo.set_parent(parent);
    vtodo.set_order(link.order);
    vtodo.set_collapsed(task.collapsed);
    vtodo.set_snooze(task.reminder_snooze, now);
}

/// Copy the VTODO's fields onto `task`.
pub fn apply_remote(task: &mut Task, vtodo: &Vtodo, zone: &LocalZone, now: DateTime<Utc>) {
    task.completion_date = match vtodo.completed_at {
        Some(completed) => completed.timestamp_millis(),
        None if vtodo.status == Some(TodoStatus::Completed) => {
            if task.is_completed() {
                task.completion_date
            } else {
                now.timestamp_millis()
            }
        }
        None => 0,
    };

    if let Some(created) = vtodo.created_at {
        task.creation_date = created.timestamp_millis();
    }
    task.title = vtodo.summary.clone();
    task.notes = vtodo.description.clone();
    task.priority = priority::from_remote(vtodo.priority);

    match vtodo.rrule.as_deref() {
        Some(rrule) => {
            let (rule, repeat_until) = from_remote_rrule(rrule, zone);
            task.set_recurrence(Some(rule), repeat_until);
        }
        None => task.set_recurrence(None, 0),
    }

    for (property, time) in [("DUE", &vtodo.due), ("DTSTART", &vtodo.dtstart)] {
        if let Some(tzid) = time.as_ref().and_then(unknown_tzid) {
            warn!(task = task.id, uid = ?vtodo.uid, property, tzid, "Unknown TZID, reading as local time");
        }
    }
    task.due_date = to_local_millis(vtodo.due.as_ref(), zone);
    task.due_has_time = vtodo.due.as_ref().is_some_and(|d| !d.is_date());
    task.hide_until = to_local_millis(vtodo.dtstart.as_ref(), zone);
    task.hide_until_has_time = vtodo.dtstart.as_ref().is_some_and(|d| !d.is_date());

    task.collapsed = vtodo.collapsed();
    task.reminder_snooze = vtodo.snooze(zone).unwrap_or(0);
}

use anyhow::Result;
use chrono::DateTime;
use owo_colors::OwoColorize;
use taskdav_core::{LocalZone, SyncConfig, Task};

use super::Session;

pub async fn run(config: &SyncConfig) -> Result<()> {
    let session = Session::open(config)?;
    let zone = *session.translator.zone();
    let store = session.translator.store();

    if store.tasks().is_empty() {
        println!("{}", "No tasks found".dimmed());
        return Ok(());
    }

    for task in store.tasks() {
        let check = if task.is_completed() { "[x]" } else { "[ ]" };
        let title = task.title.as_deref().unwrap_or_default();
        let remote: Vec<&str> = store
            .links()
            .iter()
            .filter(|l| l.task == task.id)
            .filter_map(|l| l.remote_id.as_deref())
            .collect();

        println!(
            "{} {} {} {} {}",
            format!("#{}", task.id).bold(),
            check,
            title,
            format_due(task, &zone).yellow(),
            remote.join(",").dimmed()
        );
    }

    Ok(())
}

fn format_due(task: &Task, zone: &LocalZone) -> String {
    if !task.has_due_date() {
        return String::new();
    }
    let Some(utc) = DateTime::from_timestamp_millis(task.due_date) else {
        return String::new();
    };
    let local = utc.with_timezone(&zone.tz());
    if task.due_has_time {
        local.format("%Y-%m-%d %H:%M").to_string()
    } else {
        local.format("%Y-%m-%d").to_string()
    }
}

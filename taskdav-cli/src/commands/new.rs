use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use owo_colors::OwoColorize;
use taskdav_core::store::TaskStore;
use taskdav_core::{Priority, SyncConfig, Task};

use super::Session;

pub async fn run(config: &SyncConfig, title: &str, due: Option<&str>, priority: Option<&str>) -> Result<()> {
    let mut session = Session::open(config)?;
    let zone = *session.translator.zone();

    let mut task = Task::with_title(title);
    if let Some(due) = due {
        let (naive, has_time) = parse_due(due)?;
        task.due_date = zone.millis_from_local(&naive);
        task.due_has_time = has_time;
    }
    if let Some(priority) = priority {
        task.priority = parse_priority(priority)?;
    }

    let task = session.translator.store_mut().create_task(task).await?;
    session.close()?;

    println!("{} {} {}", "Created".green(), format!("#{}", task.id).bold(), title);
    Ok(())
}

fn parse_due(value: &str) -> Result<(NaiveDateTime, bool)> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return Ok((dt, true));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok((date.and_time(chrono::NaiveTime::default()), false));
    }
    anyhow::bail!("Invalid due date '{}'. Use YYYY-MM-DD or YYYY-MM-DDTHH:MM", value)
}

fn parse_priority(value: &str) -> Result<Priority> {
    match value.to_ascii_lowercase().as_str() {
        "high" => Ok(Priority::High),
        "medium" => Ok(Priority::Medium),
        "low" => Ok(Priority::Low),
        "none" => Ok(Priority::None),
        _ => anyhow::bail!("Invalid priority '{}'. Use high, medium, low or none", value),
    }
}

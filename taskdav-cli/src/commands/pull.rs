use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use taskdav_core::{RemoteCalendar, SyncConfig};

use super::Session;

pub async fn run(
    config: &SyncConfig,
    calendar: &str,
    file: &Path,
    etag: Option<&str>,
    object: Option<&str>,
) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Could not read {}", file.display()))?;
    let object = object
        .map(String::from)
        .or_else(|| file.file_name().map(|n| n.to_string_lossy().into_owned()));

    let mut session = Session::open(config)?;
    let calendar = RemoteCalendar::new(calendar, calendar);

    let link = session
        .translator
        .pull(&calendar, &raw, object.as_deref(), etag)
        .await?;
    let reparented = session.translator.update_parents(&calendar).await?;
    session.close()?;

    println!(
        "{} #{} {}",
        "Pulled".green(),
        link.task,
        link.remote_id.as_deref().unwrap_or_default().dimmed()
    );
    if reparented > 0 {
        println!("{}", format!("Updated parent of {} task(s)", reparented).dimmed());
    }

    Ok(())
}

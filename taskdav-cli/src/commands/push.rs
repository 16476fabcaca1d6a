use std::io::Write;
use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use taskdav_core::{RemoteCalendar, SyncConfig};

use super::Session;

pub async fn run(config: &SyncConfig, calendar: &str, task: i64, out: Option<&Path>) -> Result<()> {
    let mut session = Session::open(config)?;
    let calendar = RemoteCalendar::new(calendar, calendar);

    let (link, bytes) = session.translator.push(&calendar, task).await?;
    session.close()?;

    match out {
        Some(path) => {
            std::fs::write(path, &bytes)?;
            println!(
                "{} #{} {} {}",
                "Pushed".green(),
                task,
                link.remote_id.as_deref().unwrap_or_default().dimmed(),
                path.display()
            );
        }
        None => std::io::stdout().write_all(&bytes)?,
    }

    Ok(())
}

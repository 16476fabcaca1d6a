pub mod new;
pub mod pull;
pub mod push;
pub mod tasks;

use std::path::PathBuf;

use anyhow::Result;
use taskdav_core::{MemoryStore, SyncConfig, Translator, WorkQueue, WorkRequest};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

/// Name of the store snapshot inside the data directory
pub const STORE_FILE: &str = "store.json";

/// A translator over the persisted store, plus the receiving end of its work queue.
pub struct Session {
    pub translator: Translator<MemoryStore, WorkQueue>,
    work: UnboundedReceiver<WorkRequest>,
    path: PathBuf,
}

impl Session {
    pub fn open(config: &SyncConfig) -> Result<Self> {
        let path = config.data_path().join(STORE_FILE);
        let store = MemoryStore::load(&path)?;
        let (queue, work) = WorkQueue::new();
        let translator = Translator::new(store, queue, config.translator_config());

        Ok(Session {
            translator,
            work,
            path,
        })
    }

    /// Save the store and report the background work that was requested.
    /// There is no worker in the CLI, so requests are only logged.
    pub fn close(mut self) -> Result<()> {
        self.translator.store().save(&self.path)?;

        while let Ok(request) = self.work.try_recv() {
            match request {
                WorkRequest::ReverseGeocode(place) => {
                    info!(place = %place.uid, lat = place.latitude, lon = place.longitude, "Reverse geocode requested");
                }
                WorkRequest::UpdateGeofences(place) => {
                    info!(place = %place.uid, "Geofence update requested");
                }
            }
        }

        Ok(())
    }
}

//! Fire-and-forget background work requested during translation.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;

use crate::location::Place;

/// One-way requests to a background worker. Nothing here is awaited.
pub trait BackgroundWork {
    /// Look up a name and address for a newly created place.
    fn reverse_geocode(&self, place: &Place);

    /// Geofences using `place` changed; (re)schedule their monitoring.
    fn update_geofences(&self, place: &Place);
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkRequest {
    ReverseGeocode(Place),
    UpdateGeofences(Place),
}

/// Sends work requests over an unbounded channel.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    sender: UnboundedSender<WorkRequest>,
}

impl WorkQueue {
    pub fn new() -> (Self, UnboundedReceiver<WorkRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (WorkQueue { sender }, receiver)
    }

    fn send(&self, request: WorkRequest) {
        if let Err(e) = self.sender.send(request) {
            warn!(request = ?e.0, "Background worker is gone, dropping request");
        }
    }
}

impl BackgroundWork for WorkQueue {
    fn reverse_geocode(&self, place: &Place) {
        self.send(WorkRequest::ReverseGeocode(place.clone()));
    }

    fn update_geofences(&self, place: &Place) {
        self.send(WorkRequest::UpdateGeofences(place.clone()));
    }
}

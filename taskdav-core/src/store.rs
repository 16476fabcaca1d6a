//! Storage interfaces consumed by the translator.
//!
//! Lookups that find nothing return `Ok(None)` or an empty list; only real
//! backing-store failures are errors.

use std::future::Future;

use crate::error::TaskDavResult;
use crate::link::LinkRecord;
use crate::location::{Geofence, Place};
use crate::tag::TagData;
use crate::task::Task;

/// Flags passed along with a task write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// The write came from the server, don't queue it for upload again
    pub suppress_sync: bool,
    /// Skip the refresh pass normally triggered by a task write
    pub suppress_refresh: bool,
}

impl SaveOptions {
    /// Options for writes that apply remote state.
    pub fn from_remote() -> Self {
        SaveOptions {
            suppress_sync: true,
            suppress_refresh: true,
        }
    }
}

pub trait TaskStore {
    fn fetch_task(&mut self, id: i64) -> impl Future<Output = TaskDavResult<Option<Task>>> + Send;

    /// Persist a new task, returning it with its id and timestamps assigned.
    fn create_task(&mut self, task: Task) -> impl Future<Output = TaskDavResult<Task>> + Send;

    /// Write an existing task. The store stamps the modification time and
    /// writes it back into `task`.
    fn save_task(
        &mut self,
        task: &mut Task,
        options: SaveOptions,
    ) -> impl Future<Output = TaskDavResult<()>> + Send;
}

pub trait LinkStore {
    /// Insert a new link record, returning its id. Fails if the task already
    /// has a record for the same calendar.
    fn insert_link(&mut self, link: &LinkRecord) -> impl Future<Output = TaskDavResult<i64>> + Send;

    fn update_link(&mut self, link: &LinkRecord) -> impl Future<Output = TaskDavResult<()>> + Send;

    fn link_for_remote_id(
        &mut self,
        calendar: &str,
        remote_id: &str,
    ) -> impl Future<Output = TaskDavResult<Option<LinkRecord>>> + Send;

    fn link_for_task(
        &mut self,
        task: i64,
        calendar: &str,
    ) -> impl Future<Output = TaskDavResult<Option<LinkRecord>>> + Send;

    fn links_for_calendar(
        &mut self,
        calendar: &str,
    ) -> impl Future<Output = TaskDavResult<Vec<LinkRecord>>> + Send;
}

pub trait LocationStore {
    /// Find a place by its rounded coordinate keys.
    fn find_place(
        &mut self,
        latitude_key: &str,
        longitude_key: &str,
    ) -> impl Future<Output = TaskDavResult<Option<Place>>> + Send;

    fn insert_place(&mut self, place: Place) -> impl Future<Output = TaskDavResult<Place>> + Send;

    fn place_by_uid(&mut self, uid: &str) -> impl Future<Output = TaskDavResult<Option<Place>>> + Send;

    /// The task's geofence, if it has one.
    fn geofence_for_task(
        &mut self,
        task: i64,
    ) -> impl Future<Output = TaskDavResult<Option<Geofence>>> + Send;

    /// Geofences of a task that are still being monitored.
    fn active_geofences(
        &mut self,
        task: i64,
    ) -> impl Future<Output = TaskDavResult<Vec<Geofence>>> + Send;

    fn insert_geofence(
        &mut self,
        geofence: Geofence,
    ) -> impl Future<Output = TaskDavResult<Geofence>> + Send;

    fn update_geofence(&mut self, geofence: &Geofence) -> impl Future<Output = TaskDavResult<()>> + Send;

    /// Remove a geofence. Its place is kept.
    fn delete_geofence(&mut self, id: i64) -> impl Future<Output = TaskDavResult<()>> + Send;
}

pub trait TagStore {
    fn tags_by_names(
        &mut self,
        names: &[String],
    ) -> impl Future<Output = TaskDavResult<Vec<TagData>>> + Send;

    fn create_tag(&mut self, name: &str) -> impl Future<Output = TaskDavResult<TagData>> + Send;

    fn tag_names_for_task(&mut self, task: i64) -> impl Future<Output = TaskDavResult<Vec<String>>> + Send;

    /// Replace the task's tag set.
    fn apply_tags(&mut self, task: i64, tags: &[TagData]) -> impl Future<Output = TaskDavResult<()>> + Send;
}

//! In-memory store implementing every storage interface.
//!
//! The CLI persists it as a JSON snapshot between runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TaskDavError, TaskDavResult};
use crate::link::{LinkRecord, LinkState};
use crate::location::{Geofence, Place};
use crate::store::{LinkStore, LocationStore, SaveOptions, TagStore, TaskStore};
use crate::tag::TagData;
use crate::task::Task;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStore {
    next_id: i64,
    tasks: Vec<Task>,
    links: Vec<LinkRecord>,
    places: Vec<Place>,
    geofences: Vec<Geofence>,
    tags: Vec<TagData>,
    /// (task id, tag id)
    task_tags: Vec<(i64, i64)>,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot, starting empty if the file doesn't exist.
    pub fn load(path: &Path) -> TaskDavResult<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| TaskDavError::Serialization(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> TaskDavResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| TaskDavError::Serialization(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn links(&self) -> &[LinkRecord] {
        &self.links
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn geofences(&self) -> &[Geofence] {
        &self.geofences
    }

    pub fn tags(&self) -> &[TagData] {
        &self.tags
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl TaskStore for MemoryStore {
    async fn fetch_task(&mut self, id: i64) -> TaskDavResult<Option<Task>> {
        Ok(self.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn create_task(&mut self, mut task: Task) -> TaskDavResult<Task> {
        let now = now_millis();
        task.id = self.allocate_id();
        if task.creation_date == 0 {
            task.creation_date = now;
        }
        task.modification_date = now;
        self.tasks.push(task.clone());
        Ok(task)
    }

    async fn save_task(&mut self, task: &mut Task, _options: SaveOptions) -> TaskDavResult<()> {
        let stored = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| TaskDavError::Storage(format!("No task with id {}", task.id)))?;
        task.modification_date = now_millis();
        *stored = task.clone();
        Ok(())
    }
}

impl LinkStore for MemoryStore {
    async fn insert_link(&mut self, link: &LinkRecord) -> TaskDavResult<i64> {
        if self
            .links
            .iter()
            .any(|l| l.task == link.task && l.calendar == link.calendar)
        {
            return Err(TaskDavError::Storage(format!(
                "Task {} is already linked to calendar {}",
                link.task, link.calendar
            )));
        }
        let id = self.allocate_id();
        let mut stored = link.clone();
        stored.state = LinkState::Persisted(id);
        self.links.push(stored);
        Ok(id)
    }

    async fn update_link(&mut self, link: &LinkRecord) -> TaskDavResult<()> {
        let id = link
            .id()
            .ok_or_else(|| TaskDavError::Storage("Cannot update an unsaved link".into()))?;
        let stored = self
            .links
            .iter_mut()
            .find(|l| l.id() == Some(id))
            .ok_or_else(|| TaskDavError::Storage(format!("No link with id {id}")))?;
        *stored = link.clone();
        Ok(())
    }

    async fn link_for_remote_id(
        &mut self,
        calendar: &str,
        remote_id: &str,
    ) -> TaskDavResult<Option<LinkRecord>> {
        Ok(self
            .links
            .iter()
            .find(|l| l.calendar == calendar && l.remote_id.as_deref() == Some(remote_id))
            .cloned())
    }

    async fn link_for_task(&mut self, task: i64, calendar: &str) -> TaskDavResult<Option<LinkRecord>> {
        Ok(self
            .links
            .iter()
            .find(|l| l.task == task && l.calendar == calendar)
            .cloned())
    }

    async fn links_for_calendar(&mut self, calendar: &str) -> TaskDavResult<Vec<LinkRecord>> {
        Ok(self
            .links
            .iter()
            .filter(|l| l.calendar == calendar)
            .cloned()
            .collect())
    }
}

impl LocationStore for MemoryStore {
    async fn find_place(&mut self, latitude_key: &str, longitude_key: &str) -> TaskDavResult<Option<Place>> {
        Ok(self
            .places
            .iter()
            .find(|p| p.matches(latitude_key, longitude_key))
            .cloned())
    }

    async fn insert_place(&mut self, mut place: Place) -> TaskDavResult<Place> {
        place.id = self.allocate_id();
        self.places.push(place.clone());
        Ok(place)
    }

    async fn place_by_uid(&mut self, uid: &str) -> TaskDavResult<Option<Place>> {
        Ok(self.places.iter().find(|p| p.uid == uid).cloned())
    }

    async fn geofence_for_task(&mut self, task: i64) -> TaskDavResult<Option<Geofence>> {
        Ok(self.geofences.iter().find(|g| g.task == task).cloned())
    }

    async fn active_geofences(&mut self, task: i64) -> TaskDavResult<Vec<Geofence>> {
        Ok(self
            .geofences
            .iter()
            .filter(|g| g.task == task)
            .cloned()
            .collect())
    }

    async fn insert_geofence(&mut self, mut geofence: Geofence) -> TaskDavResult<Geofence> {
        geofence.id = self.allocate_id();
        self.geofences.push(geofence.clone());
        Ok(geofence)
    }

    async fn update_geofence(&mut self, geofence: &Geofence) -> TaskDavResult<()> {
        let stored = self
            .geofences
            .iter_mut()
            .find(|g| g.id == geofence.id)
            .ok_or_else(|| TaskDavError::Storage(format!("No geofence with id {}", geofence.id)))?;
        *stored = geofence.clone();
        Ok(())
    }

    async fn delete_geofence(&mut self, id: i64) -> TaskDavResult<()> {
        self.geofences.retain(|g| g.id != id);
        Ok(())
    }
}

impl TagStore for MemoryStore {
    async fn tags_by_names(&mut self, names: &[String]) -> TaskDavResult<Vec<TagData>> {
        Ok(self
            .tags
            .iter()
            .filter(|t| names.contains(&t.name))
            .cloned()
            .collect())
    }

    async fn create_tag(&mut self, name: &str) -> TaskDavResult<TagData> {
        let mut tag = TagData::new(name);
        tag.id = self.allocate_id();
        self.tags.push(tag.clone());
        Ok(tag)
    }

    async fn tag_names_for_task(&mut self, task: i64) -> TaskDavResult<Vec<String>> {
        Ok(self
            .task_tags
            .iter()
            .filter(|(t, _)| *t == task)
            .filter_map(|(_, tag)| self.tags.iter().find(|t| t.id == *tag))
            .map(|t| t.name.clone())
            .collect())
    }

    async fn apply_tags(&mut self, task: i64, tags: &[TagData]) -> TaskDavResult<()> {
        self.task_tags.retain(|(t, _)| *t != task);
        self.task_tags.extend(tags.iter().map(|tag| (task, tag.id)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_task_assigns_id_and_timestamps() {
        let mut store = MemoryStore::new();

        let task = store.create_task(Task::with_title("a")).await.unwrap();

        assert!(task.id > 0);
        assert!(task.creation_date > 0);
        assert_eq!(task.creation_date, task.modification_date);
        assert_eq!(store.fetch_task(task.id).await.unwrap(), Some(task));
    }

    #[tokio::test]
    async fn test_save_unknown_task_fails() {
        let mut store = MemoryStore::new();
        let mut task = Task::with_title("ghost");
        task.id = 99;

        let result = store.save_task(&mut task, SaveOptions::default()).await;

        assert!(matches!(result, Err(TaskDavError::Storage(_))));
    }

    #[tokio::test]
    async fn test_second_link_for_same_task_and_calendar_is_rejected() {
        let mut store = MemoryStore::new();
        let link = LinkRecord::new(1, "cal", Some("uid".into()), None);

        store.insert_link(&link).await.unwrap();
        let second = store.insert_link(&link).await;

        assert!(second.is_err());
        assert_eq!(store.links().len(), 1);
        assert!(store.links()[0].is_persisted());
    }

    #[tokio::test]
    async fn test_deleting_geofence_keeps_place() {
        let mut store = MemoryStore::new();
        let place = store
            .insert_place(Place::new(crate::location::Geo::new(1.0, 2.0)))
            .await
            .unwrap();
        let fence = store
            .insert_geofence(Geofence::new(1, &place.uid, &Default::default()))
            .await
            .unwrap();

        store.delete_geofence(fence.id).await.unwrap();

        assert!(store.geofences().is_empty());
        assert_eq!(store.places().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = std::env::temp_dir().join(format!("taskdav-store-{}", uuid::Uuid::new_v4()));
        let path = dir.join("store.json");
        let mut store = MemoryStore::new();
        let task = store.create_task(Task::with_title("persist me")).await.unwrap();

        store.save(&path).unwrap();
        let loaded = MemoryStore::load(&path).unwrap();

        assert_eq!(loaded.tasks(), &[task]);
        let _ = std::fs::remove_dir_all(dir);
    }
}

//! Translation between local tasks and remote VTODO objects.
//!
//! `Translator` owns the storage and background-work handles and runs one
//! task translation at a time. Callers must not translate the same task
//! concurrently.

use chrono::Utc;
use tracing::{debug, warn};

use crate::apply::{apply_local, apply_remote};
use crate::config::TranslatorConfig;
use crate::datetime::LocalZone;
use crate::error::{TaskDavError, TaskDavResult};
use crate::ics::{generate_ics, parse_vtodo};
use crate::link::{LinkRecord, LinkState, RemoteCalendar};
use crate::location::Geo;
use crate::place::{apply_geo, location_for_task};
use crate::store::{LinkStore, LocationStore, SaveOptions, TagStore, TaskStore};
use crate::tag::{TagData, resolve_tags};
use crate::task::Task;
use crate::vtodo::Vtodo;
use crate::work::BackgroundWork;

fn new_uid() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub struct Translator<S, W> {
    store: S,
    work: W,
    config: TranslatorConfig,
}

impl<S, W> Translator<S, W>
where
    S: TaskStore + LinkStore + LocationStore + TagStore,
    W: BackgroundWork,
{
    pub fn new(store: S, work: W, config: TranslatorConfig) -> Self {
        Translator {
            store,
            work,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn zone(&self) -> &LocalZone {
        &self.config.zone
    }

    /// Serialize `task` as a VTODO, starting from the object cached on `link`
    /// so properties this side doesn't manage are kept.
    ///
    /// Assigns a UID to `link` if it has none yet.
    pub async fn to_vtodo(&mut self, link: &mut LinkRecord, task: &Task) -> TaskDavResult<Vec<u8>> {
        let mut vtodo = match link.vtodo.as_deref() {
            Some(cached) => parse_vtodo(cached).unwrap_or_else(|e| {
                warn!(task = task.id, error = %e, "Could not parse cached VTODO, starting over");
                Vtodo::default()
            }),
            None => Vtodo::default(),
        };

        apply_local(&mut vtodo, link, task, &self.config.zone, Utc::now());
        vtodo.categories = self.store.tag_names_for_task(task.id).await?;

        let uid = link.remote_id.get_or_insert_with(new_uid).clone();
        vtodo.uid = Some(uid);

        let geo = location_for_task(&mut self.store, task.id)
            .await?
            .map(|location| location.geo());
        match (geo, vtodo.geo) {
            (Some(geo), Some(current)) if current.equalish(&geo) => {}
            (geo, _) => vtodo.geo = geo,
        }

        Ok(generate_ics(&vtodo)?.into_bytes())
    }

    /// Apply a remote VTODO to its local task and record the sync state.
    ///
    /// Creates the task and link record when `existing` is `None`. Returns
    /// the stored link record.
    pub async fn from_vtodo(
        &mut self,
        calendar: &RemoteCalendar,
        existing: Option<LinkRecord>,
        remote: &Vtodo,
        raw: &str,
        object: Option<&str>,
        etag: Option<&str>,
    ) -> TaskDavResult<LinkRecord> {
        let fetched = match &existing {
            Some(link) => self.store.fetch_task(link.task).await?,
            None => None,
        };
        let mut task = match fetched {
            Some(task) => task,
            None => self.store.create_task(Task::with_title("")).await?,
        };

        let mut link = existing.unwrap_or_else(|| {
            LinkRecord::new(
                task.id,
                &calendar.uuid,
                Some(remote.uid.clone().unwrap_or_else(new_uid)),
                object.map(String::from),
            )
        });
        // Task may have been recreated after a local delete
        link.task = task.id;

        apply_remote(&mut task, remote, &self.config.zone, Utc::now());
        self.set_place(task.id, remote.geo).await?;
        let tags = self.get_tags(&remote.categories).await?;
        self.store.apply_tags(task.id, &tags).await?;
        self.store
            .save_task(&mut task, SaveOptions::from_remote())
            .await?;

        link.vtodo = Some(raw.to_string());
        link.etag = etag.map(String::from);
        link.last_sync = task.modification_date;
        link.remote_parent = remote.parent().map(String::from);
        link.order = remote.order();
        self.save_link(&mut link).await?;

        Ok(link)
    }

    /// Parse a fetched object and apply it, looking up its link by UID.
    pub async fn pull(
        &mut self,
        calendar: &RemoteCalendar,
        raw: &str,
        object: Option<&str>,
        etag: Option<&str>,
    ) -> TaskDavResult<LinkRecord> {
        let remote = parse_vtodo(raw)?;
        let existing = match remote.uid.as_deref() {
            Some(uid) => self.store.link_for_remote_id(&calendar.uuid, uid).await?,
            None => None,
        };
        self.from_vtodo(calendar, existing, &remote, raw, object, etag)
            .await
    }

    /// Serialize a stored task for `calendar` and remember what was sent.
    pub async fn push(&mut self, calendar: &RemoteCalendar, task_id: i64) -> TaskDavResult<(LinkRecord, Vec<u8>)> {
        let task = self
            .store
            .fetch_task(task_id)
            .await?
            .ok_or_else(|| TaskDavError::Storage(format!("No task with id {task_id}")))?;

        let mut link = self
            .store
            .link_for_task(task.id, &calendar.uuid)
            .await?
            .unwrap_or_else(|| LinkRecord::new(task.id, &calendar.uuid, None, None));

        link.remote_parent = if task.parent == Task::NO_ID {
            None
        } else {
            self.store
                .link_for_task(task.parent, &calendar.uuid)
                .await?
                .and_then(|parent| parent.remote_id)
        };

        let bytes = self.to_vtodo(&mut link, &task).await?;
        link.vtodo = Some(String::from_utf8_lossy(&bytes).into_owned());
        self.save_link(&mut link).await?;

        Ok((link, bytes))
    }

    /// Insert or update a link record depending on whether it was stored before.
    pub async fn save_link(&mut self, link: &mut LinkRecord) -> TaskDavResult<()> {
        match link.state {
            LinkState::Unpersisted => {
                let id = self.store.insert_link(link).await?;
                link.state = LinkState::Persisted(id);
                debug!(link = id, task = link.task, remote_id = ?link.remote_id, "NEW");
            }
            LinkState::Persisted(id) => {
                self.store.update_link(link).await?;
                debug!(link = id, task = link.task, remote_id = ?link.remote_id, "UPDATE");
            }
        }
        Ok(())
    }

    pub async fn set_place(&mut self, task: i64, geo: Option<Geo>) -> TaskDavResult<()> {
        apply_geo(&mut self.store, &self.work, &self.config.geofence, task, geo).await
    }

    pub async fn get_tags(&mut self, names: &[String]) -> TaskDavResult<Vec<TagData>> {
        resolve_tags(&mut self.store, names).await
    }

    /// Point each task in `calendar` at the local task its remote parent hint
    /// names, once all objects of the calendar have been pulled.
    pub async fn update_parents(&mut self, calendar: &RemoteCalendar) -> TaskDavResult<usize> {
        let mut updated = 0;
        for link in self.store.links_for_calendar(&calendar.uuid).await? {
            let Some(mut task) = self.store.fetch_task(link.task).await? else {
                continue;
            };
            let parent = match link.remote_parent.as_deref() {
                Some(uid) => self
                    .store
                    .link_for_remote_id(&calendar.uuid, uid)
                    .await?
                    .map(|parent| parent.task)
                    .unwrap_or(Task::NO_ID),
                None => Task::NO_ID,
            };
            if task.parent != parent {
                task.parent = parent;
                self.store
                    .save_task(&mut task, SaveOptions::from_remote())
                    .await?;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::task::Priority;
    use crate::work::{WorkQueue, WorkRequest};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn calendar() -> RemoteCalendar {
        RemoteCalendar::new("cal-1", "Personal")
    }

    fn translator() -> (
        Translator<MemoryStore, WorkQueue>,
        UnboundedReceiver<WorkRequest>,
    ) {
        let (queue, receiver) = WorkQueue::new();
        let config = TranslatorConfig::new(LocalZone::from_name("Europe/Berlin"));
        (Translator::new(MemoryStore::new(), queue, config), receiver)
    }

    const REMOTE: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example//EN\r\n\
BEGIN:VTODO\r\n\
UID:remote-1\r\n\
SUMMARY:Water plants\r\n\
DUE;VALUE=DATE:20240105\r\n\
PRIORITY:2\r\n\
GEO:52.520008;13.404954\r\n\
CATEGORIES:home,garden\r\n\
X-APPLE-SORT-ORDER:12\r\n\
RELATED-TO;RELTYPE=PARENT:remote-parent\r\n\
X-CUSTOM:keep me\r\n\
END:VTODO\r\n\
END:VCALENDAR\r\n";

    #[tokio::test]
    async fn test_pull_creates_task_and_link() {
        let (mut translator, mut receiver) = translator();

        let link = translator
            .pull(&calendar(), REMOTE, Some("remote-1.ics"), Some("\"etag-1\""))
            .await
            .unwrap();

        let store = translator.store();
        assert_eq!(store.tasks().len(), 1);
        let task = &store.tasks()[0];
        assert_eq!(task.title.as_deref(), Some("Water plants"));
        assert_eq!(task.priority, Priority::High);
        assert!(!task.due_has_time);

        assert!(link.is_persisted());
        assert_eq!(link.task, task.id);
        assert_eq!(link.remote_id.as_deref(), Some("remote-1"));
        assert_eq!(link.object.as_deref(), Some("remote-1.ics"));
        assert_eq!(link.etag.as_deref(), Some("\"etag-1\""));
        assert_eq!(link.last_sync, task.modification_date);
        assert_eq!(link.remote_parent.as_deref(), Some("remote-parent"));
        assert_eq!(link.order, Some(12));
        assert_eq!(link.vtodo.as_deref(), Some(REMOTE));

        assert_eq!(store.tags().len(), 2);
        assert_eq!(store.geofences().len(), 1);
        assert!(matches!(
            receiver.try_recv(),
            Ok(WorkRequest::ReverseGeocode(_))
        ));
    }

    #[tokio::test]
    async fn test_second_pull_updates_existing_link() {
        let (mut translator, _receiver) = translator();
        translator
            .pull(&calendar(), REMOTE, None, Some("1"))
            .await
            .unwrap();

        let changed = REMOTE.replace("Water plants", "Water all plants");
        let link = translator
            .pull(&calendar(), &changed, None, Some("2"))
            .await
            .unwrap();

        let store = translator.store();
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.links().len(), 1);
        assert_eq!(store.tasks()[0].title.as_deref(), Some("Water all plants"));
        assert_eq!(link.etag.as_deref(), Some("2"));
        assert_eq!(store.links()[0], link);
    }

    #[tokio::test]
    async fn test_pull_surfaces_parse_errors() {
        let (mut translator, _receiver) = translator();

        let result = translator
            .pull(&calendar(), "this is not ics", None, None)
            .await;

        assert!(matches!(result, Err(TaskDavError::IcsParse(_))));
        assert!(translator.store().tasks().is_empty());
        assert!(translator.store().links().is_empty());
    }

    #[tokio::test]
    async fn test_missing_uid_is_generated() {
        let (mut translator, _receiver) = translator();
        let remote = Vtodo {
            summary: Some("No uid".into()),
            ..Default::default()
        };

        let link = translator
            .from_vtodo(&calendar(), None, &remote, "", None, None)
            .await
            .unwrap();

        assert!(link.remote_id.as_deref().is_some_and(|uid| !uid.is_empty()));
    }

    #[tokio::test]
    async fn test_push_after_pull_keeps_unknown_properties() {
        let (mut translator, _receiver) = translator();
        let link = translator
            .pull(&calendar(), REMOTE, None, None)
            .await
            .unwrap();

        let (pushed, bytes) = translator.push(&calendar(), link.task).await.unwrap();
        let ics = String::from_utf8(bytes).unwrap();

        assert!(ics.contains("UID:remote-1"));
        assert!(ics.contains("X-CUSTOM:keep me"));
        assert!(ics.contains("DUE;VALUE=DATE:20240105"));
        assert!(ics.contains("PRIORITY:2"));
        assert!(ics.contains("GEO:52.520008;13.404954"));
        assert_eq!(pushed.remote_id.as_deref(), Some("remote-1"));
        assert_eq!(translator.store().links().len(), 1);
    }

    #[tokio::test]
    async fn test_push_new_task_assigns_stable_uid() {
        let (mut translator, _receiver) = translator();
        let mut task = Task::with_title("Buy milk");
        task.priority = Priority::High;
        let task = translator.store_mut().create_task(task).await.unwrap();

        let (first, _) = translator.push(&calendar(), task.id).await.unwrap();
        let (second, bytes) = translator.push(&calendar(), task.id).await.unwrap();

        assert!(first.remote_id.is_some());
        assert_eq!(first.remote_id, second.remote_id);
        assert_eq!(first.id(), second.id());
        let ics = String::from_utf8(bytes).unwrap();
        assert!(ics.contains("SUMMARY:Buy milk"));
        assert!(ics.contains("PRIORITY:1"));
        assert!(!ics.contains("RRULE"));
    }

    #[tokio::test]
    async fn test_broken_cache_still_serializes() {
        let (mut translator, _receiver) = translator();
        let task = translator
            .store_mut()
            .create_task(Task::with_title("Cached"))
            .await
            .unwrap();
        let mut link = LinkRecord::new(task.id, "cal-1", Some("cached-uid".into()), None);
        link.vtodo = Some("garbage".into());

        let bytes = translator.to_vtodo(&mut link, &task).await.unwrap();

        let ics = String::from_utf8(bytes).unwrap();
        assert!(ics.contains("UID:cached-uid"));
        assert!(ics.contains("SUMMARY:Cached"));
    }

    #[tokio::test]
    async fn test_tags_become_categories() {
        let (mut translator, _receiver) = translator();
        let task = translator
            .store_mut()
            .create_task(Task::with_title("Tagged"))
            .await
            .unwrap();
        let tags = translator.get_tags(&["errands".to_string()]).await.unwrap();
        translator.store_mut().apply_tags(task.id, &tags).await.unwrap();

        let mut link = LinkRecord::new(task.id, "cal-1", None, None);
        let bytes = translator.to_vtodo(&mut link, &task).await.unwrap();

        let parsed = parse_vtodo(&String::from_utf8(bytes).unwrap()).unwrap();
        assert_eq!(parsed.categories, vec!["errands"]);
        assert_eq!(parsed.uid, link.remote_id);
    }

    #[tokio::test]
    async fn test_update_parents_links_children() {
        let (mut translator, _receiver) = translator();
        let parent = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VTODO\r\n\
UID:remote-parent\r\n\
SUMMARY:Garden\r\n\
END:VTODO\r\n\
END:VCALENDAR\r\n";

        let child = translator.pull(&calendar(), REMOTE, None, None).await.unwrap();
        let parent = translator.pull(&calendar(), parent, None, None).await.unwrap();

        let updated = translator.update_parents(&calendar()).await.unwrap();

        assert_eq!(updated, 1);
        let child_task = translator
            .store_mut()
            .fetch_task(child.task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(child_task.parent, parent.task);
        assert_eq!(translator.update_parents(&calendar()).await.unwrap(), 0);
    }
}

//! Link records binding a local task to its remote VTODO.

use serde::{Deserialize, Serialize};

/// A remote CalDAV calendar (collection) that tasks are synced with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCalendar {
    pub uuid: String,
    pub name: String,
}

impl RemoteCalendar {
    pub fn new(uuid: &str, name: &str) -> Self {
        RemoteCalendar {
            uuid: uuid.to_string(),
            name: name.to_string(),
        }
    }
}

/// Whether a link record has been written to storage yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkState {
    #[default]
    Unpersisted,
    Persisted(i64),
}

/// Binding between a local task and a remote calendar object, plus the sync
/// metadata from the last exchange.
///
/// At most one record exists per (task, calendar). `remote_id` never changes
/// once assigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkRecord {
    pub state: LinkState,
    pub task: i64,
    pub calendar: String,
    /// UID of the remote VTODO
    pub remote_id: Option<String>,
    /// Object name (href) on the server
    pub object: Option<String>,
    /// Last VTODO text seen from or sent to the server
    pub vtodo: Option<String>,
    pub etag: Option<String>,
    pub last_sync: i64,
    pub remote_parent: Option<String>,
    pub order: Option<i64>,
}

impl LinkRecord {
    pub fn new(task: i64, calendar: &str, remote_id: Option<String>, object: Option<String>) -> Self {
        LinkRecord {
            task,
            calendar: calendar.to_string(),
            remote_id,
            object,
            ..Default::default()
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self.state {
            LinkState::Persisted(id) => Some(id),
            LinkState::Unpersisted => None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
}

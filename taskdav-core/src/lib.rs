//! Translation between local task records and CalDAV VTODO objects.
//!
//! This crate provides the pieces a task sync client needs at the server
//! boundary:
//! - `Task`, `LinkRecord` and the location and tag types stored locally
//! - `Vtodo` and the `ics` module for reading and writing RFC 5545 text
//! - `Translator`, which maps tasks to VTODOs and back through the storage
//!   and background-work interfaces in `store` and `work`

pub mod apply;
pub mod config;
pub mod datetime;
pub mod error;
pub mod extensions;
pub mod ics;
pub mod link;
pub mod location;
pub mod memory;
pub mod place;
pub mod priority;
pub mod recurrence;
pub mod store;
pub mod tag;
pub mod task;
pub mod translate;
pub mod vtodo;
pub mod work;

pub use config::{GeofenceDefaults, SyncConfig, TranslatorConfig};
pub use datetime::LocalZone;
pub use error::{TaskDavError, TaskDavResult};
pub use link::{LinkRecord, LinkState, RemoteCalendar};
pub use memory::MemoryStore;
pub use task::{Priority, Task};
pub use translate::Translator;
pub use vtodo::Vtodo;
pub use work::{BackgroundWork, WorkQueue, WorkRequest};

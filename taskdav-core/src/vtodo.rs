//! Remote VTODO object model.
//!
//! Mirrors the parts of an RFC 5545 VTODO that task sync reads or writes.
//! Properties without a typed field are kept in `extensions` so they survive
//! a round trip unchanged.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extensions::Extensions;
use crate::location::Geo;

/// A DUE/DTSTART value in any of the forms RFC 5545 allows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TodoTime {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl TodoTime {
    pub fn is_date(&self) -> bool {
        matches!(self, TodoTime::Date(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoStatus {
    NeedsAction,
    InProcess,
    Completed,
    Cancelled,
}

impl TodoStatus {
    pub fn as_ics_str(&self) -> &'static str {
        match self {
            TodoStatus::NeedsAction => "NEEDS-ACTION",
            TodoStatus::InProcess => "IN-PROCESS",
            TodoStatus::Completed => "COMPLETED",
            TodoStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_ics_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEEDS-ACTION" => Some(TodoStatus::NeedsAction),
            "IN-PROCESS" => Some(TodoStatus::InProcess),
            "COMPLETED" => Some(TodoStatus::Completed),
            "CANCELLED" => Some(TodoStatus::Cancelled),
            _ => None,
        }
    }
}

/// RELTYPE parameter of a RELATED-TO property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelType {
    Parent,
    Child,
    Sibling,
    Other(String),
}

impl RelType {
    pub fn as_ics_str(&self) -> &str {
        match self {
            RelType::Parent => "PARENT",
            RelType::Child => "CHILD",
            RelType::Sibling => "SIBLING",
            RelType::Other(s) => s,
        }
    }

    /// `None` for a blank value, which RFC 5545 treats as PARENT.
    pub fn from_ics_str(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        Some(match s.to_ascii_uppercase().as_str() {
            "PARENT" => RelType::Parent,
            "CHILD" => RelType::Child,
            "SIBLING" => RelType::Sibling,
            _ => RelType::Other(s.to_string()),
        })
    }
}

/// A RELATED-TO property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedTo {
    pub value: String,
    pub reltype: Option<RelType>,
}

impl RelatedTo {
    pub fn parent(value: &str) -> Self {
        RelatedTo {
            value: value.to_string(),
            reltype: Some(RelType::Parent),
        }
    }

    /// RELTYPE=PARENT, or no RELTYPE at all.
    pub fn is_parent(&self) -> bool {
        matches!(self.reltype, None | Some(RelType::Parent))
    }
}

/// A property kept verbatim, parameters included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProperty {
    pub name: String,
    pub value: String,
    pub params: Vec<(String, String)>,
}

impl RawProperty {
    pub fn new(name: &str, value: &str) -> Self {
        RawProperty {
            name: name.to_string(),
            value: value.to_string(),
            params: Vec::new(),
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// A VTODO component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vtodo {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub due: Option<TodoTime>,
    pub dtstart: Option<TodoTime>,
    /// COMPLETED
    pub completed_at: Option<DateTime<Utc>>,
    pub status: Option<TodoStatus>,
    pub percent_complete: Option<u8>,
    /// PRIORITY, 0 when unset
    pub priority: u8,
    /// RRULE value without the property name
    pub rrule: Option<String>,
    /// CREATED
    pub created_at: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub geo: Option<Geo>,
    pub categories: Vec<String>,
    pub related_to: Vec<RelatedTo>,
    pub extensions: Extensions,
}

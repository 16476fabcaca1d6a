//! Local task records.
//!
//! Timestamps are milliseconds since the epoch and use `0` for "unset",
//! matching what the storage layer persists.

use serde::{Deserialize, Serialize};

/// Local priority levels.
///
/// The stored ordinal runs opposite to the iCalendar scale: `High` is 0
/// locally but maps to the low end (1-4) of PRIORITY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High = 0,
    Medium = 1,
    Low = 2,
    #[default]
    None = 3,
}

/// A local task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    pub id: i64,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub due_date: i64,
    pub due_has_time: bool,
    /// Start date, shown as "hide until" in the task list
    pub hide_until: i64,
    pub hide_until_has_time: bool,
    pub completion_date: i64,
    pub creation_date: i64,
    pub modification_date: i64,
    pub priority: Priority,
    pub recurrence: Option<String>,
    pub repeat_until: i64,
    /// Local id of the parent task, 0 for top-level tasks
    pub parent: i64,
    pub collapsed: bool,
    pub reminder_snooze: i64,
}

impl Task {
    pub const NO_ID: i64 = 0;

    pub fn with_title(title: &str) -> Self {
        Task {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completion_date > 0
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty())
    }

    pub fn has_due_date(&self) -> bool {
        self.due_date > 0
    }

    pub fn has_due_time(&self) -> bool {
        self.has_due_date() && self.due_has_time
    }

    pub fn has_start_time(&self) -> bool {
        self.hide_until > 0 && self.hide_until_has_time
    }

    /// Replace the recurrence rule. `None` clears both the rule and its bound.
    pub fn set_recurrence(&mut self, rule: Option<String>, repeat_until: i64) {
        match rule {
            Some(rule) if !rule.trim().is_empty() => {
                self.recurrence = Some(rule);
                self.repeat_until = repeat_until;
            }
            _ => {
                self.recurrence = None;
                self.repeat_until = 0;
            }
        }
    }
}

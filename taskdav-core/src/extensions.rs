//! Typed access to vendor extension properties and the parent relation.
//!
//! Clients like Apple Reminders, Nextcloud Tasks and Thunderbird store task
//! metadata in X- properties. Names are matched case-insensitively and
//! properties nobody here understands stay in the list untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::datetime::{LocalZone, parse_date_value, to_local_millis};
use crate::vtodo::{RawProperty, RelType, RelatedTo, Vtodo};

pub const APPLE_SORT_ORDER: &str = "X-APPLE-SORT-ORDER";
pub const OC_HIDESUBTASKS: &str = "X-OC-HIDESUBTASKS";
pub const MOZ_SNOOZE_TIME: &str = "X-MOZ-SNOOZE-TIME";
pub const MOZ_LASTACK: &str = "X-MOZ-LASTACK";

const HIDE_SUBTASKS: &str = "1";

/// Properties of a VTODO without a typed field, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extensions(Vec<RawProperty>);

impl Extensions {
    pub fn new() -> Self {
        Extensions(Vec::new())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawProperty> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, property: RawProperty) {
        self.0.push(property);
    }

    /// Value of the first property with this name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.is_named(name))
            .map(|p| p.value.as_str())
    }

    /// Overwrite the first property with this name, or append one.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.0.iter_mut().find(|p| p.is_named(name)) {
            Some(existing) => existing.value = value.to_string(),
            None => self.0.push(RawProperty::new(name, value)),
        }
    }

    /// Remove every property with this name.
    pub fn remove(&mut self, name: &str) {
        self.0.retain(|p| !p.is_named(name));
    }

    pub fn sort_order(&self) -> Option<i64> {
        self.get(APPLE_SORT_ORDER)
            .and_then(|v| v.trim().parse().ok())
    }

    pub fn set_sort_order(&mut self, order: Option<i64>) {
        match order {
            Some(order) => self.set(APPLE_SORT_ORDER, &order.to_string()),
            None => self.remove(APPLE_SORT_ORDER),
        }
    }

    pub fn collapsed(&self) -> bool {
        self.get(OC_HIDESUBTASKS) == Some(HIDE_SUBTASKS)
    }

    pub fn set_collapsed(&mut self, collapsed: bool) {
        if collapsed {
            self.set(OC_HIDESUBTASKS, HIDE_SUBTASKS);
        } else {
            self.remove(OC_HIDESUBTASKS);
        }
    }

    pub fn snooze_time(&self, zone: &LocalZone) -> Option<i64> {
        self.get(MOZ_SNOOZE_TIME)
            .and_then(|v| parse_timestamp(v, zone))
    }
}

impl From<Vec<RawProperty>> for Extensions {
    fn from(properties: Vec<RawProperty>) -> Self {
        Extensions(properties)
    }
}

/// Read a DATE-TIME literal, `Z` suffixed or floating.
fn parse_timestamp(value: &str, zone: &LocalZone) -> Option<i64> {
    parse_date_value(value)
        .filter(|t| !t.is_date())
        .map(|t| to_local_millis(Some(&t), zone))
}

fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

impl Vtodo {
    /// UID of the parent task, from the first RELATED-TO that is a parent.
    pub fn parent(&self) -> Option<&str> {
        self.related_to
            .iter()
            .find(|r| r.is_parent())
            .map(|r| r.value.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    /// Point the parent relation at `parent`, collapsing duplicates into one.
    /// A blank or missing value removes the relation.
    pub fn set_parent(&mut self, parent: Option<&str>) {
        let parent = parent.filter(|p| !p.trim().is_empty());
        let Some(parent) = parent else {
            self.related_to.retain(|r| !r.is_parent());
            return;
        };

        let mut seen = false;
        self.related_to.retain_mut(|r| {
            if !r.is_parent() {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            r.value = parent.to_string();
            r.reltype = Some(RelType::Parent);
            true
        });

        if !seen {
            self.related_to.push(RelatedTo::parent(parent));
        }
    }

    pub fn order(&self) -> Option<i64> {
        self.extensions.sort_order()
    }

    pub fn set_order(&mut self, order: Option<i64>) {
        self.extensions.set_sort_order(order);
    }

    pub fn collapsed(&self) -> bool {
        self.extensions.collapsed()
    }

    pub fn set_collapsed(&mut self, collapsed: bool) {
        self.extensions.set_collapsed(collapsed);
    }

    pub fn snooze(&self, zone: &LocalZone) -> Option<i64> {
        self.extensions.snooze_time(zone)
    }

    /// Write X-MOZ-SNOOZE-TIME when `snooze` lies after `now`, together with
    /// X-MOZ-LASTACK set to LAST-MODIFIED. Anything else removes the snooze
    /// time but keeps the acknowledgement.
    pub fn set_snooze(&mut self, snooze: i64, now: DateTime<Utc>) {
        let future = DateTime::from_timestamp_millis(snooze).filter(|s| *s > now);
        match future {
            Some(snooze) => {
                self.extensions.set(MOZ_SNOOZE_TIME, &format_utc(snooze));
                let last_ack = self.last_modified.unwrap_or(now);
                self.extensions.set(MOZ_LASTACK, &format_utc(last_ack));
            }
            None => self.extensions.remove(MOZ_SNOOZE_TIME),
        }
    }
}

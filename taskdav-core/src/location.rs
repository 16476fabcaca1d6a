//! Places, geofences and the GEO position shared with remote objects.

use serde::{Deserialize, Serialize};

use crate::config::GeofenceDefaults;

/// Decimal places kept when matching coordinates.
const COORDINATE_PRECISION: usize = 4;

/// A geographic position (iCalendar GEO).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geo {
    pub latitude: f64,
    pub longitude: f64,
}

impl Geo {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Geo {
            latitude,
            longitude,
        }
    }

    /// Same position once both axes are rounded to the matching precision.
    pub fn equalish(&self, other: &Geo) -> bool {
        coordinate_key(self.latitude) == coordinate_key(other.latitude)
            && coordinate_key(self.longitude) == coordinate_key(other.longitude)
    }
}

/// String form of a coordinate used to look places up.
pub fn coordinate_key(value: f64) -> String {
    format!("{:.*}", COORDINATE_PRECISION, value)
}

/// A stored location. Places are shared between geofences and outlive them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: i64,
    pub uid: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Place {
    pub fn new(geo: Geo) -> Self {
        Place {
            id: 0,
            uid: uuid::Uuid::new_v4().to_string(),
            latitude: geo.latitude,
            longitude: geo.longitude,
        }
    }

    pub fn geo(&self) -> Geo {
        Geo::new(self.latitude, self.longitude)
    }

    pub fn matches(&self, latitude_key: &str, longitude_key: &str) -> bool {
        coordinate_key(self.latitude) == latitude_key
            && coordinate_key(self.longitude) == longitude_key
    }
}

/// A location reminder for one task, pointing at a place by uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub id: i64,
    pub task: i64,
    pub place: String,
    pub arrival: bool,
    pub departure: bool,
    /// Radius in metres
    pub radius: u32,
}

impl Geofence {
    pub fn new(task: i64, place: &str, defaults: &GeofenceDefaults) -> Self {
        Geofence {
            id: 0,
            task,
            place: place.to_string(),
            arrival: defaults.arrival,
            departure: defaults.departure,
            radius: defaults.radius,
        }
    }
}

/// A geofence joined with its place.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub geofence: Geofence,
    pub place: Place,
}

impl Location {
    pub fn geo(&self) -> Geo {
        self.place.geo()
    }
}

//! Configuration for taskdav.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::datetime::LocalZone;
use crate::error::{TaskDavError, TaskDavResult};

static DEFAULT_DATA_DIR: &str = "~/.local/share/taskdav";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

/// Settings applied to geofences created from a remote GEO position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeofenceDefaults {
    pub arrival: bool,
    pub departure: bool,
    pub radius: u32,
}

impl Default for GeofenceDefaults {
    fn default() -> Self {
        GeofenceDefaults {
            arrival: true,
            departure: false,
            radius: 250,
        }
    }
}

/// Global configuration at ~/.config/taskdav/config.toml
///
/// Every key can be overridden with a `TASKDAV_` environment variable,
/// e.g. `TASKDAV_TIME_ZONE=Europe/Berlin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// IANA zone name; the system zone when unset
    #[serde(default)]
    pub time_zone: Option<String>,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub geofence: GeofenceDefaults,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            time_zone: None,
            data_dir: default_data_dir(),
            geofence: GeofenceDefaults::default(),
        }
    }
}

impl SyncConfig {
    pub fn config_path() -> TaskDavResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TaskDavError::Config("Could not determine config directory".into()))?
            .join("taskdav");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, creating a commented default file first
    /// if none exists.
    pub fn load() -> TaskDavResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> TaskDavResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("TASKDAV"))
            .build()
            .map_err(|e| TaskDavError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| TaskDavError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> TaskDavResult<()> {
        let contents = format!(
            "\
# taskdav configuration

# Time zone used for task dates (defaults to the system zone):
# time_zone = \"Europe/Berlin\"

# Where the local task store lives:
# data_dir = \"{}\"

# Defaults for geofences created from a remote GEO position:
# [geofence]
# arrival = true
# departure = false
# radius = 250
",
            DEFAULT_DATA_DIR
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TaskDavError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| TaskDavError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn zone(&self) -> LocalZone {
        match &self.time_zone {
            Some(name) => LocalZone::from_name(name),
            None => LocalZone::system(),
        }
    }

    pub fn translator_config(&self) -> TranslatorConfig {
        TranslatorConfig {
            zone: self.zone(),
            geofence: self.geofence.clone(),
        }
    }
}

/// Inputs every translation needs. The zone is passed explicitly rather than
/// read from the process environment.
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    pub zone: LocalZone,
    pub geofence: GeofenceDefaults,
}

impl TranslatorConfig {
    pub fn new(zone: LocalZone) -> Self {
        TranslatorConfig {
            zone,
            geofence: GeofenceDefaults::default(),
        }
    }
}

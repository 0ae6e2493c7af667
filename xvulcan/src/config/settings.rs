//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use crate::footprint::TagFilter;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Imagery vendor and credentials
    pub provider: ProviderSettings,
    /// Tile zoom and fetch concurrency
    pub imagery: ImagerySettings,
    /// Where job records and artifacts live
    pub storage: StorageSettings,
    /// Footprint source
    pub footprints: FootprintSettings,
    /// External classifier
    pub inference: InferenceSettings,
    /// Stage retry behaviour
    pub pipeline: PipelineSettings,
    /// Log file location
    pub logging: LoggingSettings,
}

/// Provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Provider type: "planet" or "maxar"
    pub provider_type: String,
    /// Planet API key (required for "planet")
    pub planet_api_key: Option<String>,
    /// Maxar API key (required for "maxar")
    pub maxar_api_key: Option<String>,
}

impl ProviderSettings {
    /// The key for the configured provider type.
    pub fn api_key(&self) -> Option<&str> {
        match self.provider_type.as_str() {
            "planet" => self.planet_api_key.as_deref(),
            "maxar" => self.maxar_api_key.as_deref(),
            _ => None,
        }
    }
}

/// Imagery acquisition configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagerySettings {
    /// Slippy-map zoom used for tile-server providers
    pub zoom: u8,
    /// Concurrent tile workers
    pub workers: usize,
    /// HTTP request timeout in seconds
    pub timeout: u64,
}

/// Backend holding job records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Lost on exit
    Memory,
    /// One JSON file per job under the storage directory
    File,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Memory => f.write_str("memory"),
            StoreKind::File => f.write_str("file"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "file" => Ok(StoreKind::File),
            other => Err(format!("unknown store '{}'", other)),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    /// Root of the per-job directory layout
    pub directory: PathBuf,
    /// Job record backend
    pub store: StoreKind,
}

impl StorageSettings {
    /// Directory holding job records for the file store.
    pub fn records_directory(&self) -> PathBuf {
        self.directory.join("records")
    }
}

/// Footprint source configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootprintSettings {
    /// Overpass interpreter URL
    pub endpoint: String,
    /// Tag predicates selecting footprints
    pub tags: TagFilter,
}

/// External classifier configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceSettings {
    /// Program to run
    pub program: String,
    /// Leading arguments, before the per-job arguments
    pub args: Vec<String>,
}

/// Pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Attempts per stage (1 = no retry)
    pub max_attempts: u32,
    /// Pause between attempts in milliseconds
    pub retry_delay_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Directory holding the log file
    pub directory: PathBuf,
    /// Log file name
    pub file: String,
}

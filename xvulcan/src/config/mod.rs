//! User configuration (`~/.xvulcan/config.ini`).
//!
//! # Example
//!
//! ```
//! use xvulcan::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.imagery.zoom, 18);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, FootprintSettings, ImagerySettings, InferenceSettings, LoggingSettings,
    PipelineSettings, ProviderSettings, StorageSettings, StoreKind,
};

//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and service creation
//! to reduce duplication across command handlers.

use crate::error::CliError;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use xvulcan::config::ConfigFile;
use xvulcan::logging::{init_logging, LoggingGuard};
use xvulcan::service::{build_service, create_store, DefaultAssessmentService};
use xvulcan::store::JobStore;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    pub fn new() -> Result<Self, CliError> {
        // Load config file (or use defaults if not present)
        let config = ConfigFile::load()?;

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("xvulcan v{}", xvulcan::VERSION);
        info!("xvulcan CLI: {} command", command);
    }

    /// Open the configured job store without touching any provider.
    pub fn store(&self) -> Result<Arc<dyn JobStore>, CliError> {
        Ok(create_store(&self.config.storage)?)
    }

    /// Create the fully wired assessment service.
    pub fn create_service(&self) -> Result<DefaultAssessmentService, CliError> {
        let service = build_service(&self.config)?;
        info!(provider = service.provider_name(), "Service created successfully");
        Ok(service)
    }

    /// Save bytes to a file, creating parent directories.
    pub fn save_file(&self, path: &Path, data: &[u8]) -> Result<(), CliError> {
        let write_error = |error| CliError::FileWrite {
            path: path.display().to_string(),
            error,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(path, data).map_err(write_error)?;

        info!(path = %path.display(), bytes = data.len(), "File saved");
        Ok(())
    }
}

//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use xvulcan::config::ConfigFileError;
use xvulcan::coord::CoordError;
use xvulcan::footprint::FootprintError;
use xvulcan::mosaic::MergeError;
use xvulcan::provider::ProviderError;
use xvulcan::service::ServiceError;
use xvulcan::store::{JobId, StoreError};

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Invalid command line input
    InvalidInput(String),
    /// Failed to create or use the assessment service
    Service(ServiceError),
    /// Failed to fetch footprints
    Footprints(FootprintError),
    /// Failed to build a mosaic
    Mosaic(MergeError),
    /// Failed to write output file
    FileWrite { path: String, error: std::io::Error },
    /// The assessment pipeline stopped at a stage
    AssessmentFailed { job_id: JobId, stage: String },
}

impl CliError {
    /// Exit code for this error.
    ///
    /// Input mistakes exit with 2, a failed assessment with 3 and everything
    /// else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidInput(_) => 2,
            CliError::Service(ServiceError::Coord(_)) => 2,
            CliError::Service(ServiceError::InvalidSelection(_)) => 2,
            CliError::AssessmentFailed { .. } => 3,
            _ => 1,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Service(ServiceError::Config(_)) => {
                eprintln!();
                eprintln!("Set the provider API key in the config file:");
                eprintln!("  xvulcan config path");
            }
            CliError::Service(ServiceError::Coord(CoordError::AreaTooLarge { .. })) => {
                eprintln!();
                eprintln!("Split the area into boxes no larger than one degree per side.");
            }
            CliError::AssessmentFailed { job_id, .. } => {
                eprintln!();
                eprintln!("The job log is in the log file; inspect the job with:");
                eprintln!("  xvulcan status {}", job_id);
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CliError::Service(e) => write!(f, "{}", e),
            CliError::Footprints(e) => write!(f, "Failed to fetch footprints: {}", e),
            CliError::Mosaic(e) => write!(f, "Failed to build mosaic: {}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
            CliError::AssessmentFailed { job_id, stage } => {
                write!(f, "Assessment {} failed at stage '{}'", job_id, stage)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Service(e) => Some(e),
            CliError::Footprints(e) => Some(e),
            CliError::Mosaic(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Service(ServiceError::Coord(e))
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Service(ServiceError::Provider(e))
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Service(ServiceError::Store(e))
    }
}

impl From<FootprintError> for CliError {
    fn from(e: FootprintError) -> Self {
        CliError::Footprints(e)
    }
}

impl From<MergeError> for CliError {
    fn from(e: MergeError) -> Self {
        CliError::Mosaic(e)
    }
}

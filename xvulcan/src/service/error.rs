//! Service error types.

use crate::coord::CoordError;
use crate::provider::ProviderError;
use crate::store::{JobId, StoreError};
use thiserror::Error;

/// Errors that can occur during service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Coordinates, area or zoom rejected
    #[error("Invalid area: {0}")]
    Coord(#[from] CoordError),

    /// Job store failure, including unknown job ids
    #[error("Job store error: {0}")]
    Store(#[from] StoreError),

    /// Imagery provider failure
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Pre/post image ids not usable
    #[error("Invalid image selection: {0}")]
    InvalidSelection(String),

    /// An assessment is already in flight for the job
    #[error("Job {0} already has an assessment running")]
    AlreadyRunning(JobId),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

//! Error types for the assessment pipeline.
//!
//! A stage either finishes or fails with a [`StageError`]; the pipeline
//! turns the first failure of a group into a [`PipelineOutcome::Failed`].

use crate::coord::CoordError;
use crate::footprint::FootprintError;
use crate::inference::InferenceError;
use crate::mosaic::MergeError;
use crate::provider::ProviderError;
use crate::store::StoreError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while a stage executes.
#[derive(Debug, Error)]
pub enum StageError {
    /// Reading or writing the job record failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The job's bounding box cannot be tiled
    #[error("invalid job area: {0}")]
    Coord(#[from] CoordError),

    /// The footprint source failed
    #[error("footprint fetch failed: {0}")]
    Footprint(#[from] FootprintError),

    /// The imagery provider failed
    #[error("imagery provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Merging or writing a mosaic failed
    #[error("mosaic failed: {0}")]
    Merge(#[from] MergeError),

    /// The classifier could not be run
    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),

    /// An artifact a stage depends on is absent
    #[error("missing input: {0}")]
    MissingInput(String),

    /// A file could not be read or written
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The classifier output is not usable
    #[error("invalid results: {0}")]
    InvalidResults(String),

    /// Task panicked or was cancelled
    #[error("task panicked: {0}")]
    TaskPanicked(String),
}

impl StageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StageError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<tokio::task::JoinError> for StageError {
    fn from(err: tokio::task::JoinError) -> Self {
        StageError::TaskPanicked(err.to_string())
    }
}

/// How a pipeline run ended.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Every stage finished and the job is `done`
    Completed,

    /// `stage` failed; later groups never ran
    Failed { stage: String, error: StageError },
}

impl PipelineOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineOutcome::Completed)
    }

    /// Name of the failing stage, if any.
    pub fn failed_stage(&self) -> Option<&str> {
        match self {
            PipelineOutcome::Completed => None,
            PipelineOutcome::Failed { stage, .. } => Some(stage),
        }
    }
}

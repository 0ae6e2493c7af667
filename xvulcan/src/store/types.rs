//! Job identifiers, status labels and the per-job record.

use crate::coord::BoundingBox;
use crate::mosaic::{ImageTag, Mosaic};
use crate::provider::ImageListing;
use chrono::{DateTime, Utc};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Unique identifier for an assessment job.
///
/// # Example
///
/// ```
/// use xvulcan::store::JobId;
///
/// let id = JobId::new("8d7c0c1e");
/// assert_eq!(id.as_str(), "8d7c0c1e");
/// ```
#[derive(Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Creates a job ID with the given string value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a random (v4 UUID) job ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the string value of this job ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({})", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Progress of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageState {
    Start,
    End,
    Error,
}

impl StageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageState::Start => "start",
            StageState::End => "end",
            StageState::Error => "error",
        }
    }
}

/// Separator between stage name and state in a compound status.
pub const STATUS_DELIMITER: char = ':';

/// Status of a job as stored and reported.
///
/// Plain labels mark queue positions; `Stage` is the `<stage>:<state>`
/// label written while a pipeline stage is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum JobStatus {
    WaitingImagery,
    WaitingAssessment,
    RunningAssessment,
    Done,
    Stage { name: String, state: StageState },
}

impl JobStatus {
    pub fn stage(name: impl Into<String>, state: StageState) -> Self {
        JobStatus::Stage {
            name: name.into(),
            state,
        }
    }

    /// The failing stage, if this is an error status.
    pub fn failed_stage(&self) -> Option<&str> {
        match self {
            JobStatus::Stage {
                name,
                state: StageState::Error,
            } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::WaitingImagery => f.write_str("waiting_imagery"),
            JobStatus::WaitingAssessment => f.write_str("waiting_assessment"),
            JobStatus::RunningAssessment => f.write_str("running_assessment"),
            JobStatus::Done => f.write_str("done"),
            JobStatus::Stage { name, state } => {
                write!(f, "{}{}{}", name, STATUS_DELIMITER, state.as_str())
            }
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting_imagery" => return Ok(JobStatus::WaitingImagery),
            "waiting_assessment" => return Ok(JobStatus::WaitingAssessment),
            "running_assessment" => return Ok(JobStatus::RunningAssessment),
            "done" => return Ok(JobStatus::Done),
            _ => {}
        }

        let (name, state) = s
            .rsplit_once(STATUS_DELIMITER)
            .ok_or_else(|| format!("unknown job status '{}'", s))?;
        let state = match state {
            "start" => StageState::Start,
            "end" => StageState::End,
            "error" => StageState::Error,
            other => return Err(format!("unknown stage state '{}' in '{}'", other, s)),
        };
        if name.is_empty() {
            return Err(format!("missing stage name in '{}'", s));
        }

        Ok(JobStatus::stage(name, state))
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.to_string()
    }
}

impl TryFrom<String> for JobStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Pre- and post-event images chosen for an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSelection {
    pub pre_image_id: String,
    pub post_image_id: String,
}

impl ImageSelection {
    pub fn image_id(&self, tag: ImageTag) -> &str {
        match tag {
            ImageTag::Pre => &self.pre_image_id,
            ImageTag::Post => &self.post_image_id,
        }
    }
}

/// Everything the store keeps for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub uid: JobId,
    pub status: JobStatus,
    pub coordinates: BoundingBox,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub listings: Vec<ImageListing>,
    #[serde(default)]
    pub selection: Option<ImageSelection>,
    #[serde(default)]
    pub mosaics: Vec<Mosaic>,
    #[serde(default)]
    pub footprints: Option<FeatureCollection>,
    #[serde(default)]
    pub results: Option<FeatureCollection>,
}

impl JobRecord {
    /// A freshly submitted job waiting for imagery.
    pub fn new(uid: JobId, coordinates: BoundingBox) -> Self {
        let now = Utc::now();
        Self {
            uid,
            status: JobStatus::WaitingImagery,
            coordinates,
            created_at: now,
            updated_at: now,
            listings: Vec::new(),
            selection: None,
            mosaics: Vec::new(),
            footprints: None,
            results: None,
        }
    }

    pub fn mosaic(&self, tag: ImageTag) -> Option<&Mosaic> {
        self.mosaics.iter().find(|m| m.tag == tag)
    }
}

/// Errors that can occur in a job store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unknown job: {0}")]
    UnknownJob(JobId),

    #[error("Job already exists: {0}")]
    AlreadyExists(JobId),

    #[error("Store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt job record: {0}")]
    Serde(#[from] serde_json::Error),
}

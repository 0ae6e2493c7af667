//! The four assessment stages.

mod footprints;
mod imagery;
mod inference;
mod results;

pub use footprints::{FetchFootprintsStage, GET_OSM_POLYS};
pub use imagery::{FetchImageryStage, FETCH_IMAGERY};
pub use inference::{RunInferenceStage, RUN_INFERENCE};
pub use results::{summarize_results, StoreResultsStage, STORE_RESULTS};

use super::error::StageError;
use serde::Serialize;
use std::io;
use std::path::Path;

/// Serializes `value` to `path`, creating parent directories.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StageError::io(parent, e))?;
    }
    let bytes = serde_json::to_vec(value).map_err(|e| StageError::io(path, io::Error::other(e)))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| StageError::io(path, e))
}

//! Assessment pipeline
//!
//! An assessment runs as three groups of stages:
//!
//! ```text
//! [get_osm_polys | fetch_imagery] -> [run_inference] -> [store_results]
//! ```
//!
//! Stages in a group run concurrently; a group starts only after every
//! stage of the previous one finished. Stages exchange data only through
//! the job store and the job's directory, so each can be exercised alone.
//!
//! Status labels written while the pipeline runs are `<stage>:start`,
//! `<stage>:end` and `<stage>:error`, followed by `done` on success.

mod context;
mod error;
mod runner;
pub mod stages;

pub use context::StageContext;
pub use error::{PipelineOutcome, StageError};
pub use runner::{Pipeline, RetryPolicy, Stage, StageFuture, StageGroup};
pub use stages::{
    FetchFootprintsStage, FetchImageryStage, RunInferenceStage, StoreResultsStage,
    FETCH_IMAGERY, GET_OSM_POLYS, RUN_INFERENCE, STORE_RESULTS,
};

//! Shared state handed to every stage of a run.

use crate::layout::JobLayout;
use crate::store::{JobId, JobStore};
use std::sync::Arc;

/// The job a pipeline run works on and where its artifacts live.
///
/// Cheap to clone; each spawned stage task gets its own copy.
#[derive(Clone)]
pub struct StageContext {
    pub job_id: JobId,
    pub store: Arc<dyn JobStore>,
    pub layout: JobLayout,
}

impl StageContext {
    pub fn new(job_id: JobId, store: Arc<dyn JobStore>, layout: JobLayout) -> Self {
        Self {
            job_id,
            store,
            layout,
        }
    }
}

impl std::fmt::Debug for StageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("job_id", &self.job_id)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

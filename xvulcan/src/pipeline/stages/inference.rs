use crate::inference::{InferenceLauncher, InferenceRequest};
use crate::mosaic::ImageTag;
use crate::pipeline::{Stage, StageContext, StageError, StageFuture};
use crate::store::JobRecord;
use std::path::PathBuf;
use std::sync::Arc;

pub const RUN_INFERENCE: &str = "run_inference";

/// Hands both mosaics and the footprints to the damage classifier.
pub struct RunInferenceStage {
    launcher: Arc<dyn InferenceLauncher>,
}

impl RunInferenceStage {
    pub fn new(launcher: Arc<dyn InferenceLauncher>) -> Self {
        Self { launcher }
    }

    async fn run(&self, ctx: &StageContext) -> Result<(), StageError> {
        let job = ctx.job_id.as_str();
        let record = ctx.store.record(&ctx.job_id)?;

        let request = InferenceRequest {
            job_id: ctx.job_id.clone(),
            pre_mosaic: mosaic_path(&record, ImageTag::Pre)?,
            post_mosaic: mosaic_path(&record, ImageTag::Post)?,
            footprints: existing(ctx.layout.footprints_path(job), "footprint file")?,
            output: ctx.layout.output_path(job),
        };

        self.launcher.launch(&request).await?;
        Ok(())
    }
}

fn mosaic_path(record: &JobRecord, tag: ImageTag) -> Result<PathBuf, StageError> {
    let mosaic = record
        .mosaic(tag)
        .ok_or_else(|| StageError::MissingInput(format!("no {} mosaic recorded", tag)))?;
    existing(mosaic.path.clone(), "mosaic")
}

fn existing(path: PathBuf, what: &str) -> Result<PathBuf, StageError> {
    if !path.is_file() {
        return Err(StageError::MissingInput(format!(
            "{} not found at {}",
            what,
            path.display()
        )));
    }
    Ok(path)
}

impl Stage for RunInferenceStage {
    fn name(&self) -> &str {
        RUN_INFERENCE
    }

    fn execute<'a>(&'a self, ctx: &'a StageContext) -> StageFuture<'a> {
        Box::pin(self.run(ctx))
    }
}

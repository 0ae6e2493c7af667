//! Assessment service facade implementation.

use super::config::ServiceConfig;
use super::error::ServiceError;
use crate::coord::{BoundingBox, CoordError, MAX_ZOOM};
use crate::footprint::{FootprintFetcher, FootprintSource};
use crate::inference::InferenceLauncher;
use crate::layout::JobLayout;
use crate::mosaic::{ImageTag, Mosaic, TileFetcher};
use crate::pipeline::{
    FetchFootprintsStage, FetchImageryStage, Pipeline, PipelineOutcome, RunInferenceStage,
    StageContext, StageGroup, StoreResultsStage,
};
use crate::provider::{AsyncHttpClient, ImageListing, ImageryProvider};
use crate::store::{ImageSelection, JobId, JobRecord, JobStatus, JobStore, StageState};
use chrono::{DateTime, Duration, Utc};
use geojson::FeatureCollection;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the service talks to, wired by the caller.
pub struct ServiceContext<P, C, S>
where
    C: AsyncHttpClient,
    S: FootprintSource,
{
    pub store: Arc<dyn JobStore>,
    pub layout: JobLayout,
    pub provider: Arc<P>,
    pub fetcher: Arc<TileFetcher<C>>,
    pub footprints: Arc<FootprintFetcher<S>>,
    pub launcher: Arc<dyn InferenceLauncher>,
}

/// High-level facade for the assessment workflow.
///
/// A job moves through submission, imagery search and assessment launch:
///
/// ```text
/// submit_coordinates -> waiting_imagery
/// search_imagery     -> waiting_assessment
/// launch_assessment  -> running_assessment -> <stage>:... -> done
/// ```
///
/// Every call reads and writes the job store; nothing is cached between
/// calls, so separate processes sharing a file store see the same jobs.
pub struct AssessmentService<P, C, S>
where
    C: AsyncHttpClient,
    S: FootprintSource,
{
    config: ServiceConfig,
    store: Arc<dyn JobStore>,
    layout: JobLayout,
    provider: Arc<P>,
    fetcher: Arc<TileFetcher<C>>,
    footprints: Arc<FootprintFetcher<S>>,
    launcher: Arc<dyn InferenceLauncher>,
}

impl<P, C, S> AssessmentService<P, C, S>
where
    P: ImageryProvider + 'static,
    C: AsyncHttpClient + 'static,
    S: FootprintSource + 'static,
{
    pub fn new(config: ServiceConfig, context: ServiceContext<P, C, S>) -> Self {
        Self {
            config,
            store: context.store,
            layout: context.layout,
            provider: context.provider,
            fetcher: context.fetcher,
            footprints: context.footprints,
            launcher: context.launcher,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn layout(&self) -> &JobLayout {
        &self.layout
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Registers a new job for the box spanned by two `(lon, lat)` corners.
    ///
    /// The corners may be given in any order. Boxes wider or taller than
    /// the area limit are rejected before anything is stored.
    pub fn submit_coordinates(
        &self,
        start: (f64, f64),
        end: (f64, f64),
    ) -> Result<JobId, ServiceError> {
        submit_job(self.store.as_ref(), start, end)
    }

    pub fn status(&self, job_id: &JobId) -> Result<JobStatus, ServiceError> {
        Ok(self.store.get_status(job_id)?)
    }

    pub fn coordinates(&self, job_id: &JobId) -> Result<BoundingBox, ServiceError> {
        Ok(self.store.get_coordinates(job_id)?)
    }

    pub fn record(&self, job_id: &JobId) -> Result<JobRecord, ServiceError> {
        Ok(self.store.record(job_id)?)
    }

    pub fn jobs(&self) -> Result<Vec<JobId>, ServiceError> {
        Ok(self.store.job_ids()?)
    }

    /// Searches the provider catalogue over the job area for the window
    /// ending at `end`, stores the listings and moves the job to
    /// `waiting_assessment`.
    pub async fn search_imagery(
        &self,
        job_id: &JobId,
        end: DateTime<Utc>,
    ) -> Result<Vec<ImageListing>, ServiceError> {
        let bbox = self.store.get_coordinates(job_id)?;
        let start = end - Duration::days(self.config.search_window_days());

        let listings = self.provider.list_images(&bbox, start, end).await?;
        info!(
            job_id = %job_id,
            provider = self.provider.name(),
            images = listings.len(),
            "Imagery search complete"
        );

        self.store.put_listings(job_id, listings.clone())?;
        self.store.set_status(job_id, JobStatus::WaitingAssessment)?;
        Ok(listings)
    }

    pub fn listings(&self, job_id: &JobId) -> Result<Vec<ImageListing>, ServiceError> {
        Ok(self.store.get_listings(job_id)?)
    }

    /// Records the chosen images and runs the assessment pipeline to
    /// completion.
    ///
    /// `zoom` overrides the configured tile zoom for this job.
    pub async fn launch_assessment(
        &self,
        job_id: &JobId,
        selection: ImageSelection,
        zoom: Option<u8>,
    ) -> Result<PipelineOutcome, ServiceError> {
        let zoom = zoom.unwrap_or(self.config.zoom());
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom).into());
        }
        validate_selection(&selection)?;

        let record = self.store.record(job_id)?;
        if is_in_flight(&record.status) {
            return Err(ServiceError::AlreadyRunning(job_id.clone()));
        }
        warn_on_unlisted(&record, &selection);

        self.store.put_selection(job_id, selection)?;
        self.store.set_status(job_id, JobStatus::RunningAssessment)?;
        info!(job_id = %job_id, zoom, "Assessment launched");

        let ctx = StageContext::new(job_id.clone(), Arc::clone(&self.store), self.layout.clone());
        Ok(self.pipeline(zoom).run(&ctx).await)
    }

    /// The stage groups of one assessment run.
    pub fn pipeline(&self, zoom: u8) -> Pipeline {
        Pipeline::new()
            .then(
                StageGroup::new()
                    .with(FetchFootprintsStage::new(
                        Arc::clone(&self.footprints),
                        self.config.tags().clone(),
                    ))
                    .with(FetchImageryStage::new(
                        Arc::clone(&self.provider),
                        Arc::clone(&self.fetcher),
                        zoom,
                    )),
            )
            .then(StageGroup::single(RunInferenceStage::new(Arc::clone(
                &self.launcher,
            ))))
            .then(StageGroup::single(StoreResultsStage::new()))
            .with_retry(self.config.retry())
    }

    pub fn footprints(&self, job_id: &JobId) -> Result<Option<FeatureCollection>, ServiceError> {
        Ok(self.store.get_footprints(job_id)?)
    }

    pub fn results(&self, job_id: &JobId) -> Result<Option<FeatureCollection>, ServiceError> {
        Ok(self.store.get_result(job_id)?)
    }

    pub fn mosaic(&self, job_id: &JobId, tag: ImageTag) -> Result<Option<Mosaic>, ServiceError> {
        Ok(self.store.record(job_id)?.mosaic(tag).cloned())
    }
}

/// Validates the box spanned by two `(lon, lat)` corners and stores a new
/// job for it in `waiting_imagery`.
pub fn submit_job(
    store: &dyn JobStore,
    start: (f64, f64),
    end: (f64, f64),
) -> Result<JobId, ServiceError> {
    let bbox = BoundingBox::from_corners(start, end)?;
    bbox.check_span()?;

    let job_id = JobId::generate();
    store.create(JobRecord::new(job_id.clone(), bbox))?;

    info!(
        job_id = %job_id,
        west = bbox.west,
        south = bbox.south,
        east = bbox.east,
        north = bbox.north,
        "Job submitted"
    );
    Ok(job_id)
}

fn validate_selection(selection: &ImageSelection) -> Result<(), ServiceError> {
    for tag in [ImageTag::Pre, ImageTag::Post] {
        if selection.image_id(tag).trim().is_empty() {
            return Err(ServiceError::InvalidSelection(format!(
                "{} image id is empty",
                tag
            )));
        }
    }
    Ok(())
}

fn is_in_flight(status: &JobStatus) -> bool {
    match status {
        JobStatus::RunningAssessment => true,
        JobStatus::Stage { state, .. } => *state != StageState::Error,
        _ => false,
    }
}

fn warn_on_unlisted(record: &JobRecord, selection: &ImageSelection) {
    if record.listings.is_empty() {
        return;
    }
    for tag in [ImageTag::Pre, ImageTag::Post] {
        let id = selection.image_id(tag);
        if !record.listings.iter().any(|l| l.id == id) {
            warn!(job_id = %record.uid, tag = %tag, image_id = id, "Selected image not in search results");
        }
    }
}

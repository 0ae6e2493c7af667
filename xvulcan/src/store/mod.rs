//! Job status store
//!
//! The store is the single owner of a job's status and artifacts. Every
//! state change goes through [`JobStore`]; callers never cache a status
//! across an await point.
//!
//! Writes are last-writer-wins: there is no compare-and-swap.

mod file;
mod memory;
mod types;

pub use file::FileJobStore;
pub use memory::MemoryJobStore;
pub use types::{
    ImageSelection, JobId, JobRecord, JobStatus, StageState, StoreError, STATUS_DELIMITER,
};

use crate::coord::BoundingBox;
use crate::mosaic::Mosaic;
use crate::provider::ImageListing;
use chrono::Utc;
use geojson::FeatureCollection;

/// Durable mapping from job id to status and per-stage artifacts.
///
/// Implementors provide [`create`](Self::create), [`record`](Self::record)
/// and [`update`](Self::update); the typed accessors are built on them.
pub trait JobStore: Send + Sync {
    /// Stores a new record. Fails if the id is taken.
    fn create(&self, record: JobRecord) -> Result<(), StoreError>;

    /// Returns a snapshot of the job's record.
    fn record(&self, job_id: &JobId) -> Result<JobRecord, StoreError>;

    /// Applies `apply` to the stored record and persists the result.
    fn update(
        &self,
        job_id: &JobId,
        apply: &mut dyn FnMut(&mut JobRecord),
    ) -> Result<(), StoreError>;

    /// Lists every known job id.
    fn job_ids(&self) -> Result<Vec<JobId>, StoreError>;

    fn get_status(&self, job_id: &JobId) -> Result<JobStatus, StoreError> {
        Ok(self.record(job_id)?.status)
    }

    fn set_status(&self, job_id: &JobId, status: JobStatus) -> Result<(), StoreError> {
        let mut status = Some(status);
        self.update(job_id, &mut |record| {
            if let Some(status) = status.take() {
                record.status = status;
            }
            record.updated_at = Utc::now();
        })
    }

    fn get_coordinates(&self, job_id: &JobId) -> Result<BoundingBox, StoreError> {
        Ok(self.record(job_id)?.coordinates)
    }

    fn put_listings(&self, job_id: &JobId, listings: Vec<ImageListing>) -> Result<(), StoreError> {
        let mut listings = Some(listings);
        self.update(job_id, &mut |record| {
            if let Some(listings) = listings.take() {
                record.listings = listings;
            }
        })
    }

    fn get_listings(&self, job_id: &JobId) -> Result<Vec<ImageListing>, StoreError> {
        Ok(self.record(job_id)?.listings)
    }

    fn put_selection(&self, job_id: &JobId, selection: ImageSelection) -> Result<(), StoreError> {
        let mut selection = Some(selection);
        self.update(job_id, &mut |record| {
            if let Some(selection) = selection.take() {
                record.selection = Some(selection);
            }
        })
    }

    fn get_selection(&self, job_id: &JobId) -> Result<Option<ImageSelection>, StoreError> {
        Ok(self.record(job_id)?.selection)
    }

    /// Stores a mosaic, replacing any earlier one with the same tag.
    fn put_mosaic(&self, job_id: &JobId, mosaic: Mosaic) -> Result<(), StoreError> {
        let mut mosaic = Some(mosaic);
        self.update(job_id, &mut |record| {
            if let Some(mosaic) = mosaic.take() {
                record.mosaics.retain(|m| m.tag != mosaic.tag);
                record.mosaics.push(mosaic);
            }
        })
    }

    fn put_footprints(
        &self,
        job_id: &JobId,
        footprints: FeatureCollection,
    ) -> Result<(), StoreError> {
        let mut footprints = Some(footprints);
        self.update(job_id, &mut |record| {
            if let Some(footprints) = footprints.take() {
                record.footprints = Some(footprints);
            }
        })
    }

    fn get_footprints(&self, job_id: &JobId) -> Result<Option<FeatureCollection>, StoreError> {
        Ok(self.record(job_id)?.footprints)
    }

    fn put_result(&self, job_id: &JobId, results: FeatureCollection) -> Result<(), StoreError> {
        let mut results = Some(results);
        self.update(job_id, &mut |record| {
            if let Some(results) = results.take() {
                record.results = Some(results);
            }
        })
    }

    fn get_result(&self, job_id: &JobId) -> Result<Option<FeatureCollection>, StoreError> {
        Ok(self.record(job_id)?.results)
    }
}

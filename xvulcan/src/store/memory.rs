//! In-memory job store.

use super::types::{JobId, JobRecord, StoreError};
use super::JobStore;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Job store kept in a concurrent map; contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    records: DashMap<JobId, JobRecord>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl JobStore for MemoryJobStore {
    fn create(&self, record: JobRecord) -> Result<(), StoreError> {
        match self.records.entry(record.uid.clone()) {
            Entry::Occupied(entry) => Err(StoreError::AlreadyExists(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(record);
                Ok(())
            }
        }
    }

    fn record(&self, job_id: &JobId) -> Result<JobRecord, StoreError> {
        self.records
            .get(job_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| StoreError::UnknownJob(job_id.clone()))
    }

    fn update(
        &self,
        job_id: &JobId,
        apply: &mut dyn FnMut(&mut JobRecord),
    ) -> Result<(), StoreError> {
        let mut record = self
            .records
            .get_mut(job_id)
            .ok_or_else(|| StoreError::UnknownJob(job_id.clone()))?;
        apply(record.value_mut());
        Ok(())
    }

    fn job_ids(&self) -> Result<Vec<JobId>, StoreError> {
        let mut ids: Vec<JobId> = self.records.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }
}

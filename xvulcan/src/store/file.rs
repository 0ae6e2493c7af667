//! File-backed job store: one JSON document per job.

use super::types::{JobId, JobRecord, StoreError};
use super::JobStore;
use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Job store persisting each record to `<dir>/<job>.json`.
///
/// Separate processes may share a directory; writes replace the whole file
/// via rename, so readers never see a partial record.
#[derive(Debug)]
pub struct FileJobStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileJobStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, job_id: &JobId) -> PathBuf {
        self.dir.join(format!("{}.json", job_id))
    }

    fn read(&self, job_id: &JobId) -> Result<JobRecord, StoreError> {
        let path = self.record_path(job_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::UnknownJob(job_id.clone()))
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write(&self, record: &JobRecord) -> Result<(), StoreError> {
        let path = self.record_path(&record.uid);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(record)?;

        fs::write(&tmp, bytes).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(job_id = %record.uid, status = %record.status, "Job record written");
        Ok(())
    }
}

impl JobStore for FileJobStore {
    fn create(&self, record: JobRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        if self.record_path(&record.uid).exists() {
            return Err(StoreError::AlreadyExists(record.uid));
        }
        self.write(&record)
    }

    fn record(&self, job_id: &JobId) -> Result<JobRecord, StoreError> {
        self.read(job_id)
    }

    fn update(
        &self,
        job_id: &JobId,
        apply: &mut dyn FnMut(&mut JobRecord),
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut record = self.read(job_id)?;
        apply(&mut record);
        self.write(&record)
    }

    fn job_ids(&self) -> Result<Vec<JobId>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut ids: Vec<JobId> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension()? != "json" {
                    return None;
                }
                Some(JobId::new(path.file_stem()?.to_str()?))
            })
            .collect();
        ids.sort();
        Ok(ids)
    }
}

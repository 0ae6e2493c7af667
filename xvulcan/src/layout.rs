//! Per-job file layout.
//!
//! Every artifact of a job lives under `<root>/<job>/`:
//!
//! ```text
//! <root>/<job>/pre/<job>_pre_merged.tif
//! <root>/<job>/post/<job>_post_merged.tif
//! <root>/<job>/in_polys/<job>_polys.geojson
//! <root>/<job>/output/<job>_damage.geojson
//! ```

use crate::mosaic::ImageTag;
use std::path::{Path, PathBuf};

/// Resolves artifact paths for jobs under one root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLayout {
    root: PathBuf,
}

impl JobLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything for `job_id`.
    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.root.join(job_id)
    }

    /// Merged imagery for one side of the event.
    pub fn mosaic_path(&self, job_id: &str, tag: ImageTag) -> PathBuf {
        self.job_dir(job_id)
            .join(tag.as_str())
            .join(format!("{}_{}_merged.tif", job_id, tag))
    }

    /// Building footprints handed to inference.
    pub fn footprints_path(&self, job_id: &str) -> PathBuf {
        self.job_dir(job_id)
            .join("in_polys")
            .join(format!("{}_polys.geojson", job_id))
    }

    /// Where inference writes its classified polygons.
    pub fn output_path(&self, job_id: &str) -> PathBuf {
        self.job_dir(job_id)
            .join("output")
            .join(format!("{}_damage.geojson", job_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_namespaced_by_job() {
        let layout = JobLayout::new("/data");

        assert_eq!(
            layout.mosaic_path("abc", ImageTag::Pre),
            PathBuf::from("/data/abc/pre/abc_pre_merged.tif")
        );
        assert_eq!(
            layout.mosaic_path("abc", ImageTag::Post),
            PathBuf::from("/data/abc/post/abc_post_merged.tif")
        );
        assert_eq!(
            layout.footprints_path("abc"),
            PathBuf::from("/data/abc/in_polys/abc_polys.geojson")
        );
        assert_eq!(
            layout.output_path("abc"),
            PathBuf::from("/data/abc/output/abc_damage.geojson")
        );
    }
}

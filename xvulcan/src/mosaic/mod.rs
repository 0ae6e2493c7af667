//! Tiled imagery acquisition and mosaicking
//!
//! - [`TileFetcher`] downloads a tile set with a bounded worker pool and
//!   georeferences every tile it can decode.
//! - [`merge_rasters`] combines the tiles into one raster clipped to the
//!   requested box.
//! - [`MosaicMerger`] persists the result as a GeoTIFF under the job's
//!   directory.

mod fetch;
mod geotiff;
mod merge;
mod types;

pub use fetch::{TileFetcher, DEFAULT_WORKERS};
pub use geotiff::write_geotiff;
pub use merge::{merge_rasters, MosaicMerger};
pub use types::{
    FetchOutcome, GeoTransform, ImageTag, MergeError, MergedRaster, Mosaic, RasterTile,
    CRS_WGS84, NODATA,
};

//! Mosaic merging.
//!
//! Tiles from a slippy-map server rarely share an exact pixel size in
//! degrees (tile height varies with latitude). Merging at the coarsest
//! per-axis resolution present keeps neighbouring tiles overlapping, so no
//! row or column of the output falls between two tiles.

use super::geotiff::write_geotiff;
use super::types::{GeoTransform, ImageTag, MergeError, MergedRaster, Mosaic, RasterTile, CRS_WGS84, NODATA};
use crate::coord::BoundingBox;
use crate::layout::JobLayout;
use image::{Rgb, RgbImage};
use tracing::{debug, info};

/// Merges tiles into one raster clipped exactly to `bounds`.
///
/// Inputs are sorted by tile coordinate, then by pixel content for tiles
/// sharing a coordinate. For every output pixel centre the first tile (in
/// that order) whose extent contains the centre and whose sample is not
/// nodata supplies the value. The output therefore does not depend on the
/// order of `rasters`.
///
/// # Errors
///
/// Returns [`MergeError::EmptyInput`] when `rasters` is empty.
pub fn merge_rasters(
    mut rasters: Vec<RasterTile>,
    bounds: &BoundingBox,
) -> Result<MergedRaster, MergeError> {
    if rasters.is_empty() {
        return Err(MergeError::EmptyInput);
    }

    let (res_x, res_y) = rasters.iter().fold((0.0_f64, 0.0_f64), |(rx, ry), r| {
        (rx.max(r.transform.pixel_width), ry.max(r.transform.pixel_height))
    });

    let width = ((bounds.width() / res_x).round() as u32).max(1);
    let height = ((bounds.height() / res_y).round() as u32).max(1);
    let transform = GeoTransform {
        origin_x: bounds.west,
        origin_y: bounds.north,
        pixel_width: res_x,
        pixel_height: res_y,
    };

    rasters.sort_by(|a, b| {
        a.tile
            .cmp(&b.tile)
            .then_with(|| a.pixels.dimensions().cmp(&b.pixels.dimensions()))
            .then_with(|| a.pixels.as_raw().cmp(b.pixels.as_raw()))
    });

    let mut pixels = RgbImage::new(width, height);
    let mut filled = vec![false; width as usize * height as usize];

    for raster in &rasters {
        paint(raster, &transform, &mut pixels, &mut filled);
    }

    debug!(
        inputs = rasters.len(),
        width,
        height,
        res_x,
        res_y,
        "Rasters merged"
    );

    Ok(MergedRaster { pixels, transform })
}

/// Fills the still-empty output pixels whose centres fall inside `raster`.
fn paint(raster: &RasterTile, out: &GeoTransform, pixels: &mut RgbImage, filled: &mut [bool]) {
    let extent = raster.extent();
    let (out_w, out_h) = pixels.dimensions();
    let (src_w, src_h) = raster.pixels.dimensions();
    let src = &raster.transform;

    // Candidate window, padded by one pixel; the exact test happens per pixel
    let col_start = ((extent.west - out.origin_x) / out.pixel_width - 1.5).floor();
    let col_end = ((extent.east - out.origin_x) / out.pixel_width + 0.5).ceil();
    let row_start = ((out.origin_y - extent.north) / out.pixel_height - 1.5).floor();
    let row_end = ((out.origin_y - extent.south) / out.pixel_height + 0.5).ceil();

    let clamp = |v: f64, max: u32| v.max(0.0).min(max as f64) as u32;
    let (col_start, col_end) = (clamp(col_start, out_w), clamp(col_end, out_w));
    let (row_start, row_end) = (clamp(row_start, out_h), clamp(row_end, out_h));

    for row in row_start..row_end {
        let lat = out.origin_y - (row as f64 + 0.5) * out.pixel_height;
        // Half-open on the south edge so shared edges belong to one tile
        if !(lat > extent.south && lat <= extent.north) {
            continue;
        }
        let src_row = (((src.origin_y - lat) / src.pixel_height) as u32).min(src_h - 1);

        for col in col_start..col_end {
            let index = row as usize * out_w as usize + col as usize;
            if filled[index] {
                continue;
            }

            let lon = out.origin_x + (col as f64 + 0.5) * out.pixel_width;
            if !(lon >= extent.west && lon < extent.east) {
                continue;
            }
            let src_col = (((lon - src.origin_x) / src.pixel_width) as u32).min(src_w - 1);

            let sample = *raster.pixels.get_pixel(src_col, src_row);
            if sample.0 == NODATA {
                continue;
            }

            pixels.put_pixel(col, row, Rgb(sample.0));
            filled[index] = true;
        }
    }
}

/// Merges per-tag imagery for a job and persists it as GeoTIFF.
#[derive(Debug, Clone)]
pub struct MosaicMerger {
    layout: JobLayout,
}

impl MosaicMerger {
    pub fn new(layout: JobLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &JobLayout {
        &self.layout
    }

    /// Merges `rasters`, releases them and writes the mosaic for `job`/`tag`.
    ///
    /// Writing the same job and tag again overwrites the previous file.
    pub fn merge(
        &self,
        job_id: &str,
        tag: ImageTag,
        rasters: Vec<RasterTile>,
        bounds: &BoundingBox,
    ) -> Result<Mosaic, MergeError> {
        let inputs = rasters.len();
        // Consumes the tiles; they are freed before the file is encoded
        let merged = merge_rasters(rasters, bounds)?;
        let mosaic = self.persist(job_id, tag, merged)?;

        info!(
            job_id,
            tag = %tag,
            inputs,
            width = mosaic.width,
            height = mosaic.height,
            path = %mosaic.path.display(),
            "Mosaic written"
        );
        Ok(mosaic)
    }

    /// Decodes a whole-scene payload and writes it as the mosaic for
    /// `job`/`tag`, stretched over `bounds`.
    pub fn write_scene(
        &self,
        job_id: &str,
        tag: ImageTag,
        payload: &[u8],
        bounds: &BoundingBox,
    ) -> Result<Mosaic, MergeError> {
        let pixels = image::load_from_memory(payload)?.to_rgb8();
        let transform = GeoTransform::from_bounds(bounds, pixels.width(), pixels.height());
        let mosaic = self.persist(job_id, tag, MergedRaster { pixels, transform })?;

        info!(job_id, tag = %tag, path = %mosaic.path.display(), "Scene written");
        Ok(mosaic)
    }

    fn persist(&self, job_id: &str, tag: ImageTag, merged: MergedRaster) -> Result<Mosaic, MergeError> {
        let path = self.layout.mosaic_path(job_id, tag);
        write_geotiff(&path, &merged.pixels, &merged.transform)?;

        Ok(Mosaic {
            job_id: job_id.to_string(),
            tag,
            path,
            width: merged.pixels.width(),
            height: merged.pixels.height(),
            transform: merged.transform,
            crs: CRS_WGS84.to_string(),
        })
    }
}

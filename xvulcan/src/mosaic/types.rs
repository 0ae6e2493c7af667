//! Raster and mosaic types

use crate::coord::{BoundingBox, TileCoordinate};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Coordinate reference system of every raster we produce.
pub const CRS_WGS84: &str = "EPSG:4326";

/// Pixel value treated as "no data" when merging.
pub const NODATA: [u8; 3] = [0, 0, 0];

/// Affine mapping from pixel space to longitude/latitude.
///
/// Rasters are north-up: column `c`, row `r` maps to
/// `(origin_x + c * pixel_width, origin_y - r * pixel_height)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// Longitude of the west edge
    pub origin_x: f64,
    /// Latitude of the north edge
    pub origin_y: f64,
    /// Degrees of longitude per pixel
    pub pixel_width: f64,
    /// Degrees of latitude per pixel (positive, rows advance south)
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Stretches `width × height` pixels over `bounds`.
    pub fn from_bounds(bounds: &BoundingBox, width: u32, height: u32) -> Self {
        Self {
            origin_x: bounds.west,
            origin_y: bounds.north,
            pixel_width: bounds.width() / width.max(1) as f64,
            pixel_height: bounds.height() / height.max(1) as f64,
        }
    }

    /// Geographic extent of a raster of the given size.
    pub fn extent(&self, width: u32, height: u32) -> BoundingBox {
        BoundingBox {
            west: self.origin_x,
            south: self.origin_y - height as f64 * self.pixel_height,
            east: self.origin_x + width as f64 * self.pixel_width,
            north: self.origin_y,
        }
    }
}

/// One fetched, decoded and georeferenced tile.
///
/// Owned by the merge that consumes it.
#[derive(Debug, Clone)]
pub struct RasterTile {
    pub tile: TileCoordinate,
    pub pixels: RgbImage,
    pub transform: GeoTransform,
    pub crs: &'static str,
}

impl RasterTile {
    /// Wraps decoded pixels for `tile`, stretching them over its bounds.
    pub fn new(tile: TileCoordinate, pixels: RgbImage) -> Self {
        let bounds = crate::coord::tile_bounds(&tile);
        let transform = GeoTransform::from_bounds(&bounds, pixels.width(), pixels.height());
        Self {
            tile,
            pixels,
            transform,
            crs: CRS_WGS84,
        }
    }

    pub fn extent(&self) -> BoundingBox {
        self.transform
            .extent(self.pixels.width(), self.pixels.height())
    }
}

/// Result of a tile batch.
///
/// `rasters.len() + failed` always equals the number of requested tiles.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Successfully fetched tiles, in request order
    pub rasters: Vec<RasterTile>,
    /// Tiles dropped after a network, HTTP or decode failure
    pub failed: usize,
}

impl FetchOutcome {
    pub fn requested(&self) -> usize {
        self.rasters.len() + self.failed
    }
}

/// An in-memory merge result, clipped to the requested box.
#[derive(Debug, Clone)]
pub struct MergedRaster {
    pub pixels: RgbImage,
    pub transform: GeoTransform,
}

/// Which side of the event an image shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageTag {
    Pre,
    Post,
}

impl ImageTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageTag::Pre => "pre",
            ImageTag::Post => "post",
        }
    }
}

impl fmt::Display for ImageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre" => Ok(ImageTag::Pre),
            "post" => Ok(ImageTag::Post),
            other => Err(format!("unknown image tag '{}'", other)),
        }
    }
}

/// A merged raster persisted for one job and tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mosaic {
    pub job_id: String,
    pub tag: ImageTag,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub transform: GeoTransform,
    pub crs: String,
}

/// Errors that can occur while merging or persisting imagery.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Every tile of the request failed
    #[error("No rasters to merge: every tile in the request failed")]
    EmptyInput,

    /// A whole-scene payload could not be decoded
    #[error("Failed to decode imagery: {0}")]
    Decode(#[from] image::ImageError),

    /// GeoTIFF encoding failed
    #[error("Failed to encode GeoTIFF: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Filesystem error while writing the mosaic
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

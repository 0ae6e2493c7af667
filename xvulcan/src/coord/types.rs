//! Coordinate type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels accepted by the slippy-map tile servers we talk to
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 22;

/// Largest box edge, in degrees, that we will turn into a tile set.
///
/// At zoom 18 a one-degree square is already ~530k tiles.
pub const MAX_SPAN_DEGREES: f64 = 1.0;

/// A geographic area of interest in longitude/latitude degrees.
///
/// Always canonical: `west < east` and `south < north`. Use
/// [`BoundingBox::from_corners`] to build one from user input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Builds a box from two opposite corners given in any order.
    ///
    /// Each corner is a `(lon, lat)` pair. The corners are normalized with a
    /// min/max swap per axis, so callers never need to know which one is the
    /// north-west corner.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Result<Self, CoordError> {
        for (lon, lat) in [a, b] {
            if !lon.is_finite() || !(MIN_LON..=MAX_LON).contains(&lon) {
                return Err(CoordError::InvalidLongitude(lon));
            }
            if !lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&lat) {
                return Err(CoordError::InvalidLatitude(lat));
            }
        }

        let bbox = Self {
            west: a.0.min(b.0),
            south: a.1.min(b.1),
            east: a.0.max(b.0),
            north: a.1.max(b.1),
        };

        if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
            return Err(CoordError::DegenerateBox(bbox));
        }

        Ok(bbox)
    }

    /// East-west extent in degrees.
    #[inline]
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// North-south extent in degrees.
    #[inline]
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Returns true if the point lies inside the box (edges included).
    #[inline]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }

    /// Rejects boxes that would expand into an unreasonable number of tiles.
    pub fn check_span(&self) -> Result<(), CoordError> {
        if self.width() > MAX_SPAN_DEGREES || self.height() > MAX_SPAN_DEGREES {
            return Err(CoordError::AreaTooLarge {
                width: self.width(),
                height: self.height(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.west, self.south, self.east, self.north
        )
    }
}

/// Tile coordinates in the Web Mercator / Slippy Map system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoordinate {
    /// Zoom level
    pub zoom: u8,
    /// Y coordinate (north-south), 0 at north
    pub y: u32,
    /// X coordinate (east-west), 0 at west
    pub x: u32,
}

impl TileCoordinate {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { zoom, y, x }
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Inclusive tile index range covering a bounding box at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
    pub zoom: u8,
}

impl TileRange {
    /// Number of tiles in the range.
    #[inline]
    pub fn count(&self) -> usize {
        (self.x_max - self.x_min + 1) as usize * (self.y_max - self.y_min + 1) as usize
    }

    /// Returns an iterator over every tile in the range.
    ///
    /// Tiles are yielded column by column (x outer, y inner).
    pub fn tiles(&self) -> TileRangeIter {
        TileRangeIter {
            range: *self,
            next_x: self.x_min,
            next_y: self.y_min,
            remaining: self.count(),
        }
    }
}

/// Iterator over the tiles of a [`TileRange`].
#[derive(Debug, Clone)]
pub struct TileRangeIter {
    range: TileRange,
    next_x: u32,
    next_y: u32,
    remaining: usize,
}

impl Iterator for TileRangeIter {
    type Item = TileCoordinate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let tile = TileCoordinate::new(self.next_x, self.next_y, self.range.zoom);
        self.remaining -= 1;

        if self.next_y == self.range.y_max {
            self.next_y = self.range.y_min;
            self.next_x += 1;
        } else {
            self.next_y += 1;
        }

        Some(tile)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for TileRangeIter {}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside valid range (-85.05112878 to 85.05112878)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Zoom level is outside valid range (0 to 22)
    InvalidZoom(u8),
    /// Both corners share a longitude or latitude
    DegenerateBox(BoundingBox),
    /// Box exceeds the per-axis size limit
    AreaTooLarge { width: f64, height: f64 },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
            CoordError::DegenerateBox(bbox) => {
                write!(f, "Bounding box {} has zero width or height", bbox)
            }
            CoordError::AreaTooLarge { width, height } => {
                write!(
                    f,
                    "Bounding box is {:.4}° × {:.4}°, larger than the {}° limit; split the area into smaller requests",
                    width, height, MAX_SPAN_DEGREES
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}

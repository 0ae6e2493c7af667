//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (longitude/latitude)
//! and Web Mercator slippy-map tile coordinates, plus the bounding box type
//! every other module works with.

mod types;


pub use types::{
    BoundingBox, CoordError, TileCoordinate, TileRange, TileRangeIter, MAX_LAT, MAX_LON,
    MAX_SPAN_DEGREES, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Fractional tile position of a point.
///
/// Uses the Mercator latitude transform `(1 - ln(tan(lat) + sec(lat)) / π) / 2`.
#[inline]
fn fractional_tile(lon: f64, lat: f64, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32);
    let lat_rad = lat.to_radians();

    let x = n * (lon + 180.0) / 360.0;
    let y = n * (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;

    (x, y)
}

/// Clamps a fractional tile index into `0..2^zoom`.
#[inline]
fn clamp_index(value: f64, zoom: u8) -> u32 {
    let max_index = (1u64 << zoom) - 1;
    (value.floor().max(0.0) as u64).min(max_index) as u32
}

fn check_zoom(zoom: u8) -> Result<(), CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    Ok(())
}

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `zoom` - Zoom level (0 to 22)
#[inline]
pub fn to_tile_coords(lon: f64, lat: f64, zoom: u8) -> Result<TileCoordinate, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    check_zoom(zoom)?;

    let (x, y) = fractional_tile(lon, lat, zoom);
    Ok(TileCoordinate::new(
        clamp_index(x, zoom),
        clamp_index(y, zoom),
        zoom,
    ))
}

/// Returns the geographic extent of one tile.
#[inline]
pub fn tile_bounds(tile: &TileCoordinate) -> BoundingBox {
    let n = 2.0_f64.powi(tile.zoom as i32);
    let lon_step = 360.0 / n;

    let west = -180.0 + tile.x as f64 * lon_step;
    let north = mercator_to_lat(PI * (1.0 - 2.0 * tile.y as f64 / n));
    let south = mercator_to_lat(PI * (1.0 - 2.0 * (tile.y + 1) as f64 / n));

    BoundingBox {
        west,
        south,
        east: west + lon_step,
        north,
    }
}

#[inline]
fn mercator_to_lat(mercator_y: f64) -> f64 {
    mercator_y.sinh().atan().to_degrees()
}

/// Computes the inclusive tile range covering a bounding box.
///
/// The x-range comes from the west/east edges and the y-range from the
/// north/south edges, independently. Boxes wider or taller than
/// [`MAX_SPAN_DEGREES`] are rejected before any index is computed.
pub fn tile_range(bbox: &BoundingBox, zoom: u8) -> Result<TileRange, CoordError> {
    check_zoom(zoom)?;
    bbox.check_span()?;

    let (x_min, y_max) = fractional_tile(bbox.west, bbox.south, zoom);
    let (x_max, y_min) = fractional_tile(bbox.east, bbox.north, zoom);

    Ok(TileRange {
        x_min: clamp_index(x_min, zoom),
        x_max: clamp_index(x_max, zoom),
        y_min: clamp_index(y_min, zoom),
        y_max: clamp_index(y_max, zoom),
        zoom,
    })
}

//! Minimal GeoTIFF writer.
//!
//! Writes an LZW-compressed RGB image with the three GeoTIFF tags needed to
//! place it on the globe in EPSG:4326.

use super::types::{GeoTransform, MergeError};
use image::RgbImage;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tiff::encoder::{colortype, compression::Lzw, TiffEncoder};
use tiff::tags::Tag;

/// GeoKey directory for a geographic (lat/lon) WGS84 raster.
///
/// Header `[version, revision, minor, key count]`, then one
/// `[key, location, count, value]` entry per key:
/// GTModelType = Geographic, GTRasterType = PixelIsArea,
/// GeographicType = 4326.
const GEO_KEYS_WGS84: [u16; 16] = [
    1, 1, 0, 3, //
    1024, 0, 1, 2, //
    1025, 0, 1, 1, //
    2048, 0, 1, 4326,
];

/// Writes `pixels` as a GeoTIFF at `path`, creating parent directories.
pub fn write_geotiff(
    path: &Path,
    pixels: &RgbImage,
    transform: &GeoTransform,
) -> Result<(), MergeError> {
    let io_error = |source| MergeError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let file = File::create(path).map_err(io_error)?;

    let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
    let mut image = encoder.new_image_with_compression::<colortype::RGB8, _>(
        pixels.width(),
        pixels.height(),
        Lzw,
    )?;

    let scale = [transform.pixel_width, transform.pixel_height, 0.0];
    let tiepoint = [0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0];

    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &scale[..])?;
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])?;
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, &GEO_KEYS_WGS84[..])?;

    image.write_data(pixels.as_raw())?;
    Ok(())
}

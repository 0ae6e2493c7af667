//! Standalone mosaic command.
//!
//! Fetches the tiles of an area from any XYZ tile server and writes the
//! merged raster as a GeoTIFF, outside of any job.

use std::path::Path;
use tracing::info;
use xvulcan::coord::{tile_range, TileCoordinate};
use xvulcan::mosaic::{merge_rasters, write_geotiff, TileFetcher};
use xvulcan::provider::{AsyncReqwestClient, TileUrlTemplate};

use super::common::{require_extension, AreaArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the mosaic command.
pub struct MosaicArgs {
    pub area: AreaArgs,
    pub template: String,
    pub subdomains: Vec<String>,
    pub zoom: Option<u8>,
    pub workers: Option<usize>,
    pub output: String,
}

/// Fetch, merge and write one mosaic.
pub async fn run(runner: &CliRunner, args: MosaicArgs) -> Result<(), CliError> {
    let output = Path::new(&args.output);
    require_extension(output, "tif")?;

    let config = runner.config();
    let zoom = args.zoom.unwrap_or(config.imagery.zoom);
    let workers = args.workers.unwrap_or(config.imagery.workers).max(1);

    let bbox = args.area.bounding_box()?;
    let range = tile_range(&bbox, zoom)?;
    let tiles: Vec<TileCoordinate> = range.tiles().collect();

    println!(
        "Fetching {} tiles at zoom {} with {} workers...",
        tiles.len(),
        zoom,
        workers
    );

    let template = TileUrlTemplate::new(args.template).with_subdomains(args.subdomains);
    let client = AsyncReqwestClient::with_timeout(config.imagery.timeout)?;
    let fetcher = TileFetcher::new(client).with_workers(workers);

    let outcome = fetcher.fetch_tiles(&tiles, &template).await;
    if outcome.failed > 0 {
        println!(
            "Warning: {} of {} tiles failed and are left as nodata",
            outcome.failed,
            outcome.requested()
        );
    }

    let merged = merge_rasters(outcome.rasters, &bbox)?;
    write_geotiff(output, &merged.pixels, &merged.transform)?;

    info!(
        path = %output.display(),
        width = merged.pixels.width(),
        height = merged.pixels.height(),
        "Mosaic written"
    );
    println!(
        "✓ Saved {} ({}x{} px)",
        output.display(),
        merged.pixels.width(),
        merged.pixels.height()
    );

    Ok(())
}

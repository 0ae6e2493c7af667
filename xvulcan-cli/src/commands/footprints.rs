//! Standalone footprint command.
//!
//! Queries Overpass for the building footprints of an area and writes them
//! as a GeoJSON feature collection.

use std::path::Path;
use xvulcan::footprint::{
    FootprintCollection, FootprintFetcher, FootprintResult, OverpassSource, TagFilter,
};
use xvulcan::provider::AsyncReqwestClient;

use super::common::{require_extension, AreaArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

const ADHOC_JOB: &str = "adhoc";

/// Arguments for the footprints command.
pub struct FootprintArgs {
    pub area: AreaArgs,
    pub tags: Option<String>,
    pub endpoint: Option<String>,
    pub output: String,
}

/// Fetch the footprints and write them to the output file.
pub async fn run(runner: &CliRunner, args: FootprintArgs) -> Result<(), CliError> {
    let output = Path::new(&args.output);
    require_extension(output, "geojson")?;

    let config = runner.config();
    let tags = match &args.tags {
        Some(tags) => tags
            .parse::<TagFilter>()
            .map_err(|e| CliError::InvalidInput(format!("--tags: {}", e)))?,
        None => config.footprints.tags.clone(),
    };
    let endpoint = args
        .endpoint
        .unwrap_or_else(|| config.footprints.endpoint.clone());

    let bbox = args.area.bounding_box()?;
    println!("Querying {} for [{}] in {}...", endpoint, tags, bbox);

    let client = AsyncReqwestClient::with_timeout(config.imagery.timeout)?;
    let fetcher = FootprintFetcher::new(OverpassSource::with_endpoint(client, endpoint));

    let collection = match fetcher.fetch(ADHOC_JOB, &bbox, &tags).await? {
        FootprintResult::Found(collection) => collection,
        FootprintResult::NoResults => {
            println!("No footprints found; writing an empty collection");
            FootprintCollection::empty(ADHOC_JOB)
        }
    };

    let geojson = serde_json::to_vec_pretty(&collection.to_feature_collection())
        .map_err(|e| CliError::FileWrite {
            path: output.display().to_string(),
            error: e.into(),
        })?;
    runner.save_file(output, &geojson)?;
    println!("✓ Saved {} footprints to {}", collection.len(), output.display());

    Ok(())
}

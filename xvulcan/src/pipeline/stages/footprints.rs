use super::write_json;
use crate::footprint::{
    FootprintCollection, FootprintFetcher, FootprintResult, FootprintSource, TagFilter,
};
use crate::pipeline::{Stage, StageContext, StageError, StageFuture};
use std::sync::Arc;
use tracing::info;

pub const GET_OSM_POLYS: &str = "get_osm_polys";

/// Fetches building footprints for the job area and writes them to
/// `in_polys/<job>_polys.geojson`.
pub struct FetchFootprintsStage<S: FootprintSource> {
    fetcher: Arc<FootprintFetcher<S>>,
    tags: TagFilter,
}

impl<S: FootprintSource> FetchFootprintsStage<S> {
    pub fn new(fetcher: Arc<FootprintFetcher<S>>, tags: TagFilter) -> Self {
        Self { fetcher, tags }
    }

    async fn run(&self, ctx: &StageContext) -> Result<(), StageError> {
        let job = ctx.job_id.as_str();
        let bbox = ctx.store.get_coordinates(&ctx.job_id)?;

        let collection = match self.fetcher.fetch(job, &bbox, &self.tags).await? {
            FootprintResult::Found(collection) => collection,
            FootprintResult::NoResults => {
                info!(job_id = job, "No footprints in area, writing empty collection");
                FootprintCollection::empty(job)
            }
        };

        let features = collection.to_feature_collection();
        let path = ctx.layout.footprints_path(job);
        write_json(&path, &features).await?;
        ctx.store.put_footprints(&ctx.job_id, features)?;

        info!(
            job_id = job,
            footprints = collection.len(),
            path = %path.display(),
            "Footprints stored"
        );
        Ok(())
    }
}

impl<S: FootprintSource + 'static> Stage for FetchFootprintsStage<S> {
    fn name(&self) -> &str {
        GET_OSM_POLYS
    }

    fn execute<'a>(&'a self, ctx: &'a StageContext) -> StageFuture<'a> {
        Box::pin(self.run(ctx))
    }
}

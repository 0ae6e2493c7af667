use crate::coord::{tile_range, BoundingBox, TileCoordinate};
use crate::mosaic::{ImageTag, Mosaic, MosaicMerger, TileFetcher};
use crate::pipeline::{Stage, StageContext, StageError, StageFuture};
use crate::provider::{AsyncHttpClient, ImageryProvider, ImagerySource};
use std::sync::Arc;
use tracing::{info, warn};

pub const FETCH_IMAGERY: &str = "fetch_imagery";

/// Builds the pre- and post-event mosaics for the selected images.
pub struct FetchImageryStage<P, C: AsyncHttpClient> {
    provider: Arc<P>,
    fetcher: Arc<TileFetcher<C>>,
    zoom: u8,
}

impl<P, C> FetchImageryStage<P, C>
where
    P: ImageryProvider,
    C: AsyncHttpClient + 'static,
{
    pub fn new(provider: Arc<P>, fetcher: Arc<TileFetcher<C>>, zoom: u8) -> Self {
        Self {
            provider,
            fetcher,
            zoom,
        }
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    async fn run(&self, ctx: &StageContext) -> Result<(), StageError> {
        let bbox = ctx.store.get_coordinates(&ctx.job_id)?;
        let selection = ctx.store.get_selection(&ctx.job_id)?.ok_or_else(|| {
            StageError::MissingInput(format!("no image selection for job {}", ctx.job_id))
        })?;
        let merger = MosaicMerger::new(ctx.layout.clone());

        for tag in [ImageTag::Pre, ImageTag::Post] {
            let mosaic = self
                .build_mosaic(ctx, &merger, tag, selection.image_id(tag), bbox)
                .await?;
            ctx.store.put_mosaic(&ctx.job_id, mosaic)?;
        }
        Ok(())
    }

    async fn build_mosaic(
        &self,
        ctx: &StageContext,
        merger: &MosaicMerger,
        tag: ImageTag,
        image_id: &str,
        bbox: BoundingBox,
    ) -> Result<Mosaic, StageError> {
        let job = ctx.job_id.to_string();
        let merger = merger.clone();

        match self.provider.source(image_id) {
            ImagerySource::TileServer(template) => {
                let range = tile_range(&bbox, self.zoom)?;
                let tiles: Vec<TileCoordinate> = range.tiles().collect();
                info!(
                    job_id = %job,
                    tag = %tag,
                    image_id,
                    zoom = self.zoom,
                    tiles = tiles.len(),
                    "Fetching imagery tiles"
                );

                let outcome = self.fetcher.fetch_tiles(&tiles, &template).await;
                if outcome.failed > 0 {
                    warn!(
                        job_id = %job,
                        tag = %tag,
                        failed = outcome.failed,
                        requested = outcome.requested(),
                        "Some tiles could not be fetched"
                    );
                }

                let rasters = outcome.rasters;
                let mosaic = tokio::task::spawn_blocking(move || {
                    merger.merge(&job, tag, rasters, &bbox)
                })
                .await??;
                Ok(mosaic)
            }
            ImagerySource::Scene => {
                info!(job_id = %job, tag = %tag, image_id, provider = self.provider.name(), "Fetching scene");
                let payload = self.provider.fetch_scene(&bbox, image_id).await?;
                let mosaic = tokio::task::spawn_blocking(move || {
                    merger.write_scene(&job, tag, &payload, &bbox)
                })
                .await??;
                Ok(mosaic)
            }
        }
    }
}

impl<P, C> Stage for FetchImageryStage<P, C>
where
    P: ImageryProvider + 'static,
    C: AsyncHttpClient + 'static,
{
    fn name(&self) -> &str {
        FETCH_IMAGERY
    }

    fn execute<'a>(&'a self, ctx: &'a StageContext) -> StageFuture<'a> {
        Box::pin(self.run(ctx))
    }
}

//! Bounded tile fetching.
//!
//! A fixed number of tokio workers drain a shared queue of `(slot, tile)`
//! pairs. Each worker keeps the rasters it produced locally and hands them
//! back when the queue is empty; the fetcher then places them into a
//! pre-sized slot array so output order matches request order.

use super::types::{FetchOutcome, RasterTile};
use crate::coord::TileCoordinate;
use crate::provider::{AsyncHttpClient, ProviderError, TileUrlTemplate};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Default number of concurrent tile workers.
pub const DEFAULT_WORKERS: usize = 4;

type TileQueue = Arc<Mutex<VecDeque<(usize, TileCoordinate)>>>;

#[derive(Debug, Error)]
enum TileError {
    #[error("{0}")]
    Http(ProviderError),
    #[error("undecodable tile: {0}")]
    Decode(#[from] image::ImageError),
    #[error("decode task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Fetches and georeferences slippy-map tiles with a bounded worker pool.
pub struct TileFetcher<C: AsyncHttpClient> {
    http_client: Arc<C>,
    workers: usize,
}

impl<C: AsyncHttpClient + 'static> TileFetcher<C> {
    /// Creates a fetcher with [`DEFAULT_WORKERS`] workers.
    pub fn new(http_client: C) -> Self {
        Self::from_shared(Arc::new(http_client))
    }

    /// Creates a fetcher around an already shared client.
    pub fn from_shared(http_client: Arc<C>) -> Self {
        Self {
            http_client,
            workers: DEFAULT_WORKERS,
        }
    }

    /// Sets the worker count (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Fetches every tile in `tiles` through `template`.
    ///
    /// Failed tiles are counted and dropped, never retried; the batch always
    /// runs to completion.
    pub async fn fetch_tiles(
        &self,
        tiles: &[TileCoordinate],
        template: &TileUrlTemplate,
    ) -> FetchOutcome {
        let total = tiles.len();
        if total == 0 {
            return FetchOutcome::default();
        }

        let start = Instant::now();
        let queue: TileQueue = Arc::new(Mutex::new(tiles.iter().copied().enumerate().collect()));
        let template = Arc::new(template.clone());
        let worker_count = self.workers.min(total);

        info!(tiles = total, workers = worker_count, "Fetching tiles");

        let mut pool = JoinSet::new();
        for worker in 0..worker_count {
            let queue = Arc::clone(&queue);
            let client = Arc::clone(&self.http_client);
            let template = Arc::clone(&template);
            pool.spawn(drain_queue(worker, queue, client, template));
        }

        let mut slots: Vec<Option<RasterTile>> = (0..total).map(|_| None).collect();
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(results) => {
                    for (slot, raster) in results {
                        slots[slot] = Some(raster);
                    }
                }
                // Tiles held by a panicked worker stay empty and count as failed
                Err(e) => warn!(error = %e, "Tile worker aborted"),
            }
        }

        let rasters: Vec<RasterTile> = slots.into_iter().flatten().collect();
        let failed = total - rasters.len();

        info!(
            fetched = rasters.len(),
            failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tile fetch complete"
        );

        FetchOutcome { rasters, failed }
    }
}

async fn drain_queue<C: AsyncHttpClient>(
    worker: usize,
    queue: TileQueue,
    client: Arc<C>,
    template: Arc<TileUrlTemplate>,
) -> Vec<(usize, RasterTile)> {
    let mut produced = Vec::new();

    loop {
        // The guard is dropped before the await below
        let next = queue.lock().pop_front();
        let Some((slot, tile)) = next else {
            break;
        };

        match fetch_one(client.as_ref(), &template, tile).await {
            Ok(raster) => {
                debug!(worker, tile = %tile, "Tile fetched");
                produced.push((slot, raster));
            }
            Err(e) => {
                warn!(worker, tile = %tile, error = %e, "Tile dropped");
            }
        }
    }

    produced
}

async fn fetch_one<C: AsyncHttpClient>(
    client: &C,
    template: &TileUrlTemplate,
    tile: TileCoordinate,
) -> Result<RasterTile, TileError> {
    let url = template.url_for(&tile);
    let bytes = client.get(&url).await.map_err(TileError::Http)?;

    let pixels =
        tokio::task::spawn_blocking(move || image::load_from_memory(&bytes).map(|i| i.to_rgb8()))
            .await??;

    Ok(RasterTile::new(tile, pixels))
}

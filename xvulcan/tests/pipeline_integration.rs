//! Integration tests for the assessment workflow.
//!
//! These tests drive [`AssessmentService`] end to end against in-process
//! collaborators:
//! - a routing HTTP client serving PNG tiles and Overpass answers
//! - a tile-server imagery provider
//! - a launcher standing in for the damage classifier
//!
//! Job state lives in a [`FileJobStore`] so a second store opened on the
//! same directory must observe every transition.

use chrono::{DateTime, Utc};
use image::{ImageFormat, Rgb, RgbImage};
use std::future::Future;
use std::io::Cursor;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use xvulcan::coord::BoundingBox;
use xvulcan::footprint::{FootprintFetcher, OverpassSource};
use xvulcan::inference::{InferenceError, InferenceLauncher, InferenceRequest};
use xvulcan::layout::JobLayout;
use xvulcan::mosaic::{ImageTag, TileFetcher};
use xvulcan::pipeline::{FETCH_IMAGERY, GET_OSM_POLYS, RUN_INFERENCE};
use xvulcan::provider::{
    AsyncHttpClient, ImageListing, ImageryProvider, ImagerySource, ProviderError, TileUrlTemplate,
};
use xvulcan::service::{AssessmentService, ServiceConfig, ServiceContext};
use xvulcan::store::{FileJobStore, ImageSelection, JobStatus, JobStore, StageState};

// =============================================================================
// Test Helpers
// =============================================================================

const OVERPASS_ENDPOINT: &str = "https://overpass.test/api/interpreter";
const TILE_TEMPLATE: &str = "https://tiles.test/{z}/{x}/{y}.png";

const OVERPASS_BODY: &str = r#"{
    "elements": [
        {"type": "way", "id": 101, "geometry": [
            {"lat": 50.4510, "lon": 30.5000}, {"lat": 50.4510, "lon": 30.5010},
            {"lat": 50.4520, "lon": 30.5010}, {"lat": 50.4520, "lon": 30.5000},
            {"lat": 50.4510, "lon": 30.5000}
        ]},
        {"type": "way", "id": 102, "geometry": [
            {"lat": 50.4530, "lon": 30.5050}, {"lat": 50.4530, "lon": 30.5060},
            {"lat": 50.4540, "lon": 30.5060}, {"lat": 50.4530, "lon": 30.5050}
        ]}
    ]
}"#;

const DAMAGE_BODY: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": {"uid": "b-1", "osmid": "way/101", "dmg": 0.82},
            "geometry": {"type": "Polygon", "coordinates": [[
                [30.5000, 50.4510], [30.5010, 50.4510], [30.5010, 50.4520],
                [30.5000, 50.4520], [30.5000, 50.4510]
            ]]}
        },
        {
            "type": "Feature",
            "properties": {"uid": "b-2", "osmid": "way/102", "dmg": 0.05},
            "geometry": {"type": "Polygon", "coordinates": [[
                [30.5050, 50.4530], [30.5060, 50.4530], [30.5060, 50.4540],
                [30.5050, 50.4530]
            ]]}
        }
    ]
}"#;

fn png_tile(color: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(256, 256, Rgb(color));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("encode png");
    bytes.into_inner()
}

/// Serves PNG tiles for tile URLs and a fixed answer for Overpass URLs.
#[derive(Clone)]
struct RoutingClient {
    tile: Vec<u8>,
    overpass: Result<Vec<u8>, ProviderError>,
    tile_requests: Arc<AtomicUsize>,
}

impl RoutingClient {
    fn new(overpass: Result<Vec<u8>, ProviderError>) -> Self {
        Self {
            tile: png_tile([120, 90, 60]),
            overpass,
            tile_requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn respond(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        if url.starts_with(OVERPASS_ENDPOINT) {
            self.overpass.clone()
        } else {
            self.tile_requests.fetch_add(1, Ordering::SeqCst);
            Ok(self.tile.clone())
        }
    }
}

impl AsyncHttpClient for RoutingClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        self.respond(url)
    }

    async fn get_with_headers(
        &self,
        url: &str,
        _headers: &[(&str, &str)],
    ) -> Result<Vec<u8>, ProviderError> {
        self.respond(url)
    }

    async fn post_json(&self, url: &str, _json_body: &str) -> Result<Vec<u8>, ProviderError> {
        self.respond(url)
    }
}

/// Every image is served from the same tile server.
struct TileProvider;

impl ImageryProvider for TileProvider {
    fn name(&self) -> &str {
        "tiles"
    }

    async fn list_images(
        &self,
        _bbox: &BoundingBox,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<ImageListing>, ProviderError> {
        Ok(["pre-scene", "post-scene"]
            .iter()
            .map(|id| ImageListing {
                id: id.to_string(),
                timestamp: "2022-02-20T09:00:00Z".to_string(),
                item_type: "tiles".to_string(),
                provider: "tiles".to_string(),
            })
            .collect())
    }

    fn source(&self, _image_id: &str) -> ImagerySource {
        ImagerySource::TileServer(TileUrlTemplate::new(TILE_TEMPLATE))
    }

    async fn fetch_scene(
        &self,
        _bbox: &BoundingBox,
        _image_id: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        Err(ProviderError::Unsupported {
            provider: "tiles".to_string(),
            operation: "fetch_scene".to_string(),
        })
    }
}

/// Writes a fixed classifier output and counts its launches.
#[derive(Default)]
struct ScriptedClassifier {
    launches: AtomicUsize,
}

impl InferenceLauncher for ScriptedClassifier {
    fn launch<'a>(
        &'a self,
        request: &'a InferenceRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), InferenceError>> + Send + 'a>> {
        Box::pin(async move {
            self.launches.fetch_add(1, Ordering::SeqCst);
            let write = async {
                if let Some(parent) = request.output.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&request.output, DAMAGE_BODY).await
            };
            write.await.map_err(|e| InferenceError::Failed {
                program: "scripted".to_string(),
                status: "io".to_string(),
                stderr: e.to_string(),
            })
        })
    }
}

type TestService = AssessmentService<TileProvider, RoutingClient, OverpassSource<RoutingClient>>;

fn service(
    root: &Path,
    client: RoutingClient,
    classifier: Arc<ScriptedClassifier>,
) -> TestService {
    let store = FileJobStore::open(root.join("records")).expect("open store");
    let context = ServiceContext {
        store: Arc::new(store),
        layout: JobLayout::new(root),
        provider: Arc::new(TileProvider),
        fetcher: Arc::new(TileFetcher::new(client.clone()).with_workers(2)),
        footprints: Arc::new(FootprintFetcher::new(OverpassSource::with_endpoint(
            client,
            OVERPASS_ENDPOINT,
        ))),
        launcher: classifier,
    };
    AssessmentService::new(ServiceConfig::builder().zoom(14).build(), context)
}

fn selection() -> ImageSelection {
    ImageSelection {
        pre_image_id: "pre-scene".to_string(),
        post_image_id: "post-scene".to_string(),
    }
}

const KYIV_START: (f64, f64) = (30.496, 50.450);
const KYIV_END: (f64, f64) = (30.513, 50.457);

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_full_assessment_reaches_done() {
    let dir = tempfile::tempdir().unwrap();
    let client = RoutingClient::new(Ok(OVERPASS_BODY.as_bytes().to_vec()));
    let tile_requests = Arc::clone(&client.tile_requests);
    let classifier = Arc::new(ScriptedClassifier::default());
    let service = service(dir.path(), client, Arc::clone(&classifier));

    let job = service.submit_coordinates(KYIV_START, KYIV_END).unwrap();
    assert_eq!(service.status(&job).unwrap(), JobStatus::WaitingImagery);

    let listings = service.search_imagery(&job, Utc::now()).await.unwrap();
    assert_eq!(listings.len(), 2);
    assert_eq!(
        service.status(&job).unwrap(),
        JobStatus::WaitingAssessment
    );

    let outcome = service
        .launch_assessment(&job, selection(), None)
        .await
        .unwrap();

    assert!(outcome.is_completed(), "outcome: {:?}", outcome);
    assert_eq!(service.status(&job).unwrap(), JobStatus::Done);
    assert_eq!(classifier.launches.load(Ordering::SeqCst), 1);
    assert!(tile_requests.load(Ordering::SeqCst) > 0);

    let layout = service.layout();
    for tag in [ImageTag::Pre, ImageTag::Post] {
        let mosaic = service.mosaic(&job, tag).unwrap().expect("mosaic stored");
        assert_eq!(mosaic.path, layout.mosaic_path(job.as_str(), tag));
        assert!(mosaic.path.is_file());
        assert!(mosaic.width > 0 && mosaic.height > 0);
    }
    assert!(layout.footprints_path(job.as_str()).is_file());

    let footprints = service.footprints(&job).unwrap().expect("footprints stored");
    assert_eq!(footprints.features.len(), 2);

    let results = service.results(&job).unwrap().expect("results stored");
    assert_eq!(results.features.len(), 2);
    for feature in &results.features {
        let area = feature
            .property("area")
            .and_then(|v| v.as_f64())
            .expect("area");
        assert!(area > 0.0);
        assert!(feature.property("dmg").and_then(|v| v.as_f64()).is_some());
    }
}

#[tokio::test]
async fn test_footprint_failure_stops_before_inference() {
    let dir = tempfile::tempdir().unwrap();
    let client = RoutingClient::new(Err(ProviderError::HttpError(
        "504 Gateway Timeout".to_string(),
    )));
    let classifier = Arc::new(ScriptedClassifier::default());
    let service = service(dir.path(), client, Arc::clone(&classifier));

    let job = service.submit_coordinates(KYIV_START, KYIV_END).unwrap();
    service.search_imagery(&job, Utc::now()).await.unwrap();

    let outcome = service
        .launch_assessment(&job, selection(), Some(14))
        .await
        .unwrap();

    assert_eq!(outcome.failed_stage(), Some(GET_OSM_POLYS));
    assert_eq!(
        service.status(&job).unwrap(),
        JobStatus::stage(GET_OSM_POLYS, StageState::Error)
    );
    assert_eq!(classifier.launches.load(Ordering::SeqCst), 0);
    assert!(service.results(&job).unwrap().is_none());
    assert!(!service.layout().output_path(job.as_str()).exists());
}

#[tokio::test]
async fn test_status_is_visible_through_a_second_store() {
    let dir = tempfile::tempdir().unwrap();
    let client = RoutingClient::new(Ok(OVERPASS_BODY.as_bytes().to_vec()));
    let classifier = Arc::new(ScriptedClassifier::default());
    let service = service(dir.path(), client, classifier);

    let job = service.submit_coordinates(KYIV_START, KYIV_END).unwrap();
    service.search_imagery(&job, Utc::now()).await.unwrap();
    service
        .launch_assessment(&job, selection(), None)
        .await
        .unwrap();

    let reader = FileJobStore::open(dir.path().join("records")).unwrap();
    assert_eq!(reader.get_status(&job).unwrap(), JobStatus::Done);
    assert!(reader.job_ids().unwrap().contains(&job));
    assert_eq!(
        reader.record(&job).unwrap().selection,
        Some(selection())
    );
}

#[tokio::test]
async fn test_relaunch_after_failure_is_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = Arc::new(ScriptedClassifier::default());

    let failing = service(
        dir.path(),
        RoutingClient::new(Err(ProviderError::HttpError("down".to_string()))),
        Arc::clone(&classifier),
    );
    let job = failing.submit_coordinates(KYIV_START, KYIV_END).unwrap();
    let first = failing
        .launch_assessment(&job, selection(), None)
        .await
        .unwrap();
    assert!(!first.is_completed());

    let healthy = service(
        dir.path(),
        RoutingClient::new(Ok(OVERPASS_BODY.as_bytes().to_vec())),
        Arc::clone(&classifier),
    );
    let second = healthy
        .launch_assessment(&job, selection(), None)
        .await
        .unwrap();

    assert!(second.is_completed());
    assert_eq!(healthy.status(&job).unwrap(), JobStatus::Done);
    assert_eq!(classifier.launches.load(Ordering::SeqCst), 1);
}

#[test]
fn test_stage_names_match_status_labels() {
    assert_eq!(
        JobStatus::stage(FETCH_IMAGERY, StageState::Start).to_string(),
        "fetch_imagery:start"
    );
    assert_eq!(
        JobStatus::stage(RUN_INFERENCE, StageState::Error).to_string(),
        "run_inference:error"
    );
}

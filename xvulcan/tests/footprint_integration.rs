//! Integration tests for footprint acquisition.
//!
//! A recorded Overpass answer is served through [`OverpassSource`] and
//! checked for:
//! - which elements survive normalization
//! - the query actually sent
//! - the GeoJSON handed to the classifier

use geo::{Area, MultiPolygon};
use geojson::{FeatureCollection, GeoJson};
use parking_lot::Mutex;
use std::sync::Arc;
use xvulcan::coord::BoundingBox;
use xvulcan::footprint::{FootprintFetcher, FootprintResult, OverpassSource, TagFilter};
use xvulcan::provider::{AsyncHttpClient, ProviderError};

const FIXTURE: &str = include_str!("fixtures/overpass_buildings.json");
const ENDPOINT: &str = "https://overpass.test/api/interpreter";

/// Returns a fixed body and remembers every URL requested.
#[derive(Clone)]
struct FixtureClient {
    body: Vec<u8>,
    urls: Arc<Mutex<Vec<String>>>,
}

impl FixtureClient {
    fn new(body: &str) -> Self {
        Self {
            body: body.as_bytes().to_vec(),
            urls: Arc::default(),
        }
    }
}

impl AsyncHttpClient for FixtureClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        self.urls.lock().push(url.to_string());
        Ok(self.body.clone())
    }

    async fn get_with_headers(
        &self,
        url: &str,
        _headers: &[(&str, &str)],
    ) -> Result<Vec<u8>, ProviderError> {
        self.get(url).await
    }

    async fn post_json(&self, url: &str, _json_body: &str) -> Result<Vec<u8>, ProviderError> {
        self.get(url).await
    }
}

fn kyiv() -> BoundingBox {
    BoundingBox::from_corners((30.496, 50.450), (30.513, 50.457)).unwrap()
}

async fn fetch(client: FixtureClient) -> FootprintResult {
    let fetcher = FootprintFetcher::new(OverpassSource::with_endpoint(client, ENDPOINT));
    fetcher
        .fetch("job-kyiv", &kyiv(), &TagFilter::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_fixture_normalizes_to_three_buildings() {
    let FootprintResult::Found(collection) = fetch(FixtureClient::new(FIXTURE)).await else {
        panic!("expected footprints");
    };

    // Node, two-point way and inner-only relation are dropped
    let ids: Vec<_> = collection
        .footprints
        .iter()
        .map(|f| f.osm_id.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(ids, ["way/201", "way/202", "relation/301"]);
    assert_eq!(collection.job_id, "job-kyiv");

    // Outer 0.001° square minus a 0.0004° square courtyard
    let school: &MultiPolygon<f64> = &collection.footprints[2].geometry;
    assert!((school.unsigned_area() - 8.4e-7).abs() < 1e-9);
}

#[tokio::test]
async fn test_query_carries_bbox_in_overpass_order() {
    let client = FixtureClient::new(FIXTURE);
    let urls = Arc::clone(&client.urls);
    fetch(client).await;

    let urls = urls.lock();
    assert_eq!(urls.len(), 1);

    let url = reqwest::Url::parse(&urls[0]).unwrap();
    assert!(url.as_str().starts_with(ENDPOINT));
    let query = url
        .query_pairs()
        .find(|(key, _)| key == "data")
        .map(|(_, value)| value.into_owned())
        .expect("data parameter");

    assert!(query.starts_with("[out:json]"));
    assert!(query.contains("way[\"building\"](50.45,30.496,50.457,30.513)"));
    assert!(query.contains("relation[\"building\"](50.45,30.496,50.457,30.513)"));
    assert!(query.ends_with("out geom;"));
}

#[tokio::test]
async fn test_geojson_output_is_multipolygons_with_ids() {
    let FootprintResult::Found(collection) = fetch(FixtureClient::new(FIXTURE)).await else {
        panic!("expected footprints");
    };

    let text = serde_json::to_string(&collection.to_feature_collection()).unwrap();
    let parsed = FeatureCollection::try_from(text.parse::<GeoJson>().unwrap()).unwrap();

    assert_eq!(parsed.features.len(), 3);
    for feature in &parsed.features {
        let geometry = feature.geometry.as_ref().expect("geometry");
        assert!(matches!(geometry.value, geojson::Value::MultiPolygon(_)));
        assert_eq!(
            feature.property("uid").and_then(|v| v.as_str()),
            Some("job-kyiv")
        );
        assert!(feature.property("osmid").and_then(|v| v.as_str()).is_some());
    }
}

#[tokio::test]
async fn test_empty_answer_is_no_results() {
    let result = fetch(FixtureClient::new(r#"{"elements": []}"#)).await;
    assert_eq!(result, FootprintResult::NoResults);
}

//! Planet imagery provider.
//!
//! Searches the Planet Data API for SkySat collects and serves the selected
//! collect through Planet's XYZ tile servers.
//!
//! # URL Patterns
//!
//! - search: `POST https://api.planet.com/data/v1/quick-search?api_key={key}`
//! - tiles: `https://tiles{0-3}.planet.com/data/v1/SkySatCollect/{id}/{z}/{x}/{y}.png?api_key={key}`

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::http::AsyncHttpClient;
use super::template::TileUrlTemplate;
use super::types::{ImageListing, ImagerySource, ImageryProvider, ProviderError};
use crate::coord::BoundingBox;

const SEARCH_URL: &str = "https://api.planet.com/data/v1/quick-search";
const TILE_HOST: &str = "https://{s}.planet.com/data/v1";
const TILE_SUBDOMAINS: [&str; 4] = ["tiles0", "tiles1", "tiles2", "tiles3"];

/// Product type searched and tiled.
pub const PLANET_ITEM_TYPE: &str = "SkySatCollect";

/// Maximum cloud cover fraction accepted in search results.
pub const MAX_CLOUD_COVER: f64 = 0.2;

/// Planet provider name.
pub const PLANET_NAME: &str = "Planet";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    features: Vec<SearchFeature>,
}

#[derive(Debug, Deserialize)]
struct SearchFeature {
    id: String,
    #[serde(default)]
    properties: SearchProperties,
}

#[derive(Debug, Default, Deserialize)]
struct SearchProperties {
    published: Option<String>,
    acquired: Option<String>,
}

/// Planet Data API provider.
pub struct PlanetProvider<C: AsyncHttpClient> {
    http_client: C,
    api_key: String,
}

impl<C: AsyncHttpClient> PlanetProvider<C> {
    /// Creates a new Planet provider with the given API key.
    pub fn new(http_client: C, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
        }
    }

    /// Builds the quick-search request body.
    ///
    /// The filter restricts results to the box, the date window, low cloud
    /// cover, downloadable pansharpened assets and standard quality.
    fn search_request(bbox: &BoundingBox, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
        let ring = vec![
            vec![bbox.west, bbox.south],
            vec![bbox.east, bbox.south],
            vec![bbox.east, bbox.north],
            vec![bbox.west, bbox.north],
            vec![bbox.west, bbox.south],
        ];

        json!({
            "item_types": [PLANET_ITEM_TYPE],
            "filter": {
                "type": "AndFilter",
                "config": [
                    {
                        "type": "GeometryFilter",
                        "field_name": "geometry",
                        "config": { "type": "Polygon", "coordinates": [ring] }
                    },
                    {
                        "type": "DateRangeFilter",
                        "field_name": "acquired",
                        "config": {
                            "gte": start.to_rfc3339_opts(SecondsFormat::Secs, true),
                            "lte": end.to_rfc3339_opts(SecondsFormat::Secs, true)
                        }
                    },
                    {
                        "type": "RangeFilter",
                        "field_name": "cloud_cover",
                        "config": { "lte": MAX_CLOUD_COVER }
                    },
                    {
                        "type": "PermissionFilter",
                        "config": ["assets.ortho_pansharpened:download"]
                    },
                    {
                        "type": "StringInFilter",
                        "field_name": "quality_category",
                        "config": ["standard"]
                    }
                ]
            }
        })
        .to_string()
    }

    fn parse_listings(body: &[u8]) -> Result<Vec<ImageListing>, ProviderError> {
        let response: SearchResponse = serde_json::from_slice(body)
            .map_err(|e| ProviderError::InvalidResponse(format!("Planet search: {}", e)))?;

        Ok(response
            .features
            .into_iter()
            .map(|feature| ImageListing {
                timestamp: feature
                    .properties
                    .published
                    .or(feature.properties.acquired)
                    .unwrap_or_default(),
                id: feature.id,
                item_type: PLANET_ITEM_TYPE.to_string(),
                provider: PLANET_NAME.to_string(),
            })
            .collect())
    }
}

impl<C: AsyncHttpClient> ImageryProvider for PlanetProvider<C> {
    fn name(&self) -> &str {
        PLANET_NAME
    }

    async fn list_images(
        &self,
        bbox: &BoundingBox,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ImageListing>, ProviderError> {
        let url = format!("{}?api_key={}", SEARCH_URL, self.api_key);
        let body = Self::search_request(bbox, start, end);
        debug!(bbox = %bbox, %start, %end, "Planet quick-search");

        let response = self.http_client.post_json(&url, &body).await?;
        let listings = Self::parse_listings(&response)?;

        info!(count = listings.len(), "Planet search returned images");
        Ok(listings)
    }

    fn source(&self, image_id: &str) -> ImagerySource {
        let pattern = format!(
            "{}/{}/{}/{{z}}/{{x}}/{{y}}.png?api_key={}",
            TILE_HOST, PLANET_ITEM_TYPE, image_id, self.api_key
        );
        ImagerySource::TileServer(TileUrlTemplate::new(pattern).with_subdomains(TILE_SUBDOMAINS))
    }

    async fn fetch_scene(
        &self,
        _bbox: &BoundingBox,
        _image_id: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        Err(ProviderError::Unsupported {
            provider: PLANET_NAME.to_string(),
            operation: "whole-scene download".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoordinate;
    use crate::provider::http::tests::RecordingHttpClient;
    use chrono::TimeZone;

    const SEARCH_FIXTURE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"id": "20220301_083512_ssc3_u0001", "properties": {"published": "2022-03-02T10:00:00Z", "acquired": "2022-03-01T08:35:12Z"}},
            {"id": "20220215_090000_ssc1_u0002", "properties": {"acquired": "2022-02-15T09:00:00Z"}}
        ]
    }"#;

    fn bbox() -> BoundingBox {
        BoundingBox::from_corners((30.496, 50.450), (30.513, 50.457)).unwrap()
    }

    #[tokio::test]
    async fn test_list_images_posts_filter_and_parses_features() {
        let client = RecordingHttpClient::with_response(SEARCH_FIXTURE.as_bytes().to_vec());
        let provider = PlanetProvider::new(client.clone(), "secret");

        let start = Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap();
        let listings = provider.list_images(&bbox(), start, end).await.unwrap();

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].id, "20220301_083512_ssc3_u0001");
        assert_eq!(listings[0].timestamp, "2022-03-02T10:00:00Z");
        assert_eq!(listings[1].timestamp, "2022-02-15T09:00:00Z");
        assert!(listings.iter().all(|l| l.item_type == "SkySatCollect"));

        assert_eq!(
            client.urls(),
            vec!["https://api.planet.com/data/v1/quick-search?api_key=secret"]
        );
        let body: serde_json::Value = serde_json::from_str(&client.bodies()[0]).unwrap();
        assert_eq!(body["item_types"][0], "SkySatCollect");
        let filters = body["filter"]["config"].as_array().unwrap();
        assert_eq!(filters[1]["config"]["gte"], "2021-03-01T00:00:00Z");
        assert_eq!(filters[2]["config"]["lte"], 0.2);
    }

    #[tokio::test]
    async fn test_malformed_search_response() {
        let client = RecordingHttpClient::with_response(b"not json".to_vec());
        let provider = PlanetProvider::new(client, "k");
        let err = provider
            .list_images(&bbox(), Utc::now(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn test_source_is_tile_server() {
        let provider = PlanetProvider::new(RecordingHttpClient::default(), "k");
        let ImagerySource::TileServer(template) = provider.source("abc") else {
            panic!("expected tile server");
        };

        assert_eq!(template.subdomains().len(), 4);
        assert_eq!(
            template.url_for(&TileCoordinate::new(1, 2, 18)),
            "https://tiles3.planet.com/data/v1/SkySatCollect/abc/18/1/2.png?api_key=k"
        );
    }

    #[tokio::test]
    async fn test_fetch_scene_unsupported() {
        let provider = PlanetProvider::new(RecordingHttpClient::default(), "k");
        let err = provider.fetch_scene(&bbox(), "abc").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unsupported { .. }));
    }
}

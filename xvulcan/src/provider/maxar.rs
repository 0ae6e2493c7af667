//! Maxar imagery provider.
//!
//! Searches the Maxar (DigitalGlobe) WFS catalogue and downloads the chosen
//! image as a single GeoTIFF scene through WMS `GetMap`.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info};

use super::http::AsyncHttpClient;
use super::types::{ImageListing, ImagerySource, ImageryProvider, ProviderError};
use crate::coord::BoundingBox;

const WFS_URL: &str = "https://evwhs.digitalglobe.com/catalogservice/wfsaccess";
const WMS_URL: &str = "https://evwhs.digitalglobe.com/mapservice/wmsaccess";

/// Maxar provider name.
pub const MAXAR_NAME: &str = "MAXAR";

/// Feature type searched.
pub const MAXAR_ITEM_TYPE: &str = "DG_Feature";

/// Ground resolution requested from WMS, in metres per pixel.
pub const SCENE_RESOLUTION_M: f64 = 0.5;

/// Maximum cloud cover fraction accepted in search results.
const MAX_CLOUD_COVER: f64 = 0.10;

/// WGS84 semi-major axis used by Web Mercator.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

#[derive(Debug, Deserialize)]
struct WfsResponse {
    #[serde(default)]
    features: Vec<WfsFeature>,
}

#[derive(Debug, Deserialize)]
struct WfsFeature {
    id: String,
    #[serde(default)]
    properties: WfsProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WfsProperties {
    feature_id: Option<String>,
    acquisition_date: Option<String>,
}

/// Computes the pixel size of a scene covering `bbox` at `resolution`
/// metres per pixel, measured in Web Mercator metres.
///
/// Returns `(width, height)`, each at least one pixel.
pub fn scene_dimensions(bbox: &BoundingBox, resolution: f64) -> (u32, u32) {
    let mercator_x = |lon: f64| EARTH_RADIUS_M * lon.to_radians();
    let mercator_y = |lat: f64| {
        EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln()
    };

    let width = (mercator_x(bbox.east) - mercator_x(bbox.west)) / resolution;
    let height = (mercator_y(bbox.north) - mercator_y(bbox.south)) / resolution;

    (width.round().max(1.0) as u32, height.round().max(1.0) as u32)
}

/// Maxar WFS/WMS provider.
pub struct MaxarProvider<C: AsyncHttpClient> {
    http_client: C,
    api_key: String,
}

impl<C: AsyncHttpClient> MaxarProvider<C> {
    /// Creates a new Maxar provider with the given connect id.
    pub fn new(http_client: C, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
        }
    }

    /// Builds the WFS `GetFeature` URL.
    ///
    /// WFS 1.1.0 expects the CQL bbox as `miny,minx,maxy,maxx`.
    fn search_url(&self, bbox: &BoundingBox, start: DateTime<Utc>) -> Result<Url, ProviderError> {
        let cql = format!(
            "(cloudCover<{})AND(formattedDate>'{}')AND(BBOX(geometry,{},{},{},{}))",
            MAX_CLOUD_COVER,
            start.to_rfc3339_opts(SecondsFormat::Secs, true),
            bbox.south,
            bbox.west,
            bbox.north,
            bbox.east
        );

        Url::parse_with_params(
            WFS_URL,
            &[
                ("SERVICE", "WFS"),
                ("REQUEST", "GetFeature"),
                ("VERSION", "1.1.0"),
                ("typeName", "DigitalGlobe:FinishedFeature"),
                ("srsName", "EPSG:4326"),
                ("outputFormat", "json"),
                ("connectId", self.api_key.as_str()),
                ("CQL_Filter", cql.as_str()),
            ],
        )
        .map_err(|e| ProviderError::InvalidResponse(format!("Invalid WFS URL: {}", e)))
    }

    /// Builds the WMS `GetMap` URL for one feature.
    fn scene_url(&self, bbox: &BoundingBox, image_id: &str) -> Result<Url, ProviderError> {
        let (width, height) = scene_dimensions(bbox, SCENE_RESOLUTION_M);
        let bbox_param = format!("{},{},{},{}", bbox.west, bbox.south, bbox.east, bbox.north);
        // CQL escapes a quote inside a string literal by doubling it
        let filter = format!("featureId='{}'", image_id.replace('\'', "''"));
        let width = width.to_string();
        let height = height.to_string();

        Url::parse_with_params(
            WMS_URL,
            &[
                ("SERVICE", "WMS"),
                ("REQUEST", "GetMap"),
                ("VERSION", "1.1.1"),
                ("LAYERS", "DigitalGlobe:Imagery"),
                ("FORMAT", "image/geotiff"),
                ("WIDTH", width.as_str()),
                ("HEIGHT", height.as_str()),
                ("CONNECTID", self.api_key.as_str()),
                ("FEATUREPROFILE", "Default_Profile"),
                ("COVERAGE_CQL_FILTER", filter.as_str()),
                ("CRS", "EPSG:4326"),
                ("BBOX", bbox_param.as_str()),
            ],
        )
        .map_err(|e| ProviderError::InvalidResponse(format!("Invalid WMS URL: {}", e)))
    }

    fn parse_listings(body: &[u8]) -> Result<Vec<ImageListing>, ProviderError> {
        let response: WfsResponse = serde_json::from_slice(body)
            .map_err(|e| ProviderError::InvalidResponse(format!("Maxar WFS: {}", e)))?;

        Ok(response
            .features
            .into_iter()
            .map(|feature| ImageListing {
                id: feature.properties.feature_id.unwrap_or(feature.id),
                timestamp: feature.properties.acquisition_date.unwrap_or_default(),
                item_type: MAXAR_ITEM_TYPE.to_string(),
                provider: MAXAR_NAME.to_string(),
            })
            .collect())
    }
}

impl<C: AsyncHttpClient> ImageryProvider for MaxarProvider<C> {
    fn name(&self) -> &str {
        MAXAR_NAME
    }

    async fn list_images(
        &self,
        bbox: &BoundingBox,
        start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<ImageListing>, ProviderError> {
        // The catalogue filter only bounds the start of the window
        let url = self.search_url(bbox, start)?;
        debug!(bbox = %bbox, %start, "Maxar WFS search");

        let response = self.http_client.get(url.as_str()).await?;
        let listings = Self::parse_listings(&response)?;

        info!(count = listings.len(), "Maxar search returned images");
        Ok(listings)
    }

    fn source(&self, _image_id: &str) -> ImagerySource {
        ImagerySource::Scene
    }

    async fn fetch_scene(&self, bbox: &BoundingBox, image_id: &str) -> Result<Vec<u8>, ProviderError> {
        let url = self.scene_url(bbox, image_id)?;
        debug!(image_id, bbox = %bbox, "Maxar WMS GetMap");
        self.http_client.get(url.as_str()).await
    }
}

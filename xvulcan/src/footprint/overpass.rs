//! Overpass API footprint source.

use super::types::{FootprintError, OverpassResponse, TagFilter};
use crate::coord::BoundingBox;
use crate::provider::{AsyncHttpClient, ProviderError};
use reqwest::Url;
use std::fmt::Write;
use std::future::Future;
use tracing::debug;

/// Public Overpass endpoint.
pub const DEFAULT_OVERPASS_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Server-side query timeout, in seconds.
const QUERY_TIMEOUT_SECS: u32 = 60;

/// A queryable source of footprint geometry.
pub trait FootprintSource: Send + Sync {
    /// Returns every element matching `tags` inside `bbox`, with inline
    /// geometry.
    fn query(
        &self,
        bbox: &BoundingBox,
        tags: &TagFilter,
    ) -> impl Future<Output = Result<OverpassResponse, FootprintError>> + Send;
}

/// Builds the Overpass QL query for ways and relations matching `tags`.
///
/// Overpass boxes are `(south, west, north, east)`.
pub fn build_query(bbox: &BoundingBox, tags: &TagFilter) -> String {
    let area = format!("({},{},{},{})", bbox.south, bbox.west, bbox.north, bbox.east);

    let mut statements = String::new();
    for predicate in tags.predicates() {
        // Writing into a String cannot fail
        let _ = write!(statements, "way{predicate}{area};relation{predicate}{area};");
    }

    format!(
        "[out:json][timeout:{}];({});out geom;",
        QUERY_TIMEOUT_SECS, statements
    )
}

/// Footprint source backed by an Overpass API interpreter.
pub struct OverpassSource<C: AsyncHttpClient> {
    http_client: C,
    endpoint: String,
}

impl<C: AsyncHttpClient> OverpassSource<C> {
    /// Creates a source against [`DEFAULT_OVERPASS_ENDPOINT`].
    pub fn new(http_client: C) -> Self {
        Self::with_endpoint(http_client, DEFAULT_OVERPASS_ENDPOINT)
    }

    pub fn with_endpoint(http_client: C, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
        }
    }

    fn request_url(&self, query: &str) -> Result<Url, ProviderError> {
        Url::parse_with_params(&self.endpoint, &[("data", query)]).map_err(|e| {
            ProviderError::InvalidResponse(format!("Invalid Overpass endpoint: {}", e))
        })
    }
}

impl<C: AsyncHttpClient> FootprintSource for OverpassSource<C> {
    async fn query(
        &self,
        bbox: &BoundingBox,
        tags: &TagFilter,
    ) -> Result<OverpassResponse, FootprintError> {
        let query = build_query(bbox, tags);
        let url = self.request_url(&query)?;
        debug!(endpoint = %self.endpoint, query = %query, "Overpass query");

        let body = self.http_client.get(url.as_str()).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockAsyncHttpClient, RecordingHttpClient};

    fn bbox() -> BoundingBox {
        BoundingBox::from_corners((30.496, 50.450), (30.513, 50.457)).unwrap()
    }

    #[test]
    fn test_query_uses_south_west_north_east() {
        let query = build_query(&bbox(), &TagFilter::default());
        assert_eq!(
            query,
            "[out:json][timeout:60];(way[\"building\"](50.45,30.496,50.457,30.513);\
             relation[\"building\"](50.45,30.496,50.457,30.513););out geom;"
        );
    }

    #[test]
    fn test_query_with_several_predicates() {
        let tags: TagFilter = "building=yes, amenity".parse().unwrap();
        let query = build_query(&bbox(), &tags);
        assert!(query.contains("way[\"building\"=\"yes\"]"));
        assert!(query.contains("relation[\"amenity\"]"));
    }

    #[tokio::test]
    async fn test_query_sends_data_parameter() {
        let client = RecordingHttpClient::with_response(br#"{"elements": []}"#.to_vec());
        let source = OverpassSource::with_endpoint(client.clone(), "http://overpass.test/api");

        let response = source.query(&bbox(), &TagFilter::default()).await.unwrap();
        assert!(response.elements.is_empty());

        let url = Url::parse(&client.urls()[0]).unwrap();
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "data");
        assert!(value.starts_with("[out:json]"));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let client = MockAsyncHttpClient {
            response: Err(ProviderError::HttpError("HTTP 504".to_string())),
        };
        let source = OverpassSource::new(client);
        let err = source.query(&bbox(), &TagFilter::default()).await.unwrap_err();
        assert!(matches!(err, FootprintError::Source(_)));
    }

    #[tokio::test]
    async fn test_invalid_json_rejected() {
        let client = MockAsyncHttpClient {
            response: Ok(b"<html>busy</html>".to_vec()),
        };
        let source = OverpassSource::new(client);
        let err = source.query(&bbox(), &TagFilter::default()).await.unwrap_err();
        assert!(matches!(err, FootprintError::InvalidResponse(_)));
    }
}

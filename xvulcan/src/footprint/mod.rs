//! Building footprint retrieval
//!
//! Footprints are pulled from an Overpass-compatible [`FootprintSource`] and
//! normalized into one multipolygon per OSM element.

mod normalize;
mod overpass;
mod types;

pub use normalize::normalize_elements;
pub use overpass::{build_query, FootprintSource, OverpassSource, DEFAULT_OVERPASS_ENDPOINT};
pub use types::{
    Element, Footprint, FootprintCollection, FootprintError, FootprintResult, LatLon, Member,
    OverpassResponse, TagFilter, TagPredicate,
};

use crate::coord::BoundingBox;
use tracing::info;

/// Queries a source and normalizes what it returns.
pub struct FootprintFetcher<S: FootprintSource> {
    source: S,
}

impl<S: FootprintSource> FootprintFetcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetches the footprints matching `tags` inside `bbox` for `job_id`.
    ///
    /// An empty answer is reported as [`FootprintResult::NoResults`], not as
    /// an error.
    pub async fn fetch(
        &self,
        job_id: &str,
        bbox: &BoundingBox,
        tags: &TagFilter,
    ) -> Result<FootprintResult, FootprintError> {
        let response = self.source.query(bbox, tags).await?;
        let elements = response.elements.len();
        let footprints = normalize_elements(&response.elements);

        info!(
            job_id,
            elements,
            footprints = footprints.len(),
            "Footprints fetched"
        );

        if footprints.is_empty() {
            return Ok(FootprintResult::NoResults);
        }
        Ok(FootprintResult::Found(FootprintCollection::new(
            job_id, footprints,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockAsyncHttpClient;

    const RESPONSE: &str = r#"{
        "elements": [
            {"type": "way", "id": 1, "geometry": [
                {"lat": 50.451, "lon": 30.50}, {"lat": 50.451, "lon": 30.501},
                {"lat": 50.452, "lon": 30.501}, {"lat": 50.451, "lon": 30.50}
            ]},
            {"type": "node", "id": 2, "lat": 50.45, "lon": 30.5}
        ]
    }"#;

    fn bbox() -> BoundingBox {
        BoundingBox::from_corners((30.496, 50.450), (30.513, 50.457)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_found() {
        let source = OverpassSource::new(MockAsyncHttpClient {
            response: Ok(RESPONSE.as_bytes().to_vec()),
        });
        let fetcher = FootprintFetcher::new(source);

        let result = fetcher
            .fetch("job-1", &bbox(), &TagFilter::default())
            .await
            .unwrap();

        let FootprintResult::Found(collection) = result else {
            panic!("expected footprints");
        };
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.job_id, "job-1");

        let geojson = collection.to_feature_collection();
        let properties = geojson.features[0].properties.as_ref().unwrap();
        assert_eq!(properties["uid"], "job-1");
        assert_eq!(properties["osmid"], "way/1");
    }

    #[tokio::test]
    async fn test_fetch_no_results() {
        let source = OverpassSource::new(MockAsyncHttpClient {
            response: Ok(br#"{"elements": []}"#.to_vec()),
        });
        let result = FootprintFetcher::new(source)
            .fetch("job-1", &bbox(), &TagFilter::default())
            .await
            .unwrap();
        assert_eq!(result, FootprintResult::NoResults);
    }

    #[test]
    fn test_tag_filter_parsing() {
        let filter: TagFilter = "building".parse().unwrap();
        assert_eq!(filter, TagFilter::default());
        assert!("".parse::<TagFilter>().is_err());
        assert!("=yes".parse::<TagFilter>().is_err());
    }
}

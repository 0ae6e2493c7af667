//! Footprint types: Overpass wire format, tag filters and the normalized
//! polygon collection.

use crate::provider::ProviderError;
use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Overpass API JSON response (`[out:json]`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<Element>,
}

/// One OSM element with inline geometry (`out geom`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default)]
    pub id: Option<i64>,
    /// Way geometry
    #[serde(default)]
    pub geometry: Vec<LatLon>,
    /// Relation members
    #[serde(default)]
    pub members: Vec<Member>,
}

/// A relation member; way members carry their geometry inline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Member {
    #[serde(rename = "type", default)]
    pub member_type: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub geometry: Vec<LatLon>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// One `key` or `key=value` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPredicate {
    pub key: String,
    pub value: Option<String>,
}

impl fmt::Display for TagPredicate {
    /// Renders the Overpass QL filter, e.g. `["building"]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "[\"{}\"=\"{}\"]", self.key, value),
            None => write!(f, "[\"{}\"]", self.key),
        }
    }
}

/// Tag predicates selecting footprint geometries; an element matching any
/// predicate is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    predicates: Vec<TagPredicate>,
}

impl TagFilter {
    pub fn new(predicates: Vec<TagPredicate>) -> Self {
        Self { predicates }
    }

    /// Matches elements carrying `key` with any value.
    pub fn key(key: impl Into<String>) -> Self {
        Self::new(vec![TagPredicate {
            key: key.into(),
            value: None,
        }])
    }

    pub fn predicates(&self) -> &[TagPredicate] {
        &self.predicates
    }
}

impl Default for TagFilter {
    /// Any building.
    fn default() -> Self {
        Self::key("building")
    }
}

impl fmt::Display for TagFilter {
    /// The comma separated form accepted by [`FromStr`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match &predicate.value {
                Some(value) => write!(f, "{}={}", predicate.key, value)?,
                None => f.write_str(&predicate.key)?,
            }
        }
        Ok(())
    }
}

impl FromStr for TagFilter {
    type Err = String;

    /// Parses a comma separated list such as `building,amenity=hospital`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut predicates = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let predicate = match part.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
                    TagPredicate {
                        key: key.trim().to_string(),
                        value: Some(value.trim().to_string()),
                    }
                }
                Some(_) => return Err(format!("malformed tag predicate '{}'", part)),
                None => TagPredicate {
                    key: part.to_string(),
                    value: None,
                },
            };
            predicates.push(predicate);
        }

        if predicates.is_empty() {
            return Err("tag filter is empty".to_string());
        }
        Ok(Self::new(predicates))
    }
}

/// One normalized footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub geometry: MultiPolygon<f64>,
    /// `"<type>/<id>"` when the source element had an id
    pub osm_id: Option<String>,
}

/// Footprints found for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintCollection {
    pub job_id: String,
    pub footprints: Vec<Footprint>,
}

impl FootprintCollection {
    pub fn new(job_id: impl Into<String>, footprints: Vec<Footprint>) -> Self {
        Self {
            job_id: job_id.into(),
            footprints,
        }
    }

    /// An empty collection, written when a query finds nothing.
    pub fn empty(job_id: impl Into<String>) -> Self {
        Self::new(job_id, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    /// Converts to GeoJSON with `uid` and `osmid` properties per feature.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .footprints
            .iter()
            .map(|footprint| {
                let mut properties = JsonObject::new();
                properties.insert("uid".to_string(), JsonValue::from(self.job_id.clone()));
                properties.insert(
                    "osmid".to_string(),
                    footprint
                        .osm_id
                        .clone()
                        .map(JsonValue::from)
                        .unwrap_or(JsonValue::Null),
                );

                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(geojson::Value::from(&footprint.geometry))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

/// Outcome of a footprint query.
#[derive(Debug, Clone, PartialEq)]
pub enum FootprintResult {
    Found(FootprintCollection),
    /// The source returned no usable polygons
    NoResults,
}

/// Errors that can occur while fetching footprints.
#[derive(Debug, Error)]
pub enum FootprintError {
    #[error("Footprint source request failed: {0}")]
    Source(ProviderError),

    #[error("Invalid footprint response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

impl From<ProviderError> for FootprintError {
    fn from(err: ProviderError) -> Self {
        FootprintError::Source(err)
    }
}

//! Provider types and traits

use crate::coord::BoundingBox;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

use super::template::TileUrlTemplate;

/// Errors that can occur during provider operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// HTTP request failed
    HttpError(String),
    /// Invalid response data from provider
    InvalidResponse(String),
    /// Operation not offered by this provider
    Unsupported { provider: String, operation: String },
    /// No provider registered under this name
    UnknownProvider(String),
    /// Provider requires credentials that were not configured
    MissingApiKey(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ProviderError::Unsupported {
                provider,
                operation,
            } => write!(f, "{} does not support {}", provider, operation),
            ProviderError::UnknownProvider(name) => {
                write!(f, "Unknown imagery provider '{}' (expected planet or maxar)", name)
            }
            ProviderError::MissingApiKey(provider) => {
                write!(f, "No API key configured for {}", provider)
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// One candidate image returned by a provider search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageListing {
    /// Provider-side image identifier, later used to select pre/post imagery
    pub id: String,
    /// Acquisition or publication time as reported by the provider
    pub timestamp: String,
    /// Provider product type (e.g. `SkySatCollect`)
    pub item_type: String,
    /// Provider name
    pub provider: String,
}

/// How a provider delivers the pixels of a selected image.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagerySource {
    /// Slippy-map tiles to be fetched and merged
    TileServer(TileUrlTemplate),
    /// One georeferenced raster covering the requested box
    Scene,
}

/// Async trait for imagery vendors.
///
/// A provider searches its catalogue for a bounding box and then serves the
/// chosen image either as tiles or as a single scene.
pub trait ImageryProvider: Send + Sync {
    /// Returns the provider's name for logging and identification.
    fn name(&self) -> &str;

    /// Searches the catalogue for images intersecting `bbox` acquired
    /// between `start` and `end`.
    fn list_images(
        &self,
        bbox: &BoundingBox,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<ImageListing>, ProviderError>> + Send;

    /// Describes how the pixels of `image_id` are delivered.
    fn source(&self, image_id: &str) -> ImagerySource;

    /// Downloads a whole scene clipped to `bbox`.
    ///
    /// Only meaningful when [`source`](Self::source) returns
    /// [`ImagerySource::Scene`].
    fn fetch_scene(
        &self,
        bbox: &BoundingBox,
        image_id: &str,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}

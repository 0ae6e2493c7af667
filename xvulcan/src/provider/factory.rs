//! Provider factory for centralized provider creation.
//!
//! Providers are selected by name (`planet`, `maxar`) so the CLI and the
//! configuration file never need to know concrete provider types.

use chrono::{DateTime, Utc};

use super::http::AsyncHttpClient;
use super::maxar::MaxarProvider;
use super::planet::PlanetProvider;
use super::types::{ImageListing, ImagerySource, ImageryProvider, ProviderError};
use crate::coord::BoundingBox;

/// Configuration for creating a provider.
///
/// # Example
///
/// ```
/// use xvulcan::provider::ProviderConfig;
///
/// let config = ProviderConfig::from_name("planet", "PLANET_KEY").unwrap();
/// assert_eq!(config.name(), "Planet");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// Planet SkySat collects served over XYZ tiles.
    Planet {
        /// Planet Data API key
        api_key: String,
    },

    /// Maxar (DigitalGlobe) scenes served over WMS.
    Maxar {
        /// Maxar connect id
        api_key: String,
    },
}

impl ProviderConfig {
    /// Create a Planet provider configuration.
    pub fn planet(api_key: impl Into<String>) -> Self {
        Self::Planet {
            api_key: api_key.into(),
        }
    }

    /// Create a Maxar provider configuration.
    pub fn maxar(api_key: impl Into<String>) -> Self {
        Self::Maxar {
            api_key: api_key.into(),
        }
    }

    /// Looks up a provider by its configuration name (case-insensitive).
    pub fn from_name(name: &str, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "planet" => Ok(Self::planet(api_key)),
            "maxar" => Ok(Self::maxar(api_key)),
            other => Err(ProviderError::UnknownProvider(other.to_string())),
        }
    }

    /// Returns the provider name for this configuration.
    pub fn name(&self) -> &str {
        match self {
            Self::Planet { .. } => super::planet::PLANET_NAME,
            Self::Maxar { .. } => super::maxar::MAXAR_NAME,
        }
    }

    fn api_key(&self) -> &str {
        match self {
            Self::Planet { api_key } | Self::Maxar { api_key } => api_key,
        }
    }
}

/// Enum to hold the concrete provider types.
///
/// Lets the factory return different providers while callers stay generic
/// over a single [`ImageryProvider`].
pub enum ImageryProviderType<C: AsyncHttpClient> {
    Planet(PlanetProvider<C>),
    Maxar(MaxarProvider<C>),
}

impl<C: AsyncHttpClient> ImageryProvider for ImageryProviderType<C> {
    fn name(&self) -> &str {
        match self {
            Self::Planet(p) => p.name(),
            Self::Maxar(p) => p.name(),
        }
    }

    async fn list_images(
        &self,
        bbox: &BoundingBox,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ImageListing>, ProviderError> {
        match self {
            Self::Planet(p) => p.list_images(bbox, start, end).await,
            Self::Maxar(p) => p.list_images(bbox, start, end).await,
        }
    }

    fn source(&self, image_id: &str) -> ImagerySource {
        match self {
            Self::Planet(p) => p.source(image_id),
            Self::Maxar(p) => p.source(image_id),
        }
    }

    async fn fetch_scene(&self, bbox: &BoundingBox, image_id: &str) -> Result<Vec<u8>, ProviderError> {
        match self {
            Self::Planet(p) => p.fetch_scene(bbox, image_id).await,
            Self::Maxar(p) => p.fetch_scene(bbox, image_id).await,
        }
    }
}

/// Factory for creating imagery providers.
pub struct ProviderFactory<C: AsyncHttpClient> {
    http_client: C,
}

impl<C: AsyncHttpClient> ProviderFactory<C> {
    /// Create a new provider factory with the given HTTP client.
    pub fn new(http_client: C) -> Self {
        Self { http_client }
    }

    /// Create a provider from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingApiKey`] when the configuration
    /// carries an empty key.
    pub fn create(self, config: &ProviderConfig) -> Result<ImageryProviderType<C>, ProviderError> {
        if config.api_key().trim().is_empty() {
            return Err(ProviderError::MissingApiKey(config.name().to_string()));
        }

        match config {
            ProviderConfig::Planet { api_key } => Ok(ImageryProviderType::Planet(
                PlanetProvider::new(self.http_client, api_key.clone()),
            )),
            ProviderConfig::Maxar { api_key } => Ok(ImageryProviderType::Maxar(
                MaxarProvider::new(self.http_client, api_key.clone()),
            )),
        }
    }
}

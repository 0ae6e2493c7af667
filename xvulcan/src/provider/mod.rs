//! Imagery provider abstraction
//!
//! This module provides the HTTP transport trait, tile URL templates and the
//! imagery vendors (Planet tile servers, Maxar WMS scenes).
//!
//! # Factory Pattern
//!
//! ```ignore
//! use xvulcan::provider::{AsyncReqwestClient, ProviderConfig, ProviderFactory};
//!
//! let http_client = AsyncReqwestClient::new()?;
//! let provider = ProviderFactory::new(http_client).create(&ProviderConfig::planet(key))?;
//! ```

mod factory;
mod http;
mod maxar;
mod planet;
mod template;
mod types;

pub use factory::{ImageryProviderType, ProviderConfig, ProviderFactory};
pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use maxar::{scene_dimensions, MaxarProvider, SCENE_RESOLUTION_M};
pub use planet::{PlanetProvider, PLANET_ITEM_TYPE};
pub use template::TileUrlTemplate;
pub use types::{ImageListing, ImageryProvider, ImagerySource, ProviderError};

#[cfg(test)]
pub use http::tests::{MockAsyncHttpClient, RecordingHttpClient};

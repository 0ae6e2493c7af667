//! xvulcan - Disaster damage assessment core
//!
//! This library turns a bounding box into everything a building damage
//! classifier needs, then collects what it produces:
//!
//! - [`coord`] maps the box to slippy-map tiles
//! - [`mosaic`] fetches tiles concurrently and merges them into a GeoTIFF
//! - [`footprint`] fetches building footprints from OpenStreetMap
//! - [`pipeline`] runs the assessment stages and publishes their status
//! - [`store`] keeps each job's status and artifacts
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a simplified facade:
//!
//! ```ignore
//! use xvulcan::config::ConfigFile;
//! use xvulcan::service::build_service;
//! use xvulcan::store::ImageSelection;
//!
//! let service = build_service(&ConfigFile::load()?)?;
//! let job = service.submit_coordinates((30.496, 50.450), (30.513, 50.457))?;
//! service.search_imagery(&job, chrono::Utc::now()).await?;
//! let outcome = service
//!     .launch_assessment(&job, ImageSelection { pre_image_id, post_image_id }, None)
//!     .await?;
//! ```

pub mod config;
pub mod coord;
pub mod footprint;
pub mod inference;
pub mod layout;
pub mod logging;
pub mod mosaic;
pub mod pipeline;
pub mod provider;
pub mod service;
pub mod store;

/// Version of the xvulcan library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! High-level service facade for the assessment workflow.
//!
//! This module hides component wiring behind [`AssessmentService`]. The
//! production wiring is built from the configuration file:
//!
//! ```ignore
//! use xvulcan::config::ConfigFile;
//! use xvulcan::service::build_service;
//!
//! let service = build_service(&ConfigFile::load()?)?;
//! let job = service.submit_coordinates((30.496, 50.450), (30.513, 50.457))?;
//! let listings = service.search_imagery(&job, chrono::Utc::now()).await?;
//! ```

mod builder;
mod config;
mod error;
mod facade;

pub use builder::{
    build_service, create_footprint_source, create_http_client, create_provider, create_store,
    create_tile_fetcher, provider_config, DefaultAssessmentService,
};
pub use config::{ServiceConfig, ServiceConfigBuilder, DEFAULT_SEARCH_WINDOW_DAYS};
pub use error::ServiceError;
pub use facade::{submit_job, AssessmentService, ServiceContext};

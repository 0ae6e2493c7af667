//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, show, path)
//! - [`footprints`] - Building footprints for an area
//! - [`jobs`] - Job lifecycle (submit, search, launch, status)
//! - [`mosaic`] - Standalone tile mosaic to GeoTIFF
//! - [`tiles`] - Tile range for an area

pub mod common;
pub mod config;
pub mod footprints;
pub mod jobs;
pub mod mosaic;
pub mod tiles;

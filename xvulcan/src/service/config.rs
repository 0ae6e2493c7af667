//! Service configuration types.

use crate::config::{ConfigFile, DEFAULT_ZOOM};
use crate::footprint::TagFilter;
use crate::pipeline::RetryPolicy;
use std::time::Duration;

/// Default length of the imagery search window (one year back).
pub const DEFAULT_SEARCH_WINDOW_DAYS: i64 = 365;

/// Configuration for the assessment service.
///
/// # Example
///
/// ```
/// use xvulcan::service::ServiceConfig;
///
/// let config = ServiceConfig::builder().zoom(17).build();
///
/// assert_eq!(config.zoom(), 17);
/// assert_eq!(config.retry().max_attempts, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Default tile zoom for tile-server imagery
    zoom: u8,
    /// Footprint tag predicates
    tags: TagFilter,
    /// Retry policy applied to every stage
    retry: RetryPolicy,
    /// Imagery search window in days, ending at the search date
    search_window_days: i64,
}

impl ServiceConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Build from the user's configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self::builder()
            .zoom(config.imagery.zoom)
            .tags(config.footprints.tags.clone())
            .retry(RetryPolicy::new(
                config.pipeline.max_attempts,
                Duration::from_millis(config.pipeline.retry_delay_ms),
            ))
            .build()
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn tags(&self) -> &TagFilter {
        &self.tags
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    pub fn search_window_days(&self) -> i64 {
        self.search_window_days
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            tags: TagFilter::default(),
            retry: RetryPolicy::default(),
            search_window_days: DEFAULT_SEARCH_WINDOW_DAYS,
        }
    }
}

/// Builder for ServiceConfig.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfigBuilder {
    zoom: Option<u8>,
    tags: Option<TagFilter>,
    retry: Option<RetryPolicy>,
    search_window_days: Option<i64>,
}

impl ServiceConfigBuilder {
    /// Set the default tile zoom.
    pub fn zoom(mut self, zoom: u8) -> Self {
        self.zoom = Some(zoom);
        self
    }

    /// Set the footprint tag predicates.
    pub fn tags(mut self, tags: TagFilter) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Set the stage retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Set the imagery search window in days.
    pub fn search_window_days(mut self, days: i64) -> Self {
        self.search_window_days = Some(days);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ServiceConfig {
        let default = ServiceConfig::default();
        ServiceConfig {
            zoom: self.zoom.unwrap_or(default.zoom),
            tags: self.tags.unwrap_or(default.tags),
            retry: self.retry.unwrap_or(default.retry),
            search_window_days: self.search_window_days.unwrap_or(default.search_window_days),
        }
    }
}

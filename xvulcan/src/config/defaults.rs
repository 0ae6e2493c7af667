//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::file::config_directory;
use super::settings::*;
use crate::footprint::{TagFilter, DEFAULT_OVERPASS_ENDPOINT};
use crate::mosaic::DEFAULT_WORKERS;
use crate::provider::DEFAULT_TIMEOUT_SECS;

/// Provider names accepted in `[provider] type`.
pub const VALID_PROVIDERS: [&str; 2] = ["planet", "maxar"];

/// Default imagery provider.
pub const DEFAULT_PROVIDER: &str = "planet";

/// Default slippy-map zoom for tile-server imagery (~0.6 m/pixel).
pub const DEFAULT_ZOOM: u8 = 18;

/// Default number of concurrent tile workers.
pub const DEFAULT_IMAGERY_WORKERS: usize = DEFAULT_WORKERS;

/// Default HTTP timeout in seconds.
pub const DEFAULT_IMAGERY_TIMEOUT_SECS: u64 = DEFAULT_TIMEOUT_SECS;

/// Default classifier program and its leading arguments.
pub const DEFAULT_INFERENCE_PROGRAM: &str = "python";
pub const DEFAULT_INFERENCE_ARGS: &str = "handler.py";

/// Default attempts per stage (no retry).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Default pause between stage attempts.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 5_000;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "xvulcan.log";

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = config_directory();

        Self {
            provider: ProviderSettings {
                provider_type: DEFAULT_PROVIDER.to_string(),
                planet_api_key: None,
                maxar_api_key: None,
            },
            imagery: ImagerySettings {
                zoom: DEFAULT_ZOOM,
                workers: DEFAULT_IMAGERY_WORKERS,
                timeout: DEFAULT_IMAGERY_TIMEOUT_SECS,
            },
            storage: StorageSettings {
                directory: config_dir.join("jobs"),
                store: StoreKind::File,
            },
            footprints: FootprintSettings {
                endpoint: DEFAULT_OVERPASS_ENDPOINT.to_string(),
                tags: TagFilter::default(),
            },
            inference: InferenceSettings {
                program: DEFAULT_INFERENCE_PROGRAM.to_string(),
                args: vec![DEFAULT_INFERENCE_ARGS.to_string()],
            },
            pipeline: PipelineSettings {
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            },
            logging: LoggingSettings {
                directory: config_dir.join("logs"),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}

//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let planet_api_key = config.provider.planet_api_key.as_deref().unwrap_or("");
    let maxar_api_key = config.provider.maxar_api_key.as_deref().unwrap_or("");

    format!(
        r#"[provider]
; Imagery provider:
;   planet - Planet SkySat imagery served as map tiles (requires API key)
;   maxar  - Maxar imagery delivered as one scene per request (requires API key)
type = {}
; Planet API key (only required when type = planet)
planet_api_key = {}
; Maxar API key (only required when type = maxar)
maxar_api_key = {}

[imagery]
; Map zoom used for tile providers (default: 18, about 0.6 m per pixel)
; Can be overridden per assessment at launch time
zoom = {}
; Concurrent tile downloads (default: 4)
workers = {}
; HTTP request timeout in seconds (default: 30)
timeout = {}

[storage]
; Root directory for per-job imagery, footprints and results
directory = {}
; Job record store:
;   file   - one JSON file per job, shared between invocations
;   memory - kept in memory, lost on exit
store = {}

[footprints]
; Overpass API interpreter endpoint
endpoint = {}
; Comma separated tag predicates, e.g. building or building,amenity=hospital
tags = {}

[inference]
; Damage classifier program
program = {}
; Arguments placed before --pre_directory/--post_directory/--bldg_polys/--output_file
args = {}

[pipeline]
; Attempts per stage before it is marked as failed (default: 1, no retry)
max_attempts = {}
; Pause between attempts in milliseconds
retry_delay_ms = {}

[logging]
; Directory for the log file
directory = {}
; Log file name (cleared on each start)
file = {}
"#,
        config.provider.provider_type,
        planet_api_key,
        maxar_api_key,
        config.imagery.zoom,
        config.imagery.workers,
        config.imagery.timeout,
        path_to_string(&config.storage.directory),
        config.storage.store,
        config.footprints.endpoint,
        config.footprints.tags,
        config.inference.program,
        config.inference.args.join(" "),
        config.pipeline.max_attempts,
        config.pipeline.retry_delay_ms,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

/// Convert a path to a string, using ~ for home directory if applicable.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::defaults::VALID_PROVIDERS;
use super::file::ConfigFileError;
use super::settings::{ConfigFile, StoreKind};
use crate::coord::MAX_ZOOM;
use crate::footprint::TagFilter;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [provider] section
    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = section.get("type") {
            let v = v.trim().to_lowercase();
            if !VALID_PROVIDERS.contains(&v.as_str()) {
                return Err(invalid(
                    "provider",
                    "type",
                    &v,
                    &format!("must be one of: {}", VALID_PROVIDERS.join(", ")),
                ));
            }
            config.provider.provider_type = v;
        }
        config.provider.planet_api_key = non_empty(section.get("planet_api_key"));
        config.provider.maxar_api_key = non_empty(section.get("maxar_api_key"));
    }

    // [imagery] section
    if let Some(section) = ini.section(Some("imagery")) {
        if let Some(v) = section.get("zoom") {
            config.imagery.zoom = parse_number("imagery", "zoom", v)?;
            if config.imagery.zoom > MAX_ZOOM {
                return Err(invalid(
                    "imagery",
                    "zoom",
                    v,
                    &format!("must be between 0 and {}", MAX_ZOOM),
                ));
            }
        }
        if let Some(v) = section.get("workers") {
            config.imagery.workers = parse_positive("imagery", "workers", v)?;
        }
        if let Some(v) = section.get("timeout") {
            config.imagery.timeout = parse_positive("imagery", "timeout", v)?;
        }
    }

    // [storage] section
    if let Some(section) = ini.section(Some("storage")) {
        if let Some(v) = non_empty(section.get("directory")) {
            config.storage.directory = expand_tilde(&v);
        }
        if let Some(v) = section.get("store") {
            config.storage.store = StoreKind::from_str(v)
                .map_err(|_| invalid("storage", "store", v, "must be 'memory' or 'file'"))?;
        }
    }

    // [footprints] section
    if let Some(section) = ini.section(Some("footprints")) {
        if let Some(v) = non_empty(section.get("endpoint")) {
            config.footprints.endpoint = v;
        }
        if let Some(v) = section.get("tags") {
            config.footprints.tags = TagFilter::from_str(v)
                .map_err(|reason| invalid("footprints", "tags", v, &reason))?;
        }
    }

    // [inference] section
    if let Some(section) = ini.section(Some("inference")) {
        if let Some(v) = non_empty(section.get("program")) {
            config.inference.program = v;
        }
        if let Some(v) = section.get("args") {
            config.inference.args = v.split_whitespace().map(str::to_string).collect();
        }
    }

    // [pipeline] section
    if let Some(section) = ini.section(Some("pipeline")) {
        if let Some(v) = section.get("max_attempts") {
            config.pipeline.max_attempts = parse_positive("pipeline", "max_attempts", v)?;
        }
        if let Some(v) = section.get("retry_delay_ms") {
            config.pipeline.retry_delay_ms = parse_number("pipeline", "retry_delay_ms", v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("directory")) {
            config.logging.directory = expand_tilde(&v);
        }
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = v;
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_number<T: FromStr>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, "must be a non-negative integer"))
}

fn parse_positive<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    let parsed: T = parse_number(section, key, value)?;
    if parsed <= T::default() {
        return Err(invalid(section, key, value, "must be a positive integer"));
    }
    Ok(parsed)
}

/// Expands a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

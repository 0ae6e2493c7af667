//! Common argument types and helpers shared across CLI commands.

use chrono::{DateTime, Utc};
use clap::Args;
use std::path::Path;
use xvulcan::coord::BoundingBox;
use xvulcan::store::JobId;

use crate::error::CliError;

/// Two opposite corners of the area of interest, in any order.
#[derive(Debug, Clone, Copy, Args)]
pub struct AreaArgs {
    /// Longitude of the first corner
    #[arg(allow_negative_numbers = true)]
    pub start_lon: f64,

    /// Latitude of the first corner
    #[arg(allow_negative_numbers = true)]
    pub start_lat: f64,

    /// Longitude of the opposite corner
    #[arg(allow_negative_numbers = true)]
    pub end_lon: f64,

    /// Latitude of the opposite corner
    #[arg(allow_negative_numbers = true)]
    pub end_lat: f64,
}

impl AreaArgs {
    pub fn start(&self) -> (f64, f64) {
        (self.start_lon, self.start_lat)
    }

    pub fn end(&self) -> (f64, f64) {
        (self.end_lon, self.end_lat)
    }

    /// Validated bounding box, including the area limit.
    pub fn bounding_box(&self) -> Result<BoundingBox, CliError> {
        let bbox = BoundingBox::from_corners(self.start(), self.end())?;
        bbox.check_span()?;
        Ok(bbox)
    }
}

/// Parse an RFC 3339 timestamp, defaulting to now.
pub fn parse_date(date: Option<&str>) -> Result<DateTime<Utc>, CliError> {
    match date {
        None => Ok(Utc::now()),
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| {
                CliError::InvalidInput(format!(
                    "date '{}' is not RFC 3339 (e.g. 2024-03-01T00:00:00Z): {}",
                    value, e
                ))
            }),
    }
}

/// Require `path` to carry the given extension.
pub fn require_extension(path: &Path, extension: &str) -> Result<(), CliError> {
    let matches = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false);

    if matches {
        Ok(())
    } else {
        Err(CliError::InvalidInput(format!(
            "output '{}' must end in .{}",
            path.display(),
            extension
        )))
    }
}

pub fn job_id(value: &str) -> JobId {
    JobId::new(value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let date = parse_date(Some("2024-03-01T12:00:00+02:00")).unwrap();
        assert_eq!(date.to_rfc3339(), "2024-03-01T10:00:00+00:00");
        assert!(matches!(
            parse_date(Some("yesterday")),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_require_extension() {
        assert!(require_extension(Path::new("out/pre.TIF"), "tif").is_ok());
        assert!(require_extension(Path::new("out/pre.png"), "tif").is_err());
        assert!(require_extension(Path::new("out/pre"), "tif").is_err());
    }

    #[test]
    fn test_area_corners_in_any_order() {
        let area = AreaArgs {
            start_lon: 30.513,
            start_lat: 50.457,
            end_lon: 30.496,
            end_lat: 50.450,
        };
        let bbox = area.bounding_box().unwrap();
        assert_eq!(bbox.west, 30.496);
        assert_eq!(bbox.north, 50.457);
    }
}

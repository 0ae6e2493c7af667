//! Tile URL templates.
//!
//! A template is a URL containing `{x}`, `{y}` and `{z}` placeholders and,
//! optionally, a `{s}` (or `{subdomain}`) placeholder that is filled from a
//! list of interchangeable hosts.

use crate::coord::TileCoordinate;

/// A slippy-map tile URL with placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileUrlTemplate {
    pattern: String,
    subdomains: Vec<String>,
}

impl TileUrlTemplate {
    /// Creates a template without subdomains.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            subdomains: Vec::new(),
        }
    }

    /// Sets the hosts substituted into `{s}` / `{subdomain}`.
    pub fn with_subdomains<I, S>(mut self, subdomains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdomains = subdomains.into_iter().map(Into::into).collect();
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }

    /// Picks the subdomain for a tile.
    ///
    /// Selection is `(x + y) mod n`, so horizontally or vertically adjacent
    /// tiles never share a host.
    pub fn subdomain_for(&self, tile: &TileCoordinate) -> Option<&str> {
        if self.subdomains.is_empty() {
            return None;
        }
        let index = (tile.x as u64 + tile.y as u64) % self.subdomains.len() as u64;
        Some(self.subdomains[index as usize].as_str())
    }

    /// Builds the URL for one tile.
    pub fn url_for(&self, tile: &TileCoordinate) -> String {
        let mut url = self
            .pattern
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
            .replace("{z}", &tile.zoom.to_string());

        if let Some(subdomain) = self.subdomain_for(tile) {
            url = url
                .replace("{subdomain}", subdomain)
                .replace("{s}", subdomain);
        }

        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_coordinates() {
        let template = TileUrlTemplate::new("https://tiles.example.com/{z}/{x}/{y}.png");
        let url = template.url_for(&TileCoordinate::new(153278, 88384, 18));
        assert_eq!(url, "https://tiles.example.com/18/153278/88384.png");
    }

    #[test]
    fn test_subdomains_rotate_between_neighbours() {
        let template = TileUrlTemplate::new("https://{s}.example.com/{z}/{x}/{y}.png")
            .with_subdomains(["tiles0", "tiles1", "tiles2", "tiles3"]);

        let origin = TileCoordinate::new(10, 20, 5);
        let right = TileCoordinate::new(11, 20, 5);
        let below = TileCoordinate::new(10, 21, 5);

        assert_eq!(template.subdomain_for(&origin), Some("tiles2"));
        assert_ne!(template.subdomain_for(&origin), template.subdomain_for(&right));
        assert_ne!(template.subdomain_for(&origin), template.subdomain_for(&below));
        assert_eq!(
            template.url_for(&origin),
            "https://tiles2.example.com/5/10/20.png"
        );
    }

    #[test]
    fn test_long_form_subdomain_placeholder() {
        let template =
            TileUrlTemplate::new("https://{subdomain}.example.com/{z}/{x}/{y}").with_subdomains(["a"]);
        assert_eq!(
            template.url_for(&TileCoordinate::new(1, 2, 3)),
            "https://a.example.com/3/1/2"
        );
    }

    #[test]
    fn test_placeholder_left_without_subdomains() {
        let template = TileUrlTemplate::new("https://{s}.example.com/{z}/{x}/{y}");
        assert_eq!(template.subdomain_for(&TileCoordinate::new(0, 0, 0)), None);
        assert!(template.url_for(&TileCoordinate::new(0, 0, 0)).contains("{s}"));
    }
}

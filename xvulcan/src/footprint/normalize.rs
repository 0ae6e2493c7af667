//! Normalization of Overpass geometry into multipolygons.

use super::types::{Element, Footprint, LatLon};
use geo::{BooleanOps, LineString, MultiPolygon, Polygon};
use tracing::trace;

/// Fewest coordinate pairs that can describe a ring.
const MIN_RING_POINTS: usize = 3;

fn ring(points: &[LatLon]) -> Option<Polygon<f64>> {
    if points.len() < MIN_RING_POINTS {
        return None;
    }
    let exterior: LineString<f64> = points.iter().map(|p| (p.lon, p.lat)).collect();
    Some(Polygon::new(exterior, Vec::new()))
}

fn normalize_relation(element: &Element) -> Option<MultiPolygon<f64>> {
    let mut outers = Vec::new();
    let mut inners = Vec::new();

    for member in &element.members {
        match member.role.as_str() {
            "outer" => outers.extend(ring(&member.geometry)),
            "inner" => inners.extend(ring(&member.geometry)),
            _ => {}
        }
    }

    if outers.is_empty() {
        return None;
    }

    let mut merged = outers
        .into_iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, outer| {
            acc.union(&MultiPolygon::new(vec![outer]))
        });
    for inner in inners {
        merged = merged.difference(&MultiPolygon::new(vec![inner]));
    }

    Some(merged)
}

/// Converts Overpass elements into footprints.
///
/// - a way becomes a polygon without holes;
/// - a relation becomes the union of its `outer` rings minus every `inner`
///   ring;
/// - rings with fewer than three points, nodes, and relations without a
///   usable outer ring are skipped.
pub fn normalize_elements(elements: &[Element]) -> Vec<Footprint> {
    elements
        .iter()
        .filter_map(|element| {
            let geometry = match element.element_type.as_str() {
                "way" => ring(&element.geometry).map(|p| MultiPolygon::new(vec![p])),
                "relation" => normalize_relation(element),
                _ => None,
            };

            let Some(geometry) = geometry else {
                trace!(
                    element_type = %element.element_type,
                    id = element.id,
                    "Skipping element without usable geometry"
                );
                return None;
            };

            Some(Footprint {
                geometry,
                osm_id: element
                    .id
                    .map(|id| format!("{}/{}", element.element_type, id)),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::types::Member;
    use geo::Area;

    fn square(x: f64, y: f64, size: f64) -> Vec<LatLon> {
        vec![
            LatLon { lon: x, lat: y },
            LatLon { lon: x + size, lat: y },
            LatLon { lon: x + size, lat: y + size },
            LatLon { lon: x, lat: y + size },
            LatLon { lon: x, lat: y },
        ]
    }

    fn way(id: i64, geometry: Vec<LatLon>) -> Element {
        Element {
            element_type: "way".to_string(),
            id: Some(id),
            geometry,
            members: Vec::new(),
        }
    }

    fn member(role: &str, geometry: Vec<LatLon>) -> Member {
        Member {
            member_type: "way".to_string(),
            role: role.to_string(),
            geometry,
        }
    }

    fn relation(id: i64, members: Vec<Member>) -> Element {
        Element {
            element_type: "relation".to_string(),
            id: Some(id),
            geometry: Vec::new(),
            members,
        }
    }

    #[test]
    fn test_way_becomes_simple_polygon() {
        let footprints = normalize_elements(&[way(42, square(30.5, 50.45, 0.001))]);

        assert_eq!(footprints.len(), 1);
        assert_eq!(footprints[0].osm_id.as_deref(), Some("way/42"));
        assert_eq!(footprints[0].geometry.0.len(), 1);
        assert!(footprints[0].geometry.0[0].interiors().is_empty());
    }

    #[test]
    fn test_relation_outer_minus_inner() {
        let outer = square(0.0, 0.0, 10.0);
        let inner = square(2.0, 2.0, 4.0);
        let footprints = normalize_elements(&[relation(
            7,
            vec![member("outer", outer), member("inner", inner)],
        )]);

        assert_eq!(footprints.len(), 1);
        assert_eq!(footprints[0].osm_id.as_deref(), Some("relation/7"));
        let area = footprints[0].geometry.unsigned_area();
        assert!((area - (100.0 - 16.0)).abs() < 1e-9, "area = {}", area);
    }

    #[test]
    fn test_relation_with_two_outers() {
        let footprints = normalize_elements(&[relation(
            8,
            vec![
                member("outer", square(0.0, 0.0, 1.0)),
                member("outer", square(5.0, 5.0, 1.0)),
            ],
        )]);
        assert_eq!(footprints[0].geometry.0.len(), 2);
        assert!((footprints[0].geometry.unsigned_area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_rings_and_nodes_skipped() {
        let degenerate = vec![LatLon { lon: 0.0, lat: 0.0 }, LatLon { lon: 1.0, lat: 1.0 }];
        let node = Element {
            element_type: "node".to_string(),
            id: Some(1),
            geometry: Vec::new(),
            members: Vec::new(),
        };
        let hollow = relation(9, vec![member("outer", degenerate.clone())]);
        let inner_only = relation(10, vec![member("inner", square(0.0, 0.0, 1.0))]);

        let footprints =
            normalize_elements(&[way(1, degenerate), node, hollow, inner_only]);
        assert!(footprints.is_empty());
    }

    #[test]
    fn test_degenerate_inner_ignored() {
        let footprints = normalize_elements(&[relation(
            11,
            vec![
                member("outer", square(0.0, 0.0, 2.0)),
                member("inner", vec![LatLon { lon: 0.5, lat: 0.5 }]),
            ],
        )]);
        assert!((footprints[0].geometry.unsigned_area() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_id() {
        let mut element = way(0, square(0.0, 0.0, 1.0));
        element.id = None;
        let footprints = normalize_elements(&[element]);
        assert_eq!(footprints[0].osm_id, None);
    }
}

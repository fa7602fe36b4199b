//! GeoJSON export of contour path sets
//!
//! Isolines become `MultiLineString` features tagged with their `isovalue`;
//! isobands become `MultiPolygon` features tagged with `lower_level` and
//! `upper_level`. Band rings come out of the engine as flat sibling rings
//! (holes wind the opposite way but are separate paths), so this module
//! nests them before building polygons: rings are placed largest-first, each
//! under the smallest already-placed ring enclosing it, and the parity of
//! that nesting depth decides exterior versus hole.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Position, Value as GeoValue};

use crate::grid::Scalar;
use crate::paths::ContourPaths;

/// Absolute area of a closed ring, by the shoelace formula
fn ring_area(ring: &[Position]) -> f64 {
    let mut twice_area = 0.0;
    for pair in ring.windows(2) {
        twice_area += pair[0][0] * pair[1][1] - pair[1][0] * pair[0][1];
    }
    (twice_area / 2.0).abs()
}

/// Ray-casting point-in-ring test over a closed ring
fn point_in_ring(point: &[f64], ring: &[Position]) -> bool {
    let mut inside = false;
    for pair in ring.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if (a[1] > point[1]) != (b[1] > point[1])
            && point[0] < a[0] + (point[1] - a[1]) / (b[1] - a[1]) * (b[0] - a[0])
        {
            inside = !inside;
        }
    }
    inside
}

/// Whether `outer` encloses `inner`
///
/// Sibling rings may legitimately share vertices, and a ray cast from a
/// shared vertex is unreliable, so every vertex of the inner ring votes and
/// the majority decides.
fn ring_contains(outer: &[Position], inner: &[Position]) -> bool {
    let mut inside = 0usize;
    let mut outside = 0usize;
    for point in &inner[..inner.len() - 1] {
        if point_in_ring(point, outer) {
            inside += 1;
        } else {
            outside += 1;
        }
    }
    inside > outside
}

/// Nest flat sibling rings into polygons with holes
///
/// Rings are placed in order of decreasing area, so all rings that could
/// enclose one have already been placed when it arrives; the smallest
/// encloser is its immediate parent. A ring at even nesting depth starts a
/// new polygon, a ring at odd depth is a hole of its parent's polygon, and
/// an island inside a hole lands back at even depth and becomes its own
/// polygon again.
fn assemble_polygons(mut rings: Vec<Vec<Position>>) -> Vec<Vec<Vec<Position>>> {
    let areas: Vec<f64> = rings.iter().map(|ring| ring_area(ring)).collect();
    let mut order: Vec<usize> = (0..rings.len()).collect();
    order.sort_by(|&i, &j| areas[j].total_cmp(&areas[i]));

    // ring index, the polygon it joined, and its nesting depth, in
    // placement order
    let mut placed: Vec<(usize, usize, usize)> = Vec::new();
    // ring indices per output polygon, exterior first
    let mut members: Vec<Vec<usize>> = Vec::new();

    for &i in &order {
        let mut parent = None;
        for &(j, polygon, depth) in &placed {
            // placement runs largest-first, so the last hit is the
            // smallest enclosing ring
            if ring_contains(&rings[j], &rings[i]) {
                parent = Some((polygon, depth));
            }
        }

        match parent {
            Some((polygon, depth)) if depth % 2 == 0 => {
                members[polygon].push(i);
                placed.push((i, polygon, depth + 1));
            }
            Some((_, depth)) => {
                members.push(vec![i]);
                placed.push((i, members.len() - 1, depth + 1));
            }
            None => {
                members.push(vec![i]);
                placed.push((i, members.len() - 1, 0));
            }
        }
    }

    members
        .into_iter()
        .map(|ring_ids| {
            ring_ids
                .into_iter()
                .map(|i| std::mem::take(&mut rings[i]))
                .collect()
        })
        .collect()
}

/// Convert each path to a position list, closing rings if requested
fn to_positions<T: Scalar>(paths: &ContourPaths<T>, close: bool) -> Vec<Vec<Position>> {
    paths
        .paths()
        .map(|(_, xs, ys)| {
            let mut line: Vec<Position> = xs
                .iter()
                .zip(ys)
                .map(|(&x, &y)| vec![x.to_f64(), y.to_f64()])
                .collect();
            if close && !line.is_empty() && line.first() != line.last() {
                let first = line[0].clone();
                line.push(first);
            }
            line
        })
        .collect()
}

/// Build a `MultiLineString` feature for one isoline level
///
/// The feature carries the level in an `isovalue` property.
pub fn line_feature<T: Scalar>(paths: &ContourPaths<T>, isovalue: T) -> Feature {
    let lines = to_positions(paths, false);

    let mut feature = Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeoValue::MultiLineString(lines))),
        id: None,
        properties: Some(JsonObject::new()),
        foreign_members: None,
    };

    if let Some(props) = feature.properties.as_mut() {
        props.insert("isovalue".to_string(), serde_json::json!(isovalue.to_f64()));
    }

    feature
}

/// Build a `MultiPolygon` feature for one isoband
///
/// Rings are explicitly closed, nested into exterior/hole polygons, and the
/// feature carries `lower_level` and `upper_level` properties.
pub fn band_feature<T: Scalar>(paths: &ContourPaths<T>, lower: T, upper: T) -> Feature {
    let rings = to_positions(paths, true);
    let polygons = assemble_polygons(rings);

    let mut feature = Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeoValue::MultiPolygon(polygons))),
        id: None,
        properties: Some(JsonObject::new()),
        foreign_members: None,
    };

    if let Some(props) = feature.properties.as_mut() {
        props.insert(
            "lower_level".to_string(),
            serde_json::json!(lower.to_f64()),
        );
        props.insert(
            "upper_level".to_string(),
            serde_json::json!(upper.to_f64()),
        );
    }

    feature
}

/// Check if a feature has non-empty MultiLineString geometry
fn has_line_coordinates(feature: &Feature) -> bool {
    match &feature.geometry {
        Some(geometry) => match &geometry.value {
            GeoValue::MultiLineString(lines) => !lines.is_empty(),
            _ => false,
        },
        None => false,
    }
}

/// Check if a feature has non-empty MultiPolygon geometry
fn has_polygon_coordinates(feature: &Feature) -> bool {
    match &feature.geometry {
        Some(geometry) => match &geometry.value {
            GeoValue::MultiPolygon(polygons) => !polygons.is_empty(),
            _ => false,
        },
        None => false,
    }
}

/// Build a collection of isoline features, one per level
///
/// Levels whose path set is empty are filtered out.
pub fn line_collection<T: Scalar>(results: &[ContourPaths<T>], levels: &[T]) -> FeatureCollection {
    let features = results
        .iter()
        .zip(levels)
        .map(|(paths, &level)| line_feature(paths, level))
        .filter(has_line_coordinates)
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Build a collection of isoband features, one per level pair
///
/// Bands whose path set is empty are filtered out.
pub fn band_collection<T: Scalar>(
    results: &[ContourPaths<T>],
    lower: &[T],
    upper: &[T],
) -> FeatureCollection {
    let features = results
        .iter()
        .zip(lower.iter().zip(upper))
        .map(|(paths, (&lo, &hi))| band_feature(paths, lo, hi))
        .filter(has_polygon_coordinates)
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

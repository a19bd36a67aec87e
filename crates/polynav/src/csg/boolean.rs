//! Boolean operations on [`CSGPolygon`]
//!
//! Clipping is delegated to `geo` (i_overlay). Coordinates are snapped on a
//! fixed precision grid before clipping so that identical inputs always give
//! identical outputs, and results are converted back to clockwise polygons.

use super::CSGPolygon;
use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon};
use glam::Vec2;
use polynav_common::{bounds_2d, overlap_bounds_2d, signed_area_2d};

/// Inverse of the grid step used to snap coordinates
const SNAP_SCALE: f64 = 10_000.0;

fn snap(value: f32) -> f64 {
    (value as f64 * SNAP_SCALE).round() / SNAP_SCALE
}

fn to_geo_polygon(polygon: &CSGPolygon) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = polygon
        .cw_points()
        .iter()
        .map(|p| Coord {
            x: snap(p.x),
            y: snap(p.y),
        })
        .collect();
    Polygon::new(LineString::new(coords), vec![])
}

/// Converts a geo ring in clockwise points without closing point
fn from_geo_ring(ring: &LineString<f64>) -> Vec<Vec2> {
    let mut points: Vec<Vec2> = ring
        .coords()
        .map(|c| Vec2::new(c.x as f32, c.y as f32))
        .collect();
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if signed_area_2d(&points) > 0.0 {
        points.reverse();
    }
    points
}

fn exteriors(name: &str, result: &MultiPolygon<f64>) -> Vec<CSGPolygon> {
    result
        .iter()
        .map(|polygon| from_geo_ring(polygon.exterior()))
        .filter(|points| points.len() >= 3)
        .map(|points| CSGPolygon::new(name, points))
        .collect()
}

fn bounds_overlap(p1: &CSGPolygon, p2: &CSGPolygon) -> bool {
    match (bounds_2d(p1.cw_points()), bounds_2d(p2.cw_points())) {
        (Some((min1, max1)), Some((min2, max2))) => overlap_bounds_2d(min1, max1, min2, max2),
        _ => false,
    }
}

/// Outcome of merging two polygons
#[derive(Debug)]
enum PairUnion {
    Merged(CSGPolygon),
    /// The polygons do not form a single contour
    Separate,
    Failed,
}

/// Merges the overlapping polygons. Polygons not overlapping any other are
/// returned unchanged. A single polygon is returned as is.
///
/// When the clipping of a pair fails, the whole union is abandoned and the
/// input polygons are returned unmerged.
pub fn union_polygons(polygons: &[CSGPolygon]) -> Vec<CSGPolygon> {
    merge_pairs(polygons, union_two_polygons)
}

fn merge_pairs<F>(polygons: &[CSGPolygon], union_two: F) -> Vec<CSGPolygon>
where
    F: Fn(&CSGPolygon, &CSGPolygon) -> PairUnion,
{
    let mut working: Vec<CSGPolygon> = polygons.to_vec();
    let mut merged = Vec::with_capacity(polygons.len());

    while !working.is_empty() {
        let mut union_found = false;
        for i in 1..working.len() {
            match union_two(&working[0], &working[i]) {
                PairUnion::Merged(union) => {
                    working.remove(i);
                    working[0] = union;
                    union_found = true;
                    break;
                }
                PairUnion::Separate => {}
                PairUnion::Failed => return polygons.to_vec(),
            }
        }

        if !union_found {
            merged.push(working.remove(0));
        }
    }

    merged
}

/// Union of two polygons when they form a single contour. Holes of the result
/// are filled.
fn union_two_polygons(p1: &CSGPolygon, p2: &CSGPolygon) -> PairUnion {
    if !bounds_overlap(p1, p2) {
        return PairUnion::Separate;
    }

    let result = to_geo_polygon(p1).union(&to_geo_polygon(p2));
    match result.0.len() {
        0 => {
            log::error!(
                "Union of polygons returns no result: {:?} ({}), {:?} ({})",
                p1.cw_points(),
                p1.name(),
                p2.cw_points(),
                p2.name()
            );
            PairUnion::Failed
        }
        1 => {
            let points = from_geo_ring(result.0[0].exterior());
            if points.len() < 3 {
                return PairUnion::Separate;
            }
            PairUnion::Merged(CSGPolygon::new(format!("{}-{}", p1.name(), p2.name()), points))
        }
        _ => PairUnion::Separate,
    }
}

/// Subtracts `subtrahend` from `minuend`.
///
/// The returned flag is true when the subtrahend lies strictly inside the
/// minuend: the subtraction would create a hole, so the minuend is returned
/// unchanged and the caller decides how to handle the hole.
pub fn subtract_polygons(minuend: &CSGPolygon, subtrahend: &CSGPolygon) -> (Vec<CSGPolygon>, bool) {
    if !bounds_overlap(minuend, subtrahend) {
        return (vec![minuend.clone()], false);
    }

    let result = to_geo_polygon(minuend).difference(&to_geo_polygon(subtrahend));
    if result.0.is_empty() {
        return (Vec::new(), false);
    }
    if result.0.len() == 1 && !result.0[0].interiors().is_empty() {
        return (vec![minuend.clone()], true);
    }
    (exteriors(minuend.name(), &result), false)
}

/// Intersection of two polygons, zero or more polygons
pub fn intersect_polygons(p1: &CSGPolygon, p2: &CSGPolygon) -> Vec<CSGPolygon> {
    if !bounds_overlap(p1, p2) {
        return Vec::new();
    }
    let result = to_geo_polygon(p1).intersection(&to_geo_polygon(p2));
    exteriors(&format!("{}-{}", p1.name(), p2.name()), &result)
}

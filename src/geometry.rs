//! WKT parsing and geometry operations.
//!
//! This module wraps the geometry collaborator capabilities the engines
//! consume: parse/serialize WKT, envelopes, convex hulls, validity check
//! and healing, and n-ary union.
//!
//! # Design
//!
//! WKT strings are the source of truth throughout the model; parsing
//! happens at the policy boundary (geometry-union merge, tiling entry)
//! and healed/unioned geometries are serialized straight back to text.
//! Healing uses a boolean-ops self-union, which re-nodes the rings the
//! same way a zero-distance buffer does.

use crate::error::{ModelError, Result};
use geo::{Area, BooleanOps, BoundingRect, ConvexHull, CoordsIter, Intersects, Validation};
use geo_types::{
    Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
    Polygon, Rect,
};
use wkt::ToWkt;

/// Parse a WKT string to a geo-types Geometry.
pub fn parse_wkt(text: &str) -> Result<Geometry<f64>> {
    use std::str::FromStr;
    wkt::Wkt::from_str(text)
        .map_err(|e| ModelError::WktParse(format!("{:?}", e)))
        .and_then(|w| {
            w.try_into()
                .map_err(|e: wkt::conversion::Error| ModelError::WktParse(format!("{:?}", e)))
        })
}

/// Serialize a geometry back to WKT.
pub fn to_wkt(geom: &Geometry<f64>) -> String {
    geom.wkt_string()
}

/// Axis-aligned bounding rectangle, if the geometry has any extent.
pub fn envelope(geom: &Geometry<f64>) -> Option<Rect<f64>> {
    geom.bounding_rect()
}

/// Whether two WKT strings describe intersecting geometries.
pub fn wkt_intersects(a: &str, b: &str) -> Result<bool> {
    Ok(parse_wkt(a)?.intersects(&parse_wkt(b)?))
}

/// Check a geometry for OGC validity (self-intersections etc.).
pub fn is_valid(geom: &Geometry<f64>) -> bool {
    geom.is_valid()
}

/// Heal an invalid areal geometry by unioning it with the empty set.
///
/// The boolean overlay re-nodes self-intersecting rings into a valid
/// polygon set, matching the zero-distance-buffer healing trick. Healing
/// is only defined for areal geometries; others pass through unchanged.
pub fn heal(geom: &Geometry<f64>) -> Geometry<f64> {
    let empty = MultiPolygon::new(Vec::new());
    match geom {
        Geometry::Polygon(p) => collapse_areal(MultiPolygon::new(vec![p.clone()]).union(&empty)),
        Geometry::MultiPolygon(mp) => collapse_areal(mp.union(&empty)),
        other => other.clone(),
    }
}

/// Compute the n-ary union of a set of geometries.
///
/// Areal parts are combined with boolean ops; points and lines are
/// collected with set semantics. Mixed dimensionality yields a
/// GeometryCollection. Returns `None` for an empty input.
pub fn union_all(geoms: &[Geometry<f64>]) -> Option<Geometry<f64>> {
    if geoms.is_empty() {
        return None;
    }

    let mut areal = MultiPolygon::new(Vec::new());
    let mut points: Vec<Point<f64>> = Vec::new();
    let mut lines: Vec<LineString<f64>> = Vec::new();
    collect_parts(geoms, &mut areal, &mut points, &mut lines);

    let mut parts: Vec<Geometry<f64>> = Vec::new();
    if !areal.0.is_empty() {
        parts.push(collapse_areal(areal));
    }
    if !points.is_empty() {
        let mut distinct: Vec<Point<f64>> = Vec::new();
        for p in points {
            if !distinct.contains(&p) {
                distinct.push(p);
            }
        }
        parts.push(if distinct.len() == 1 {
            Geometry::Point(distinct[0])
        } else {
            Geometry::MultiPoint(MultiPoint::new(distinct))
        });
    }
    if !lines.is_empty() {
        let mut distinct: Vec<LineString<f64>> = Vec::new();
        for l in lines {
            if !distinct.contains(&l) {
                distinct.push(l);
            }
        }
        parts.push(if distinct.len() == 1 {
            Geometry::LineString(distinct.remove(0))
        } else {
            Geometry::MultiLineString(MultiLineString::new(distinct))
        });
    }

    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(Geometry::GeometryCollection(GeometryCollection(parts))),
    }
}

fn collect_parts(
    geoms: &[Geometry<f64>],
    areal: &mut MultiPolygon<f64>,
    points: &mut Vec<Point<f64>>,
    lines: &mut Vec<LineString<f64>>,
) {
    for geom in geoms {
        match geom {
            Geometry::Polygon(p) => {
                *areal = areal.union(&MultiPolygon::new(vec![p.clone()]));
            }
            Geometry::MultiPolygon(mp) => {
                *areal = areal.union(mp);
            }
            Geometry::Rect(r) => {
                *areal = areal.union(&MultiPolygon::new(vec![r.to_polygon()]));
            }
            Geometry::Triangle(t) => {
                *areal = areal.union(&MultiPolygon::new(vec![t.to_polygon()]));
            }
            Geometry::Point(p) => points.push(*p),
            Geometry::MultiPoint(mp) => points.extend(mp.0.iter().copied()),
            Geometry::LineString(l) => lines.push(l.clone()),
            Geometry::MultiLineString(ml) => lines.extend(ml.0.iter().cloned()),
            Geometry::Line(l) => lines.push(LineString::new(vec![l.start, l.end])),
            Geometry::GeometryCollection(gc) => collect_parts(&gc.0, areal, points, lines),
        }
    }
}

/// Collapse a single-polygon MultiPolygon back to a Polygon.
fn collapse_areal(mut mp: MultiPolygon<f64>) -> Geometry<f64> {
    if mp.0.len() == 1 {
        Geometry::Polygon(mp.0.remove(0))
    } else {
        Geometry::MultiPolygon(mp)
    }
}

/// Convex hull of a geometry's coordinates.
///
/// Returns `None` for degenerate inputs (fewer than three distinct
/// coordinates, or zero hull area), where the hull is useless as a
/// spatial prefilter.
pub fn convex_hull(geom: &Geometry<f64>) -> Option<Polygon<f64>> {
    let pts: Vec<Point<f64>> = geom.coords_iter().map(Point::from).collect();
    if pts.len() < 3 {
        return None;
    }
    let hull = MultiPoint::new(pts).convex_hull();
    if hull.exterior().0.len() < 4 || hull.unsigned_area() == 0.0 {
        return None;
    }
    Some(hull)
}

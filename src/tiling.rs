//! Adaptive geohash covering generation.
//!
//! Given a geometry, produces the set of fixed-grid cells covering it at
//! an automatically chosen precision, annotating each cell with whether
//! the geometry covers it fully or only intersects it.
//!
//! # Design
//!
//! A uniform fixed-precision raster scan avoids the cost of a recursive
//! quad-tree for typical shapes. Partially covered cells are refined one
//! level finer: sub-cells fully inside the geometry are recorded on the
//! parent tile, recovering most of the precision benefit of recursion for
//! boundary cells only. A convex-hull prefilter rejects candidate cells
//! cheaply before the exact prepared-geometry predicates run.
//!
//! Cell dimensions at a fixed precision are uniform across the
//! latitude/longitude band near the seed cell, which is what allows a
//! fixed-step raster instead of re-deriving the step per cell.

use crate::cell;
use crate::config::TilingConfig;
use crate::error::{ModelError, Result};
use crate::geometry;
use geo::{Intersects, PreparedGeometry, Relate};
use geo_types::{Geometry, Polygon, Rect};
use rustc_hash::FxHashSet;

/// Whether a tile's rectangle lies entirely inside the geometry or only
/// overlaps its boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// The geometry covers the whole cell rectangle.
    Full,
    /// The geometry intersects but does not cover the cell rectangle.
    Partial,
}

/// One cell of a covering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Cell code; length equals the chosen precision.
    pub code: String,

    /// Coverage classification for this cell.
    pub coverage: Coverage,

    /// Sub-cells one precision level finer that are fully covered by the
    /// geometry. Only populated for `Partial` tiles.
    pub refined: Vec<String>,
}

/// Convex-hull prefilter for candidate cells.
///
/// Degenerate geometries (points, zero-area shapes) have no usable hull;
/// every candidate passes and the exact predicates decide.
enum HullFilter {
    Hull(Polygon<f64>),
    Pass,
}

impl HullFilter {
    fn admits(&self, rect: &Rect<f64>) -> bool {
        match self {
            HullFilter::Hull(hull) => hull.intersects(rect),
            HullFilter::Pass => true,
        }
    }
}

/// Compute the covering for a WKT geometry.
pub fn tile(wkt: &str, config: &TilingConfig) -> Result<Vec<Tile>> {
    let geom = geometry::parse_wkt(wkt)?;
    tile_geometry(&geom, config)
}

/// Compute the covering for a parsed geometry.
pub fn tile_geometry(geom: &Geometry<f64>, config: &TilingConfig) -> Result<Vec<Tile>> {
    validate_config(config)?;

    let envelope = geometry::envelope(geom)
        .ok_or_else(|| ModelError::InvalidGeometry("geometry has no extent".into()))?;

    let precision = select_precision(&envelope, config)?;

    // Uniform step derived from the seed cell at the envelope min corner.
    let seed = cell::encode(envelope.min().y, envelope.min().x, precision)?;
    let seed_box = cell::bounding_box(&seed)?;
    let step_x = seed_box.width();
    let step_y = seed_box.height();

    let hull = match geometry::convex_hull(geom) {
        Some(h) => HullFilter::Hull(h),
        None => HullFilter::Pass,
    };
    let prepared = PreparedGeometry::from(geom);

    let mut tiles = Vec::new();
    let mut seen: FxHashSet<String> = FxHashSet::default();

    // One-cell margin on every side so boundary-adjacent cells are not
    // clipped by the raster extent.
    let mut y = envelope.min().y - step_y;
    while y <= envelope.max().y + step_y {
        let mut x = envelope.min().x - step_x;
        while x <= envelope.max().x + step_x {
            let candidate_x = x;
            x += step_x;

            let code = cell::encode(y, candidate_x, precision)?;
            if !seen.insert(code.clone()) {
                continue;
            }

            let rect = cell::bounding_box(&code)?;
            // Hull is a superset of the geometry: fast reject.
            if !hull.admits(&rect) {
                continue;
            }

            let rect_poly = rect.to_polygon();
            let matrix = prepared.relate(&rect_poly);
            if matrix.is_covers() {
                tiles.push(Tile {
                    code,
                    coverage: Coverage::Full,
                    refined: Vec::new(),
                });
            } else if matrix.is_intersects() {
                let refined = if config.refine_partial {
                    refine_subcells(&prepared, &code)?
                } else {
                    Vec::new()
                };
                tiles.push(Tile {
                    code,
                    coverage: Coverage::Partial,
                    refined,
                });
            }
        }
        y += step_y;
    }

    tracing::trace!(
        precision = precision,
        tiles = tiles.len(),
        "computed geohash covering"
    );

    Ok(tiles)
}

/// Sub-cells of a partial cell fully covered by the geometry.
fn refine_subcells<'a>(
    prepared: &PreparedGeometry<'a, &'a Geometry<f64>>,
    code: &str,
) -> Result<Vec<String>> {
    let mut refined = Vec::new();
    for child in cell::subcells(code) {
        let rect = cell::bounding_box(&child)?;
        if prepared.relate(&rect.to_polygon()).is_covers() {
            refined.push(child);
        }
    }
    Ok(refined)
}

/// Choose the coarsest precision whose cell is strictly smaller than the
/// geometry envelope's width or height.
///
/// A monotonic linear scan from coarse to fine, stopping at the first
/// match; the precision range is a handful of values, so no search
/// structure is warranted. When no scanned level satisfies the test the
/// finest level is used as the fallback.
pub fn select_precision(envelope: &Rect<f64>, config: &TilingConfig) -> Result<usize> {
    for precision in config.coarsest..config.finest {
        let code = cell::encode(envelope.min().y, envelope.min().x, precision)?;
        let cell_box = cell::bounding_box(&code)?;
        if cell_box.width() < envelope.width() || cell_box.height() < envelope.height() {
            return Ok(precision);
        }
    }
    tracing::trace!(
        finest = config.finest,
        "no scanned precision subdivides the envelope, using finest"
    );
    Ok(config.finest)
}

fn validate_config(config: &TilingConfig) -> Result<()> {
    if config.coarsest == 0 || config.finest < config.coarsest || config.finest > 12 {
        return Err(ModelError::Config(format!(
            "precision range {}..{} out of bounds",
            config.coarsest, config.finest
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::parse_wkt;

    const SQUARE_1DEG: &str = "POLYGON((10 59, 11 59, 11 60, 10 60, 10 59))";

    fn covers(geom: &Geometry<f64>, code: &str) -> bool {
        let rect = cell::bounding_box(code).unwrap();
        geom.relate(&rect.to_polygon()).is_covers()
    }

    #[test]
    fn test_precision_selection_one_degree() {
        let geom = parse_wkt(SQUARE_1DEG).unwrap();
        let envelope = geometry::envelope(&geom).unwrap();
        let p = select_precision(&envelope, &TilingConfig::default()).unwrap();
        // Precision 3 cells are ~1.4 degrees, precision 4 are ~0.35x0.18.
        assert_eq!(p, 4);
    }

    #[test]
    fn test_precision_fallback_for_point() {
        let geom = parse_wkt("POINT(10.5 59.5)").unwrap();
        let envelope = geometry::envelope(&geom).unwrap();
        let config = TilingConfig::default();
        let p = select_precision(&envelope, &config).unwrap();
        assert_eq!(p, config.finest);
    }

    #[test]
    fn test_square_has_full_interior_and_partial_boundary() {
        let geom = parse_wkt(SQUARE_1DEG).unwrap();
        let tiles = tile(SQUARE_1DEG, &TilingConfig::default()).unwrap();

        let full: Vec<_> = tiles
            .iter()
            .filter(|t| t.coverage == Coverage::Full)
            .collect();
        let partial: Vec<_> = tiles
            .iter()
            .filter(|t| t.coverage == Coverage::Partial)
            .collect();
        assert!(!full.is_empty());
        assert!(!partial.is_empty());

        // Full cells must actually be covered by the geometry.
        for t in &full {
            assert!(covers(&geom, &t.code), "cell {} not covered", t.code);
        }
        // Partial cells must intersect but not be covered.
        for t in &partial {
            let rect = cell::bounding_box(&t.code).unwrap();
            assert!(geom.intersects(&rect.to_polygon()));
            assert!(!covers(&geom, &t.code));
        }
    }

    #[test]
    fn test_no_emitted_cell_is_disjoint() {
        let geom = parse_wkt(SQUARE_1DEG).unwrap();
        for t in tile(SQUARE_1DEG, &TilingConfig::default()).unwrap() {
            let rect = cell::bounding_box(&t.code).unwrap();
            assert!(geom.intersects(&rect.to_polygon()));
        }
    }

    #[test]
    fn test_soundness_sample_points_covered() {
        let tiles = tile(SQUARE_1DEG, &TilingConfig::default()).unwrap();
        let rects: Vec<Rect<f64>> = tiles
            .iter()
            .map(|t| cell::bounding_box(&t.code).unwrap())
            .collect();

        // Sample a grid of interior points; each must land in some cell.
        for i in 1..10 {
            for j in 1..10 {
                let x = 10.0 + i as f64 / 10.0;
                let y = 59.0 + j as f64 / 10.0;
                assert!(
                    rects
                        .iter()
                        .any(|r| x >= r.min().x && x <= r.max().x && y >= r.min().y && y <= r.max().y),
                    "point ({x}, {y}) not covered"
                );
            }
        }
    }

    #[test]
    fn test_refinement_subcells_are_covered() {
        let geom = parse_wkt(SQUARE_1DEG).unwrap();
        let tiles = tile(SQUARE_1DEG, &TilingConfig::default()).unwrap();

        let mut refined_total = 0;
        for t in &tiles {
            if t.coverage == Coverage::Full {
                assert!(t.refined.is_empty());
            }
            for child in &t.refined {
                assert_eq!(child.len(), t.code.len() + 1);
                assert!(child.starts_with(&t.code));
                assert!(covers(&geom, child), "sub-cell {} not covered", child);
                refined_total += 1;
            }
        }
        // Boundary cells of an axis-aligned square always contain some
        // fully interior sub-cells.
        assert!(refined_total > 0);
    }

    #[test]
    fn test_point_yields_finest_cell() {
        let tiles = tile("POINT(10.5 59.5)", &TilingConfig::default()).unwrap();
        assert!(!tiles.is_empty());
        for t in &tiles {
            assert_eq!(t.code.len(), TilingConfig::default().finest);
            assert_eq!(t.coverage, Coverage::Partial);
        }
    }

    #[test]
    fn test_empty_geometry_rejected() {
        let err = tile("POLYGON EMPTY", &TilingConfig::default()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidGeometry(_)));
    }

    #[test]
    fn test_bad_config_rejected() {
        let config = TilingConfig::default().with_precision_range(5, 3);
        let err = tile(SQUARE_1DEG, &config).unwrap_err();
        assert!(matches!(err, ModelError::Config(_)));
    }

    #[test]
    fn test_refinement_disabled() {
        let config = TilingConfig::default().with_refinement(false);
        for t in tile(SQUARE_1DEG, &config).unwrap() {
            assert!(t.refined.is_empty());
        }
    }
}

//! Grid cell (geohash) codec.
//!
//! Thin wrapper over the geohash collaborator: encode a (lat, lon,
//! precision) triple to a cell code, decode a code back to its bounding
//! rectangle, and enumerate the sub-cells one precision level finer.
//!
//! Cell codes are ephemeral query results, never stored entities.
//! Decoding is injective and deterministic; precision = code length.

use crate::error::{ModelError, Result};
use geo_types::{Coord, Rect};

/// Geohash base32 alphabet. Appending one character yields the 32
/// sub-cells at the next precision level.
pub const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Encode a latitude/longitude to a cell code at the given precision.
pub fn encode(lat: f64, lon: f64, precision: usize) -> Result<String> {
    geohash::encode(Coord { x: lon, y: lat }, precision)
        .map_err(|e| ModelError::Cell(e.to_string()))
}

/// Bounding rectangle of a cell code (x = longitude, y = latitude).
pub fn bounding_box(code: &str) -> Result<Rect<f64>> {
    geohash::decode_bbox(code).map_err(|e| ModelError::Cell(e.to_string()))
}

/// Center point of a cell code as (lat, lon).
pub fn center(code: &str) -> Result<(f64, f64)> {
    let (coord, _, _) = geohash::decode(code).map_err(|e| ModelError::Cell(e.to_string()))?;
    Ok((coord.y, coord.x))
}

/// The 32 sub-cell codes one precision level finer.
pub fn subcells(code: &str) -> Vec<String> {
    BASE32
        .iter()
        .map(|c| {
            let mut child = String::with_capacity(code.len() + 1);
            child.push_str(code);
            child.push(*c as char);
            child
        })
        .collect()
}

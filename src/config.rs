//! Configuration types for tiling and assembly.

use serde::{Deserialize, Serialize};

/// Configuration for adaptive geohash covering generation.
///
/// Controls the precision range the tiling engine scans when choosing
/// a cell size for a geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TilingConfig {
    /// Coarsest geohash precision considered (1 = ~5000km cells).
    /// Default: 1
    pub coarsest: usize,

    /// Finest geohash precision considered. The precision scan runs over
    /// `coarsest..finest`; if no level produces a cell smaller than the
    /// geometry's own extent, `finest` is used as the fallback.
    /// Default: 8 (~38m x 19m cells)
    pub finest: usize,

    /// Whether partially covered cells are refined one level finer,
    /// recording fully covered sub-cells.
    /// Default: true
    pub refine_partial: bool,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            coarsest: 1,
            finest: 8,
            refine_partial: true,
        }
    }
}

impl TilingConfig {
    /// Set the precision scan range.
    pub fn with_precision_range(mut self, coarsest: usize, finest: usize) -> Self {
        self.coarsest = coarsest;
        self.finest = finest;
        self
    }

    /// Enable or disable sub-cell refinement of partial cells.
    pub fn with_refinement(mut self, refine: bool) -> Self {
        self.refine_partial = refine;
        self
    }
}

/// Configuration for resource-tree assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembleConfig {
    /// Maximum resource nesting depth walked before input is rejected.
    /// The resource model does not guarantee cycle-freedom; the walk is
    /// bounded instead of cycle-checked.
    /// Default: 8
    pub max_depth: usize,

    /// Tiling configuration used for derived `@geohash` index cells.
    pub tiling: TilingConfig,
}

impl Default for AssembleConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            tiling: TilingConfig::default(),
        }
    }
}

impl AssembleConfig {
    /// Set the maximum nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the tiling configuration for derived index cells.
    pub fn with_tiling(mut self, tiling: TilingConfig) -> Self {
        self.tiling = tiling;
        self
    }
}

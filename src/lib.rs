//! Property reconciliation and adaptive geohash tiling for hierarchical
//! resource records.
//!
//! Resource records carry polymorphic, tag-annotated property values
//! (plain text, geometry-as-text, temporal intervals) contributed by
//! multiple sources. This crate reconciles duplicate property entries
//! into a single canonical view per property name, and computes minimal
//! adaptive geohash coverings for geometry-valued properties.
//!
//! # Architecture
//!
//! ```text
//! raw observations (Vec<Property>)
//!            │
//!            ▼
//!   group by name ──► MergePolicy (from merged tag set)
//!            │
//!     ┌──────┼──────────────┐
//!     ▼      ▼              ▼
//!  history  geometry union  plain union
//!  (runs)   (parse/heal/∪)  (flatten + dedup)
//!     │      │              │
//!     └──────┴──────┬───────┘
//!                   ▼
//!        merged Vec<Property> + per-group failures
//!                   │
//!                   ▼ (assembler, @geohash-tagged values)
//!            Spatial Tiling Engine
//!        (precision scan → raster covering
//!         → Full/Partial + sub-cell refinement)
//! ```
//!
//! Both engines are pure, synchronous transformations over immutable
//! inputs: no shared state, no I/O. Reconciliation parallelizes across
//! property groups; failures stay isolated per group.
//!
//! # Modules
//!
//! - [`model`]: Property/Resource records and tag constants
//! - [`reconcile`]: Property Reconciliation Engine
//! - [`history`]: `@history` timeline policy
//! - [`tiling`]: Spatial Tiling Engine
//! - [`cell`]: grid cell (geohash) codec
//! - [`geometry`]: WKT parsing, healing, hulls, unions
//! - [`assemble`]: depth-limited resource-tree assembly
//! - [`config`]: tiling and assembly configuration
//! - [`error`]: error types

pub mod assemble;
pub mod cell;
pub mod config;
pub mod error;
pub mod geometry;
pub(crate) mod history;
pub mod model;
pub mod reconcile;
pub mod tiling;

// Re-export key types
pub use assemble::{assemble, Assembled};
pub use config::{AssembleConfig, TilingConfig};
pub use error::{ModelError, Result};
pub use model::{Property, Resource};
pub use reconcile::{reconcile, GroupFailure, MergePolicy, ReconcileOutcome};
pub use tiling::{tile, Coverage, Tile};

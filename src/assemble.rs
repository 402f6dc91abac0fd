//! Resource assembly.
//!
//! Walks a resource tree depth-first, reconciling each resource's
//! property set and recursing into nested child resources. System
//! properties (`@`-prefixed names) pass through untouched. Properties
//! tagged `@geohash` get their grid index cells computed by the tiling
//! engine and attached as a derived `@geohash` system property.
//!
//! The resource model does not guarantee cycle-freedom, so the walk is
//! bounded by `AssembleConfig::max_depth` and rejects deeper input
//! instead of following it.

use crate::config::AssembleConfig;
use crate::error::{ModelError, Result};
use crate::model::{dedup_first_seen, Property, Resource, TAG_GEOHASH};
use crate::reconcile::{reconcile, GroupFailure};
use crate::tiling;

/// An assembled resource plus the per-group failures encountered while
/// reconciling it and its descendants.
#[derive(Debug)]
pub struct Assembled {
    /// The reconciled resource tree.
    pub resource: Resource,
    /// Failures collected across the whole walk; never aborts siblings.
    pub failures: Vec<GroupFailure>,
}

/// Reconcile a resource tree into its canonical view.
pub fn assemble(resource: Resource, config: &AssembleConfig) -> Result<Assembled> {
    let mut failures = Vec::new();
    let resource = assemble_at(resource, config, 0, &mut failures)?;
    Ok(Assembled { resource, failures })
}

fn assemble_at(
    mut resource: Resource,
    config: &AssembleConfig,
    depth: usize,
    failures: &mut Vec<GroupFailure>,
) -> Result<Resource> {
    if depth > config.max_depth {
        return Err(ModelError::DepthExceeded {
            max: config.max_depth,
        });
    }

    let (system, user): (Vec<Property>, Vec<Property>) = resource
        .properties
        .into_iter()
        .partition(|p| p.is_system());

    let outcome = reconcile(user);
    failures.extend(outcome.failures);
    let mut properties = outcome.properties;

    if let Some(index) = derive_index_cells(&properties, config, failures) {
        properties.push(index);
    }

    for property in &mut properties {
        let children = std::mem::take(&mut property.resources);
        let mut assembled = Vec::with_capacity(children.len());
        for child in children {
            assembled.push(assemble_at(child, config, depth + 1, failures)?);
        }
        property.resources = assembled;
    }

    resource.properties = system.into_iter().chain(properties).collect();
    Ok(resource)
}

/// Compute the derived `@geohash` property for geometry-bearing
/// properties that request index cells.
///
/// Tiling failures are collected per property, not propagated: a
/// geometry that cannot be tiled leaves the rest of the resource intact.
fn derive_index_cells(
    properties: &[Property],
    config: &AssembleConfig,
    failures: &mut Vec<GroupFailure>,
) -> Option<Property> {
    let mut cells: Vec<String> = Vec::new();
    for property in properties.iter().filter(|p| p.has_tag(TAG_GEOHASH)) {
        for value in &property.values {
            match tiling::tile(value, &config.tiling) {
                Ok(tiles) => cells.extend(tiles.into_iter().map(|t| t.code)),
                Err(error) => {
                    tracing::debug!(
                        property = %property.name,
                        error = %error,
                        "failed to derive index cells"
                    );
                    failures.push(GroupFailure {
                        name: property.name.clone(),
                        error,
                    });
                }
            }
        }
    }

    if cells.is_empty() {
        None
    } else {
        Some(
            Property::new(TAG_GEOHASH)
                .with_values(dedup_first_seen(cells))
                .with_tags([TAG_GEOHASH]),
        )
    }
}

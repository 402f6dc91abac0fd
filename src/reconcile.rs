//! Property reconciliation.
//!
//! Merges multiple raw property observations sharing the same name into
//! one canonical view per property name. The group's merged tag set
//! selects exactly one policy:
//!
//! 1. **History** (`@history`): timeline of state values collapsed into
//!    adjacency runs (see [`crate::history`]).
//! 2. **Geometry union** (`@wkt`): values parsed as WKT, invalid
//!    geometries healed (flagged `@invalid`), optionally collapsed to a
//!    single n-ary union under `@union`.
//! 3. **Plain union** (default): values, tags, and child resources
//!    flattened and deduplicated with first-seen order.
//!
//! Failures are isolated per group: a malformed geometry in one group
//! never aborts reconciliation of sibling groups. Callers get best-effort
//! output plus an enumerable list of failures.

use crate::error::{ModelError, Result};
use crate::geometry;
use crate::history;
use crate::model::{
    dedup_first_seen, Property, TAG_FIRST, TAG_HISTORY, TAG_INVALID, TAG_LAST, TAG_UNION, TAG_WKT,
};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Merge policy for one reconciliation group, computed once from the
/// group's merged tag set and dispatched as a closed set of strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Timeline reconciliation of time-bounded states.
    History,
    /// Values are geometry text; `union` collapses them to one value.
    GeometryUnion { union: bool },
    /// Flatten and deduplicate.
    PlainUnion,
}

impl MergePolicy {
    /// Select the policy for a group's merged tag set.
    ///
    /// Precedence: history, then geometry, then plain union.
    pub fn select(tags: &[String]) -> Self {
        let has = |t: &str| tags.iter().any(|tag| tag == t);
        if has(TAG_HISTORY) {
            MergePolicy::History
        } else if has(TAG_WKT) {
            MergePolicy::GeometryUnion {
                union: has(TAG_UNION),
            }
        } else {
            MergePolicy::PlainUnion
        }
    }
}

/// A reconciliation failure scoped to one property group.
#[derive(Debug)]
pub struct GroupFailure {
    /// Property name of the failed group.
    pub name: String,
    /// The error that stopped the group's merge.
    pub error: ModelError,
}

/// Best-effort reconciliation result: merged properties for the groups
/// that succeeded plus one failure record per group that did not.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Merged properties, in first-seen group order.
    pub properties: Vec<Property>,
    /// Per-group failures.
    pub failures: Vec<GroupFailure>,
}

impl ReconcileOutcome {
    /// Whether every group merged cleanly.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Reconcile a batch of property observations.
///
/// Observations are grouped by name (first-seen group order preserved)
/// and each group is merged independently, in parallel across groups.
pub fn reconcile(observations: Vec<Property>) -> ReconcileOutcome {
    let groups = group_by_name(observations);

    let merged: Vec<(String, Result<Vec<Property>>)> = groups
        .into_par_iter()
        .map(|(name, group)| {
            let result = merge_group(&name, group);
            (name, result)
        })
        .collect();

    let mut outcome = ReconcileOutcome::default();
    for (name, result) in merged {
        match result {
            Ok(properties) => outcome.properties.extend(properties),
            Err(error) => {
                tracing::debug!(group = %name, error = %error, "property group failed to merge");
                outcome.failures.push(GroupFailure { name, error });
            }
        }
    }
    outcome
}

/// Merge a single named group of observations.
pub fn merge_group(name: &str, observations: Vec<Property>) -> Result<Vec<Property>> {
    let tags = group_tags(&observations);
    match MergePolicy::select(&tags) {
        MergePolicy::History => Ok(history::merge_timeline(name, observations, tags)),
        MergePolicy::GeometryUnion { union } => merge_geometry(name, observations, tags, union),
        MergePolicy::PlainUnion => Ok(vec![merge_plain(name, observations, tags)]),
    }
}

/// Group observations by name, preserving first-seen group order.
fn group_by_name(observations: Vec<Property>) -> Vec<(String, Vec<Property>)> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: FxHashMap<String, Vec<Property>> = FxHashMap::default();
    for obs in observations {
        match groups.get_mut(&obs.name) {
            Some(group) => group.push(obs),
            None => {
                order.push(obs.name.clone());
                groups.insert(obs.name.clone(), vec![obs]);
            }
        }
    }
    order
        .into_iter()
        .filter_map(|name| groups.remove(&name).map(|group| (name, group)))
        .collect()
}

/// Merged tag set of a group: union over observations, minus the
/// engine-private `@first`/`@last` markers.
fn group_tags(observations: &[Property]) -> Vec<String> {
    dedup_first_seen(
        observations
            .iter()
            .flat_map(|p| p.tags.iter())
            .filter(|t| t.as_str() != TAG_FIRST && t.as_str() != TAG_LAST)
            .cloned(),
    )
}

/// Plain-union policy: flatten values, tags, resources, and sources.
fn merge_plain(name: &str, observations: Vec<Property>, tags: Vec<String>) -> Property {
    let mut merged = Property::new(name);
    merged.values = dedup_first_seen(observations.iter().flat_map(|p| p.values.iter()).cloned());
    merged.resources =
        dedup_first_seen(observations.iter().flat_map(|p| p.resources.iter()).cloned());
    merged.sources = dedup_first_seen(observations.iter().flat_map(|p| p.sources.iter()).cloned());
    merged.tags = tags;
    merged
}

/// Geometry-union policy.
///
/// Every value must parse as WKT; a syntactic failure is fatal for the
/// group. Invalid geometries are healed silently but flagged with
/// `@invalid` on the merged property.
fn merge_geometry(
    name: &str,
    observations: Vec<Property>,
    tags: Vec<String>,
    union: bool,
) -> Result<Vec<Property>> {
    let mut geometries = Vec::new();
    let mut healed_any = false;

    for value in observations.iter().flat_map(|p| p.values.iter()) {
        let geom = geometry::parse_wkt(value)?;
        if geometry::is_valid(&geom) {
            geometries.push(geom);
        } else {
            tracing::debug!(group = %name, "healed invalid geometry");
            healed_any = true;
            geometries.push(geometry::heal(&geom));
        }
    }

    let mut merged = merge_plain(name, observations, tags);
    if union {
        merged.values = geometry::union_all(&geometries)
            .map(|g| vec![geometry::to_wkt(&g)])
            .unwrap_or_default();
    } else {
        merged.values = dedup_first_seen(geometries.iter().map(geometry::to_wkt));
    }
    if healed_any && !merged.has_tag(TAG_INVALID) {
        merged.tags.push(TAG_INVALID.to_string());
    }

    Ok(vec![merged])
}

//! Resource and property records.
//!
//! Properties are named, tagged, multi-valued attributes. Tags drive the
//! merge policy applied during reconciliation; values are raw text and may
//! encode geometry (under `@wkt`) or time-bounded states (under `@history`).
//!
//! Records are immutable inputs: the engines never mutate what they are
//! given and always construct fresh outputs.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Merge sibling values into one property.
pub const TAG_UNION: &str = "@union";
/// Values are well-known-text geometry.
pub const TAG_WKT: &str = "@wkt";
/// Observations represent time-bounded states.
pub const TAG_HISTORY: &str = "@history";
/// Engine-assigned: at least one geometry in the group was healed.
pub const TAG_INVALID: &str = "@invalid";
/// Engine-assigned: first run of a history timeline.
pub const TAG_FIRST: &str = "@first";
/// Engine-assigned: last run of a history timeline.
pub const TAG_LAST: &str = "@last";
/// Property wants derived grid index cells attached at assembly.
pub const TAG_GEOHASH: &str = "@geohash";

/// Reserved sigil marking system/control properties (e.g. `@resourceId`).
pub const SYSTEM_SIGIL: char = '@';

/// A single property observation (or merged property).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Property {
    /// Name, unique within a reconciliation group.
    pub name: String,

    /// Raw textual values, ordered.
    #[serde(default)]
    pub values: Vec<String>,

    /// Merge/interpretation tags, first-seen order.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Nested child resources referenced by this property.
    #[serde(default)]
    pub resources: Vec<Resource>,

    /// Interval start; only meaningful under `@history`. `None` = open-started.
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,

    /// Interval end; only meaningful under `@history`. `None` = open-ended.
    #[serde(default)]
    pub thru: Option<DateTime<Utc>>,

    /// Provenance markers for the contributing source(s).
    #[serde(default)]
    pub sources: Vec<String>,
}

impl Property {
    /// Create an empty property with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            tags: Vec::new(),
            resources: Vec::new(),
            from: None,
            thru: None,
            sources: Vec::new(),
        }
    }

    /// Set values.
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Set tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set child resources.
    pub fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = resources;
        self
    }

    /// Set the temporal interval.
    pub fn with_interval(mut self, from: Option<DateTime<Utc>>, thru: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.thru = thru;
        self
    }

    /// Set provenance sources.
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Check whether this property carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether this is a system/control property (`@`-prefixed name).
    pub fn is_system(&self) -> bool {
        self.name.starts_with(SYSTEM_SIGIL)
    }
}

/// An entity with descriptive fields and a property set.
///
/// Resources reference other resources through `Property::resources`,
/// forming a tree. Cycle-freedom is not guaranteed by the model; the
/// assembler bounds recursion depth instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    /// Namespace/context the resource belongs to.
    pub context: String,

    /// Identifier, unique within the context.
    pub resource_id: String,

    #[serde(default)]
    pub types: Vec<String>,

    #[serde(default)]
    pub titles: Vec<String>,

    #[serde(default)]
    pub codes: Vec<String>,

    #[serde(default)]
    pub status: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Resource {
    /// Create an empty resource.
    pub fn new(context: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            resource_id: resource_id.into(),
            types: Vec::new(),
            titles: Vec::new(),
            codes: Vec::new(),
            status: Vec::new(),
            tags: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Set properties.
    pub fn with_properties(mut self, properties: Vec<Property>) -> Self {
        self.properties = properties;
        self
    }
}

/// Flatten items across observations, keeping the first occurrence of each.
///
/// Set semantics with first-seen order, so merged output is deterministic
/// and testable under input permutation.
pub(crate) fn dedup_first_seen<T, I>(items: I) -> Vec<T>
where
    T: std::hash::Hash + Eq + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen: FxHashSet<T> = FxHashSet::default();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

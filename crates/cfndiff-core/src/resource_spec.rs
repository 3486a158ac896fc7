//! Resource replacement metadata.
//!
//! Whether changing a property replaces the resource is a fact about the
//! resource *type*, published by the provider in the CloudFormation Resource
//! Specification. This module defines the [`ResourceSpecLookup`] trait that the
//! resource comparator receives as an injected dependency, plus
//! [`ResourceSpecification`], a concrete table that can be loaded from that
//! published JSON document.
//!
//! `cfndiff-core` performs no I/O: callers read the specification file
//! themselves and pass its text to [`ResourceSpecification::from_json`].
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Embedded table of well-known replacement properties for common types.
const BUILTIN_SPEC_JSON: &str = include_str!("../data/resource-spec.json");

static BUILTIN_SPEC: LazyLock<ResourceSpecification> =
    LazyLock::new(|| match ResourceSpecification::from_json(BUILTIN_SPEC_JSON) {
        Ok(spec) => spec,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "built-in resource specification failed to parse; treating all properties as mutable"
            );
            ResourceSpecification::new()
        }
    });

// ---------------------------------------------------------------------------
// UpdateType
// ---------------------------------------------------------------------------

/// How CloudFormation applies a change to a property.
///
/// Variant names match the `UpdateType` values of the CloudFormation
/// Resource Specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UpdateType {
    /// Updated in place; no replacement.
    #[default]
    Mutable,
    /// Any change replaces the resource.
    Immutable,
    /// Whether a change replaces the resource depends on the values involved.
    Conditional,
}

// ---------------------------------------------------------------------------
// ResourceSpecLookup
// ---------------------------------------------------------------------------

/// An injected source of replacement metadata.
///
/// The trait is object-safe: [`crate::diff::DiffConfig`] stores it as
/// `&dyn ResourceSpecLookup`. Implementations must answer
/// [`UpdateType::Mutable`] for resource types or properties they know
/// nothing about.
///
/// Any `Fn(&str, &str) -> UpdateType` closure implements the trait, which is
/// convenient for tests.
pub trait ResourceSpecLookup {
    /// Returns the update behaviour of `property` on `resource_type`.
    fn update_type(&self, resource_type: &str, property: &str) -> UpdateType;
}

impl<F> ResourceSpecLookup for F
where
    F: Fn(&str, &str) -> UpdateType,
{
    fn update_type(&self, resource_type: &str, property: &str) -> UpdateType {
        self(resource_type, property)
    }
}

// ---------------------------------------------------------------------------
// ResourceSpecError
// ---------------------------------------------------------------------------

/// Error returned when a resource specification document cannot be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSpecError {
    /// The document is not valid JSON or does not have the expected shape.
    Parse(String),
}

impl fmt::Display for ResourceSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "invalid resource specification: {msg}"),
        }
    }
}

impl std::error::Error for ResourceSpecError {}

// ---------------------------------------------------------------------------
// ResourceSpecification
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawSpecification {
    #[serde(rename = "ResourceTypes", default)]
    resource_types: HashMap<String, RawResourceType>,
}

#[derive(Deserialize)]
struct RawResourceType {
    #[serde(rename = "Properties", default)]
    properties: HashMap<String, RawProperty>,
}

#[derive(Deserialize)]
struct RawProperty {
    #[serde(rename = "UpdateType", default)]
    update_type: UpdateType,
}

/// A static table of property update types, keyed by resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSpecification {
    types: HashMap<String, HashMap<String, UpdateType>>,
}

impl ResourceSpecification {
    /// Creates an empty table: every property is [`UpdateType::Mutable`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table embedded in the crate.
    ///
    /// It covers a small set of common resource types; supply the full
    /// published specification through [`from_json`](Self::from_json) for
    /// complete coverage.
    pub fn builtin() -> &'static Self {
        &BUILTIN_SPEC
    }

    /// Reads the CloudFormation Resource Specification JSON format.
    ///
    /// Only `ResourceTypes.<type>.Properties.<name>.UpdateType` is read; all
    /// other keys are ignored.
    pub fn from_json(input: &str) -> Result<Self, ResourceSpecError> {
        let raw: RawSpecification =
            serde_json::from_str(input).map_err(|e| ResourceSpecError::Parse(e.to_string()))?;
        let types = raw
            .resource_types
            .into_iter()
            .map(|(type_name, rt)| {
                let props = rt
                    .properties
                    .into_iter()
                    .map(|(name, p)| (name, p.update_type))
                    .collect();
                (type_name, props)
            })
            .collect();
        Ok(Self { types })
    }

    /// Records the update type of a property, returning `self` for chaining.
    pub fn with_property(
        mut self,
        resource_type: impl Into<String>,
        property: impl Into<String>,
        update_type: UpdateType,
    ) -> Self {
        self.types
            .entry(resource_type.into())
            .or_default()
            .insert(property.into(), update_type);
        self
    }

    /// Number of resource types in the table.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if the table has an entry for `resource_type`.
    pub fn knows_type(&self, resource_type: &str) -> bool {
        self.types.contains_key(resource_type)
    }
}

impl ResourceSpecLookup for ResourceSpecification {
    fn update_type(&self, resource_type: &str, property: &str) -> UpdateType {
        self.types
            .get(resource_type)
            .and_then(|props| props.get(property))
            .copied()
            .unwrap_or_default()
    }
}

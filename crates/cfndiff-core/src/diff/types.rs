use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::template::Resource;
use crate::value::deep_equal;

// ---------------------------------------------------------------------------
// Change classification shared by every difference record
// ---------------------------------------------------------------------------

/// Whether an entity was added, removed, or changed in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Present only in the new template.
    Addition,
    /// Present in both templates with different content.
    Update,
    /// Present only in the old template.
    Removal,
}

/// Common view over [`Difference`] and [`ResourceDifference`].
pub trait Change {
    /// Classifies this record.
    fn kind(&self) -> ChangeKind;

    /// Returns `true` if the record represents an actual change.
    fn is_different(&self) -> bool;

    /// Returns `true` for additions.
    fn is_addition(&self) -> bool {
        self.kind() == ChangeKind::Addition
    }

    /// Returns `true` for removals.
    fn is_removal(&self) -> bool {
        self.kind() == ChangeKind::Removal
    }

    /// Returns `true` for in-place updates.
    fn is_update(&self) -> bool {
        self.kind() == ChangeKind::Update
    }
}

// ---------------------------------------------------------------------------
// Difference<T>
// ---------------------------------------------------------------------------

/// A change to one entity or value: `old_value` from the old template,
/// `new_value` from the new one.
///
/// Exactly one side absent means addition or removal. Both present means an
/// update; the engine never builds a `Difference` for two equal values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Difference<T> {
    /// Value in the old template, or `None` if absent there.
    pub old_value: Option<T>,
    /// Value in the new template, or `None` if absent there.
    pub new_value: Option<T>,
}

impl<T> Difference<T> {
    /// Creates a difference from both sides.
    pub fn new(old_value: Option<T>, new_value: Option<T>) -> Self {
        Self {
            old_value,
            new_value,
        }
    }

    /// An entity present only in the new template.
    pub fn addition(new_value: T) -> Self {
        Self::new(None, Some(new_value))
    }

    /// An entity present only in the old template.
    pub fn removal(old_value: T) -> Self {
        Self::new(Some(old_value), None)
    }
}

impl Difference<Value> {
    /// Builds a difference between two optional JSON values, or `None` when
    /// they are structurally equal.
    ///
    /// An explicit `null` on either side is treated as absent.
    pub fn between(old_value: Option<&Value>, new_value: Option<&Value>) -> Option<Self> {
        if deep_equal(old_value, new_value) {
            return None;
        }
        let present = |v: Option<&Value>| v.filter(|v| !v.is_null()).cloned();
        Some(Self::new(present(old_value), present(new_value)))
    }
}

impl<T> Change for Difference<T> {
    fn kind(&self) -> ChangeKind {
        match (&self.old_value, &self.new_value) {
            (None, Some(_)) => ChangeKind::Addition,
            (Some(_), None) => ChangeKind::Removal,
            (Some(_), Some(_)) | (None, None) => ChangeKind::Update,
        }
    }

    fn is_different(&self) -> bool {
        self.old_value.is_some() || self.new_value.is_some()
    }
}

// ---------------------------------------------------------------------------
// ResourceImpact
// ---------------------------------------------------------------------------

/// What kind of deployment operation a change triggers.
///
/// Variants are declared in increasing order of severity, so the derived
/// [`Ord`] is the tie-break order: the impact of a resource is the maximum
/// over every signal that contributes to it (see [`ResourceImpact::worst`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceImpact {
    /// Nothing changes.
    #[default]
    NoChange,
    /// The resource is mutated in place.
    WillUpdate,
    /// A new resource is created.
    WillCreate,
    /// The resource may be replaced; it depends on values not known until
    /// deployment.
    MayReplace,
    /// The resource is replaced: its physical identity changes.
    WillReplace,
    /// The resource is deleted.
    WillDestroy,
}

impl ResourceImpact {
    /// Returns the more severe of two impacts.
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }

    /// Returns `true` for [`MayReplace`](Self::MayReplace) and
    /// [`WillReplace`](Self::WillReplace).
    pub fn is_replacement(self) -> bool {
        matches!(self, Self::MayReplace | Self::WillReplace)
    }

    /// Stable upper-case name, e.g. `WILL_REPLACE`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoChange => "NO_CHANGE",
            Self::WillUpdate => "WILL_UPDATE",
            Self::WillCreate => "WILL_CREATE",
            Self::MayReplace => "MAY_REPLACE",
            Self::WillReplace => "WILL_REPLACE",
            Self::WillDestroy => "WILL_DESTROY",
        }
    }
}

impl std::fmt::Display for ResourceImpact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PropertyDifference
// ---------------------------------------------------------------------------

/// A change to one resource property, with its own impact verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDifference {
    /// Property value in the old template.
    pub old_value: Option<Value>,
    /// Property value in the new template.
    pub new_value: Option<Value>,
    /// Impact of this property change taken alone.
    pub change_impact: ResourceImpact,
}

impl PropertyDifference {
    /// Drops the impact, leaving a plain [`Difference`].
    pub fn to_difference(&self) -> Difference<Value> {
        Difference::new(self.old_value.clone(), self.new_value.clone())
    }
}

impl Change for PropertyDifference {
    fn kind(&self) -> ChangeKind {
        self.to_difference().kind()
    }

    fn is_different(&self) -> bool {
        self.old_value.is_some() || self.new_value.is_some()
    }
}

// ---------------------------------------------------------------------------
// ResourceDifference
// ---------------------------------------------------------------------------

/// A change to one resource, with per-property detail and an overall impact.
///
/// Built by [`crate::diff::diff_resource`] or, for additions and removals, by
/// [`ResourceDifference::addition`] / [`ResourceDifference::removal`]. The
/// impact is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDifference {
    /// Resource declaration in the old template.
    pub old_value: Option<Resource>,
    /// Resource declaration in the new template.
    pub new_value: Option<Resource>,
    /// Changed properties, ordered by property name.
    pub property_updates: BTreeMap<String, PropertyDifference>,
    /// Changed non-property attributes (`Type`, `Condition`, `DependsOn`,
    /// `Metadata`, policies, ...), ordered by attribute name.
    pub other_changes: BTreeMap<String, Difference<Value>>,
    change_impact: ResourceImpact,
}

impl ResourceDifference {
    /// A resource present only in the new template: [`ResourceImpact::WillCreate`].
    pub fn addition(resource: Resource) -> Self {
        Self {
            old_value: None,
            new_value: Some(resource),
            property_updates: BTreeMap::new(),
            other_changes: BTreeMap::new(),
            change_impact: ResourceImpact::WillCreate,
        }
    }

    /// A resource present only in the old template: [`ResourceImpact::WillDestroy`].
    pub fn removal(resource: Resource) -> Self {
        Self {
            old_value: Some(resource),
            new_value: None,
            property_updates: BTreeMap::new(),
            other_changes: BTreeMap::new(),
            change_impact: ResourceImpact::WillDestroy,
        }
    }

    /// An update of a resource present in both templates.
    ///
    /// The impact is the worst of every property and attribute impact, or
    /// [`ResourceImpact::NoChange`] when both maps are empty.
    pub(crate) fn update(
        old: Resource,
        new: Resource,
        property_updates: BTreeMap<String, PropertyDifference>,
        other_changes: BTreeMap<String, (Difference<Value>, ResourceImpact)>,
    ) -> Self {
        let property_impact = property_updates
            .values()
            .map(|p| p.change_impact)
            .fold(ResourceImpact::NoChange, ResourceImpact::worst);
        let change_impact = other_changes
            .values()
            .map(|(_, impact)| *impact)
            .fold(property_impact, ResourceImpact::worst);
        Self {
            old_value: Some(old),
            new_value: Some(new),
            property_updates,
            other_changes: other_changes
                .into_iter()
                .map(|(key, (diff, _))| (key, diff))
                .collect(),
            change_impact,
        }
    }

    /// The overall impact of this change on the deployed resource.
    pub fn change_impact(&self) -> ResourceImpact {
        self.change_impact
    }

    /// Resource type in the old template.
    pub fn old_resource_type(&self) -> Option<&str> {
        self.old_value.as_ref().map(|r| r.resource_type.as_str())
    }

    /// Resource type in the new template.
    pub fn new_resource_type(&self) -> Option<&str> {
        self.new_value.as_ref().map(|r| r.resource_type.as_str())
    }

    /// The resource type, preferring the new template's.
    pub fn resource_type(&self) -> Option<&str> {
        self.new_resource_type().or_else(|| self.old_resource_type())
    }

    /// Returns `true` if both sides exist with different types.
    pub fn resource_type_changed(&self) -> bool {
        match (self.old_resource_type(), self.new_resource_type()) {
            (Some(old), Some(new)) => old != new,
            (Some(_), None) | (None, Some(_)) | (None, None) => false,
        }
    }

    /// Number of individual property and attribute changes.
    ///
    /// Additions and removals count as one.
    pub fn difference_count(&self) -> usize {
        match self.kind() {
            ChangeKind::Addition | ChangeKind::Removal => 1,
            ChangeKind::Update => self.property_updates.len() + self.other_changes.len(),
        }
    }
}

impl Change for ResourceDifference {
    fn kind(&self) -> ChangeKind {
        match (&self.old_value, &self.new_value) {
            (None, Some(_)) => ChangeKind::Addition,
            (Some(_), None) => ChangeKind::Removal,
            (Some(_), Some(_)) | (None, None) => ChangeKind::Update,
        }
    }

    fn is_different(&self) -> bool {
        self.change_impact != ResourceImpact::NoChange
    }
}

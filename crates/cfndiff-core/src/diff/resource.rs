use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};
use tracing::trace;

use super::engine::DiffConfig;
use super::types::{Difference, PropertyDifference, ResourceDifference, ResourceImpact};
use crate::resource_spec::UpdateType;
use crate::template::Resource;
use crate::value::DeferredScope;

/// Compares two declarations of the same logical resource.
///
/// # Classification
///
/// Each contributing signal gets an impact, and the resource takes the worst
/// of them (see [`ResourceImpact`] for the order):
///
/// | Signal | Impact |
/// |---|---|
/// | `Type` changed | `WillReplace` (properties still recorded, each as `WillReplace`) |
/// | property with `UpdateType::Immutable` | `WillReplace`, or `MayReplace` if either side is deferred |
/// | property with `UpdateType::Conditional` | `MayReplace` |
/// | any other property | `WillUpdate` |
/// | `Condition` changed | `MayReplace` |
/// | `DependsOn`, `Metadata`, policies, other attributes | `WillUpdate` |
///
/// `DependsOn` is compared as a set of logical IDs, so `"A"` and `["A"]` are
/// equivalent.
///
/// Deferred values are recognised without knowledge of the templates'
/// parameters: only pseudo parameters, imports, tokens and dynamic
/// references count. [`crate::diff::diff_template`] additionally treats
/// references to declared parameters as deferred.
pub fn diff_resource(
    old: &Resource,
    new: &Resource,
    config: &DiffConfig<'_>,
) -> ResourceDifference {
    diff_resource_in_scope("", old, new, config, &DeferredScope::empty())
}

pub(crate) fn diff_resource_in_scope(
    logical_id: &str,
    old: &Resource,
    new: &Resource,
    config: &DiffConfig<'_>,
    scope: &DeferredScope,
) -> ResourceDifference {
    let type_changed = old.resource_type != new.resource_type;

    let mut property_updates = BTreeMap::new();
    let names: BTreeSet<&String> = old.properties.keys().chain(new.properties.keys()).collect();
    for name in names {
        let old_value = old.properties.get(name);
        let new_value = new.properties.get(name);
        let Some(diff) = Difference::between(old_value, new_value) else {
            continue;
        };
        let change_impact = if type_changed {
            ResourceImpact::WillReplace
        } else {
            property_impact(&new.resource_type, name, old_value, new_value, config, scope)
        };
        property_updates.insert(
            name.clone(),
            PropertyDifference {
                old_value: diff.old_value,
                new_value: diff.new_value,
                change_impact,
            },
        );
    }

    let other_changes = diff_attributes(old, new);

    let diff = ResourceDifference::update(old.clone(), new.clone(), property_updates, other_changes);
    trace!(
        logical_id,
        resource_type = %new.resource_type,
        impact = %diff.change_impact(),
        "resource compared"
    );
    diff
}

fn property_impact(
    resource_type: &str,
    property: &str,
    old_value: Option<&Value>,
    new_value: Option<&Value>,
    config: &DiffConfig<'_>,
    scope: &DeferredScope,
) -> ResourceImpact {
    match config.resource_spec.update_type(resource_type, property) {
        UpdateType::Mutable => ResourceImpact::WillUpdate,
        UpdateType::Conditional => ResourceImpact::MayReplace,
        UpdateType::Immutable => {
            let deferred = scope.is_deferred_opt(old_value) || scope.is_deferred_opt(new_value);
            if config.treat_deferred_as_may_replace && deferred {
                ResourceImpact::MayReplace
            } else {
                ResourceImpact::WillReplace
            }
        }
    }
}

fn attribute_impact(key: &str) -> ResourceImpact {
    match key {
        "Type" => ResourceImpact::WillReplace,
        "Condition" => ResourceImpact::MayReplace,
        _ => ResourceImpact::WillUpdate,
    }
}

fn diff_attributes(
    old: &Resource,
    new: &Resource,
) -> BTreeMap<String, (Difference<Value>, ResourceImpact)> {
    let old_attrs = old.attributes();
    let new_attrs = new.attributes();
    let keys: BTreeSet<&String> = old_attrs.keys().chain(new_attrs.keys()).collect();

    let mut out = BTreeMap::new();
    for key in keys {
        if key == "DependsOn" && same_dependencies(old, new) {
            continue;
        }
        if let Some(diff) = attribute_difference(&old_attrs, &new_attrs, key) {
            out.insert(key.clone(), (diff, attribute_impact(key)));
        }
    }
    out
}

/// Set comparison of `DependsOn`. Any other shape falls back to structural
/// equality in [`attribute_difference`].
fn same_dependencies(old: &Resource, new: &Resource) -> bool {
    match (old.dependencies(), new.dependencies()) {
        (Some(a), Some(b)) => a == b,
        (None, Some(_)) | (Some(_), None) | (None, None) => false,
    }
}

fn attribute_difference(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    key: &str,
) -> Option<Difference<Value>> {
    Difference::between(old.get(key), new.get(key))
}

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use super::collection::DifferenceCollection;
use super::types::{Difference, ResourceDifference};
use crate::template::Resource;

/// A difference record that can describe an entity present on one side only.
pub trait EntityDiff: Sized {
    /// The entity exists only in the new template.
    fn addition(new_value: &Value) -> Self;

    /// The entity exists only in the old template.
    fn removal(old_value: &Value) -> Self;
}

impl EntityDiff for Difference<Value> {
    fn addition(new_value: &Value) -> Self {
        Difference::addition(new_value.clone())
    }

    fn removal(old_value: &Value) -> Self {
        Difference::removal(old_value.clone())
    }
}

impl EntityDiff for ResourceDifference {
    fn addition(new_value: &Value) -> Self {
        ResourceDifference::addition(Resource::from_value(new_value))
    }

    fn removal(old_value: &Value) -> Self {
        ResourceDifference::removal(Resource::from_value(old_value))
    }
}

/// Diffs two named collections of entities.
///
/// For every key in either map:
///
/// - only in `new`: an addition;
/// - only in `old`: a removal;
/// - in both: `compare(name, old, new)`, which returns `None` when the two
///   entities are equivalent.
///
/// An explicit `null` entry is treated as absent, so `{"A": null}` and `{}`
/// produce no record for `A`.
pub fn diff_keyed_entities<D, F>(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    mut compare: F,
) -> DifferenceCollection<D>
where
    D: EntityDiff,
    F: FnMut(&str, &Value, &Value) -> Option<D>,
{
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    let mut out = DifferenceCollection::new();
    for key in keys {
        let diff = match (present(old, key), present(new, key)) {
            (None, None) => None,
            (None, Some(n)) => Some(D::addition(n)),
            (Some(o), None) => Some(D::removal(o)),
            (Some(o), Some(n)) => compare(key, o, n),
        };
        if let Some(diff) = diff {
            out.insert(key.clone(), diff);
        }
    }
    out
}

fn present<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

/// Per-entity comparator for sections without replacement semantics.
pub fn compare_plain(_name: &str, old: &Value, new: &Value) -> Option<Difference<Value>> {
    Difference::between(Some(old), Some(new))
}

//! Template mutations that produce the "new" side of a benchmark diff.
//!
//! A mutation removes unreferenced resources, forces replacement of some
//! resources by renaming them, bumps mutable properties on others, and adds
//! fresh resources linked into the existing graph.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value, json};

use super::catalog::{KINDS, ResourceKind, kind_for_type};
use super::resources::{build_resource, literal_name, mutable_value};

/// Configuration for [`mutate_template`].
#[derive(Debug, Clone)]
pub struct MutationConfig {
    /// Seed for the random number generator (deterministic).
    pub seed: u64,
    /// Resources whose immutable name changes.
    pub replacements: usize,
    /// Resources whose mutable property changes.
    pub updates: usize,
    /// New resources to add.
    pub additions: usize,
    /// Unreferenced resources to remove.
    pub removals: usize,
}

impl MutationConfig {
    /// Only mutable changes: the diff converges in one round.
    pub fn updates_only(seed: u64, updates: usize) -> Self {
        Self {
            seed,
            replacements: 0,
            updates,
            additions: 0,
            removals: 0,
        }
    }

    /// A bit of everything, scaled to `resource_count`.
    pub fn mixed(seed: u64, resource_count: usize) -> Self {
        let share = (resource_count / 20).max(1);
        Self {
            seed,
            replacements: share,
            updates: share * 2,
            additions: share,
            removals: share,
        }
    }
}

/// Returns a mutated copy of `template`. The input is left untouched.
pub fn mutate_template(template: &Value, config: &MutationConfig) -> Value {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut out = template.clone();
    let referenced = referenced_ids(&out);

    let Some(resources) = out.get_mut("Resources").and_then(Value::as_object_mut) else {
        return out;
    };

    let unreferenced: Vec<String> = resources
        .keys()
        .filter(|id| !referenced.contains(*id))
        .cloned()
        .collect();
    for id in unreferenced.choose_multiple(&mut rng, config.removals) {
        resources.remove(id);
    }

    let literal_named: Vec<String> = resources
        .iter()
        .filter(|(_, r)| has_literal_name(r))
        .map(|(id, _)| id.clone())
        .collect();
    for id in literal_named.choose_multiple(&mut rng, config.replacements) {
        if let Some(resource) = resources.get_mut(id) {
            rename(resource);
        }
    }

    let ids: Vec<String> = resources.keys().cloned().collect();
    for (i, id) in ids.choose_multiple(&mut rng, config.updates).enumerate() {
        if let Some(resource) = resources.get_mut(id) {
            bump_mutable(resource, 1000 + i);
        }
    }

    add_resources(resources, config.additions, &mut rng);
    out
}

/// Changes the immutable name of `logical_id` so the resource is replaced.
///
/// Returns `false` if the resource does not exist or is not a generated
/// kind.
pub fn force_replacement(template: &mut Value, logical_id: &str) -> bool {
    template
        .get_mut("Resources")
        .and_then(|r| r.get_mut(logical_id))
        .is_some_and(rename)
}

/// Logical IDs named by any `Ref` or `Fn::GetAtt` in the template.
pub fn referenced_ids(template: &Value) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    let mut stack = vec![template];
    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => {
                if map.len() == 1 {
                    if let Some(Value::String(id)) = map.get("Ref") {
                        ids.insert(id.clone());
                    } else if let Some(Value::Array(args)) = map.get("Fn::GetAtt") {
                        if let Some(Value::String(id)) = args.first() {
                            ids.insert(id.clone());
                        }
                    }
                }
                stack.extend(map.values());
            }
            Value::Array(items) => stack.extend(items),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
    }
    ids
}

fn resource_kind(resource: &Value) -> Option<&'static ResourceKind> {
    resource
        .get("Type")
        .and_then(Value::as_str)
        .and_then(kind_for_type)
}

fn has_literal_name(resource: &Value) -> bool {
    resource_kind(resource).is_some_and(|kind| {
        resource["Properties"]
            .get(kind.name_property)
            .is_some_and(Value::is_string)
    })
}

fn rename(resource: &mut Value) -> bool {
    let Some(kind) = resource_kind(resource) else {
        return false;
    };
    let Some(properties) = resource
        .get_mut("Properties")
        .and_then(Value::as_object_mut)
    else {
        return false;
    };
    let renamed = match properties.get(kind.name_property) {
        Some(Value::String(name)) => format!("{name}-renamed"),
        Some(_) | None => literal_name(kind, "renamed"),
    };
    properties.insert(kind.name_property.to_owned(), json!(renamed));
    true
}

fn bump_mutable(resource: &mut Value, revision: usize) {
    let Some(kind) = resource_kind(resource) else {
        return;
    };
    if let Some(properties) = resource
        .get_mut("Properties")
        .and_then(Value::as_object_mut)
    {
        let revision = u32::try_from(revision).unwrap_or(u32::MAX);
        properties.insert(kind.mutable_property.to_owned(), mutable_value(revision));
    }
}

fn add_resources(resources: &mut Map<String, Value>, count: usize, rng: &mut StdRng) {
    let mut by_type: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    for (id, resource) in resources.iter() {
        if let Some(kind) = resource_kind(resource) {
            by_type.entry(kind.type_name).or_default().push(id.clone());
        }
    }
    for i in 0..count {
        let kind = &KINDS[rng.gen_range(0..KINDS.len())];
        let logical_id = format!("{}Added{i}", kind.id_prefix);
        let name = json!(literal_name(kind, &format!("added-{i}")));
        let resource = build_resource(kind, name, 1.0, &by_type, rng);
        resources.insert(logical_id, resource);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::generator::{SizeTier, generate_template};

    fn resource_ids(template: &Value) -> BTreeSet<String> {
        template["Resources"]
            .as_object()
            .expect("resources")
            .keys()
            .cloned()
            .collect()
    }

    #[test]
    fn mutation_is_deterministic() {
        let t = generate_template(&SizeTier::Small.config(42));
        let config = MutationConfig::mixed(7, 20);
        assert_eq!(mutate_template(&t, &config), mutate_template(&t, &config));
    }

    #[test]
    fn removals_only_touch_unreferenced_resources() {
        let t = generate_template(&SizeTier::Medium.config(42));
        let config = MutationConfig {
            seed: 1,
            replacements: 0,
            updates: 0,
            additions: 0,
            removals: 10,
        };
        let mutated = mutate_template(&t, &config);
        let referenced = referenced_ids(&t);
        let removed: Vec<String> = resource_ids(&t)
            .difference(&resource_ids(&mutated))
            .cloned()
            .collect();
        assert!(!removed.is_empty());
        for id in removed {
            assert!(!referenced.contains(&id), "{id} was referenced");
        }
    }

    #[test]
    fn additions_get_fresh_ids() {
        let t = generate_template(&SizeTier::Small.config(3));
        let config = MutationConfig {
            seed: 3,
            replacements: 0,
            updates: 0,
            additions: 5,
            removals: 0,
        };
        let mutated = mutate_template(&t, &config);
        assert_eq!(resource_ids(&mutated).len(), resource_ids(&t).len() + 5);
    }

    #[test]
    fn force_replacement_renames() {
        let mut t = json!({"Resources": {
            "Queue0": {"Type": "AWS::SQS::Queue", "Properties": {"QueueName": "queue-0"}},
            "Custom": {"Type": "Custom::Thing"}
        }});
        assert!(force_replacement(&mut t, "Queue0"));
        assert_eq!(
            t["Resources"]["Queue0"]["Properties"]["QueueName"],
            json!("queue-0-renamed")
        );
        assert!(!force_replacement(&mut t, "Custom"));
        assert!(!force_replacement(&mut t, "Missing"));
    }

    #[test]
    fn referenced_ids_reads_ref_and_get_att() {
        let t = json!({
            "Resources": {"B": {"Properties": {
                "X": {"Ref": "A"},
                "Y": [{"Fn::GetAtt": ["C", "Arn"]}]
            }}},
            "Outputs": {"O": {"Value": {"Ref": "D"}}}
        });
        let ids: Vec<String> = referenced_ids(&t).into_iter().collect();
        assert_eq!(ids, vec!["A", "C", "D"]);
    }
}

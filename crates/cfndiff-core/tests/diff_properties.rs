//! Property-based tests for the template diff engine.
//!
//! Templates are generated with `proptest`: a handful of parameters and
//! 1-12 resources whose properties mix scalars, lists and `Ref`/`Fn::GetAtt`
//! references to other resources.
#![allow(clippy::expect_used)]

use cfndiff_core::{
    Change, DiffConfig, ResourceImpact, ResourceSpecification, UpdateType, diff_template_with,
};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

const TYPES: [&str; 3] = ["Test::A", "Test::B", "Test::C"];
const PROPS: [&str; 4] = ["Name", "Size", "Target", "Tags"];

fn spec() -> ResourceSpecification {
    TYPES.iter().fold(ResourceSpecification::new(), |spec, t| {
        spec.with_property(*t, "Name", UpdateType::Immutable)
            .with_property(*t, "Target", UpdateType::Immutable)
    })
}

fn diff(old: &Value, new: &Value) -> cfndiff_core::TemplateDiff {
    let spec = spec();
    let config = DiffConfig::default().with_resource_spec(&spec);
    diff_template_with(old, new, &config).expect("generated templates are objects")
}

fn leaf(resource_count: usize) -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z]{1,6}".prop_map(Value::String),
        (0i64..100).prop_map(Value::from),
        any::<bool>().prop_map(Value::Bool),
        (0..resource_count).prop_map(|i| json!({"Ref": format!("R{i}")})),
        (0..resource_count).prop_map(|i| json!({"Fn::GetAtt": [format!("R{i}"), "Arn"]})),
        Just(json!({"Ref": "Env"})),
    ]
}

fn property_value(resource_count: usize) -> impl Strategy<Value = Value> {
    leaf(resource_count).prop_recursive(2, 8, 3, |inner| {
        prop::collection::vec(inner, 0..3).prop_map(Value::Array)
    })
}

fn resource(resource_count: usize) -> impl Strategy<Value = Value> {
    (
        prop::sample::select(TYPES.to_vec()),
        prop::collection::btree_map(
            prop::sample::select(PROPS.to_vec()),
            property_value(resource_count),
            0..4,
        ),
    )
        .prop_map(|(ty, props)| {
            let props: Map<String, Value> =
                props.into_iter().map(|(k, v)| (k.to_owned(), v)).collect();
            json!({"Type": ty, "Properties": props})
        })
}

fn template() -> impl Strategy<Value = Value> {
    (1usize..12).prop_flat_map(|n| {
        prop::collection::vec(resource(n), n).prop_map(|resources| {
            let resources: Map<String, Value> = resources
                .into_iter()
                .enumerate()
                .map(|(i, r)| (format!("R{i}"), r))
                .collect();
            json!({
                "Parameters": {"Env": {"Type": "String"}},
                "Resources": resources,
                "Outputs": {"First": {"Value": {"Ref": "R0"}}}
            })
        })
    })
}

/// Changes the type of every resource whose index is selected by `mask`.
fn retype(template: &Value, mask: u16) -> Value {
    let mut out = template.clone();
    if let Some(resources) = out["Resources"].as_object_mut() {
        for (i, r) in resources.values_mut().enumerate() {
            if mask & (1 << i) != 0 {
                r["Type"] = json!("Test::Retyped");
            }
        }
    }
    out
}

fn count_references(value: &Value) -> usize {
    let mut count = 0;
    let mut stack = vec![value];
    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => {
                if map.len() == 1 && map.keys().any(|k| k == "Ref" || k.starts_with("Fn::")) {
                    count += 1;
                }
                stack.extend(map.values());
            }
            Value::Array(items) => stack.extend(items),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
    }
    count
}

/// Writes `value` as JSON text with every object's keys in reverse order.
fn reversed_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let fields: Vec<String> = map
                .iter()
                .rev()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), reversed_json(v)))
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(reversed_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => value.to_string(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Diffing a template against itself yields nothing.
    #[test]
    fn self_diff_is_empty(t in template()) {
        let d = diff(&t, &t);
        prop_assert!(d.is_empty());
        prop_assert!(!d.has_replacements());
        prop_assert_eq!(d.iterations, 1);
    }

    /// Re-reading a template with every key order reversed changes nothing.
    ///
    /// Parsing sorts object keys, so this pins the behaviour end to end
    /// rather than exercising the comparator on differently ordered maps.
    #[test]
    fn key_order_is_irrelevant(t in template()) {
        let reordered: Value = serde_json::from_str(&reversed_json(&t)).expect("valid json");
        prop_assert!(diff(&t, &reordered).is_empty());
    }

    /// Everything in a template is an addition against an empty template,
    /// and a removal the other way round.
    #[test]
    fn existence_is_symmetric(t in template()) {
        let empty = json!({});
        let resource_count = t["Resources"].as_object().map_or(0, Map::len);

        let added = diff(&empty, &t);
        prop_assert_eq!(added.resources.len(), resource_count);
        for (_, r) in &added.resources {
            prop_assert!(r.is_addition());
            prop_assert!(r.old_value.is_none());
            prop_assert_eq!(r.change_impact(), ResourceImpact::WillCreate);
        }
        for (_, p) in &added.parameters {
            prop_assert!(p.old_value.is_none());
        }

        let removed = diff(&t, &empty);
        prop_assert_eq!(removed.resources.len(), resource_count);
        for (_, r) in &removed.resources {
            prop_assert!(r.is_removal());
            prop_assert!(r.new_value.is_none());
            prop_assert_eq!(r.change_impact(), ResourceImpact::WillDestroy);
        }
    }

    /// Every retyped resource is replaced, and the fixed point is reached
    /// within one round more than the template has references.
    #[test]
    fn retyping_terminates_within_bound(t in template(), mask in any::<u16>()) {
        let new = retype(&t, mask);
        let d = diff(&t, &new);

        prop_assert!(d.iterations >= 1);
        prop_assert!(d.iterations <= count_references(&new) + 1);

        let resources = new["Resources"].as_object().expect("resources");
        for (i, id) in resources.keys().enumerate() {
            if mask & (1 << i) != 0 {
                let r = d.resources.get(id).expect("retyped resource is reported");
                prop_assert_eq!(r.change_impact(), ResourceImpact::WillReplace);
            }
        }
    }

    /// Changing only mutable properties never replaces anything, so the
    /// first round is final.
    #[test]
    fn mutable_changes_never_replace(t in template(), size in 100i64..200) {
        let mut new = t.clone();
        if let Some(resources) = new["Resources"].as_object_mut() {
            for r in resources.values_mut() {
                r["Properties"]["Size"] = json!(size);
            }
        }
        let d = diff(&t, &new);
        prop_assert_eq!(d.iterations, 1);
        prop_assert!(!d.has_replacements());
        for (_, r) in &d.resources {
            prop_assert_eq!(r.change_impact(), ResourceImpact::WillUpdate);
        }
        prop_assert_eq!(
            d.resources.len(),
            t["Resources"].as_object().map_or(0, Map::len)
        );
    }
}

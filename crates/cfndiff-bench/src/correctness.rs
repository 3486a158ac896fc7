//! Post-diff invariant checkers for correctness validation.

use cfndiff_core::{
    Change, DiffConfig, ResourceImpact, TemplateDiff,
    UpdateType, diff_template_with, replaced_sentinel,
};
use serde_json::{Map, Value};

use crate::generator::mutations::referenced_ids;

/// Counts `Ref` and `Fn::*` intrinsics anywhere in `template`.
pub fn count_references(template: &Value) -> usize {
    let mut count = 0;
    let mut stack = vec![template];
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

fn run(old: &Value, new: &Value, config: &DiffConfig<'_>) -> Result<TemplateDiff, String> {
    diff_template_with(old, new, config).map_err(|e| e.to_string())
}

fn resources(template: &Value) -> Map<String, Value> {
    template
        .get("Resources")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Verifies that a template diffed against itself reports nothing.
pub fn check_self_diff_empty(template: &Value, config: &DiffConfig<'_>) -> Result<(), String> {
    let diff = run(template, template, config)?;
    if !diff.is_empty() {
        return Err(format!(
            "self diff reported {} differences",
            diff.difference_count()
        ));
    }
    if diff.iterations != 1 {
        return Err(format!(
            "self diff took {} iterations, expected 1",
            diff.iterations
        ));
    }
    Ok(())
}

/// Verifies the fixed point was reached within one round more than the new
/// template has references.
pub fn check_iteration_bound(new: &Value, diff: &TemplateDiff) -> Result<(), String> {
    let bound = count_references(new) + 1;
    if diff.iterations == 0 || diff.iterations > bound {
        return Err(format!(
            "diff took {} iterations, expected 1..={bound}",
            diff.iterations
        ));
    }
    Ok(())
}

/// Verifies that every resource is a creation against an empty template and
/// a destruction the other way round.
pub fn check_existence_symmetry(template: &Value, config: &DiffConfig<'_>) -> Result<(), String> {
    let empty = Value::Object(Map::new());
    let expected = resources(template).len();

    let added = run(&empty, template, config)?;
    if added.resources.len() != expected {
        return Err(format!(
            "expected {expected} additions, got {}",
            added.resources.len()
        ));
    }
    if let Some((id, _)) = added.resources.iter().find(|(_, r)| {
        !r.is_addition() || r.change_impact() != ResourceImpact::WillCreate
    }) {
        return Err(format!("{id} is not reported as a creation"));
    }

    let removed = run(template, &empty, config)?;
    if removed.resources.len() != expected {
        return Err(format!(
            "expected {expected} removals, got {}",
            removed.resources.len()
        ));
    }
    if let Some((id, _)) = removed.resources.iter().find(|(_, r)| {
        !r.is_removal() || r.change_impact() != ResourceImpact::WillDestroy
    }) {
        return Err(format!("{id} is not reported as a destruction"));
    }
    Ok(())
}

/// Verifies that a resource reached by a sentinel through an immutable
/// property is itself replaced.
///
/// Walks the property updates of `diff`: any property whose new value
/// mentions a replaced resource's sentinel must carry the impact its update
/// type dictates.
pub fn check_replacements_cascade(
    diff: &TemplateDiff,
    config: &DiffConfig<'_>,
) -> Result<(), String> {
    let sentinels: Vec<String> = diff
        .resources_with(|impact| impact == ResourceImpact::WillReplace)
        .into_iter()
        .map(replaced_sentinel)
        .collect();
    for (id, resource) in &diff.resources {
        let Some(resource_type) = resource.new_resource_type() else {
            continue;
        };
        for (property, update) in &resource.property_updates {
            let Some(new_value) = update.new_value.as_ref() else {
                continue;
            };
            let mentioned = referenced_ids(new_value);
            if !sentinels.iter().any(|s| mentioned.contains(s)) {
                continue;
            }
            let update_type = config.resource_spec.update_type(resource_type, property);
            if update_type == UpdateType::Immutable
                && resource.change_impact() < ResourceImpact::MayReplace
            {
                return Err(format!(
                    "{id}.{property} references a replaced resource but {id} is {:?}",
                    resource.change_impact()
                ));
            }
        }
    }
    Ok(())
}

/// Verifies that the inputs to a diff were not modified.
pub fn check_input_unchanged(before: &Value, after: &Value) -> Result<(), String> {
    if before != after {
        return Err("diff modified its input template".to_owned());
    }
    Ok(())
}

/// Verifies the summary agrees with the per-resource impacts.
pub fn check_summary_consistent(diff: &TemplateDiff) -> Result<(), String> {
    let summary = diff.summary();
    let count = |impact: ResourceImpact| {
        diff.resources
            .iter()
            .filter(|(_, r)| r.change_impact() == impact)
            .count()
    };
    let pairs = [
        ("added", summary.resources_added, ResourceImpact::WillCreate),
        ("removed", summary.resources_removed, ResourceImpact::WillDestroy),
        ("updated", summary.resources_updated, ResourceImpact::WillUpdate),
        (
            "may_replace",
            summary.resources_may_replace,
            ResourceImpact::MayReplace,
        ),
        (
            "replaced",
            summary.resources_replaced,
            ResourceImpact::WillReplace,
        ),
    ];
    for (label, reported, impact) in pairs {
        let actual = count(impact);
        if reported != actual {
            return Err(format!(
                "summary {label} is {reported}, resources show {actual}"
            ));
        }
    }
    Ok(())
}

#![allow(clippy::expect_used)]
#![allow(clippy::doc_markdown)]


use std::sync::LazyLock;

use serde_json::Value;

use super::engine::{DiffConfig, diff_template_with};
use super::template_diff::TemplateDiff;
use crate::resource_spec::{ResourceSpecification, UpdateType};

/// Resource types used throughout these tests:
///
/// - `T`: `Name` and `Target` replace, `Engine` conditionally replaces,
///   everything else is mutable.
/// - `T1`: `P` replaces.
/// - `T2`: everything is mutable.
pub(crate) static TEST_SPEC: LazyLock<ResourceSpecification> = LazyLock::new(|| {
    ResourceSpecification::new()
        .with_property("T", "Name", UpdateType::Immutable)
        .with_property("T", "Target", UpdateType::Immutable)
        .with_property("T", "Engine", UpdateType::Conditional)
        .with_property("T1", "P", UpdateType::Immutable)
});

pub(crate) fn config() -> DiffConfig<'static> {
    DiffConfig::default().with_resource_spec(&*TEST_SPEC)
}

pub(crate) fn run(old: &Value, new: &Value) -> TemplateDiff {
    diff_template_with(old, new, &config()).expect("both templates are objects")
}

/// Counts `Ref` and `Fn::*` nodes anywhere in `value`.
pub(crate) fn count_references(value: &Value) -> usize {
    let mut count = 0;
    let mut stack = vec![value];
    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => {
                if map.len() == 1
                    && map
                        .keys()
                        .any(|k| k == "Ref" || k.starts_with("Fn::"))
                {
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

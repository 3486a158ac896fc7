//! Reference propagation for replaced resources.
//!
//! When a resource is replaced its physical identity changes, so every
//! `Ref` or `Fn::*` reference to it resolves to a new value at deploy time.
//! The pass below makes that visible to the comparators by rewriting each
//! such reference in the working copy of the new template to a sentinel
//! (`<logical id>(replaced)`). On the next comparison round the referring
//! resource shows a property change, which may replace it in turn.
//!
//! A node is rewritten when it is a single-key object of one of these forms:
//!
//! | Node | Rewritten part |
//! |---|---|
//! | `{"Ref": "A"}` | `"A"` |
//! | `{"Fn::<Name>": ["A", ...]}` | the first array element only |
//!
//! Rewritten nodes are not descended into. Every other object or array is
//! walked in full, including `Fn::*` nodes whose first argument does not
//! match. The sentinel contains characters that are not valid in a logical
//! ID, so a rewritten reference can never match again.
use serde_json::{Map, Value};
use tracing::debug;

use crate::template::TemplateDocument;

/// Suffix appended to a logical ID to mark a reference to a replaced
/// resource.
pub const REPLACED_SUFFIX: &str = "(replaced)";

const REF: &str = "Ref";
const FN_PREFIX: &str = "Fn::";

/// Returns the sentinel that replaces references to `logical_id`.
pub fn replaced_sentinel(logical_id: &str) -> String {
    format!("{logical_id}{REPLACED_SUFFIX}")
}

/// Rewrites every reference to `logical_id` inside `template`.
///
/// Returns `true` if at least one reference was rewritten.
pub fn propagate_replaced_references(template: &mut Value, logical_id: &str) -> bool {
    rewrite_references([template], logical_id) > 0
}

/// Rewrites every reference to `logical_id` across all sections of `doc`.
///
/// Returns the number of references rewritten.
pub fn propagate_in_document(doc: &mut TemplateDocument, logical_id: &str) -> usize {
    let rewrites = rewrite_references(doc.as_map_mut().values_mut(), logical_id);
    if rewrites > 0 {
        debug!(logical_id, rewrites, "propagated replacement");
    }
    rewrites
}

fn rewrite_references<'a, I>(roots: I, logical_id: &str) -> usize
where
    I: IntoIterator<Item = &'a mut Value>,
{
    let sentinel = replaced_sentinel(logical_id);
    let mut rewrites = 0;
    let mut stack: Vec<&'a mut Value> = roots.into_iter().collect();
    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => {
                if rewrite_reference(map, logical_id, &sentinel) {
                    rewrites += 1;
                    continue;
                }
                stack.extend(map.values_mut());
            }
            Value::Array(items) => stack.extend(items.iter_mut()),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
    }
    rewrites
}

/// Rewrites `map` in place if it is a reference to `logical_id`.
fn rewrite_reference(map: &mut Map<String, Value>, logical_id: &str, sentinel: &str) -> bool {
    if map.len() != 1 {
        return false;
    }
    let Some((key, arg)) = map.iter_mut().next() else {
        return false;
    };
    let target = if key == REF {
        Some(arg)
    } else if key.starts_with(FN_PREFIX) {
        arg.as_array_mut().and_then(|args| args.first_mut())
    } else {
        None
    };
    match target.filter(|t| t.as_str() == Some(logical_id)) {
        Some(t) => {
            *t = Value::String(sentinel.to_owned());
            true
        }
        None => false,
    }
}

//! Structural equality and deferred-value detection over JSON-like values.
//!
//! Template documents are weakly typed: every section, resource attribute and
//! property is an arbitrary [`serde_json::Value`]. The comparators in
//! [`crate::diff`] never look at raw bytes; they rely on [`deep_equal`] to
//! decide whether two positions differ at all, and on [`DeferredScope`] to
//! decide whether a difference can be judged concretely before deployment.
use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Structural equality
// ---------------------------------------------------------------------------

/// Compares two optional JSON-like values structurally.
///
/// - An absent value and an explicit `null` are equal to each other.
/// - Arrays are equal when they have the same length and pairwise-equal
///   elements **in order**.
/// - Objects are equal when they have the same key set and pairwise-equal
///   values; key order is irrelevant.
/// - Scalars use strict equality with no coercion: `"1"` and `1` differ, and
///   so do the integer `1` and the float `1.0`.
pub fn deep_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => true,
        (Some(a), Some(b)) => values_equal(a, b),
        (None, Some(_)) | (Some(_), None) => false,
    }
}

/// Structural equality of two present values. See [`deep_equal`].
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => maps_equal(x, y),
        _ => false,
    }
}

/// Structural equality of two JSON objects, ignoring key order.
pub fn maps_equal(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(key, av)| b.get(key).is_some_and(|bv| values_equal(av, bv)))
}

/// Returns a short, stable name for the JSON kind of `value`.
///
/// Used in error messages and diagnostics.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Deferred values
// ---------------------------------------------------------------------------

/// Unresolved CDK token embedded in a string, e.g. `${Token[TOKEN.123]}`.
static CDK_TOKEN_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$\{Token\[[^\]]+\]\}").ok());

/// CloudFormation dynamic reference, e.g. `{{resolve:ssm:/my/param}}`.
static DYNAMIC_REFERENCE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{resolve:[^}]+\}\}").ok());

/// `${Name}` placeholder in an `Fn::Sub` template string. `${!Literal}` is an
/// escape and does not match.
static SUB_PLACEHOLDER_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$\{([^!}][^}]*)\}").ok());

/// Prefix shared by all CloudFormation pseudo parameters (`AWS::Region`, ...).
const PSEUDO_PARAMETER_PREFIX: &str = "AWS::";

/// Decides whether a value is only known at deploy time.
///
/// A value is *deferred* when, anywhere inside it, one of the following
/// appears:
///
/// - `{"Ref": X}` where `X` is a declared template parameter or a pseudo
///   parameter (`AWS::...`);
/// - an `Fn::ImportValue` intrinsic;
/// - an `Fn::Sub` whose template string has a `${X}` placeholder naming a
///   parameter or pseudo parameter that the variable map does not bind;
/// - a string carrying an unresolved CDK token (`${Token[...]}`) or a
///   dynamic reference (`{{resolve:...}}`).
///
/// References to other resources are **not** deferred. Their replacement is
/// tracked explicitly by the reference-propagation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeferredScope {
    parameters: BTreeSet<String>,
}

impl DeferredScope {
    /// A scope with no declared parameters. Pseudo parameters, imports, tokens
    /// and dynamic references are still recognised.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a scope from the `Parameters` sections of both templates.
    pub fn from_templates(old: &Map<String, Value>, new: &Map<String, Value>) -> Self {
        let mut parameters = BTreeSet::new();
        for template in [old, new] {
            if let Some(Value::Object(params)) = template.get("Parameters") {
                parameters.extend(params.keys().cloned());
            }
        }
        Self { parameters }
    }

    /// Adds a parameter name to the scope.
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.insert(name.into());
        self
    }

    /// Returns `true` if `name` is a declared parameter or a pseudo parameter.
    pub fn is_parameter(&self, name: &str) -> bool {
        name.starts_with(PSEUDO_PARAMETER_PREFIX) || self.parameters.contains(name)
    }

    /// Returns `true` if `value` (or anything nested in it) is deferred.
    pub fn is_deferred(&self, value: &Value) -> bool {
        let mut stack: Vec<&Value> = vec![value];
        while let Some(node) = stack.pop() {
            match node {
                Value::String(s) => {
                    if is_token_string(s) {
                        return true;
                    }
                }
                Value::Array(items) => stack.extend(items),
                Value::Object(map) => {
                    if self.is_deferred_intrinsic(map) {
                        return true;
                    }
                    stack.extend(map.values());
                }
                Value::Null | Value::Bool(_) | Value::Number(_) => {}
            }
        }
        false
    }

    /// Like [`is_deferred`](Self::is_deferred) but accepts an absent value.
    pub fn is_deferred_opt(&self, value: Option<&Value>) -> bool {
        value.is_some_and(|v| self.is_deferred(v))
    }

    fn is_deferred_intrinsic(&self, map: &Map<String, Value>) -> bool {
        if map.len() != 1 {
            return false;
        }
        if map.contains_key("Fn::ImportValue") {
            return true;
        }
        if let Some(arg) = map.get("Fn::Sub") {
            return self.is_deferred_sub(arg);
        }
        matches!(map.get("Ref"), Some(Value::String(target)) if self.is_parameter(target))
    }

    /// Reads the placeholders of `Fn::Sub`, either `"template"` or
    /// `["template", {vars}]`. The variable values themselves are walked by
    /// the caller like any other nested value.
    fn is_deferred_sub(&self, arg: &Value) -> bool {
        let (template, vars) = match arg {
            Value::String(s) => (s.as_str(), None),
            Value::Array(items) => {
                let Some(Value::String(s)) = items.first() else {
                    return false;
                };
                (s.as_str(), items.get(1).and_then(Value::as_object))
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::Object(_) => return false,
        };
        let Some(re) = SUB_PLACEHOLDER_RE.as_ref() else {
            return false;
        };
        re.captures_iter(template)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .any(|name| !vars.is_some_and(|v| v.contains_key(name)) && self.is_parameter(name))
    }
}

fn is_token_string(s: &str) -> bool {
    let matches = |re: &LazyLock<Option<Regex>>| re.as_ref().is_some_and(|re| re.is_match(s));
    matches(&CDK_TOKEN_RE) || matches(&DYNAMIC_REFERENCE_RE)
}

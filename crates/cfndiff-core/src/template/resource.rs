//! The `Resources` section entry.

use serde::Serialize;
use serde_json::{Map, Value};

/// Key under which a non-object resource entry is preserved in
/// [`Resource::extra`].
pub const OPAQUE_VALUE_KEY: &str = "$value";

/// A single resource declaration.
///
/// Built with [`Resource::from_value`], which never fails: a missing `Type`
/// becomes the empty string, a non-string `Type` is kept as its JSON text,
/// a non-object `Properties` moves into [`extra`](Self::extra) under
/// `"Properties"`, and a non-object entry is kept whole under
/// [`OPAQUE_VALUE_KEY`]. Any of these shapes still diffs as a change.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Resource {
    /// Resource type name, e.g. `AWS::S3::Bucket`.
    #[serde(rename = "Type")]
    pub resource_type: String,
    /// Resource properties, ordered by name.
    #[serde(rename = "Properties", skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    /// Name of the condition gating creation of this resource.
    #[serde(rename = "Condition", skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
    /// Explicit dependencies: a logical ID or a list of them.
    #[serde(rename = "DependsOn", skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Value>,
    /// Resource-level metadata.
    #[serde(rename = "Metadata", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// What happens to the old physical resource on replacement.
    #[serde(rename = "UpdateReplacePolicy", skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<Value>,
    /// What happens to the physical resource on deletion.
    #[serde(rename = "DeletionPolicy", skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<Value>,
    /// Every other attribute (`UpdatePolicy`, `CreationPolicy`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    /// Creates a resource of the given type with no properties.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ..Self::default()
        }
    }

    /// Sets a property, returning `self` for chaining.
    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Reads a resource declaration from raw template JSON.
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(map) = value else {
            let mut extra = Map::new();
            extra.insert(OPAQUE_VALUE_KEY.to_owned(), value.clone());
            return Self {
                extra,
                ..Self::default()
            };
        };

        let mut attrs = map.clone();
        let resource_type = match attrs.remove("Type") {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let properties = match attrs.remove("Properties") {
            Some(Value::Object(props)) => props,
            Some(Value::Null) | None => Map::new(),
            Some(other) => {
                attrs.insert("Properties".to_owned(), other);
                Map::new()
            }
        };

        Self {
            resource_type,
            properties,
            condition: attrs.remove("Condition"),
            depends_on: attrs.remove("DependsOn"),
            metadata: attrs.remove("Metadata"),
            update_replace_policy: attrs.remove("UpdateReplacePolicy"),
            deletion_policy: attrs.remove("DeletionPolicy"),
            extra: attrs,
        }
    }

    /// Returns every non-`Properties` attribute by its template key,
    /// including `Type`.
    ///
    /// `extra` may carry a `"Properties"` key when the declaration held a
    /// non-object there; it is included so the shape change is not lost.
    pub fn attributes(&self) -> Map<String, Value> {
        let mut out = Map::new();
        if !self.resource_type.is_empty() {
            out.insert(
                "Type".to_owned(),
                Value::String(self.resource_type.clone()),
            );
        }
        let optional = [
            ("Condition", &self.condition),
            ("DependsOn", &self.depends_on),
            ("Metadata", &self.metadata),
            ("UpdateReplacePolicy", &self.update_replace_policy),
            ("DeletionPolicy", &self.deletion_policy),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                out.insert(key.to_owned(), v.clone());
            }
        }
        for (key, value) in &self.extra {
            out.insert(key.clone(), value.clone());
        }
        out
    }

    /// Logical IDs listed in `DependsOn`, sorted and deduplicated.
    ///
    /// A single string and a one-element list are equivalent. Returns `None`
    /// when `DependsOn` is neither a string nor a list of strings.
    pub fn dependencies(&self) -> Option<Vec<String>> {
        let mut ids: Vec<String> = match &self.depends_on {
            Some(Value::String(id)) => vec![id.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(str::to_owned))
                .collect::<Option<_>>()?,
            Some(Value::Null) | None => Vec::new(),
            Some(Value::Bool(_) | Value::Number(_) | Value::Object(_)) => return None,
        };
        ids.sort();
        ids.dedup();
        Some(ids)
    }

    /// Converts the record back into template JSON.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_standard_attributes() {
        let r = Resource::from_value(&json!({
            "Type": "AWS::SQS::Queue",
            "Properties": {"QueueName": "q"},
            "Condition": "IsProd",
            "DependsOn": ["B", "A"],
            "DeletionPolicy": "Retain",
            "UpdatePolicy": {"AutoScalingRollingUpdate": {}}
        }));
        assert_eq!(r.resource_type, "AWS::SQS::Queue");
        assert_eq!(r.properties.get("QueueName"), Some(&json!("q")));
        assert_eq!(r.condition, Some(json!("IsProd")));
        assert_eq!(r.deletion_policy, Some(json!("Retain")));
        assert_eq!(r.dependencies(), Some(vec!["A".to_owned(), "B".to_owned()]));
        assert!(r.extra.contains_key("UpdatePolicy"));
    }

    #[test]
    fn malformed_shapes_are_preserved() {
        let r = Resource::from_value(&json!({"Type": 7, "Properties": "oops"}));
        assert_eq!(r.resource_type, "7");
        assert!(r.properties.is_empty());
        assert_eq!(r.extra.get("Properties"), Some(&json!("oops")));

        let opaque = Resource::from_value(&json!("not a resource"));
        assert_eq!(opaque.resource_type, "");
        assert_eq!(
            opaque.extra.get(OPAQUE_VALUE_KEY),
            Some(&json!("not a resource"))
        );
    }

    #[test]
    fn attributes_include_type_but_not_properties() {
        let r = Resource::new("AWS::SNS::Topic")
            .with_property("TopicName", json!("t"))
            .with_property("DisplayName", json!("d"));
        let attrs = r.attributes();
        assert_eq!(attrs.get("Type"), Some(&json!("AWS::SNS::Topic")));
        assert!(!attrs.contains_key("Properties"));
    }

    #[test]
    fn to_value_round_trips() {
        let raw = json!({
            "Type": "AWS::SNS::Topic",
            "Properties": {"TopicName": "t"},
            "Metadata": {"cdk:path": "Stack/Topic"}
        });
        assert_eq!(Resource::from_value(&raw).to_value(), raw);
    }

    #[test]
    fn single_dependency_string() {
        let r = Resource::from_value(&json!({"Type": "T", "DependsOn": "Other"}));
        assert_eq!(r.dependencies(), Some(vec!["Other".to_owned()]));
    }

    #[test]
    fn non_string_dependencies_have_no_set() {
        let r = Resource::from_value(&json!({"Type": "T", "DependsOn": {"Ref": "A"}}));
        assert_eq!(r.dependencies(), None);
        let mixed = Resource::from_value(&json!({"Type": "T", "DependsOn": ["A", 1]}));
        assert_eq!(mixed.dependencies(), None);
        let absent = Resource::new("T");
        assert_eq!(absent.dependencies(), Some(Vec::new()));
    }
}

//! CloudFormation template document model.
//!
//! A template is an unordered map from top-level section name to section
//! content. Most sections (`Parameters`, `Mappings`, `Conditions`, `Outputs`,
//! `Metadata`) are themselves maps from logical name to an arbitrary value;
//! `Resources` maps logical IDs to [`Resource`] records; a handful of
//! sections (`AWSTemplateFormatVersion`, `Description`, `Transform`) are
//! scalars.
//!
//! # Unknown section preservation
//!
//! [`TemplateDocument`] stores sections as raw JSON values and never drops a
//! key it does not recognise. Unrecognised sections surface as
//! [`Section::Unknown`] and are diffed generically.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::value::kind_name;

pub mod resource;
pub mod yaml;

pub use resource::Resource;

// ---------------------------------------------------------------------------
// TemplateError
// ---------------------------------------------------------------------------

/// Errors produced while loading a template document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The input was not valid JSON.
    Json(String),
    /// The input was not valid YAML.
    Yaml(String),
    /// The document parsed, but its top level is not an object.
    ///
    /// The contained string names the JSON kind that was found instead.
    NotAnObject(&'static str),
    /// A YAML tag that is not a CloudFormation intrinsic short form.
    UnsupportedTag(String),
    /// A YAML mapping key that cannot be represented as a JSON object key.
    UnsupportedKey(String),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "invalid JSON template: {msg}"),
            Self::Yaml(msg) => write!(f, "invalid YAML template: {msg}"),
            Self::NotAnObject(kind) => {
                write!(f, "template must be an object at the top level, got {kind}")
            }
            Self::UnsupportedTag(tag) => write!(f, "unsupported YAML tag: !{tag}"),
            Self::UnsupportedKey(key) => write!(f, "unsupported YAML mapping key: {key}"),
        }
    }
}

impl std::error::Error for TemplateError {}

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// A top-level template section, identified by its key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    /// `AWSTemplateFormatVersion` (scalar).
    AwsTemplateFormatVersion,
    /// `Description` (scalar).
    Description,
    /// `Transform` (scalar or list of macro names).
    Transform,
    /// `Parameters`.
    Parameters,
    /// `Mappings`.
    Mappings,
    /// `Conditions`.
    Conditions,
    /// `Resources`.
    Resources,
    /// `Outputs`.
    Outputs,
    /// `Metadata`.
    Metadata,
    /// Any other top-level key.
    Unknown(String),
}

impl Section {
    /// Every section the engine recognises by name.
    pub const KNOWN: [Section; 9] = [
        Section::AwsTemplateFormatVersion,
        Section::Description,
        Section::Transform,
        Section::Parameters,
        Section::Mappings,
        Section::Conditions,
        Section::Resources,
        Section::Outputs,
        Section::Metadata,
    ];

    /// Maps a top-level key to its section. Never fails.
    pub fn from_key(key: &str) -> Self {
        match key {
            "AWSTemplateFormatVersion" => Self::AwsTemplateFormatVersion,
            "Description" => Self::Description,
            "Transform" => Self::Transform,
            "Parameters" => Self::Parameters,
            "Mappings" => Self::Mappings,
            "Conditions" => Self::Conditions,
            "Resources" => Self::Resources,
            "Outputs" => Self::Outputs,
            "Metadata" => Self::Metadata,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// Returns the top-level key for this section.
    pub fn as_key(&self) -> &str {
        match self {
            Self::AwsTemplateFormatVersion => "AWSTemplateFormatVersion",
            Self::Description => "Description",
            Self::Transform => "Transform",
            Self::Parameters => "Parameters",
            Self::Mappings => "Mappings",
            Self::Conditions => "Conditions",
            Self::Resources => "Resources",
            Self::Outputs => "Outputs",
            Self::Metadata => "Metadata",
            Self::Unknown(key) => key,
        }
    }

    /// Returns `true` for sections whose content is a single scalar value.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::AwsTemplateFormatVersion | Self::Description | Self::Transform
        )
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

// ---------------------------------------------------------------------------
// TemplateDocument
// ---------------------------------------------------------------------------

/// A parsed template: an object whose keys are section names.
///
/// Deserialising through serde (or [`TemplateDocument::from_value`]) rejects
/// anything that is not an object at the top level; section contents are
/// not validated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateDocument {
    sections: Map<String, Value>,
}

impl TemplateDocument {
    /// Creates an empty template.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, TemplateError> {
        match value {
            Value::Object(sections) => Ok(Self { sections }),
            other @ (Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::Array(_)) => Err(TemplateError::NotAnObject(kind_name(&other))),
        }
    }

    /// Parses a JSON template.
    pub fn from_json_str(input: &str) -> Result<Self, TemplateError> {
        let value: Value =
            serde_json::from_str(input).map_err(|e| TemplateError::Json(e.to_string()))?;
        Self::from_value(value)
    }

    /// Parses a YAML template, expanding CloudFormation short-form intrinsic
    /// tags (`!Ref`, `!GetAtt`, `!Sub`, ...) into their long JSON form.
    pub fn from_yaml_str(input: &str) -> Result<Self, TemplateError> {
        Self::from_value(yaml::parse_yaml(input)?)
    }

    /// Returns the raw content of a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.sections.get(key)
    }

    /// Returns the raw content of a section.
    pub fn section(&self, section: &Section) -> Option<&Value> {
        self.sections.get(section.as_key())
    }

    /// Sets a top-level key, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.sections.insert(key.into(), value)
    }

    /// Iterates over top-level keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Returns the resource with the given logical ID, if any.
    pub fn resource(&self, logical_id: &str) -> Option<Resource> {
        match self.section(&Section::Resources) {
            Some(Value::Object(resources)) => resources.get(logical_id).map(Resource::from_value),
            Some(_) | None => None,
        }
    }

    /// Returns the underlying map of sections.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.sections
    }

    pub(crate) fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.sections
    }

    /// Converts the document back into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.sections)
    }
}

impl TryFrom<Value> for TemplateDocument {
    type Error = TemplateError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Map<String, Value>> for TemplateDocument {
    fn from(sections: Map<String, Value>) -> Self {
        Self { sections }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn section_keys_round_trip() {
        for section in Section::KNOWN {
            assert_eq!(Section::from_key(section.as_key()), section);
        }
        assert_eq!(
            Section::from_key("Rules"),
            Section::Unknown("Rules".to_owned())
        );
        assert_eq!(Section::from_key("Rules").as_key(), "Rules");
    }

    #[test]
    fn scalar_sections() {
        assert!(Section::Description.is_scalar());
        assert!(Section::Transform.is_scalar());
        assert!(!Section::Resources.is_scalar());
        assert!(!Section::Unknown("X".to_owned()).is_scalar());
    }

    #[test]
    fn from_value_rejects_non_objects() {
        let err = TemplateDocument::from_value(json!([1, 2])).expect_err("array rejected");
        assert_eq!(err, TemplateError::NotAnObject("array"));
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn from_json_str_reports_syntax_errors() {
        let err = TemplateDocument::from_json_str("{ not json").expect_err("invalid");
        assert!(matches!(err, TemplateError::Json(_)));
    }

    #[test]
    fn resource_lookup() {
        let doc = TemplateDocument::from_value(json!({
            "Resources": {"Bucket": {"Type": "AWS::S3::Bucket"}}
        }))
        .expect("object");
        let bucket = doc.resource("Bucket").expect("present");
        assert_eq!(bucket.resource_type, "AWS::S3::Bucket");
        assert!(doc.resource("Missing").is_none());
    }

    #[test]
    fn serde_is_transparent() {
        let doc: TemplateDocument =
            serde_json::from_value(json!({"Description": "d"})).expect("deserialize");
        assert_eq!(doc.get("Description"), Some(&json!("d")));
        assert_eq!(
            serde_json::to_value(&doc).expect("serialize"),
            json!({"Description": "d"})
        );
    }
}

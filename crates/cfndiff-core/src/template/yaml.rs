//! YAML template loading with CloudFormation short-form intrinsic expansion.
//!
//! `serde_yaml` surfaces `!Ref Foo` as a tagged value. CloudFormation defines a
//! fixed set of these short forms; each expands to the single-key long form
//! the diff engine understands:
//!
//! | YAML                | JSON                                   |
//! |---------------------|----------------------------------------|
//! | `!Ref X`            | `{"Ref": "X"}`                         |
//! | `!Condition X`      | `{"Condition": "X"}`                   |
//! | `!GetAtt A.B`       | `{"Fn::GetAtt": ["A", "B"]}`           |
//! | `!Sub s`, `!Join l` | `{"Fn::Sub": s}`, `{"Fn::Join": l}`    |
//! | `!Transform m`      | `{"Fn::Transform": m}`                 |
//!
//! Any other tag is rejected with [`TemplateError::UnsupportedTag`].
use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;

use super::TemplateError;

/// Short-form tags that expand to `Fn::<Name>`.
const FN_SHORT_FORMS: [&str; 17] = [
    "And",
    "Base64",
    "Cidr",
    "Equals",
    "FindInMap",
    "GetAZs",
    "GetAtt",
    "If",
    "ImportValue",
    "Join",
    "Length",
    "Not",
    "Or",
    "Select",
    "Split",
    "Sub",
    "Transform",
];

/// Parses YAML text into a JSON value, expanding intrinsic short forms.
pub fn parse_yaml(input: &str) -> Result<Value, TemplateError> {
    let doc: YamlValue =
        serde_yaml::from_str(input).map_err(|e| TemplateError::Yaml(e.to_string()))?;
    yaml_to_json(&doc)
}

/// Converts a parsed YAML value into JSON.
pub fn yaml_to_json(value: &YamlValue) -> Result<Value, TemplateError> {
    Ok(match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(*b),
        YamlValue::Number(n) => yaml_number(n),
        YamlValue::String(s) => Value::String(s.clone()),
        YamlValue::Sequence(items) => Value::Array(
            items
                .iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        YamlValue::Mapping(mapping) => {
            let mut out = Map::new();
            for (k, v) in mapping {
                out.insert(mapping_key(k)?, yaml_to_json(v)?);
            }
            Value::Object(out)
        }
        YamlValue::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            expand_short_form(tag.trim_start_matches('!'), yaml_to_json(&tagged.value)?)?
        }
    })
}

fn expand_short_form(name: &str, arg: Value) -> Result<Value, TemplateError> {
    let (key, arg) = match name {
        "Ref" | "Condition" => (name.to_owned(), arg),
        "GetAtt" => ("Fn::GetAtt".to_owned(), split_get_att(arg)),
        other if FN_SHORT_FORMS.contains(&other) => (format!("Fn::{other}"), arg),
        other => return Err(TemplateError::UnsupportedTag(other.to_owned())),
    };
    let mut map = Map::new();
    map.insert(key, arg);
    Ok(Value::Object(map))
}

/// `!GetAtt Resource.Attr.Path` splits at the first dot.
fn split_get_att(arg: Value) -> Value {
    match arg {
        Value::String(s) => match s.split_once('.') {
            Some((resource, attribute)) => Value::Array(vec![
                Value::String(resource.to_owned()),
                Value::String(attribute.to_owned()),
            ]),
            None => Value::String(s),
        },
        other @ (Value::Null
        | Value::Bool(_)
        | Value::Number(_)
        | Value::Array(_)
        | Value::Object(_)) => other,
    }
}

/// JSON has no infinities or NaN; those keep their YAML text (`.inf`, `.nan`).
fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(Number::from(i))
    } else if let Some(u) = n.as_u64() {
        Value::Number(Number::from(u))
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map_or_else(|| Value::String(n.to_string()), Value::Number)
    }
}

fn mapping_key(key: &YamlValue) -> Result<String, TemplateError> {
    match key {
        YamlValue::String(s) => Ok(s.clone()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Null | YamlValue::Sequence(_) | YamlValue::Mapping(_) => {
            Err(TemplateError::UnsupportedKey(format!("{key:?}")))
        }
        YamlValue::Tagged(tagged) => Err(TemplateError::UnsupportedKey(tagged.tag.to_string())),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn expands_ref_and_get_att() {
        let v = parse_yaml(
            "Resources:\n  Fn:\n    Type: AWS::Lambda::Function\n    Properties:\n      Role: !GetAtt Role.Arn\n      Bucket: !Ref Bucket\n",
        )
        .expect("parses");
        assert_eq!(
            v["Resources"]["Fn"]["Properties"],
            json!({
                "Role": {"Fn::GetAtt": ["Role", "Arn"]},
                "Bucket": {"Ref": "Bucket"}
            })
        );
    }

    #[test]
    fn expands_nested_short_forms() {
        let v = parse_yaml("Value: !Join ['-', [!Ref Env, !Sub '${Env}-x']]\n")
            .expect("parses");
        assert_eq!(
            v["Value"],
            json!({"Fn::Join": ["-", [{"Ref": "Env"}, {"Fn::Sub": "${Env}-x"}]]})
        );
    }

    #[test]
    fn get_att_list_form_is_kept() {
        let v = parse_yaml("A: !GetAtt [Role, Arn]\n").expect("parses");
        assert_eq!(v["A"], json!({"Fn::GetAtt": ["Role", "Arn"]}));
    }

    #[test]
    fn condition_tag() {
        let v = parse_yaml("C: !And [!Condition IsProd, !Equals [a, b]]\n").expect("parses");
        assert_eq!(
            v["C"],
            json!({"Fn::And": [{"Condition": "IsProd"}, {"Fn::Equals": ["a", "b"]}]})
        );
    }

    #[test]
    fn transform_short_form() {
        let v = parse_yaml("T: !Transform {Name: AWS::Include, Parameters: {Location: s3://b/k}}\n")
            .expect("parses");
        assert_eq!(
            v["T"],
            json!({"Fn::Transform": {"Name": "AWS::Include", "Parameters": {"Location": "s3://b/k"}}})
        );
    }

    #[test]
    fn non_finite_numbers_keep_their_text() {
        let v = parse_yaml("a: .inf\nb: -.inf\nc: .nan\nd: 1.5\n").expect("parses");
        assert_eq!(v["a"], json!(".inf"));
        assert_eq!(v["b"], json!("-.inf"));
        assert_eq!(v["c"], json!(".nan"));
        assert_eq!(v["d"], json!(1.5));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = parse_yaml("A: !Frobnicate x\n").expect_err("rejected");
        assert_eq!(err, TemplateError::UnsupportedTag("Frobnicate".to_owned()));
    }

    #[test]
    fn scalar_keys_are_stringified() {
        let v = parse_yaml("Mappings:\n  M:\n    1: {a: true}\n").expect("parses");
        assert_eq!(v["Mappings"]["M"]["1"], json!({"a": true}));
    }

    #[test]
    fn syntax_errors_are_reported() {
        let err = parse_yaml("a: [unclosed").expect_err("invalid");
        assert!(matches!(err, TemplateError::Yaml(_)));
    }
}

//! Template assembly: parameters, resources with links to earlier
//! resources, and outputs.

use std::collections::BTreeMap;

use rand::Rng;
use rand::rngs::StdRng;
use serde_json::{Map, Value, json};

use super::GeneratorConfig;
use super::catalog::{KINDS, LinkStyle, ResourceKind};

const REGIONS: &[&str] = &["us-east-1", "eu-west-1", "ap-southeast-2"];

/// Builds a complete template value from the generator configuration.
pub fn build_template(config: &GeneratorConfig, rng: &mut StdRng) -> Value {
    let parameters = build_parameters(config.num_parameters);
    let parameter_names: Vec<String> = parameters.keys().cloned().collect();

    // Logical IDs already emitted, grouped by resource type.
    let mut by_type: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    let mut resources = Map::new();
    for i in 0..config.num_resources {
        let kind = &KINDS[rng.gen_range(0..KINDS.len())];
        let logical_id = format!("{}{i}", kind.id_prefix);
        let name = name_value(kind, i, config.deferred_fraction, &parameter_names, rng);
        let resource = build_resource(kind, name, config.reference_density, &by_type, rng);
        by_type
            .entry(kind.type_name)
            .or_default()
            .push(logical_id.clone());
        resources.insert(logical_id, resource);
    }

    let outputs = build_outputs(&resources, config.num_outputs, rng);

    let mut template = Map::new();
    template.insert("AWSTemplateFormatVersion".to_owned(), json!("2010-09-09"));
    template.insert(
        "Description".to_owned(),
        json!(format!("generated template (seed {})", config.seed)),
    );
    if !parameters.is_empty() {
        template.insert("Parameters".to_owned(), Value::Object(parameters));
    }
    let region_map: Map<String, Value> = REGIONS
        .iter()
        .map(|r| ((*r).to_owned(), json!({"Ami": format!("ami-{r}")})))
        .collect();
    template.insert("Mappings".to_owned(), json!({"RegionMap": region_map}));
    template.insert("Resources".to_owned(), Value::Object(resources));
    if !outputs.is_empty() {
        template.insert("Outputs".to_owned(), Value::Object(outputs));
    }
    Value::Object(template)
}

fn build_parameters(count: usize) -> Map<String, Value> {
    (0..count)
        .map(|i| {
            (
                format!("Param{i}"),
                json!({"Type": "String", "Default": format!("value-{i}")}),
            )
        })
        .collect()
}

/// Builds one resource of `kind`, linking it to resources in `by_type`.
pub fn build_resource(
    kind: &ResourceKind,
    name: Value,
    reference_density: f64,
    by_type: &BTreeMap<&'static str, Vec<String>>,
    rng: &mut StdRng,
) -> Value {
    let mut properties = Map::new();
    properties.insert(kind.name_property.to_owned(), name);
    properties.insert(
        kind.mutable_property.to_owned(),
        mutable_value(rng.gen_range(1..=100)),
    );
    for link in kind.links {
        let Some(targets) = by_type.get(link.target_type) else {
            continue;
        };
        if targets.is_empty() || !rng.gen_bool(reference_density) {
            continue;
        }
        let target = &targets[rng.gen_range(0..targets.len())];
        properties.insert(link.property.to_owned(), reference(target, link.style));
    }
    json!({"Type": kind.type_name, "Properties": properties})
}

fn name_value(
    kind: &ResourceKind,
    index: usize,
    deferred_fraction: f64,
    parameter_names: &[String],
    rng: &mut StdRng,
) -> Value {
    let literal = literal_name(kind, &index.to_string());
    if !rng.gen_bool(deferred_fraction) {
        return json!(literal);
    }
    let prefix = if parameter_names.is_empty() || rng.gen_bool(0.5) {
        "AWS::StackName"
    } else {
        parameter_names[rng.gen_range(0..parameter_names.len())].as_str()
    };
    json!({"Fn::Join": ["-", [{"Ref": prefix}, literal]]})
}

/// A physical name known before deployment, e.g. `queue-12`.
pub fn literal_name(kind: &ResourceKind, suffix: &str) -> String {
    format!("{}-{suffix}", kind.id_prefix.to_lowercase())
}

/// Value of a mutable property, parameterised so mutations can bump it.
pub fn mutable_value(n: u32) -> Value {
    json!([{"Key": "Revision", "Value": n}])
}

/// The intrinsic that refers to `logical_id` in the given style.
pub fn reference(logical_id: &str, style: LinkStyle) -> Value {
    match style {
        LinkStyle::Ref => json!({"Ref": logical_id}),
        LinkStyle::GetAtt(attribute) => json!({"Fn::GetAtt": [logical_id, attribute]}),
    }
}

fn build_outputs(
    resources: &Map<String, Value>,
    count: usize,
    rng: &mut StdRng,
) -> Map<String, Value> {
    let ids: Vec<&String> = resources.keys().collect();
    if ids.is_empty() {
        return Map::new();
    }
    (0..count)
        .map(|i| {
            let id = ids[rng.gen_range(0..ids.len())];
            let value = if rng.gen_bool(0.5) {
                json!({"Ref": id})
            } else {
                json!({"Fn::GetAtt": [id, "Arn"]})
            };
            (format!("Output{i}"), json!({"Value": value}))
        })
        .collect()
}

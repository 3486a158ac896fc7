//! Integration tests: load template fixtures and diff them end to end.
//!
//! The old template is YAML with short-form intrinsics; the new one is JSON.
//! Both go through [`TemplateDocument`] and the default (built-in) resource
//! specification.
#![allow(clippy::expect_used)]

use std::path::PathBuf;

use cfndiff_core::{
    Change, DiffConfig, ResourceDifference, ResourceImpact, Section, TemplateDiff,
    TemplateDocument, diff_documents,
};
use serde_json::json;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .canonicalize()
        .expect("fixtures directory should exist")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path).expect("fixture file should be readable")
}

fn old_template() -> TemplateDocument {
    TemplateDocument::from_yaml_str(&read_fixture("network-old.yaml"))
        .expect("old fixture should load")
}

fn new_template() -> TemplateDocument {
    TemplateDocument::from_json_str(&read_fixture("network-new.json"))
        .expect("new fixture should load")
}

fn network_diff() -> TemplateDiff {
    diff_documents(&old_template(), &new_template(), &DiffConfig::default())
}

fn impact(d: &TemplateDiff, id: &str) -> ResourceImpact {
    d.resources
        .get(id)
        .map_or(ResourceImpact::NoChange, ResourceDifference::change_impact)
}

/// Short forms in the YAML fixture expand to their long JSON form.
#[test]
fn yaml_fixture_expands_short_forms() {
    let old = old_template();
    let subnet = old.resource("Subnet").expect("Subnet declared");
    assert_eq!(subnet.resource_type, "AWS::EC2::Subnet");
    assert_eq!(subnet.properties["VpcId"], json!({"Ref": "Vpc"}));
    assert_eq!(
        subnet.properties["AvailabilityZone"],
        json!({"Fn::Select": [0, {"Fn::GetAZs": ""}]})
    );
    assert_eq!(
        old.section(&Section::Outputs).expect("outputs")["QueueArn"],
        json!({"Value": {"Fn::GetAtt": ["Queue", "Arn"]}})
    );
}

/// Loading a fixture and diffing it against itself finds nothing.
#[test]
fn fixture_self_diff_is_empty() {
    let old = old_template();
    let d = diff_documents(&old, &old, &DiffConfig::default());
    assert!(d.is_empty());
    assert_eq!(d.iterations, 1);
}

/// The VPC's CIDR change replaces it, and everything attached to the VPC by
/// an immutable `VpcId` is replaced with it.
#[test]
fn vpc_replacement_cascades() {
    let d = network_diff();
    assert_eq!(impact(&d, "Vpc"), ResourceImpact::WillReplace);
    assert_eq!(impact(&d, "Subnet"), ResourceImpact::WillReplace);
    assert_eq!(impact(&d, "SecurityGroup"), ResourceImpact::WillReplace);
    assert_eq!(d.iterations, 2);

    let vpc_id = &d.resources.get("Subnet").expect("Subnet").property_updates["VpcId"];
    assert_eq!(vpc_id.new_value, Some(json!({"Ref": "Vpc(replaced)"})));
}

/// A queue name built from a pseudo parameter cannot be judged before
/// deployment.
#[test]
fn deferred_queue_name_may_replace() {
    let d = network_diff();
    let queue = d.resources.get("Queue").expect("Queue");
    assert_eq!(queue.change_impact(), ResourceImpact::MayReplace);
    assert_eq!(
        queue.property_updates["VisibilityTimeout"].change_impact,
        ResourceImpact::WillUpdate
    );
    assert!(!d.outputs.contains("QueueArn"));
}

#[test]
fn additions_removals_and_updates() {
    let d = network_diff();
    assert_eq!(impact(&d, "Bucket"), ResourceImpact::WillUpdate);
    assert_eq!(impact(&d, "Topic"), ResourceImpact::WillCreate);
    assert_eq!(impact(&d, "LegacyTopic"), ResourceImpact::WillDestroy);
    assert!(d.resources.get("Topic").expect("Topic").is_addition());
    assert!(d.description.is_some());
    assert!(d.parameters.is_empty());
    assert!(d.conditions.is_empty());
    assert!(d.outputs.get("VpcId").expect("VpcId").is_update());
}

#[test]
fn summary_counts() {
    let summary = network_diff().summary();
    assert_eq!(summary.resources_replaced, 3);
    assert_eq!(summary.resources_may_replace, 1);
    assert_eq!(summary.resources_updated, 1);
    assert_eq!(summary.resources_added, 1);
    assert_eq!(summary.resources_removed, 1);
    assert_eq!(summary.outputs, 1);
    assert_eq!(summary.scalar_changes, 1);
}

#[test]
fn replacements_are_listed_in_order() {
    let d = network_diff();
    assert_eq!(
        d.replacements(),
        vec!["Queue", "SecurityGroup", "Subnet", "Vpc"]
    );
}

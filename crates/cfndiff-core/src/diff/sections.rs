use std::borrow::Cow;
use std::collections::BTreeSet;

use serde_json::{Map, Value};

use super::collection::DifferenceCollection;
use super::engine::DiffConfig;
use super::keyed::{compare_plain, diff_keyed_entities};
use super::resource::diff_resource_in_scope;
use super::template_diff::TemplateDiff;
use super::types::{Change, Difference};
use crate::template::{Resource, Section};
use crate::value::{DeferredScope, deep_equal, values_equal};

/// Inputs shared by every section comparator during one comparison round.
pub(crate) struct SectionContext<'c> {
    pub(crate) config: &'c DiffConfig<'c>,
    pub(crate) scope: &'c DeferredScope,
}

/// A section comparator. Writes its findings into the [`TemplateDiff`].
pub(crate) type SectionComparator =
    fn(&Section, Option<&Value>, Option<&Value>, &SectionContext<'_>, &mut TemplateDiff);

/// The dispatch table: every section maps to exactly one comparator, and
/// unrecognised keys fall through to the generic one.
pub(crate) fn comparator_for(section: &Section) -> SectionComparator {
    match section {
        Section::AwsTemplateFormatVersion | Section::Description | Section::Transform => {
            diff_scalar_section
        }
        Section::Parameters
        | Section::Mappings
        | Section::Conditions
        | Section::Outputs
        | Section::Metadata => diff_plain_section,
        Section::Resources => diff_resources_section,
        Section::Unknown(_) => diff_unknown_section,
    }
}

/// Runs one full comparison round over every top-level key of either
/// template, in key order. Sections that are structurally equal are skipped.
pub(crate) fn compare_sections(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    ctx: &SectionContext<'_>,
) -> TemplateDiff {
    let mut diff = TemplateDiff::default();
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    for key in keys {
        let (old_section, new_section) = (old.get(key), new.get(key));
        if deep_equal(old_section, new_section) {
            continue;
        }
        let section = Section::from_key(key);
        comparator_for(&section)(&section, old_section, new_section, ctx, &mut diff);
    }
    diff
}

// ---------------------------------------------------------------------------
// Comparators
// ---------------------------------------------------------------------------

fn diff_scalar_section(
    section: &Section,
    old: Option<&Value>,
    new: Option<&Value>,
    _ctx: &SectionContext<'_>,
    diff: &mut TemplateDiff,
) {
    let change = Difference::between(old, new);
    match scalar_slot(diff, section) {
        Some(slot) => *slot = change,
        None => record_unknown(diff, section, change),
    }
}

fn diff_plain_section(
    section: &Section,
    old: Option<&Value>,
    new: Option<&Value>,
    ctx: &SectionContext<'_>,
    diff: &mut TemplateDiff,
) {
    let (Some(old_entities), Some(new_entities)) = (entities(old), entities(new)) else {
        diff_unknown_section(section, old, new, ctx, diff);
        return;
    };
    let changes = diff_keyed_entities(&old_entities, &new_entities, compare_plain);
    match plain_slot(diff, section) {
        Some(slot) => *slot = changes,
        None => record_unknown(diff, section, Difference::between(old, new)),
    }
}

fn diff_resources_section(
    section: &Section,
    old: Option<&Value>,
    new: Option<&Value>,
    ctx: &SectionContext<'_>,
    diff: &mut TemplateDiff,
) {
    let (Some(old_entities), Some(new_entities)) = (entities(old), entities(new)) else {
        diff_unknown_section(section, old, new, ctx, diff);
        return;
    };
    diff.resources = diff_keyed_entities(&old_entities, &new_entities, |id, o, n| {
        if values_equal(o, n) {
            return None;
        }
        let change = diff_resource_in_scope(
            id,
            &Resource::from_value(o),
            &Resource::from_value(n),
            ctx.config,
            ctx.scope,
        );
        change.is_different().then_some(change)
    });
}

fn diff_unknown_section(
    section: &Section,
    old: Option<&Value>,
    new: Option<&Value>,
    _ctx: &SectionContext<'_>,
    diff: &mut TemplateDiff,
) {
    record_unknown(diff, section, Difference::between(old, new));
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn record_unknown(diff: &mut TemplateDiff, section: &Section, change: Option<Difference<Value>>) {
    if let Some(change) = change {
        diff.unknown.insert(section.as_key(), change);
    }
}

/// Reads a keyed section. Absent and `null` are empty; any other non-object
/// shape yields `None`.
fn entities(value: Option<&Value>) -> Option<Cow<'_, Map<String, Value>>> {
    match value {
        None | Some(Value::Null) => Some(Cow::Owned(Map::new())),
        Some(Value::Object(map)) => Some(Cow::Borrowed(map)),
        Some(Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Array(_)) => None,
    }
}

fn scalar_slot<'d>(
    diff: &'d mut TemplateDiff,
    section: &Section,
) -> Option<&'d mut Option<Difference<Value>>> {
    match section {
        Section::AwsTemplateFormatVersion => Some(&mut diff.aws_template_format_version),
        Section::Description => Some(&mut diff.description),
        Section::Transform => Some(&mut diff.transform),
        Section::Parameters
        | Section::Mappings
        | Section::Conditions
        | Section::Resources
        | Section::Outputs
        | Section::Metadata
        | Section::Unknown(_) => None,
    }
}

fn plain_slot<'d>(
    diff: &'d mut TemplateDiff,
    section: &Section,
) -> Option<&'d mut DifferenceCollection<Difference<Value>>> {
    match section {
        Section::Parameters => Some(&mut diff.parameters),
        Section::Mappings => Some(&mut diff.mappings),
        Section::Conditions => Some(&mut diff.conditions),
        Section::Outputs => Some(&mut diff.outputs),
        Section::Metadata => Some(&mut diff.metadata),
        Section::AwsTemplateFormatVersion
        | Section::Description
        | Section::Transform
        | Section::Resources
        | Section::Unknown(_) => None,
    }
}

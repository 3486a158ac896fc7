use serde::Serialize;
use serde_json::Value;

use super::collection::DifferenceCollection;
use super::types::{Change, Difference, ResourceDifference, ResourceImpact};
use crate::template::Section;

/// Summary statistics for a template diff.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DiffSummary {
    /// Number of changed scalar sections (`AWSTemplateFormatVersion`,
    /// `Description`, `Transform`).
    pub scalar_changes: usize,
    /// Number of changed parameters.
    pub parameters: usize,
    /// Number of changed mappings.
    pub mappings: usize,
    /// Number of changed conditions.
    pub conditions: usize,
    /// Number of changed outputs.
    pub outputs: usize,
    /// Number of changed template metadata entries.
    pub metadata: usize,
    /// Number of changed unrecognised sections.
    pub unknown: usize,
    /// Resources with impact [`ResourceImpact::WillCreate`].
    pub resources_added: usize,
    /// Resources with impact [`ResourceImpact::WillDestroy`].
    pub resources_removed: usize,
    /// Resources with impact [`ResourceImpact::WillUpdate`].
    pub resources_updated: usize,
    /// Resources with impact [`ResourceImpact::MayReplace`].
    pub resources_may_replace: usize,
    /// Resources with impact [`ResourceImpact::WillReplace`].
    pub resources_replaced: usize,
}

/// The complete result of diffing two templates.
///
/// Each recognised section has its own field; anything else lands in
/// [`unknown`](Self::unknown). Collections only hold entries that differ, so
/// diffing a template against itself yields a value for which
/// [`is_empty`](Self::is_empty) is `true`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDiff {
    /// Change to `AWSTemplateFormatVersion`.
    pub aws_template_format_version: Option<Difference<Value>>,
    /// Change to `Description`.
    pub description: Option<Difference<Value>>,
    /// Change to `Transform`.
    pub transform: Option<Difference<Value>>,
    /// Changed parameters.
    pub parameters: DifferenceCollection<Difference<Value>>,
    /// Changed mappings.
    pub mappings: DifferenceCollection<Difference<Value>>,
    /// Changed conditions.
    pub conditions: DifferenceCollection<Difference<Value>>,
    /// Changed resources, with impact classification.
    pub resources: DifferenceCollection<ResourceDifference>,
    /// Changed outputs.
    pub outputs: DifferenceCollection<Difference<Value>>,
    /// Changed template metadata entries.
    pub metadata: DifferenceCollection<Difference<Value>>,
    /// Changed top-level keys the engine does not recognise, keyed by the
    /// top-level key.
    pub unknown: DifferenceCollection<Difference<Value>>,
    /// Number of fixed-point rounds the engine ran to produce this diff.
    ///
    /// Always at least 1; each extra round follows a reference rewrite.
    pub iterations: usize,
}

impl TemplateDiff {
    fn scalars(&self) -> [&Option<Difference<Value>>; 3] {
        [
            &self.aws_template_format_version,
            &self.description,
            &self.transform,
        ]
    }

    fn plain_collections(&self) -> [&DifferenceCollection<Difference<Value>>; 6] {
        [
            &self.parameters,
            &self.mappings,
            &self.conditions,
            &self.outputs,
            &self.metadata,
            &self.unknown,
        ]
    }

    /// Total number of changed entities across all sections.
    pub fn difference_count(&self) -> usize {
        let scalars = self.scalars().iter().filter(|d| d.is_some()).count();
        let plain: usize = self
            .plain_collections()
            .iter()
            .map(|c| c.difference_count())
            .sum();
        scalars + plain + self.resources.difference_count()
    }

    /// Returns `true` if the two templates are semantically identical.
    pub fn is_empty(&self) -> bool {
        self.difference_count() == 0
    }

    /// Returns `true` if any resource may be or will be replaced.
    pub fn has_replacements(&self) -> bool {
        self.resources
            .iter()
            .any(|(_, d)| d.change_impact().is_replacement())
    }

    /// Logical IDs of resources that may be or will be replaced, in order.
    pub fn replacements(&self) -> Vec<&str> {
        self.resources_with(ResourceImpact::is_replacement)
    }

    /// Logical IDs of resources whose impact satisfies `predicate`.
    pub fn resources_with<P>(&self, predicate: P) -> Vec<&str>
    where
        P: Fn(ResourceImpact) -> bool,
    {
        self.resources
            .iter()
            .filter(|(_, d)| predicate(d.change_impact()))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Returns a summary of the diff.
    pub fn summary(&self) -> DiffSummary {
        let count = |impact: ResourceImpact| {
            self.resources
                .iter()
                .filter(|(_, d)| d.change_impact() == impact)
                .count()
        };
        DiffSummary {
            scalar_changes: self.scalars().iter().filter(|d| d.is_some()).count(),
            parameters: self.parameters.difference_count(),
            mappings: self.mappings.difference_count(),
            conditions: self.conditions.difference_count(),
            outputs: self.outputs.difference_count(),
            metadata: self.metadata.difference_count(),
            unknown: self.unknown.difference_count(),
            resources_added: count(ResourceImpact::WillCreate),
            resources_removed: count(ResourceImpact::WillDestroy),
            resources_updated: count(ResourceImpact::WillUpdate),
            resources_may_replace: count(ResourceImpact::MayReplace),
            resources_replaced: count(ResourceImpact::WillReplace),
        }
    }

    /// Resources whose change is an addition, update, or removal, in the
    /// fixed addition → update → removal order.
    pub fn resource_changes(&self) -> Vec<(&str, &ResourceDifference)> {
        let mut out = Vec::with_capacity(self.resources.len());
        out.extend(self.resources.additions());
        out.extend(self.resources.updates().filter(|(_, d)| d.is_different()));
        out.extend(self.resources.removals());
        out
    }

    /// Differences for a keyed section without replacement semantics.
    ///
    /// Returns `None` for scalar sections, `Resources`, and unknown keys.
    pub fn section_differences(
        &self,
        section: &Section,
    ) -> Option<&DifferenceCollection<Difference<Value>>> {
        match section {
            Section::Parameters => Some(&self.parameters),
            Section::Mappings => Some(&self.mappings),
            Section::Conditions => Some(&self.conditions),
            Section::Outputs => Some(&self.outputs),
            Section::Metadata => Some(&self.metadata),
            Section::AwsTemplateFormatVersion
            | Section::Description
            | Section::Transform
            | Section::Resources
            | Section::Unknown(_) => None,
        }
    }

    /// The resource differences, for symmetry with
    /// [`section_differences`](Self::section_differences).
    pub fn resource_differences(&self) -> &DifferenceCollection<ResourceDifference> {
        &self.resources
    }
}

use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;

use super::propagate::propagate_in_document;
use super::sections::{SectionContext, compare_sections};
use super::template_diff::TemplateDiff;
use super::types::ResourceImpact;
use crate::resource_spec::{ResourceSpecLookup, ResourceSpecification};
use crate::template::TemplateDocument;
use crate::value::{DeferredScope, kind_name};

// ---------------------------------------------------------------------------
// DiffConfig
// ---------------------------------------------------------------------------

/// Configuration for a diff run.
#[derive(Clone, Copy)]
pub struct DiffConfig<'a> {
    /// Source of replacement metadata for resource properties.
    ///
    /// Defaults to [`ResourceSpecification::builtin`].
    pub resource_spec: &'a dyn ResourceSpecLookup,
    /// When `true` (the default), a change to an immutable property whose old
    /// or new value is only known at deploy time is reported as
    /// [`ResourceImpact::MayReplace`] instead of
    /// [`ResourceImpact::WillReplace`].
    pub treat_deferred_as_may_replace: bool,
}

impl Default for DiffConfig<'static> {
    fn default() -> Self {
        Self {
            resource_spec: ResourceSpecification::builtin(),
            treat_deferred_as_may_replace: true,
        }
    }
}

impl DiffConfig<'_> {
    /// Replaces the resource specification, keeping every other setting.
    pub fn with_resource_spec<'b>(
        self,
        resource_spec: &'b dyn ResourceSpecLookup,
    ) -> DiffConfig<'b> {
        DiffConfig {
            resource_spec,
            treat_deferred_as_may_replace: self.treat_deferred_as_may_replace,
        }
    }
}

impl fmt::Debug for DiffConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffConfig")
            .field("resource_spec", &"<dyn ResourceSpecLookup>")
            .field(
                "treat_deferred_as_may_replace",
                &self.treat_deferred_as_may_replace,
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// DiffError
// ---------------------------------------------------------------------------

/// Which of the two input templates an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSide {
    /// The baseline template.
    Old,
    /// The target template.
    New,
}

impl fmt::Display for TemplateSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Old => f.write_str("old"),
            Self::New => f.write_str("new"),
        }
    }
}

/// Errors returned by [`diff_template`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// One of the inputs is not a JSON object at the top level.
    NotAnObject {
        /// The offending input.
        side: TemplateSide,
        /// JSON kind found instead (`"array"`, `"string"`, ...).
        found: &'static str,
    },
}

impl fmt::Display for DiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject { side, found } => {
                write!(f, "{side} template must be a JSON object, got {found}")
            }
        }
    }
}

impl std::error::Error for DiffError {}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Compares two templates using the default configuration.
///
/// `old` is the baseline (e.g. the deployed stack); `new` is the target.
/// Neither input is modified.
///
/// # Errors
///
/// Returns [`DiffError::NotAnObject`] if either input is not a JSON object.
pub fn diff_template(old: &Value, new: &Value) -> Result<TemplateDiff, DiffError> {
    diff_template_with(old, new, &DiffConfig::default())
}

/// Compares two templates with an explicit configuration.
///
/// # Algorithm
///
/// 1. Deep-copy `new` into a working copy.
/// 2. Compare every top-level section of `old` against the working copy.
/// 3. For every resource classified [`ResourceImpact::WillReplace`], rewrite
///    references to it in the working copy (see [`crate::diff::propagate`]).
/// 4. If anything was rewritten, discard the round's result and go back to
///    step 2; otherwise return it.
///
/// Every rewrite consumes a reference that can never match again, so the
/// loop runs at most one round more than the template has references.
///
/// # Errors
///
/// Returns [`DiffError::NotAnObject`] if either input is not a JSON object.
pub fn diff_template_with(
    old: &Value,
    new: &Value,
    config: &DiffConfig<'_>,
) -> Result<TemplateDiff, DiffError> {
    let old = as_template(old, TemplateSide::Old)?;
    let new = as_template(new, TemplateSide::New)?;
    Ok(diff_maps(old, new, config))
}

/// Compares two already-loaded template documents.
pub fn diff_documents(
    old: &TemplateDocument,
    new: &TemplateDocument,
    config: &DiffConfig<'_>,
) -> TemplateDiff {
    diff_maps(old.as_map(), new.as_map(), config)
}

fn as_template(value: &Value, side: TemplateSide) -> Result<&Map<String, Value>, DiffError> {
    value.as_object().ok_or_else(|| DiffError::NotAnObject {
        side,
        found: kind_name(value),
    })
}

fn diff_maps(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    config: &DiffConfig<'_>,
) -> TemplateDiff {
    let scope = DeferredScope::from_templates(old, new);
    let ctx = SectionContext {
        config,
        scope: &scope,
    };
    let mut working = TemplateDocument::from(new.clone());

    let mut iteration = 0;
    loop {
        iteration += 1;
        let mut diff = compare_sections(old, working.as_map(), &ctx);

        let replaced: Vec<String> = diff
            .resources_with(|impact| impact == ResourceImpact::WillReplace)
            .into_iter()
            .map(str::to_owned)
            .collect();
        let rewrites: usize = replaced
            .iter()
            .map(|logical_id| propagate_in_document(&mut working, logical_id))
            .sum();

        debug!(
            iteration,
            replaced = replaced.len(),
            rewrites,
            "diff iteration complete"
        );
        if rewrites == 0 {
            diff.iterations = iteration;
            return diff;
        }
    }
}

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod diff;
pub mod resource_spec;
pub mod template;
pub mod value;

pub use diff::{
    Change, ChangeKind, DiffConfig, DiffError, DiffSummary, Difference, DifferenceCollection,
    EntityDiff, PropertyDifference, REPLACED_SUFFIX, ResourceDifference, ResourceImpact,
    TemplateDiff, TemplateSide, diff_documents, diff_keyed_entities, diff_resource,
    diff_template, diff_template_with, propagate_replaced_references, replaced_sentinel,
};
pub use resource_spec::{ResourceSpecError, ResourceSpecLookup, ResourceSpecification, UpdateType};
pub use template::{Resource, Section, TemplateDocument, TemplateError};
pub use value::{DeferredScope, deep_equal};

/// Returns the current version of the cfndiff-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

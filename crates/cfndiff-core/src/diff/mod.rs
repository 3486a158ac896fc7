//! Semantic diff engine for CloudFormation templates.
//!
//! Two templates are compared section by section. Every recognised section
//! has its own comparator, picked from a static dispatch table; unrecognised
//! top-level keys are diffed as whole values.
//!
//! # Resource impact
//!
//! Resources are compared property by property against an injected
//! [`ResourceSpecLookup`](crate::resource_spec::ResourceSpecLookup), and every
//! changed resource is classified with a [`ResourceImpact`]. See
//! [`diff_resource`] for the classification table.
//!
//! # Replacement cascades
//!
//! A replaced resource gets a new physical identity, so everything that
//! references it changes too. [`diff_template`] rewrites those references in
//! a private copy of the new template (see [`propagate`]) and re-runs the
//! comparison until no further reference changes, so second-order
//! replacements are reported. [`TemplateDiff::iterations`] records how many
//! rounds that took.
//!
//! # Determinism
//!
//! Every collection in the result is ordered by logical name, and sections
//! are visited in key order, so the same pair of templates always produces
//! the same result.

pub mod collection;
pub mod engine;
pub mod keyed;
pub mod propagate;
pub mod resource;
mod sections;
pub mod template_diff;
pub mod types;

pub use collection::DifferenceCollection;
pub use engine::{
    DiffConfig, DiffError, TemplateSide, diff_documents, diff_template, diff_template_with,
};
pub use keyed::{EntityDiff, diff_keyed_entities};
pub use propagate::{REPLACED_SUFFIX, propagate_replaced_references, replaced_sentinel};
pub use resource::diff_resource;
pub use template_diff::{DiffSummary, TemplateDiff};
pub use types::{
    Change, ChangeKind, Difference, PropertyDifference, ResourceDifference, ResourceImpact,
};

#[cfg(test)]
mod tests;

//! Template generator and benchmark utilities for cfndiff.
//!
//! This crate provides deterministic generation of realistic CloudFormation
//! templates, and mutations of them, for benchmarking and property-based
//! testing of `cfndiff-core`.

pub mod correctness;
pub mod generator;

pub use generator::{GeneratorConfig, MutationConfig, SizeTier, generate_template, mutate_template};

//! CloudFormation template generator.
//!
//! Produces template values with realistic reference chains (VPCs feeding
//! subnets and security groups, roles feeding functions and task
//! definitions) for benchmarking the diff engine.

pub mod catalog;
pub mod mutations;
pub mod resources;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;

pub use mutations::{MutationConfig, mutate_template};
use resources::build_template;

/// Configuration for the template generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Seed for the random number generator (deterministic).
    pub seed: u64,
    /// Number of resources in the `Resources` section.
    pub num_resources: usize,
    /// Number of string parameters.
    pub num_parameters: usize,
    /// Number of outputs referencing generated resources.
    pub num_outputs: usize,
    /// Probability that a resource links to an earlier resource when its
    /// kind has a link slot (0.0-1.0).
    pub reference_density: f64,
    /// Fraction of name properties built from parameters or pseudo
    /// parameters, whose values are only known at deploy time (0.0-1.0).
    pub deferred_fraction: f64,
}

/// Predefined size tiers for benchmarking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTier {
    /// ~20 resources, ~10KB JSON
    Small,
    /// ~200 resources, ~100KB JSON
    Medium,
    /// ~1000 resources, ~500KB JSON
    Large,
    /// ~5000 resources, ~2.5MB JSON
    XLarge,
}

impl SizeTier {
    /// Returns the default `GeneratorConfig` for this size tier.
    pub fn config(self, seed: u64) -> GeneratorConfig {
        match self {
            SizeTier::Small => GeneratorConfig {
                seed,
                num_resources: 20,
                num_parameters: 3,
                num_outputs: 4,
                reference_density: 0.8,
                deferred_fraction: 0.1,
            },
            SizeTier::Medium => GeneratorConfig {
                seed,
                num_resources: 200,
                num_parameters: 8,
                num_outputs: 20,
                reference_density: 0.8,
                deferred_fraction: 0.1,
            },
            SizeTier::Large => GeneratorConfig {
                seed,
                num_resources: 1000,
                num_parameters: 16,
                num_outputs: 60,
                reference_density: 0.85,
                deferred_fraction: 0.15,
            },
            SizeTier::XLarge => GeneratorConfig {
                seed,
                num_resources: 5000,
                num_parameters: 32,
                num_outputs: 200,
                reference_density: 0.9,
                deferred_fraction: 0.15,
            },
        }
    }
}

/// Generates a CloudFormation template from the given configuration.
///
/// All randomness is deterministic, seeded from `config.seed`.
pub fn generate_template(config: &GeneratorConfig) -> Value {
    let mut rng = StdRng::seed_from_u64(config.seed);
    build_template(config, &mut rng)
}

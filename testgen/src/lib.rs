//! Classification-tree test generation for CCTM
//!
//! This crate turns a parsed classification tree into test cases:
//! - Normalizes ingested trees into the canonical shape
//! - Merges uploads into a stored baseline, coarsening numeric buckets
//! - Diffs versions and derives impact rules
//! - Builds partitions with one representative sample per class
//! - Generates the full cartesian product, or samples above a threshold
//! - Caps and deduplicates the result

pub mod builder;
pub mod config;
pub mod diff;
pub mod ecp;
pub mod generator;
pub mod merge;
pub mod partition;
pub mod reducer;
pub mod report;
pub mod telemetry;
pub mod types;

pub use builder::TreeBuilder;
pub use config::GenerationConfig;
pub use diff::{compare, ChangeKind, DiffReport, DiffSummary, Impact, ImpactRule, ImpactTrigger};
pub use ecp::EcpBoundaryGenerator;
pub use generator::{estimate_size, CombinatorialGenerator, Generation};
pub use merge::{merge, MergeOutcome};
pub use reducer::{reduce, reduce_by, Reduction};
pub use report::ReportGenerator;
pub use telemetry::init_tracing;
pub use types::*;

use cctm_core::{case_id, ClassificationTree, TestCase};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// The previously stored tree a request is compared against
#[derive(Debug, Clone, Default)]
pub enum Baseline {
    /// First upload; nothing to merge or diff.
    #[default]
    None,
    Tree(ClassificationTree),
    /// A JSON snapshot as written by an earlier run.
    Serialized(String),
}

/// Main entry point for the test generator
pub struct TestGenerator {
    pub config: GenerationConfig,
    pub rng: StdRng,
}

impl TestGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    /// Parse classification-tree XML and generate test cases for it
    pub fn generate(&mut self, xml: &str, baseline: Baseline) -> Result<GenerationOutcome, TestGenError> {
        let parsed = cctm_parser::parse(xml)?;
        self.generate_from_tree(&parsed, baseline)
    }

    pub fn generate_from_tree(
        &mut self,
        parsed: &ClassificationTree,
        baseline: Baseline,
    ) -> Result<GenerationOutcome, TestGenError> {
        if self.config.threshold == 0 {
            return Err(TestGenError::Config("threshold must be positive".into()));
        }
        let builder = TreeBuilder::new();
        let tree = builder.build(parsed);
        let mut warnings = Vec::new();

        // 1. Resolve the baseline; a bad snapshot degrades to "first version"
        let prior = match resolve_baseline(baseline) {
            Ok(prior) => prior.map(|t| builder.build(&t)),
            Err(err) => {
                tracing::warn!(error = %err, "baseline unusable, treating upload as first version");
                warnings.push(Warning::DiffComputation {
                    detail: err.to_string(),
                });
                None
            }
        };

        // 2. Merge and diff against the baseline
        let (accumulated, diff) = match &prior {
            Some(prior) => {
                let outcome = merge::merge(prior, &tree);
                warnings.extend(outcome.warnings.into_iter().map(Warning::MergeConflict));
                (outcome.merged, Some(diff::compare(prior, &tree)))
            }
            None => (tree.clone(), None),
        };
        let source = match &diff {
            Some(report) if self.config.focus_on_changes => report.active_tree(),
            _ => accumulated.clone(),
        };

        // 3. Partitions and combinatorial generation
        let partitions = partition::build(&source.variables);
        let generation = CombinatorialGenerator::new(&partitions, &self.config).generate(&mut self.rng);
        if generation.strategy == GenerationStrategy::Sampled {
            warnings.push(Warning::GenerationOverflow {
                threshold: self.config.threshold,
            });
            if self.config.dedup_sampled && generation.test_cases.len() < self.config.threshold {
                warnings.push(Warning::SamplingShortfall {
                    requested: self.config.threshold,
                    produced: generation.test_cases.len(),
                });
            }
        }

        // 4. Keep only cases that touch changed classes
        let mut generated = generation.test_cases;
        if let Some(report) = diff.as_ref().filter(|_| self.config.focus_on_changes) {
            let changed = report.changed_class_ids();
            if changed.is_empty() {
                tracing::debug!("no changed classes, keeping all cases");
            } else {
                generated.retain(|tc| tc.meta.iter().any(|id| changed.contains(id)));
                renumber(&mut generated, 1);
            }
        }

        // 5. Safety-net reduction
        let cap = self.config.cap();
        let reduction = reducer::reduce(generated, cap);
        if reduction.cap_reached {
            warnings.push(Warning::ReductionCapReached {
                cap,
                dropped: reduction.dropped,
            });
        }
        let mut test_cases = reduction.test_cases;

        // 6. Boundary cases
        let mut boundary_cases = 0;
        if self.config.include_boundary_cases {
            let mut extra = EcpBoundaryGenerator::generate(&source, source.output.as_ref());
            boundary_cases = extra.len();
            renumber(&mut extra, test_cases.len() + 1);
            test_cases.append(&mut extra);
        }

        let invalid = test_cases.iter().filter(|tc| tc.is_invalid()).count();
        let stats = GenerationStats {
            strategy: generation.strategy,
            product_size: generation.product_size,
            duplicates_removed: generation.duplicates_removed + reduction.duplicates,
            boundary_cases,
            valid: test_cases.len() - invalid,
            invalid,
        };
        tracing::info!(
            cases = test_cases.len(),
            valid = stats.valid,
            invalid = stats.invalid,
            strategy = stats.strategy.as_str(),
            warnings = warnings.len(),
            "generation complete"
        );

        Ok(GenerationOutcome {
            tree: accumulated,
            partitions,
            test_cases,
            diff,
            warnings,
            stats,
            seed: self.config.seed,
        })
    }
}

fn resolve_baseline(baseline: Baseline) -> Result<Option<ClassificationTree>, TestGenError> {
    match baseline {
        Baseline::None => Ok(None),
        Baseline::Tree(tree) => Ok(Some(tree)),
        Baseline::Serialized(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| TestGenError::DiffComputation(format!("unreadable baseline snapshot: {}", e))),
    }
}

fn renumber(cases: &mut [TestCase], first: usize) {
    for (offset, tc) in cases.iter_mut().enumerate() {
        tc.id = case_id(first + offset);
    }
}

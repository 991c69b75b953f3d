//! Configuration for test generation

use serde::Deserialize;

/// Configuration for test generation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Largest cartesian product materialized in full
    pub threshold: usize,
    /// Random seed for the sampling branch
    pub seed: u64,
    /// Cap applied by the reducer; defaults to `threshold`
    pub reduction_cap: Option<usize>,
    /// Deduplicate sampled cases by input map
    pub dedup_sampled: bool,
    /// Sampling gives up after `threshold * factor` draws when deduplicating
    pub max_sampling_attempts_factor: usize,
    /// Keep only cases touching added or modified classes
    pub focus_on_changes: bool,
    /// Append underflow/overflow/none cases per variable
    pub include_boundary_cases: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            threshold: 10_000,
            seed: 42,
            reduction_cap: None,
            dedup_sampled: false,
            max_sampling_attempts_factor: 10,
            focus_on_changes: false,
            include_boundary_cases: false,
        }
    }
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_reduction_cap(mut self, cap: usize) -> Self {
        self.reduction_cap = Some(cap);
        self
    }

    pub fn with_dedup_sampled(mut self, dedup: bool) -> Self {
        self.dedup_sampled = dedup;
        self
    }

    pub fn with_focus_on_changes(mut self, focus: bool) -> Self {
        self.focus_on_changes = focus;
        self
    }

    pub fn with_boundary_cases(mut self, include: bool) -> Self {
        self.include_boundary_cases = include;
        self
    }

    /// Effective reducer cap.
    pub fn cap(&self) -> usize {
        self.reduction_cap.unwrap_or(self.threshold)
    }

    pub fn max_sampling_attempts(&self) -> usize {
        self.threshold
            .saturating_mul(self.max_sampling_attempts_factor.max(1))
    }

    pub fn minimal() -> Self {
        Self {
            threshold: 100,
            seed: 42,
            reduction_cap: None,
            dedup_sampled: true,
            max_sampling_attempts_factor: 10,
            focus_on_changes: false,
            include_boundary_cases: false,
        }
    }
}

//! Combinatorial test-case generation

use crate::config::GenerationConfig;
use crate::types::GenerationStrategy;
use cctm_core::{case_id, canonical_key, CaseKind, Inputs, Partition, PartitionItem, TestCase};
use rand::Rng;
use std::collections::HashSet;

/// Result of one generator run
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub test_cases: Vec<TestCase>,
    pub strategy: GenerationStrategy,
    /// Exact product size, absent when it exceeded the threshold
    pub product_size: Option<usize>,
    /// Combinations collapsed by the canonical-key dedup
    pub duplicates_removed: usize,
    /// Random draws made; zero for the full product
    pub attempts: usize,
}

/// Product of partition sizes, or `None` as soon as it passes `threshold`.
/// Never materializes the product.
pub fn estimate_size<'p>(
    partitions: impl IntoIterator<Item = &'p Partition>,
    threshold: usize,
) -> Option<usize> {
    let mut size: usize = 1;
    for partition in partitions {
        size = size.checked_mul(partition.len().max(1))?;
        if size > threshold {
            return None;
        }
    }
    Some(size)
}

/// Generates test cases from partitions
pub struct CombinatorialGenerator<'a> {
    partitions: &'a [Partition],
    config: &'a GenerationConfig,
}

impl<'a> CombinatorialGenerator<'a> {
    pub fn new(partitions: &'a [Partition], config: &'a GenerationConfig) -> Self {
        Self { partitions, config }
    }

    /// Full product when it fits under the threshold, random sampling otherwise.
    pub fn generate(&self, rng: &mut impl Rng) -> Generation {
        let partitions: Vec<&Partition> = self.partitions.iter().filter(|p| !p.is_empty()).collect();
        if partitions.is_empty() {
            return Generation {
                test_cases: Vec::new(),
                strategy: GenerationStrategy::Full,
                product_size: Some(0),
                duplicates_removed: 0,
                attempts: 0,
            };
        }

        let threshold = self.config.threshold;
        match estimate_size(partitions.iter().copied(), threshold) {
            Some(size) => {
                tracing::debug!(size, threshold, "materializing full product");
                self.full_product(&partitions, size)
            }
            None => {
                tracing::info!(threshold, "product exceeds threshold, sampling");
                self.sample(&partitions, rng)
            }
        }
    }

    fn full_product(&self, partitions: &[&Partition], size: usize) -> Generation {
        let mut seen = HashSet::new();
        let mut test_cases = Vec::new();
        let mut duplicates_removed = 0;

        // Odometer over item indices; the last partition turns fastest.
        let mut indices = vec![0usize; partitions.len()];
        'product: loop {
            let combo: Vec<&PartitionItem> = partitions
                .iter()
                .zip(&indices)
                .map(|(p, &i)| &p.items[i])
                .collect();
            let inputs = inputs_of(partitions, &combo);
            if seen.insert(canonical_key(&inputs)) {
                test_cases.push(build_case(test_cases.len() + 1, inputs, &combo));
            } else {
                duplicates_removed += 1;
            }

            let mut pos = indices.len();
            loop {
                if pos == 0 {
                    break 'product;
                }
                pos -= 1;
                indices[pos] += 1;
                if indices[pos] < partitions[pos].len() {
                    break;
                }
                indices[pos] = 0;
            }
        }

        Generation {
            test_cases,
            strategy: GenerationStrategy::Full,
            product_size: Some(size),
            duplicates_removed,
            attempts: 0,
        }
    }

    fn sample(&self, partitions: &[&Partition], rng: &mut impl Rng) -> Generation {
        let target = self.config.threshold;
        let max_attempts = if self.config.dedup_sampled {
            self.config.max_sampling_attempts()
        } else {
            target
        };

        let mut seen = HashSet::new();
        let mut test_cases = Vec::with_capacity(target);
        let mut duplicates_removed = 0;
        let mut attempts = 0;
        while test_cases.len() < target && attempts < max_attempts {
            attempts += 1;
            let combo: Vec<&PartitionItem> = partitions
                .iter()
                .map(|p| &p.items[rng.gen_range(0..p.len())])
                .collect();
            let inputs = inputs_of(partitions, &combo);
            if self.config.dedup_sampled && !seen.insert(canonical_key(&inputs)) {
                duplicates_removed += 1;
                continue;
            }
            test_cases.push(build_case(test_cases.len() + 1, inputs, &combo));
        }

        Generation {
            test_cases,
            strategy: GenerationStrategy::Sampled,
            product_size: None,
            duplicates_removed,
            attempts,
        }
    }
}

fn inputs_of(partitions: &[&Partition], combo: &[&PartitionItem]) -> Inputs {
    partitions
        .iter()
        .zip(combo)
        .map(|(p, item)| (p.name.clone(), item.sample.clone()))
        .collect()
}

/// Invalid iff any contributing class is invalid.
fn build_case(n: usize, inputs: Inputs, combo: &[&PartitionItem]) -> TestCase {
    let kind = if combo.iter().any(|item| !item.valid) {
        CaseKind::Invalid
    } else {
        CaseKind::Valid
    };
    TestCase {
        id: case_id(n),
        kind,
        inputs,
        expected: None,
        meta: combo.iter().map(|item| item.id.clone()).collect(),
    }
}

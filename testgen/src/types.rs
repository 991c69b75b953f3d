//! Core types for the test generation pipeline

use crate::diff::DiffReport;
use cctm_core::{ClassificationTree, Partition, TestCase};
use cctm_parser::ParseError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during test generation
#[derive(Error, Debug)]
pub enum TestGenError {
    #[error("Failed to parse classification tree: {0}")]
    Parse(#[from] ParseError),
    #[error("Diff computation failed: {0}")]
    DiffComputation(String),
    #[error("Invalid baseline snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TestGenError {
    pub fn kind(&self) -> &'static str {
        match self {
            TestGenError::Parse(_) => "ParseError",
            TestGenError::DiffComputation(_) => "DiffComputationError",
            TestGenError::Snapshot(_) => "SnapshotError",
            TestGenError::Config(_) => "ConfigError",
            TestGenError::Io(_) => "IoError",
        }
    }
}

/// The user-visible failure shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            detail,
        }
    }
}

impl From<&TestGenError> for ErrorResponse {
    fn from(err: &TestGenError) -> Self {
        ErrorResponse::new(err.kind(), Some(err.to_string()))
    }
}

/// A label present in both merge inputs with differing validity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeConflict {
    pub variable: String,
    pub label: String,
    pub existing_valid: bool,
    pub incoming_valid: bool,
}

/// Which branch of the combinatorial generator ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStrategy {
    /// Full cartesian product, deduplicated
    Full,
    /// Product exceeded the threshold; random draws
    Sampled,
}

impl GenerationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStrategy::Full => "full",
            GenerationStrategy::Sampled => "sampled",
        }
    }
}

/// Non-fatal outcomes collected while generating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    MergeConflict(MergeConflict),
    /// The baseline could not be used; the upload was treated as a first version.
    DiffComputation { detail: String },
    /// The product exceeded the threshold and sampling was used.
    GenerationOverflow { threshold: usize },
    ReductionCapReached { cap: usize, dropped: usize },
    /// Deduplicated sampling ran out of attempts.
    SamplingShortfall { requested: usize, produced: usize },
}

impl Warning {
    pub fn describe(&self) -> String {
        match self {
            Warning::MergeConflict(c) => format!(
                "{}: '{}' is {} in the baseline but {} in the upload",
                c.variable,
                c.label,
                validity(c.existing_valid),
                validity(c.incoming_valid)
            ),
            Warning::DiffComputation { detail } => {
                format!("baseline ignored, treated as first version ({})", detail)
            }
            Warning::GenerationOverflow { threshold } => {
                format!("product exceeds threshold {}, sampled instead", threshold)
            }
            Warning::ReductionCapReached { cap, dropped } => {
                format!("reduction cap {} reached, {} case(s) dropped", cap, dropped)
            }
            Warning::SamplingShortfall {
                requested,
                produced,
            } => format!("sampling produced {} of {} unique cases", produced, requested),
        }
    }
}

fn validity(valid: bool) -> &'static str {
    if valid {
        "valid"
    } else {
        "invalid"
    }
}

/// Counters for one generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStats {
    pub strategy: GenerationStrategy,
    /// Product size, absent when the estimate stopped at the threshold
    pub product_size: Option<usize>,
    pub duplicates_removed: usize,
    pub boundary_cases: usize,
    pub valid: usize,
    pub invalid: usize,
}

/// Everything one generation request produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    /// Accumulated tree; store it as the next baseline
    pub tree: ClassificationTree,
    /// Generation input, one per variable with classes
    pub partitions: Vec<Partition>,
    pub test_cases: Vec<TestCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffReport>,
    pub warnings: Vec<Warning>,
    pub stats: GenerationStats,
    pub seed: u64,
}

impl GenerationOutcome {
    pub fn merge_conflicts(&self) -> impl Iterator<Item = &MergeConflict> {
        self.warnings.iter().filter_map(|w| match w {
            Warning::MergeConflict(c) => Some(c),
            _ => None,
        })
    }
}

//! Generated test cases.

use crate::Inputs;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseKind {
    Valid,
    Invalid,
    #[serde(rename = "fault")]
    Fault,
}

impl CaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseKind::Valid => "Valid",
            CaseKind::Invalid => "Invalid",
            CaseKind::Fault => "fault",
        }
    }
}

/// A single generated test case. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CaseKind,
    pub inputs: Inputs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Inputs>,
    /// Ids of the terminal classes that produced the inputs.
    #[serde(default)]
    pub meta: Vec<String>,
}

impl TestCase {
    pub fn is_invalid(&self) -> bool {
        self.kind == CaseKind::Invalid
    }

    /// Canonical dedup key: the key-sorted JSON of the input map.
    pub fn input_key(&self) -> String {
        canonical_key(&self.inputs)
    }
}

pub fn canonical_key(inputs: &Inputs) -> String {
    // BTreeMap serialization is key-ordered; Value serialization cannot fail.
    serde_json::to_string(inputs).unwrap_or_default()
}

/// Formats the n-th (1-based) case id.
pub fn case_id(n: usize) -> String {
    format!("TC-{}", n)
}

//! Fault-tree graph and fault test cases.

use crate::{CaseKind, Inputs, TestCase};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultNodeType {
    Top,
    Intermediate,
    Basic,
    Property,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FaultNodeType,
}

impl FaultNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: FaultNodeType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaultEdge {
    pub from: String,
    pub to: String,
}

impl FaultEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// One test case per triggering basic event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultTestCase {
    pub id: String,
    pub description: String,
    pub inputs: Inputs,
    /// Node ids from the basic event up through its stage.
    pub triggers: Vec<String>,
}

impl FaultTestCase {
    pub fn to_test_case(&self) -> TestCase {
        TestCase {
            id: self.id.clone(),
            kind: CaseKind::Fault,
            inputs: self.inputs.clone(),
            expected: None,
            meta: self.triggers.clone(),
        }
    }
}

/// Formats the n-th (1-based) fault case id as `TC-001`.
pub fn fault_case_id(n: usize) -> String {
    format!("TC-{:03}", n)
}

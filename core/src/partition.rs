//! Partitions: the generation input for one variable.

use crate::Value;
use serde::{Deserialize, Serialize};

/// One representative item of a partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionItem {
    /// Id of the terminal class this item stands for.
    pub id: String,
    pub label: String,
    pub sample: Value,
    pub valid: bool,
}

/// Representative items for one variable, in class declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    /// Variable name.
    pub name: String,
    pub items: Vec<PartitionItem>,
}

impl Partition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, id: impl Into<String>, label: impl Into<String>, sample: Value, valid: bool) {
        self.items.push(PartitionItem {
            id: id.into(),
            label: label.into(),
            sample,
            valid,
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

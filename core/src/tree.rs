//! The classification tree model.
//!
//! A tree holds one use case, an ordered list of input variables each split
//! into terminal classes, and an optional output with its own classes.

use crate::{Interval, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared kind of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    Range,
    Nominal,
    Ordinal,
    Boolean,
    Enum,
    Float,
    String,
    Percentage,
}

impl VariableType {
    /// Lenient reading of a type attribute. Unknown names fall back to String.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "range" | "number" | "int" | "integer" | "numeric" => VariableType::Range,
            "float" | "decimal" | "double" | "real" => VariableType::Float,
            "percent" | "percentage" => VariableType::Percentage,
            "bool" | "boolean" => VariableType::Boolean,
            "enum" | "enumeration" => VariableType::Enum,
            "nominal" => VariableType::Nominal,
            "ordinal" => VariableType::Ordinal,
            _ => VariableType::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::Range => "range",
            VariableType::Nominal => "nominal",
            VariableType::Ordinal => "ordinal",
            VariableType::Boolean => "boolean",
            VariableType::Enum => "enum",
            VariableType::Float => "float",
            VariableType::String => "string",
            VariableType::Percentage => "percentage",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            VariableType::Range | VariableType::Float | VariableType::Percentage
        )
    }

    /// Types whose samples carry decimals even when the bounds are whole.
    pub fn is_decimal(&self) -> bool {
        matches!(self, VariableType::Float | VariableType::Percentage)
    }
}

impl Default for VariableType {
    fn default() -> Self {
        VariableType::String
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle tag attached by diff/merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Added,
    Removed,
    Modified,
    Unchanged,
}

/// Which tree version a node in a merged tree came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceVersion {
    Old,
    New,
    Both,
}

/// A leaf-level equivalence class of a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalClass {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Interval>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ChangeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_version: Option<SourceVersion>,
}

impl TerminalClass {
    pub fn interval(
        id: impl Into<String>,
        label: impl Into<String>,
        range: Interval,
        valid: bool,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            range: Some(range),
            values: Vec::new(),
            valid,
            status: None,
            source_version: None,
        }
    }

    pub fn literal(
        id: impl Into<String>,
        label: impl Into<String>,
        values: Vec<Value>,
        valid: bool,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            range: None,
            values,
            valid,
            status: None,
            source_version: None,
        }
    }

    pub fn with_status(mut self, status: ChangeStatus, source: SourceVersion) -> Self {
        self.status = Some(status);
        self.source_version = Some(source);
        self
    }

    /// Drops diff annotations.
    pub fn plain(mut self) -> Self {
        self.status = None;
        self.source_version = None;
        self
    }

    /// The comparable content of a class: its interval, else its literal
    /// values, else its label.
    pub fn range_string(&self) -> String {
        if let Some(range) = &self.range {
            return range.to_string();
        }
        if !self.values.is_empty() {
            return self
                .values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",");
        }
        self.label.clone()
    }
}

/// An input variable and its terminal classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: VariableType,
    #[serde(default)]
    pub terminal_classes: Vec<TerminalClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ChangeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_version: Option<SourceVersion>,
}

impl Variable {
    pub fn new(name: impl Into<String>, kind: VariableType) -> Self {
        Self {
            name: name.into(),
            kind,
            terminal_classes: Vec::new(),
            parent_classification: None,
            status: None,
            source_version: None,
        }
    }

    pub fn with_class(mut self, class: TerminalClass) -> Self {
        self.terminal_classes.push(class);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_classification = Some(parent.into());
        self
    }

    pub fn with_status(mut self, status: ChangeStatus, source: SourceVersion) -> Self {
        self.status = Some(status);
        self.source_version = Some(source);
        self
    }

    /// Numeric if declared so, or if every class carries an interval.
    pub fn is_numeric(&self) -> bool {
        if self.kind.is_numeric() {
            return true;
        }
        self.kind != VariableType::Boolean
            && !self.terminal_classes.is_empty()
            && self.terminal_classes.iter().all(|tc| tc.range.is_some())
    }

    pub fn class_by_label(&self, label: &str) -> Option<&TerminalClass> {
        self.terminal_classes.iter().find(|tc| tc.label == label)
    }

    pub fn class_by_id(&self, id: &str) -> Option<&TerminalClass> {
        self.terminal_classes.iter().find(|tc| tc.id == id)
    }

    /// Lowest finite lower bound and highest finite upper bound across classes.
    pub fn numeric_extent(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for range in self.terminal_classes.iter().filter_map(|tc| tc.range) {
            if range.min.is_finite() {
                lo = lo.min(range.min);
            }
            if range.max.is_finite() {
                hi = hi.max(range.max);
            }
        }
        if lo.is_finite() && hi.is_finite() {
            Some((lo, hi))
        } else {
            None
        }
    }
}

/// The system response named by a tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub name: String,
    #[serde(default)]
    pub terminal_classes: Vec<TerminalClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ChangeStatus>,
}

impl Output {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            terminal_classes: Vec::new(),
            status: None,
        }
    }

    pub fn with_class(mut self, class: TerminalClass) -> Self {
        self.terminal_classes.push(class);
        self
    }

    pub fn is_numeric(&self) -> bool {
        !self.terminal_classes.is_empty()
            && self.terminal_classes.iter().all(|tc| tc.range.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseCase {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Default for UseCase {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            name: "Use Case".to_string(),
            description: String::new(),
        }
    }
}

/// A complete classification tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationTree {
    #[serde(default)]
    pub use_case: UseCase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Output>,
}

impl ClassificationTree {
    pub fn new(use_case: UseCase) -> Self {
        Self {
            use_case,
            ..Default::default()
        }
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.output = Some(output);
        self
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn class_count(&self) -> usize {
        self.variables.iter().map(|v| v.terminal_classes.len()).sum()
    }
}

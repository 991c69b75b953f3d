//! Normalization of ingested trees into the shape the pipeline consumes

use cctm_core::{ClassificationTree, TerminalClass, Variable};
use std::collections::HashSet;

/// Normalizes a parsed tree so downstream stages can rely on it:
/// trimmed non-empty names, per-variable unique class ids, no diff
/// annotations.
#[derive(Debug, Default)]
pub struct TreeBuilder;

impl TreeBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, tree: &ClassificationTree) -> ClassificationTree {
        let mut names: HashSet<String> = HashSet::new();
        let variables = tree
            .variables
            .iter()
            .enumerate()
            .map(|(idx, var)| {
                let mut name = var.name.trim().to_string();
                if name.is_empty() {
                    name = format!("var_{}", idx);
                }
                if !names.insert(name.clone()) {
                    tracing::warn!(variable = %name, "duplicate variable name renamed");
                    name = format!("{}_{}", name, idx);
                    names.insert(name.clone());
                }
                Variable {
                    name: name.clone(),
                    kind: var.kind,
                    terminal_classes: normalize_classes(&name, &var.terminal_classes),
                    parent_classification: var
                        .parent_classification
                        .as_deref()
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string),
                    status: None,
                    source_version: None,
                }
            })
            .collect();

        let output = tree.output.as_ref().map(|out| {
            let mut out = out.clone();
            out.name = out.name.trim().to_string();
            out.terminal_classes = normalize_classes(&out.name, &out.terminal_classes);
            out.status = None;
            out
        });

        ClassificationTree {
            use_case: tree.use_case.clone(),
            system: tree.system.clone(),
            variables,
            output,
        }
    }
}

fn normalize_classes(owner: &str, classes: &[TerminalClass]) -> Vec<TerminalClass> {
    let mut ids: HashSet<String> = HashSet::new();
    classes
        .iter()
        .enumerate()
        .map(|(idx, tc)| {
            let mut tc = tc.clone().plain();
            tc.label = tc.label.trim().to_string();
            if tc.id.trim().is_empty() {
                tc.id = format!("{}-{}-{}", owner, tc.label, idx);
            }
            if !ids.insert(tc.id.clone()) {
                tc.id = format!("{}-{}", tc.id, idx);
                ids.insert(tc.id.clone());
            }
            tc
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cctm_core::{Interval, VariableType};

    #[test]
    fn test_names_and_ids_are_normalized() {
        let tree = ClassificationTree::default()
            .with_variable(
                Variable::new("  Age ", VariableType::Range)
                    .with_class(TerminalClass::interval("a", " young ", Interval::new(0.0, 17.0), false))
                    .with_class(TerminalClass::interval("a", "adult", Interval::new(18.0, 65.0), true))
                    .with_class(TerminalClass::interval("", "old", Interval::new(66.0, 120.0), true)),
            )
            .with_variable(Variable::new("", VariableType::String));

        let built = TreeBuilder::new().build(&tree);
        assert_eq!(built.variables[0].name, "Age");
        assert_eq!(built.variables[1].name, "var_1");
        let ids: Vec<_> = built.variables[0]
            .terminal_classes
            .iter()
            .map(|tc| tc.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "a-1", "Age-old-2"]);
        assert_eq!(built.variables[0].terminal_classes[0].label, "young");
    }
}

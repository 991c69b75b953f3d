//! Equivalence-class boundary cases
//!
//! For every numeric variable, one case just below its lowest finite bound
//! and one just above its highest; for every discrete variable, one case
//! with no value. All other inputs stay at a baseline taken from each
//! variable's first class.

use crate::partition::extremes;
use cctm_core::{case_id, representative, CaseKind, ClassificationTree, Inputs, Output, TestCase, Value};

pub struct EcpBoundaryGenerator;

impl EcpBoundaryGenerator {
    pub fn generate(tree: &ClassificationTree, output: Option<&Output>) -> Vec<TestCase> {
        let baseline: Inputs = tree
            .variables
            .iter()
            .filter_map(|v| {
                let first = v.terminal_classes.first()?;
                Some((v.name.clone(), representative(first, v.kind)))
            })
            .collect();

        let mut cases = Vec::new();
        for var in tree.variables.iter().filter(|v| !v.terminal_classes.is_empty()) {
            let mut edges: Vec<(String, Value)> = Vec::new();
            if var.is_numeric() {
                let (lo, hi) = extremes(&var.terminal_classes);
                if let Some(lo) = lo {
                    edges.push((format!("{}-underflow", var.name), Value::number(lo - 1.0)));
                }
                if let Some(hi) = hi {
                    edges.push((format!("{}-overflow", var.name), Value::number(hi + 1.0)));
                }
            } else {
                edges.push((format!("{}-none", var.name), Value::Null));
            }

            for (meta, value) in edges {
                let mut inputs = baseline.clone();
                inputs.insert(var.name.clone(), value);
                let expected = output.map(|out| {
                    let mut expected = Inputs::new();
                    expected.insert(out.name.clone(), Value::String(format!("Invalid {}", var.name)));
                    expected
                });
                cases.push(TestCase {
                    id: case_id(cases.len() + 1),
                    kind: CaseKind::Invalid,
                    inputs,
                    expected,
                    meta: vec![meta],
                });
            }
        }
        cases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cctm_core::{inputs, Interval, TerminalClass, Variable, VariableType};
    use pretty_assertions::assert_eq;

    fn tree() -> ClassificationTree {
        ClassificationTree::default()
            .with_variable(
                Variable::new("Age", VariableType::Range)
                    .with_class(TerminalClass::interval("a0", "18-65", Interval::new(18.0, 65.0), true))
                    .with_class(TerminalClass::interval("a1", "66-120", Interval::new(66.0, 120.0), true)),
            )
            .with_variable(
                Variable::new("Gender", VariableType::Enum)
                    .with_class(TerminalClass::literal("g0", "M", vec!["M".into()], true)),
            )
            .with_output(Output::new("Decision"))
    }

    #[test]
    fn test_boundary_cases_per_variable() {
        let tree = tree();
        let cases = EcpBoundaryGenerator::generate(&tree, tree.output.as_ref());
        assert_eq!(cases.len(), 3);

        assert_eq!(cases[0].inputs, inputs! { "Age" => 17i64, "Gender" => "M" });
        assert_eq!(cases[1].inputs, inputs! { "Age" => 121i64, "Gender" => "M" });
        assert_eq!(cases[2].inputs["Gender"], Value::Null);
        assert_eq!(cases[2].inputs["Age"], Value::Int(42));
        assert!(cases.iter().all(|c| c.kind == CaseKind::Invalid));
        assert_eq!(
            cases[1].expected,
            Some(inputs! { "Decision" => "Invalid Age" })
        );
        assert_eq!(cases[2].id, "TC-3");
    }

    #[test]
    fn test_no_output_no_expectation() {
        let tree = tree();
        let cases = EcpBoundaryGenerator::generate(&tree, None);
        assert!(cases.iter().all(|c| c.expected.is_none()));
    }
}

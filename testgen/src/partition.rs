//! Partition construction from variables
//!
//! [`build`] is the generation input: one item per terminal class, in
//! declaration order. [`build_display`] is the visualization variant and
//! adds synthetic underflow/overflow and `None` buckets.

use cctm_core::{
    format_bound, representative, ClassificationTree, Output, Partition, PartitionItem,
    TerminalClass, Value, Variable, VariableType,
};

/// One partition per variable that has terminal classes.
pub fn build(variables: &[Variable]) -> Vec<Partition> {
    variables
        .iter()
        .filter(|v| !v.terminal_classes.is_empty())
        .map(|v| from_classes(&v.name, &v.terminal_classes, v.kind))
        .collect()
}

fn from_classes(name: &str, classes: &[TerminalClass], kind: VariableType) -> Partition {
    let mut partition = Partition::new(name);
    for tc in classes {
        partition.push(tc.id.clone(), tc.label.clone(), representative(tc, kind), tc.valid);
    }
    partition
}

/// Partitions for display. Numeric variables are bracketed by underflow and
/// overflow buckets one unit outside their finite extremes; discrete
/// variables get a `None` bucket. Partitions with at most one item are
/// dropped.
pub fn build_display(tree: &ClassificationTree) -> Vec<Partition> {
    let mut partitions: Vec<Partition> = tree
        .variables
        .iter()
        .map(|v| {
            let numeric = v.is_numeric() && v.kind != VariableType::Boolean;
            bracketed(from_classes(&v.name, &v.terminal_classes, v.kind), numeric, &v.terminal_classes)
        })
        .collect();
    if let Some(output) = &tree.output {
        partitions.push(output_partition(output));
    }
    partitions.retain(|p| p.len() > 1);
    partitions
}

/// A numeric output collapses into one `min-max` item spanning its classes,
/// with the id of the class holding each end. Other outputs keep one item per
/// class. Both end with `None`; outputs are never bracketed.
fn output_partition(output: &Output) -> Partition {
    let mut partition = Partition::new(&output.name);
    if output.is_numeric() {
        let ranged: Vec<_> = output
            .terminal_classes
            .iter()
            .filter_map(|tc| tc.range.map(|r| (tc, r)))
            .collect();
        let low = ranged.iter().min_by(|a, b| a.1.min.total_cmp(&b.1.min));
        let high = ranged.iter().max_by(|a, b| a.1.max.total_cmp(&b.1.max));
        if let (Some((lo_tc, lo)), Some((hi_tc, hi))) = (low, high) {
            let label = if lo.min == hi.max {
                format_bound(lo.min)
            } else {
                format!("{}-{}", format_bound(lo.min), format_bound(hi.max))
            };
            partition.push(format!("{}-{}", lo_tc.id, hi_tc.id), label, Value::number(lo.min), true);
        }
    } else {
        for tc in &output.terminal_classes {
            partition.push(tc.id.clone(), tc.label.clone(), representative(tc, VariableType::String), tc.valid);
        }
    }
    partition.push(format!("{}-none", output.name), "None", Value::Null, false);
    partition
}

/// Lowest lower bound and highest upper bound over all ranged classes,
/// each present only when finite.
pub(crate) fn extremes(classes: &[TerminalClass]) -> (Option<f64>, Option<f64>) {
    let ranges: Vec<_> = classes.iter().filter_map(|tc| tc.range).collect();
    if ranges.is_empty() {
        return (None, None);
    }
    let lo = ranges.iter().map(|r| r.min).fold(f64::INFINITY, f64::min);
    let hi = ranges.iter().map(|r| r.max).fold(f64::NEG_INFINITY, f64::max);
    (Some(lo).filter(|n| n.is_finite()), Some(hi).filter(|n| n.is_finite()))
}

fn bracketed(mut partition: Partition, numeric: bool, classes: &[TerminalClass]) -> Partition {
    let name = partition.name.clone();
    if !numeric {
        partition.push(format!("{}-none", name), "None", Value::Null, false);
        return partition;
    }
    let (lo, hi) = extremes(classes);
    if let Some(lo) = lo {
        partition.items.insert(
            0,
            PartitionItem {
                id: format!("{}-underflow", name),
                label: format!("< {}", format_bound(lo)),
                sample: Value::number(lo - 1.0),
                valid: false,
            },
        );
    }
    if let Some(hi) = hi {
        partition.push(
            format!("{}-overflow", name),
            format!("> {}", format_bound(hi)),
            Value::number(hi + 1.0),
            false,
        );
    }
    partition
}

#[cfg(test)]
mod tests {
    use super::*;
    use cctm_core::Interval;
    use pretty_assertions::assert_eq;

    fn age() -> Variable {
        Variable::new("Age", VariableType::Range)
            .with_class(TerminalClass::interval("Age-0", "0-17", Interval::new(0.0, 17.0), false))
            .with_class(TerminalClass::interval("Age-1", "18-65", Interval::new(18.0, 65.0), true))
            .with_class(TerminalClass::interval("Age-2", ">120", Interval::at_least(120.1), false))
    }

    #[test]
    fn test_one_item_per_class() {
        let gender = Variable::new("Gender", VariableType::Enum)
            .with_class(TerminalClass::literal("g0", "male", vec!["M".into()], true))
            .with_class(TerminalClass::literal("g1", "other", vec![], false));
        let empty = Variable::new("Unused", VariableType::String);
        let partitions = build(&[age(), gender, empty]);

        assert_eq!(partitions.len(), 2);
        let samples: Vec<_> = partitions[0].items.iter().map(|i| i.sample.clone()).collect();
        assert_eq!(samples, vec![Value::Int(9), Value::Int(42), Value::Int(121)]);
        let samples: Vec<_> = partitions[1].items.iter().map(|i| i.sample.clone()).collect();
        assert_eq!(samples, vec![Value::from("M"), Value::from("other")]);
        assert!(!partitions[1].items[1].valid);
    }

    #[test]
    fn test_single_item_partitions_are_kept_for_generation() {
        let region = Variable::new("Region", VariableType::Enum)
            .with_class(TerminalClass::literal("r0", "north", vec!["N".into()], true));
        assert_eq!(build(&[region]).len(), 1);
    }

    #[test]
    fn test_display_brackets_numeric_extremes() {
        let tree = ClassificationTree::default().with_variable(age());
        let partitions = build_display(&tree);
        // the open top class leaves nothing to overflow
        let labels: Vec<_> = partitions[0].items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["< 0", "0-17", "18-65", ">120"]);
        assert_eq!(partitions[0].items[0].sample, Value::Int(-1));

        let bounded = Variable::new("Score", VariableType::Range)
            .with_class(TerminalClass::interval("s0", "low", Interval::new(0.0, 49.0), true))
            .with_class(TerminalClass::interval("s1", "high", Interval::new(50.0, 100.0), true));
        let partitions = build_display(&ClassificationTree::default().with_variable(bounded));
        let last = partitions[0].items.last().unwrap();
        assert_eq!(last.id, "Score-overflow");
        assert_eq!(last.sample, Value::Int(101));
        assert_eq!(partitions[0].len(), 4);
    }

    #[test]
    fn test_display_adds_none_and_drops_small_partitions() {
        let tree = ClassificationTree::default()
            .with_variable(Variable::new("Empty", VariableType::Enum))
            .with_variable(
                Variable::new("Mode", VariableType::Enum)
                    .with_class(TerminalClass::literal("m0", "auto", vec!["auto".into()], true)),
            )
            .with_output(Output::new("Action"));
        let partitions = build_display(&tree);
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].name, "Mode");
        assert_eq!(partitions[0].items[1].sample, Value::Null);
        assert_eq!(partitions[0].items[1].label, "None");
    }

    #[test]
    fn test_numeric_output_collapses_to_one_span() {
        let dose = Output::new("Dose")
            .with_class(TerminalClass::interval("d1", "10-20", Interval::new(10.0, 20.0), true))
            .with_class(TerminalClass::interval("d0", "0-5", Interval::new(0.0, 5.0), true))
            .with_class(TerminalClass::interval("d2", "50", Interval::point(50.0), true));
        let partitions = build_display(&ClassificationTree::default().with_output(dose));
        let output = &partitions[0];
        let labels: Vec<_> = output.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["0-50", "None"]);
        assert_eq!(output.items[0].id, "d0-d2");
        assert_eq!(output.items[0].sample, Value::Int(0));
        assert!(output.items[0].valid);
        assert!(!output.items.iter().any(|i| i.id.ends_with("flow")));
    }

    #[test]
    fn test_discrete_output_keeps_each_class() {
        let action = Output::new("Action")
            .with_class(TerminalClass::literal("a0", "stop", vec![], true))
            .with_class(TerminalClass::literal("a1", "go", vec![], true));
        let partitions = build_display(&ClassificationTree::default().with_output(action));
        let ids: Vec<_> = partitions[0].items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a0", "a1", "Action-none"]);
    }
}

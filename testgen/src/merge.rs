//! Merging classification trees across uploads.
//!
//! Numeric variables coalesce intersecting buckets (valid and invalid sets
//! separately), so bucket counts never grow. Discrete variables union their
//! buckets by label; when an upload brings new invalid labels, all invalid
//! buckets fold into one `name=other` bucket. Inputs are never mutated.

use crate::types::MergeConflict;
use cctm_core::{ClassificationTree, Interval, TerminalClass, Variable};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub merged: ClassificationTree,
    pub warnings: Vec<MergeConflict>,
}

/// Merge `incoming` into `existing`. Variables only in `incoming` are
/// appended unchanged; the output definition of `incoming` wins when present.
pub fn merge(existing: &ClassificationTree, incoming: &ClassificationTree) -> MergeOutcome {
    let mut variables: Vec<Variable> = existing.variables.iter().map(plain_variable).collect();
    let mut warnings = Vec::new();

    for var in &incoming.variables {
        match variables.iter().position(|v| v.name == var.name) {
            None => variables.push(plain_variable(var)),
            Some(idx) => {
                warnings.extend(conflicts(&variables[idx], var));
                variables[idx] = merge_variable(&variables[idx], var);
            }
        }
    }

    for warning in &warnings {
        tracing::warn!(
            variable = %warning.variable,
            label = %warning.label,
            existing_valid = warning.existing_valid,
            incoming_valid = warning.incoming_valid,
            "validity conflict while merging"
        );
    }

    let merged = ClassificationTree {
        use_case: existing.use_case.clone(),
        system: existing.system.clone().or_else(|| incoming.system.clone()),
        variables,
        output: incoming.output.clone().or_else(|| existing.output.clone()),
    };
    MergeOutcome { merged, warnings }
}

fn plain_variable(v: &Variable) -> Variable {
    Variable {
        name: v.name.clone(),
        kind: v.kind,
        terminal_classes: v.terminal_classes.iter().cloned().map(TerminalClass::plain).collect(),
        parent_classification: v.parent_classification.clone(),
        status: None,
        source_version: None,
    }
}

fn conflicts(existing: &Variable, incoming: &Variable) -> Vec<MergeConflict> {
    incoming
        .terminal_classes
        .iter()
        .filter_map(|tc| {
            let found = existing.class_by_label(&tc.label)?;
            (found.valid != tc.valid).then(|| MergeConflict {
                variable: incoming.name.clone(),
                label: tc.label.clone(),
                existing_valid: found.valid,
                incoming_valid: tc.valid,
            })
        })
        .collect()
}

fn merge_variable(existing: &Variable, incoming: &Variable) -> Variable {
    let classes = if existing.is_numeric() && incoming.is_numeric() {
        merge_numeric(&existing.name, &existing.terminal_classes, &incoming.terminal_classes)
    } else {
        merge_discrete(&existing.name, &existing.terminal_classes, &incoming.terminal_classes)
    };
    let before = existing.terminal_classes.len() + incoming.terminal_classes.len();
    tracing::debug!(
        variable = %existing.name,
        before,
        after = classes.len(),
        "merged terminal classes"
    );
    Variable {
        terminal_classes: classes,
        parent_classification: existing
            .parent_classification
            .clone()
            .or_else(|| incoming.parent_classification.clone()),
        ..plain_variable(existing)
    }
}

fn merge_numeric(name: &str, a: &[TerminalClass], b: &[TerminalClass]) -> Vec<TerminalClass> {
    let all: Vec<&TerminalClass> = a.iter().chain(b).collect();
    let ranged: Vec<&TerminalClass> = all.iter().copied().filter(|tc| tc.range.is_some()).collect();

    let mut result: Vec<TerminalClass> = Vec::new();
    for valid in [true, false] {
        let group: Vec<&TerminalClass> = ranged.iter().copied().filter(|tc| tc.valid == valid).collect();
        for (idx, interval) in coalesce(group.iter().filter_map(|tc| tc.range)).into_iter().enumerate() {
            let reused = group
                .iter()
                .find(|tc| tc.range.map_or(false, |r| r.same_bounds(&interval)));
            let class = match reused {
                Some(tc) => TerminalClass::interval(tc.id.clone(), tc.label.clone(), interval, valid),
                None => {
                    let prefix = if valid { "merged" } else { "merged-invalid" };
                    TerminalClass::interval(
                        format!("{}-{}-{}", prefix, idx, interval),
                        interval.to_string(),
                        interval,
                        valid,
                    )
                }
            };
            result.push(class);
        }
    }
    result.sort_by(|x, y| {
        let (xm, ym) = (x.range.map_or(0.0, |r| r.min), y.range.map_or(0.0, |r| r.min));
        xm.partial_cmp(&ym).unwrap_or(std::cmp::Ordering::Equal)
    });

    // Classes without an interval survive by label.
    let mut labels: HashSet<String> = result.iter().map(|tc| tc.label.clone()).collect();
    for tc in all.into_iter().filter(|tc| tc.range.is_none()) {
        if labels.insert(tc.label.clone()) {
            result.push(tc.clone().plain());
        }
    }
    unique_ids(name, result)
}

/// Sort by lower bound and fold every interval that intersects the running
/// one into it.
pub fn coalesce(intervals: impl Iterator<Item = Interval>) -> Vec<Interval> {
    let mut sorted: Vec<Interval> = intervals.collect();
    sorted.sort_by(|x, y| x.min.partial_cmp(&y.min).unwrap_or(std::cmp::Ordering::Equal));

    let mut merged: Vec<Interval> = Vec::new();
    for next in sorted {
        match merged.last_mut() {
            Some(current) if !current.is_disjoint(&next) => *current = current.hull(&next),
            _ => merged.push(next),
        }
    }
    merged
}

fn merge_discrete(name: &str, a: &[TerminalClass], b: &[TerminalClass]) -> Vec<TerminalClass> {
    // Later definitions replace earlier ones but keep the first position.
    let mut union: Vec<TerminalClass> = Vec::new();
    for tc in a.iter().chain(b) {
        match union.iter_mut().find(|u| u.label == tc.label) {
            Some(slot) => *slot = tc.clone().plain(),
            None => union.push(tc.clone().plain()),
        }
    }

    // Collapse only when the union gained an invalid label the existing
    // variable did not already have.
    let known_invalid: HashSet<&str> = a.iter().filter(|tc| !tc.valid).map(|tc| tc.label.as_str()).collect();
    let invalid_count = union.iter().filter(|tc| !tc.valid).count();
    let grew = union
        .iter()
        .any(|tc| !tc.valid && !known_invalid.contains(tc.label.as_str()));
    if invalid_count > 1 && grew {
        union.retain(|tc| tc.valid);
        union.push(TerminalClass::literal(
            format!("{}-enum-invalid", name),
            format!("{}=other", name),
            Vec::new(),
            false,
        ));
    }
    unique_ids(name, union)
}

/// Re-key classes whose id is already taken within the variable.
fn unique_ids(name: &str, classes: Vec<TerminalClass>) -> Vec<TerminalClass> {
    let mut seen: HashSet<String> = HashSet::new();
    classes
        .into_iter()
        .enumerate()
        .map(|(idx, mut tc)| {
            if !seen.insert(tc.id.clone()) {
                let mut n = idx;
                loop {
                    let candidate = format!("{}-enum-{}", name, n);
                    if seen.insert(candidate.clone()) {
                        tc.id = candidate;
                        break;
                    }
                    n += 1;
                }
            }
            tc
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cctm_core::{Value, VariableType};
    use pretty_assertions::assert_eq;

    fn age(classes: &[(&str, Interval, bool)]) -> Variable {
        let mut v = Variable::new("Age", VariableType::Range);
        for (i, (label, iv, valid)) in classes.iter().enumerate() {
            v.terminal_classes.push(TerminalClass::interval(
                format!("Age-{}-{}", label, i),
                *label,
                *iv,
                *valid,
            ));
        }
        v
    }

    fn tree(vars: Vec<Variable>) -> ClassificationTree {
        ClassificationTree {
            variables: vars,
            ..Default::default()
        }
    }

    fn base_age() -> Variable {
        age(&[
            ("minor", Interval::new(0.0, 17.0), false),
            ("adult", Interval::new(18.0, 65.0), true),
            ("senior", Interval::new(66.0, 120.0), true),
            ("too_old", Interval::at_least(120.1), false),
        ])
    }

    #[test]
    fn test_numeric_coarsening_example() {
        let existing = tree(vec![base_age()]);
        let mut incoming_age = base_age();
        incoming_age.terminal_classes.push(TerminalClass::interval(
            "Age-child-4",
            "child",
            Interval::new(0.0, 12.0),
            false,
        ));
        let incoming = tree(vec![incoming_age]);

        let outcome = merge(&existing, &incoming);
        assert!(outcome.warnings.is_empty());
        let classes = &outcome.merged.variables[0].terminal_classes;
        let invalid: Vec<_> = classes.iter().filter(|t| !t.valid).collect();
        assert_eq!(invalid.len(), 2);
        assert_eq!(invalid[0].range, Some(Interval::new(0.0, 17.0)));
        assert_eq!(invalid[0].id, "Age-minor-0");
        let valid: Vec<_> = classes.iter().filter(|t| t.valid).map(|t| t.label.as_str()).collect();
        assert_eq!(valid, vec!["adult", "senior"]);
    }

    #[test]
    fn test_overlapping_valid_buckets_are_synthesized() {
        let existing = tree(vec![age(&[("a", Interval::new(0.0, 30.0), true)])]);
        let incoming = tree(vec![age(&[("b", Interval::new(20.0, 50.0), true)])]);
        let outcome = merge(&existing, &incoming);
        let classes = &outcome.merged.variables[0].terminal_classes;
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].id, "merged-0-0-50");
        assert_eq!(classes[0].label, "0-50");
    }

    #[test]
    fn test_new_variables_are_appended() {
        let existing = tree(vec![base_age()]);
        let gender = Variable::new("Gender", VariableType::Enum)
            .with_class(TerminalClass::literal("g0", "M", vec!["M".into()], true));
        let incoming = tree(vec![gender.clone()]);
        let outcome = merge(&existing, &incoming);
        assert_eq!(outcome.merged.variables.len(), 2);
        assert_eq!(outcome.merged.variables[1], gender);
        // caller trees untouched
        assert_eq!(existing.variables.len(), 1);
    }

    #[test]
    fn test_discrete_union_and_invalid_collapse() {
        let a = Variable::new("Region", VariableType::Enum)
            .with_class(TerminalClass::literal("Region-enum-0", "Region=North", vec!["North".into()], true))
            .with_class(TerminalClass::literal("Region-bad-1", "bad", vec![], false));
        let b = Variable::new("Region", VariableType::Enum)
            .with_class(TerminalClass::literal("Region-enum-0", "Region=South", vec!["South".into()], true))
            .with_class(TerminalClass::literal("Region-worse-1", "worse", vec![], false));
        let outcome = merge(&tree(vec![a]), &tree(vec![b]));
        let classes = &outcome.merged.variables[0].terminal_classes;
        let labels: Vec<_> = classes.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["Region=North", "Region=South", "Region=other"]);
        let ids: Vec<_> = classes.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["Region-enum-0", "Region-enum-1", "Region-enum-invalid"]);
        assert_eq!(classes[1].values, vec![Value::String("South".into())]);
    }

    #[test]
    fn test_conflict_is_reported_not_fatal() {
        let a = Variable::new("Flag", VariableType::Enum)
            .with_class(TerminalClass::literal("f0", "maybe", vec![], true));
        let b = Variable::new("Flag", VariableType::Enum)
            .with_class(TerminalClass::literal("f0", "maybe", vec![], false));
        let outcome = merge(&tree(vec![a]), &tree(vec![b]));
        assert_eq!(
            outcome.warnings,
            vec![MergeConflict {
                variable: "Flag".into(),
                label: "maybe".into(),
                existing_valid: true,
                incoming_valid: false,
            }]
        );
        assert_eq!(outcome.merged.variables[0].terminal_classes.len(), 1);
    }

    #[test]
    fn test_self_merge_is_idempotent() {
        let t = tree(vec![base_age()]);
        let outcome = merge(&t, &t);
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.merged.class_count(), t.class_count());
    }

    #[test]
    fn test_discrete_self_merge_keeps_invalid_classes() {
        let mode = Variable::new("Mode", VariableType::Enum)
            .with_class(TerminalClass::literal("Mode-auto-0", "auto", vec!["auto".into()], true))
            .with_class(TerminalClass::literal("Mode-invalid_blank-1", "invalid_blank", vec![], false))
            .with_class(TerminalClass::literal("Mode-invalid_unknown-2", "invalid_unknown", vec![], false));
        let t = tree(vec![mode]);
        let outcome = merge(&t, &t);
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.merged, t);
    }

    #[test]
    fn test_collapsed_bucket_is_stable() {
        let existing = Variable::new("Region", VariableType::Enum)
            .with_class(TerminalClass::literal("Region-enum-0", "Region=North", vec!["North".into()], true))
            .with_class(TerminalClass::literal("Region-enum-invalid", "Region=other", vec![], false));
        let incoming = Variable::new("Region", VariableType::Enum)
            .with_class(TerminalClass::literal("Region-bad-0", "bad", vec![], false));
        let once = merge(&tree(vec![existing]), &tree(vec![incoming.clone()])).merged;
        let twice = merge(&once, &tree(vec![incoming])).merged;
        let labels: Vec<_> = twice.variables[0].terminal_classes.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["Region=North", "Region=other"]);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_coalesce_touching_endpoints() {
        let merged = coalesce(
            vec![
                Interval::new(10.0, 20.0),
                Interval::new(0.0, 10.0),
                Interval::new(30.0, 40.0),
            ]
            .into_iter(),
        );
        assert_eq!(merged, vec![Interval::new(0.0, 20.0), Interval::new(30.0, 40.0)]);
    }
}

//! Version comparison of classification trees
//!
//! Variables are matched by name and terminal classes by label. Every
//! variable of either version lands in exactly one bucket of
//! [`VariableDiff`]; the merged tree carries the same verdicts as
//! `status`/`sourceVersion` annotations.

mod impact;

pub use impact::{Impact, ImpactAction, ImpactRule, ImpactTarget, ImpactTrigger};

use cctm_core::{
    ChangeStatus, ClassificationTree, Output, SourceVersion, TerminalClass, Variable,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    RangeChanged,
    ValidityChanged,
}

/// A label present in both versions whose content or validity differs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedClass {
    pub label: String,
    pub change_kind: ChangeKind,
    pub old: TerminalClass,
    pub new: TerminalClass,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDiff {
    pub added: Vec<TerminalClass>,
    pub removed: Vec<TerminalClass>,
    pub modified: Vec<ModifiedClass>,
    pub unchanged: Vec<TerminalClass>,
}

impl ClassDiff {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || !self.modified.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedVariable {
    pub name: String,
    pub old: Variable,
    pub new: Variable,
    pub changes: ClassDiff,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDiff {
    pub added: Vec<Variable>,
    pub removed: Vec<Variable>,
    pub modified: Vec<ModifiedVariable>,
    pub unchanged: Vec<Variable>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDiff {
    /// The new version introduced an output.
    pub added: bool,
    /// The new version dropped the output.
    pub removed: bool,
    pub classes: ClassDiff,
}

impl OutputDiff {
    pub fn has_changes(&self) -> bool {
        self.added || self.removed || self.classes.has_changes()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub variables_added: usize,
    pub variables_removed: usize,
    pub variables_modified: usize,
    pub variables_unchanged: usize,
    pub output_changed: bool,
    pub terminal_classes_added: usize,
    pub terminal_classes_removed: usize,
    pub terminal_classes_modified: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    pub variable_diff: VariableDiff,
    pub output_diff: OutputDiff,
    pub merged_tree: ClassificationTree,
    pub impact: Impact,
    pub summary: DiffSummary,
}

impl DiffReport {
    /// The merged tree without anything the new version removed.
    pub fn active_tree(&self) -> ClassificationTree {
        let is_live = |tc: &TerminalClass| tc.status != Some(ChangeStatus::Removed);
        let variables = self
            .merged_tree
            .variables
            .iter()
            .filter(|v| v.status != Some(ChangeStatus::Removed))
            .map(|v| Variable {
                terminal_classes: v.terminal_classes.iter().filter(|tc| is_live(tc)).cloned().collect(),
                ..v.clone()
            })
            .collect();
        let output = match &self.merged_tree.output {
            Some(out) if !self.output_diff.removed => Some(Output {
                terminal_classes: out.terminal_classes.iter().filter(|tc| is_live(tc)).cloned().collect(),
                ..out.clone()
            }),
            _ => None,
        };
        ClassificationTree {
            variables,
            output,
            ..self.merged_tree.clone()
        }
    }

    /// Ids of terminal classes that are new or changed in the new version.
    pub fn changed_class_ids(&self) -> HashSet<String> {
        self.merged_tree
            .variables
            .iter()
            .flat_map(|v| &v.terminal_classes)
            .filter(|tc| {
                matches!(
                    tc.status,
                    Some(ChangeStatus::Added) | Some(ChangeStatus::Modified)
                )
            })
            .map(|tc| tc.id.clone())
            .collect()
    }

    pub fn has_changes(&self) -> bool {
        let s = &self.summary;
        s.variables_added + s.variables_removed + s.variables_modified > 0 || s.output_changed
    }
}

/// Compare two versions of a tree. Neither input is modified.
pub fn compare(old: &ClassificationTree, new: &ClassificationTree) -> DiffReport {
    let variable_diff = compare_variables(&old.variables, &new.variables);
    let output_diff = compare_outputs(old.output.as_ref(), new.output.as_ref());
    let merged_tree = merged_tree(old, new, &variable_diff, &output_diff);
    let impact = Impact::analyze(&variable_diff, &output_diff);
    let summary = summarize(&variable_diff, &output_diff);

    tracing::info!(
        added = summary.variables_added,
        removed = summary.variables_removed,
        modified = summary.variables_modified,
        unchanged = summary.variables_unchanged,
        output_changed = summary.output_changed,
        "computed tree diff"
    );

    DiffReport {
        variable_diff,
        output_diff,
        merged_tree,
        impact,
        summary,
    }
}

fn compare_variables(old: &[Variable], new: &[Variable]) -> VariableDiff {
    let old_by_name: HashMap<&str, &Variable> = first_by(old, |v| v.name.as_str());
    let new_by_name: HashMap<&str, &Variable> = first_by(new, |v| v.name.as_str());
    let mut diff = VariableDiff::default();
    let mut seen = HashSet::new();

    for var in new {
        if !seen.insert(var.name.as_str()) {
            continue;
        }
        match old_by_name.get(var.name.as_str()) {
            None => diff.added.push(var.clone()),
            Some(previous) => {
                let changes = compare_classes(&previous.terminal_classes, &var.terminal_classes);
                if changes.has_changes() {
                    diff.modified.push(ModifiedVariable {
                        name: var.name.clone(),
                        old: (*previous).clone(),
                        new: var.clone(),
                        changes,
                    });
                } else {
                    diff.unchanged.push(var.clone());
                }
            }
        }
    }
    let mut seen = HashSet::new();
    for var in old {
        if seen.insert(var.name.as_str()) && !new_by_name.contains_key(var.name.as_str()) {
            diff.removed.push(var.clone());
        }
    }
    diff
}

/// Diff terminal classes by label. The comparable content of a class is
/// its range string.
pub fn compare_classes(old: &[TerminalClass], new: &[TerminalClass]) -> ClassDiff {
    let old_by_label = first_by(old, |tc| tc.label.as_str());
    let new_by_label = first_by(new, |tc| tc.label.as_str());
    let mut diff = ClassDiff::default();
    let mut seen = HashSet::new();

    for tc in new {
        if !seen.insert(tc.label.as_str()) {
            continue;
        }
        match old_by_label.get(tc.label.as_str()) {
            None => diff.added.push(tc.clone()),
            Some(previous) => {
                let change_kind = if previous.range_string() != tc.range_string() {
                    Some(ChangeKind::RangeChanged)
                } else if previous.valid != tc.valid {
                    Some(ChangeKind::ValidityChanged)
                } else {
                    None
                };
                match change_kind {
                    Some(change_kind) => diff.modified.push(ModifiedClass {
                        label: tc.label.clone(),
                        change_kind,
                        old: (*previous).clone(),
                        new: tc.clone(),
                    }),
                    None => diff.unchanged.push(tc.clone()),
                }
            }
        }
    }
    let mut seen = HashSet::new();
    for tc in old {
        if seen.insert(tc.label.as_str()) && !new_by_label.contains_key(tc.label.as_str()) {
            diff.removed.push(tc.clone());
        }
    }
    diff
}

fn compare_outputs(old: Option<&Output>, new: Option<&Output>) -> OutputDiff {
    match (old, new) {
        (None, None) => OutputDiff::default(),
        (None, Some(_)) => OutputDiff {
            added: true,
            ..Default::default()
        },
        (Some(_), None) => OutputDiff {
            removed: true,
            ..Default::default()
        },
        (Some(o), Some(n)) => OutputDiff {
            classes: compare_classes(&o.terminal_classes, &n.terminal_classes),
            ..Default::default()
        },
    }
}

fn first_by<'a, T>(items: &'a [T], key: impl Fn(&'a T) -> &'a str) -> HashMap<&'a str, &'a T> {
    let mut map = HashMap::new();
    for item in items {
        map.entry(key(item)).or_insert(item);
    }
    map
}

fn tagged(classes: &[TerminalClass], status: ChangeStatus, source: SourceVersion) -> Vec<TerminalClass> {
    classes
        .iter()
        .map(|tc| tc.clone().with_status(status, source))
        .collect()
}

/// New-version order first, then whatever only the old version had.
fn merged_classes(new: &[TerminalClass], diff: &ClassDiff) -> Vec<TerminalClass> {
    let verdicts: HashMap<&str, ChangeStatus> = diff
        .added
        .iter()
        .map(|tc| (tc.label.as_str(), ChangeStatus::Added))
        .chain(diff.modified.iter().map(|m| (m.label.as_str(), ChangeStatus::Modified)))
        .collect();
    let mut seen = HashSet::new();
    let mut out: Vec<TerminalClass> = new
        .iter()
        .filter(|tc| seen.insert(tc.label.as_str()))
        .map(|tc| match verdicts.get(tc.label.as_str()) {
            Some(ChangeStatus::Added) => tc.clone().with_status(ChangeStatus::Added, SourceVersion::New),
            Some(status) => tc.clone().with_status(*status, SourceVersion::Both),
            None => tc.clone().with_status(ChangeStatus::Unchanged, SourceVersion::Both),
        })
        .collect();
    out.extend(tagged(&diff.removed, ChangeStatus::Removed, SourceVersion::Old));
    out
}

fn merged_tree(
    old: &ClassificationTree,
    new: &ClassificationTree,
    diff: &VariableDiff,
    output_diff: &OutputDiff,
) -> ClassificationTree {
    let modified: HashMap<&str, &ModifiedVariable> =
        diff.modified.iter().map(|m| (m.name.as_str(), m)).collect();
    let added: HashSet<&str> = diff.added.iter().map(|v| v.name.as_str()).collect();

    let mut seen = HashSet::new();
    let mut variables: Vec<Variable> = Vec::new();
    for var in new.variables.iter().filter(|v| seen.insert(v.name.as_str())) {
        let merged = if added.contains(var.name.as_str()) {
            Variable {
                terminal_classes: tagged(&var.terminal_classes, ChangeStatus::Added, SourceVersion::New),
                ..var.clone()
            }
            .with_status(ChangeStatus::Added, SourceVersion::New)
        } else if let Some(m) = modified.get(var.name.as_str()) {
            Variable {
                terminal_classes: merged_classes(&var.terminal_classes, &m.changes),
                ..var.clone()
            }
            .with_status(ChangeStatus::Modified, SourceVersion::Both)
        } else {
            Variable {
                terminal_classes: tagged(&var.terminal_classes, ChangeStatus::Unchanged, SourceVersion::Both),
                ..var.clone()
            }
            .with_status(ChangeStatus::Unchanged, SourceVersion::Both)
        };
        variables.push(merged);
    }
    for var in &diff.removed {
        variables.push(
            Variable {
                terminal_classes: tagged(&var.terminal_classes, ChangeStatus::Removed, SourceVersion::Old),
                ..var.clone()
            }
            .with_status(ChangeStatus::Removed, SourceVersion::Old),
        );
    }

    let output = match (old.output.as_ref(), new.output.as_ref()) {
        (_, Some(n)) => {
            let classes = match old.output.as_ref() {
                Some(_) => merged_classes(&n.terminal_classes, &output_diff.classes),
                None => tagged(&n.terminal_classes, ChangeStatus::Added, SourceVersion::New),
            };
            Some(Output {
                name: n.name.clone(),
                terminal_classes: classes,
                status: Some(output_status(output_diff)),
            })
        }
        (Some(o), None) => Some(Output {
            name: o.name.clone(),
            terminal_classes: tagged(&o.terminal_classes, ChangeStatus::Removed, SourceVersion::Old),
            status: Some(ChangeStatus::Removed),
        }),
        (None, None) => None,
    };

    ClassificationTree {
        use_case: new.use_case.clone(),
        system: new.system.clone().or_else(|| old.system.clone()),
        variables,
        output,
    }
}

fn output_status(diff: &OutputDiff) -> ChangeStatus {
    if diff.added {
        ChangeStatus::Added
    } else if diff.has_changes() {
        ChangeStatus::Modified
    } else {
        ChangeStatus::Unchanged
    }
}

fn summarize(diff: &VariableDiff, output: &OutputDiff) -> DiffSummary {
    let classes_of = |vars: &[Variable]| -> usize { vars.iter().map(|v| v.terminal_classes.len()).sum() };
    DiffSummary {
        variables_added: diff.added.len(),
        variables_removed: diff.removed.len(),
        variables_modified: diff.modified.len(),
        variables_unchanged: diff.unchanged.len(),
        output_changed: output.has_changes(),
        terminal_classes_added: classes_of(&diff.added)
            + diff.modified.iter().map(|m| m.changes.added.len()).sum::<usize>(),
        terminal_classes_removed: classes_of(&diff.removed)
            + diff.modified.iter().map(|m| m.changes.removed.len()).sum::<usize>(),
        terminal_classes_modified: diff.modified.iter().map(|m| m.changes.modified.len()).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cctm_core::{Interval, VariableType};
    use pretty_assertions::assert_eq;

    fn class(label: &str, iv: Interval, valid: bool) -> TerminalClass {
        TerminalClass::interval(format!("Age-{}", label), label, iv, valid)
    }

    fn v1() -> ClassificationTree {
        ClassificationTree::default()
            .with_variable(
                Variable::new("Age", VariableType::Range)
                    .with_class(class("minor", Interval::new(0.0, 17.0), false))
                    .with_class(class("adult", Interval::new(18.0, 65.0), true))
                    .with_class(class("senior", Interval::new(66.0, 120.0), true)),
            )
            .with_variable(Variable::new("Smoker", VariableType::Boolean).with_class(
                TerminalClass::literal("Smoker-yes", "yes", vec![true.into()], true),
            ))
    }

    fn v2() -> ClassificationTree {
        ClassificationTree::default()
            .with_variable(
                Variable::new("Age", VariableType::Range)
                    .with_class(class("minor", Interval::new(0.0, 17.0), false))
                    .with_class(class("adult", Interval::new(18.0, 60.0), true))
                    .with_class(class("senior", Interval::new(66.0, 120.0), false))
                    .with_class(class("ancient", Interval::at_least(120.1), false)),
            )
            .with_variable(Variable::new("Region", VariableType::Enum).with_class(
                TerminalClass::literal("Region-north", "north", vec!["north".into()], true),
            ))
            .with_output(Output::new("Premium"))
    }

    #[test]
    fn test_variable_buckets() {
        let report = compare(&v1(), &v2());
        let names = |vs: &[Variable]| vs.iter().map(|v| v.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&report.variable_diff.added), vec!["Region"]);
        assert_eq!(names(&report.variable_diff.removed), vec!["Smoker"]);
        assert_eq!(report.variable_diff.modified.len(), 1);
        assert!(report.variable_diff.unchanged.is_empty());

        let changes = &report.variable_diff.modified[0].changes;
        assert_eq!(changes.added[0].label, "ancient");
        assert_eq!(changes.unchanged[0].label, "minor");
        let kinds: Vec<_> = changes.modified.iter().map(|m| (m.label.as_str(), m.change_kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("adult", ChangeKind::RangeChanged),
                ("senior", ChangeKind::ValidityChanged)
            ]
        );
    }

    #[test]
    fn test_summary_counts() {
        let summary = compare(&v1(), &v2()).summary;
        assert_eq!(
            summary,
            DiffSummary {
                variables_added: 1,
                variables_removed: 1,
                variables_modified: 1,
                variables_unchanged: 0,
                output_changed: true,
                terminal_classes_added: 2,
                terminal_classes_removed: 1,
                terminal_classes_modified: 2,
            }
        );
    }

    #[test]
    fn test_merged_tree_annotations() {
        let report = compare(&v1(), &v2());
        let merged = &report.merged_tree;
        let statuses: Vec<_> = merged
            .variables
            .iter()
            .map(|v| (v.name.as_str(), v.status, v.source_version))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("Age", Some(ChangeStatus::Modified), Some(SourceVersion::Both)),
                ("Region", Some(ChangeStatus::Added), Some(SourceVersion::New)),
                ("Smoker", Some(ChangeStatus::Removed), Some(SourceVersion::Old)),
            ]
        );
        let age = merged.variable("Age").unwrap();
        assert_eq!(age.class_by_label("adult").unwrap().status, Some(ChangeStatus::Modified));
        assert_eq!(age.class_by_label("ancient").unwrap().source_version, Some(SourceVersion::New));
        assert_eq!(merged.output.as_ref().unwrap().status, Some(ChangeStatus::Added));
    }

    #[test]
    fn test_active_tree_and_changed_ids() {
        let report = compare(&v1(), &v2());
        let active = report.active_tree();
        assert!(active.variable("Smoker").is_none());
        assert_eq!(active.variables.len(), 2);

        let mut changed: Vec<_> = report.changed_class_ids().into_iter().collect();
        changed.sort();
        assert_eq!(
            changed,
            vec!["Age-adult", "Age-ancient", "Age-senior", "Region-north"]
        );
    }

    #[test]
    fn test_identical_versions_have_no_changes() {
        let report = compare(&v1(), &v1());
        assert!(!report.has_changes());
        assert_eq!(report.variable_diff.unchanged.len(), 2);
        assert!(report.impact.rules.is_empty());
        assert!(report.changed_class_ids().is_empty());
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let (old, new) = (v1(), v2());
        let _ = compare(&old, &new);
        assert_eq!(old, v1());
        assert_eq!(new, v2());
    }
}

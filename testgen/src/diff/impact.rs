//! Impact rules derived from a diff

use super::{ChangeKind, OutputDiff, VariableDiff};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactTrigger {
    VariableAdded,
    VariableRemoved,
    TerminalClassAdded,
    TerminalClassRemoved,
    TerminalClassModified,
    OutputChanged,
}

impl ImpactTrigger {
    pub fn action(&self) -> ImpactAction {
        match self {
            ImpactTrigger::VariableAdded | ImpactTrigger::TerminalClassAdded => {
                ImpactAction::GenerateTestCases
            }
            ImpactTrigger::VariableRemoved | ImpactTrigger::TerminalClassRemoved => {
                ImpactAction::MarkObsolete
            }
            ImpactTrigger::TerminalClassModified => ImpactAction::RegenerateTestCases,
            ImpactTrigger::OutputChanged => ImpactAction::ReviewExpectedOutputs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactAction {
    GenerateTestCases,
    MarkObsolete,
    RegenerateTestCases,
    ReviewExpectedOutputs,
}

/// A variable or terminal class whose test cases are affected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactTarget {
    pub variable: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_class: Option<String>,
    pub reason: ImpactTrigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_kind: Option<ChangeKind>,
    /// Labels covered when a whole variable is added
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terminal_classes: Vec<String>,
}

/// One record per triggering event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactRule {
    pub trigger: ImpactTrigger,
    pub action: ImpactAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_class: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    pub test_cases_to_generate: Vec<ImpactTarget>,
    pub test_cases_to_mark_obsolete: Vec<ImpactTarget>,
    pub test_cases_to_regenerate: Vec<ImpactTarget>,
    pub rules: Vec<ImpactRule>,
}

impl Impact {
    pub fn analyze(variables: &VariableDiff, output: &OutputDiff) -> Self {
        let mut impact = Impact::default();

        for var in &variables.added {
            impact.record(
                ImpactTarget {
                    terminal_classes: var.terminal_classes.iter().map(|tc| tc.label.clone()).collect(),
                    ..target(&var.name, None, ImpactTrigger::VariableAdded)
                },
                format!(
                    "Generate test cases covering all terminal classes of new variable {}",
                    var.name
                ),
            );
        }

        for var in &variables.removed {
            impact.record(
                target(&var.name, None, ImpactTrigger::VariableRemoved),
                format!("Mark all test cases depending on variable {} as obsolete", var.name),
            );
        }

        for var in &variables.modified {
            for m in &var.changes.modified {
                let kind = match m.change_kind {
                    ChangeKind::RangeChanged => "range changed",
                    ChangeKind::ValidityChanged => "validity changed",
                };
                impact.record(
                    ImpactTarget {
                        change_kind: Some(m.change_kind),
                        ..target(&var.name, Some(&m.label), ImpactTrigger::TerminalClassModified)
                    },
                    format!(
                        "Regenerate test cases that depend on {}.{} ({})",
                        var.name, m.label, kind
                    ),
                );
            }
            for tc in &var.changes.added {
                impact.record(
                    target(&var.name, Some(&tc.label), ImpactTrigger::TerminalClassAdded),
                    format!("Generate test cases for new class {}.{}", var.name, tc.label),
                );
            }
            for tc in &var.changes.removed {
                impact.record(
                    target(&var.name, Some(&tc.label), ImpactTrigger::TerminalClassRemoved),
                    format!(
                        "Mark test cases depending on {}.{} as obsolete",
                        var.name, tc.label
                    ),
                );
            }
        }

        if output.has_changes() {
            let c = &output.classes;
            impact.rules.push(ImpactRule {
                trigger: ImpactTrigger::OutputChanged,
                action: ImpactAction::ReviewExpectedOutputs,
                variable: None,
                terminal_class: None,
                description: format!(
                    "Review expected outputs ({} added, {} removed, {} modified)",
                    c.added.len(),
                    c.removed.len(),
                    c.modified.len()
                ),
            });
        }

        impact
    }

    fn record(&mut self, target: ImpactTarget, description: String) {
        let action = target.reason.action();
        self.rules.push(ImpactRule {
            trigger: target.reason,
            action,
            variable: Some(target.variable.clone()),
            terminal_class: target.terminal_class.clone(),
            description,
        });
        match action {
            ImpactAction::GenerateTestCases => self.test_cases_to_generate.push(target),
            ImpactAction::MarkObsolete => self.test_cases_to_mark_obsolete.push(target),
            ImpactAction::RegenerateTestCases => self.test_cases_to_regenerate.push(target),
            ImpactAction::ReviewExpectedOutputs => {}
        }
    }
}

fn target(variable: &str, class: Option<&str>, reason: ImpactTrigger) -> ImpactTarget {
    ImpactTarget {
        variable: variable.to_string(),
        terminal_class: class.map(str::to_string),
        reason,
        change_kind: None,
        terminal_classes: Vec::new(),
    }
}

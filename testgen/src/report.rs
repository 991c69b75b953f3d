//! Plain-text summaries of a generation run

use crate::types::{GenerationOutcome, Warning};
use cctm_core::CaseKind;
use std::fmt::Write;

/// Renders a generation outcome for humans
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn generate(outcome: &GenerationOutcome) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = Self::write(&mut out, outcome);
        out
    }

    fn write(out: &mut String, outcome: &GenerationOutcome) -> std::fmt::Result {
        let use_case = &outcome.tree.use_case;
        writeln!(out, "Use case: {} ({})", use_case.name, use_case.id)?;
        if let Some(system) = &outcome.tree.system {
            writeln!(out, "System: {}", system)?;
        }
        writeln!(
            out,
            "Variables: {}  Terminal classes: {}",
            outcome.tree.variables.len(),
            outcome.tree.class_count()
        )?;
        writeln!(out)?;

        let stats = &outcome.stats;
        writeln!(out, "Strategy: {} (seed {})", stats.strategy.as_str(), outcome.seed)?;
        if let Some(size) = stats.product_size {
            writeln!(out, "Product size: {}", size)?;
        }
        let count = |kind: CaseKind| outcome.test_cases.iter().filter(|tc| tc.kind == kind).count();
        writeln!(
            out,
            "Test cases: {} ({} valid, {} invalid)",
            outcome.test_cases.len(),
            count(CaseKind::Valid),
            count(CaseKind::Invalid)
        )?;
        if stats.duplicates_removed > 0 {
            writeln!(out, "Duplicates removed: {}", stats.duplicates_removed)?;
        }
        if stats.boundary_cases > 0 {
            writeln!(out, "Boundary cases: {}", stats.boundary_cases)?;
        }

        if let Some(diff) = &outcome.diff {
            let s = &diff.summary;
            writeln!(out)?;
            writeln!(out, "Changes since baseline:")?;
            writeln!(
                out,
                "  variables: +{} -{} ~{} ={}",
                s.variables_added, s.variables_removed, s.variables_modified, s.variables_unchanged
            )?;
            writeln!(
                out,
                "  terminal classes: +{} -{} ~{}",
                s.terminal_classes_added, s.terminal_classes_removed, s.terminal_classes_modified
            )?;
            if s.output_changed {
                writeln!(out, "  output changed, review expected values")?;
            }
            for rule in &diff.impact.rules {
                writeln!(out, "  - {}", rule.description)?;
            }
        }

        let conflicts: Vec<&Warning> = outcome
            .warnings
            .iter()
            .filter(|w| matches!(w, Warning::MergeConflict(_)))
            .collect();
        let others: Vec<&Warning> = outcome
            .warnings
            .iter()
            .filter(|w| !matches!(w, Warning::MergeConflict(_)))
            .collect();
        if !conflicts.is_empty() {
            writeln!(out)?;
            writeln!(out, "Merge conflicts ({}):", conflicts.len())?;
            for w in conflicts {
                writeln!(out, "  - {}", w.describe())?;
            }
        }
        if !others.is_empty() {
            writeln!(out)?;
            writeln!(out, "Warnings:")?;
            for w in others {
                writeln!(out, "  - {}", w.describe())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GenerationStats, GenerationStrategy, MergeConflict};
    use cctm_core::{inputs, ClassificationTree, TestCase};

    #[test]
    fn test_report_mentions_counts_and_conflicts() {
        let outcome = GenerationOutcome {
            tree: ClassificationTree::default(),
            partitions: Vec::new(),
            test_cases: vec![TestCase {
                id: "TC-1".into(),
                kind: CaseKind::Invalid,
                inputs: inputs! { "Age" => 9i64 },
                expected: None,
                meta: vec!["Age-0".into()],
            }],
            diff: None,
            warnings: vec![Warning::MergeConflict(MergeConflict {
                variable: "Age".into(),
                label: "minor".into(),
                existing_valid: false,
                incoming_valid: true,
            })],
            stats: GenerationStats {
                strategy: GenerationStrategy::Full,
                product_size: Some(1),
                duplicates_removed: 0,
                boundary_cases: 0,
                valid: 0,
                invalid: 1,
            },
            seed: 42,
        };
        let text = ReportGenerator::generate(&outcome);
        assert!(text.contains("Use case: Use Case (default)"));
        assert!(text.contains("Test cases: 1 (0 valid, 1 invalid)"));
        assert!(text.contains("Merge conflicts (1):"));
        assert!(text.contains("Age: 'minor' is invalid in the baseline but valid in the upload"));
    }
}

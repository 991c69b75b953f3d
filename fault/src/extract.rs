//! Fault-tree extraction entry point.

use crate::condition::mentions_stage;
use crate::pattern::{EventNode, FaultPattern, IdAllocator, PatternKind};
use crate::FaultGraph;
use cctm_core::{fault_case_id, FaultEdge, FaultNode, FaultNodeType, FaultTestCase};
use cctm_parser::{parse_document, Element, ParseError, ParseResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultExtraction {
    pub nodes: Vec<FaultNode>,
    pub edges: Vec<FaultEdge>,
    pub test_cases: Vec<FaultTestCase>,
    /// Root-to-leaf label paths per pattern.
    pub scenarios: Vec<Vec<String>>,
}

/// Parse fault-pattern XML into a graph and one test case per basic event.
pub fn parse_fault_tree(xml: &str) -> ParseResult<FaultExtraction> {
    let root = parse_document(xml)?;
    let elements = pattern_elements(&root);
    if elements.is_empty() {
        return Err(ParseError::unrecognized_root(
            root.span,
            &root.name,
            &["pattern", "topEvent"],
        ));
    }

    let mut ids = IdAllocator::default();
    let patterns: Vec<FaultPattern> = elements
        .into_iter()
        .map(|e| FaultPattern::from_element(e, &mut ids))
        .collect();

    let mut graph = FaultGraph::new();
    let mut test_cases = Vec::new();
    let mut scenarios = Vec::new();
    for pattern in &patterns {
        add_pattern(&mut graph, pattern);
        synthesize(pattern, &mut test_cases);
        scenarios.extend(pattern.scenarios());
    }

    let dangling = graph.dangling_edges().len();
    if dangling > 0 {
        tracing::warn!(dangling, "edges reference nodes merged away by label");
    }
    tracing::info!(
        patterns = patterns.len(),
        test_cases = test_cases.len(),
        "extracted fault scenarios"
    );

    let (nodes, edges) = graph.into_parts();
    Ok(FaultExtraction {
        nodes,
        edges,
        test_cases,
        scenarios,
    })
}

/// `<pattern>` elements anywhere in the document, or the whole document
/// as a single pattern when it is a bare fault tree.
fn pattern_elements(root: &Element) -> Vec<&Element> {
    if root.name == "pattern" {
        return vec![root];
    }
    let patterns = root.descendants_named("pattern");
    if !patterns.is_empty() {
        return patterns;
    }
    if root.name == "topEvent" || root.has_child("topEvent") {
        return vec![root];
    }
    Vec::new()
}

fn add_pattern(graph: &mut FaultGraph, pattern: &FaultPattern) {
    pattern.top.walk(&mut |node, ancestors| {
        graph.add_node(FaultNode::new(node.id.clone(), node.label.clone(), node.kind));
        if let Some(parent) = ancestors.last() {
            graph.add_edge(parent.id.clone(), node.id.clone());
        }
    });
    for (id, label) in &pattern.properties {
        graph.add_node(FaultNode::new(id.clone(), label.clone(), FaultNodeType::Property));
        graph.add_edge(pattern.top.id.clone(), id.clone());
    }
}

fn synthesize(pattern: &FaultPattern, out: &mut Vec<FaultTestCase>) {
    let mut basics: Vec<(&EventNode, Vec<&EventNode>)> = Vec::new();
    pattern.top.walk(&mut |node, ancestors| {
        if node.kind == FaultNodeType::Basic {
            basics.push((node, ancestors.to_vec()));
        }
    });

    for (node, ancestors) in basics {
        let Some(event) = &node.event else { continue };
        let parent = ancestors.last().copied().unwrap_or(&pattern.top);

        let (description, triggers) = match pattern.kind {
            PatternKind::InvalidRange => {
                let mut triggers = vec![node.id.clone()];
                triggers.extend(ancestors.iter().rev().map(|a| a.id.clone()));
                (event.label.clone(), triggers)
            }
            PatternKind::InvalidMapping => {
                let stage = bound_stage(pattern, node).unwrap_or(parent);
                (
                    format!("{} -> {}", event.label, stage.label),
                    chain(node, stage, &pattern.top),
                )
            }
            PatternKind::SafetyProperty => (
                format!("{}: {}", parent.label, event.label),
                chain(node, parent, &pattern.top),
            ),
        };

        out.push(FaultTestCase {
            id: fault_case_id(out.len() + 1),
            description,
            inputs: event.inputs(),
            triggers,
        });
    }
}

/// The intermediate event named by the first mapping whose condition
/// intersects the basic event's own condition.
fn bound_stage<'a>(pattern: &'a FaultPattern, node: &EventNode) -> Option<&'a EventNode> {
    let condition = node.event.as_ref()?.condition()?;
    let stage = pattern
        .mappings
        .iter()
        .filter(|m| m.stage.is_some())
        .find(|m| condition.matches(m))?
        .stage
        .as_deref()?;
    let found = pattern
        .intermediates()
        .into_iter()
        .find(|n| mentions_stage(&n.label, stage));
    if found.is_none() {
        tracing::debug!(stage, event = %node.label, "no intermediate event names mapped stage");
    }
    found
}

fn chain(node: &EventNode, stage: &EventNode, top: &EventNode) -> Vec<String> {
    let mut triggers = vec![node.id.clone()];
    for id in [&stage.id, &top.id] {
        if !triggers.contains(id) {
            triggers.push(id.clone());
        }
    }
    triggers
}

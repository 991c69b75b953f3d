//! Node/edge graph assembled from fault patterns.

use cctm_core::{FaultEdge, FaultNode};
use std::collections::HashSet;

/// Nodes are deduplicated by label (first occurrence wins). Edges are kept
/// as declared, so an edge may name the id of a node that lost to an
/// earlier one with the same label.
#[derive(Debug, Clone, Default)]
pub struct FaultGraph {
    nodes: Vec<FaultNode>,
    edges: Vec<FaultEdge>,
    labels: HashSet<String>,
}

impl FaultGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when a node with the same label already exists.
    pub fn add_node(&mut self, node: FaultNode) -> bool {
        if !self.labels.insert(node.label.clone()) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.edges.push(FaultEdge::new(from, to));
    }

    pub fn nodes(&self) -> &[FaultNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[FaultEdge] {
        &self.edges
    }

    /// Edges with an endpoint that is not a kept node.
    pub fn dangling_edges(&self) -> Vec<&FaultEdge> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .filter(|e| !ids.contains(e.from.as_str()) || !ids.contains(e.to.as_str()))
            .collect()
    }

    pub fn into_parts(self) -> (Vec<FaultNode>, Vec<FaultEdge>) {
        (self.nodes, self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cctm_core::FaultNodeType;

    #[test]
    fn test_dedup_by_label_keeps_first() {
        let mut g = FaultGraph::new();
        assert!(g.add_node(FaultNode::new("a", "Same", FaultNodeType::Intermediate)));
        assert!(!g.add_node(FaultNode::new("b", "Same", FaultNodeType::Intermediate)));
        g.add_edge("a", "b");
        assert_eq!(g.nodes().len(), 1);
        assert_eq!(g.nodes()[0].id, "a");
        assert_eq!(g.dangling_edges().len(), 1);
    }
}

//! Fault patterns read from XML.

use crate::condition::{Comparison, Condition, NumericSpan};
use crate::event::BasicEvent;
use cctm_core::FaultNodeType;
use cctm_parser::Element;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    InvalidRange,
    InvalidMapping,
    SafetyProperty,
}

impl PatternKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "invalid-range" => Some(PatternKind::InvalidRange),
            "invalid-mapping" => Some(PatternKind::InvalidMapping),
            "safety-property" => Some(PatternKind::SafetyProperty),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::InvalidRange => "invalid-range",
            PatternKind::InvalidMapping => "invalid-mapping",
            PatternKind::SafetyProperty => "safety-property",
        }
    }
}

/// One node of a pattern's event hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct EventNode {
    pub id: String,
    pub label: String,
    pub kind: FaultNodeType,
    pub children: Vec<EventNode>,
    /// Set for basic events.
    pub event: Option<BasicEvent>,
}

impl EventNode {
    /// Pre-order walk.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a EventNode, &[&'a EventNode])) {
        let mut ancestors = Vec::new();
        self.walk_inner(&mut ancestors, visit);
    }

    fn walk_inner<'a>(
        &'a self,
        ancestors: &mut Vec<&'a EventNode>,
        visit: &mut dyn FnMut(&'a EventNode, &[&'a EventNode]),
    ) {
        visit(self, ancestors);
        ancestors.push(self);
        for child in &self.children {
            child.walk_inner(ancestors, visit);
        }
        ancestors.pop();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaultPattern {
    pub name: Option<String>,
    pub kind: PatternKind,
    pub top: EventNode,
    pub mappings: Vec<Condition>,
    pub properties: Vec<(String, String)>,
}

impl FaultPattern {
    pub(crate) fn from_element(element: &Element, ids: &mut IdAllocator) -> Self {
        let top_element = element.child("topEvent").unwrap_or(element);
        let top = read_event(top_element, FaultNodeType::Top, ids);
        let mappings = read_mappings(element);
        let properties = read_properties(element, ids);

        let declared = element.attr("type").and_then(PatternKind::parse);
        let kind = declared.unwrap_or_else(|| {
            if !mappings.is_empty() {
                PatternKind::InvalidMapping
            } else if has_structured_event(&top) {
                PatternKind::InvalidRange
            } else {
                PatternKind::SafetyProperty
            }
        });
        if declared.is_none() {
            tracing::debug!(kind = kind.as_str(), "pattern type inferred from structure");
        }

        Self {
            name: element.field("name"),
            kind,
            top,
            mappings,
            properties,
        }
    }

    /// Every root-to-leaf label path.
    pub fn scenarios(&self) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        self.top.walk(&mut |node, ancestors| {
            if node.children.is_empty() {
                let mut path: Vec<String> = ancestors.iter().map(|a| a.label.clone()).collect();
                path.push(node.label.clone());
                paths.push(path);
            }
        });
        paths
    }

    /// Intermediate events in document order.
    pub fn intermediates(&self) -> Vec<&EventNode> {
        let mut found = Vec::new();
        self.top.walk(&mut |node, _| {
            if node.kind == FaultNodeType::Intermediate {
                found.push(node);
            }
        });
        found
    }
}

fn has_structured_event(node: &EventNode) -> bool {
    node.event.as_ref().map_or(false, BasicEvent::is_structured)
        || node.children.iter().any(has_structured_event)
}

fn read_event(element: &Element, kind: FaultNodeType, ids: &mut IdAllocator) -> EventNode {
    if kind == FaultNodeType::Basic {
        let id = ids.claim(element.attr("id"), "basic");
        let event = BasicEvent::from_element(element, id.clone());
        return EventNode {
            id,
            label: event.label.clone(),
            kind,
            children: Vec::new(),
            event: Some(event),
        };
    }

    let id = ids.claim(element.attr("id"), kind_prefix(kind));
    let label = element
        .field("label")
        .or_else(|| element.field("name"))
        .or_else(|| element.field("description"))
        .unwrap_or_else(|| id.clone());
    let children = element
        .elements()
        .filter_map(|child| match child.name.as_str() {
            "intermediateEvent" => Some(read_event(child, FaultNodeType::Intermediate, ids)),
            "basicEvent" => Some(read_event(child, FaultNodeType::Basic, ids)),
            _ => None,
        })
        .collect();
    EventNode {
        id,
        label,
        kind,
        children,
        event: None,
    }
}

fn kind_prefix(kind: FaultNodeType) -> &'static str {
    match kind {
        FaultNodeType::Top => "top",
        FaultNodeType::Intermediate => "intermediate",
        FaultNodeType::Basic => "basic",
        FaultNodeType::Property => "property",
    }
}

/// Mapping entries are either text (`GFR >= 90 -> RISK`) or attributes
/// (`variable`, `operator`, `value` or `min`/`max`, `stage`).
fn read_mappings(pattern: &Element) -> Vec<Condition> {
    let Some(section) = pattern.child("mappings") else {
        return Vec::new();
    };
    section
        .elements()
        .filter_map(|m| {
            let parsed = structured_mapping(m).or_else(|| {
                let text = m.field("condition").unwrap_or_else(|| m.text());
                let mut cond = Condition::parse(&text)?;
                if cond.stage.is_none() {
                    cond.stage = m.field("stage");
                }
                Some(cond)
            });
            if parsed.is_none() {
                tracing::warn!(element = %m.name, "skipping unreadable mapping condition");
            }
            parsed
        })
        .collect()
}

fn structured_mapping(m: &Element) -> Option<Condition> {
    let variable = m.attr("variable")?.trim().to_string();
    let stage = m.field("stage");
    if let (Some(lo), Some(hi)) = (m.attr("min"), m.attr("max")) {
        return Some(Condition {
            variable,
            op: Comparison::Eq,
            span: NumericSpan::closed(lo.trim().parse().ok()?, hi.trim().parse().ok()?),
            stage,
        });
    }
    let op = Comparison::parse(m.attr("operator").or_else(|| m.attr("op")).unwrap_or("="))?;
    let n: f64 = m.attr("value")?.trim().parse().ok()?;
    Some(Condition {
        variable,
        op,
        span: NumericSpan::from_comparison(op, n)?,
        stage,
    })
}

fn read_properties(pattern: &Element, ids: &mut IdAllocator) -> Vec<(String, String)> {
    let section = pattern.child("properties").unwrap_or(pattern);
    section
        .elements()
        .filter(|e| e.name == "property" || e.name == "safetyProperty")
        .map(|e| {
            let id = ids.claim(e.attr("id"), "property");
            let label = e
                .field("label")
                .or_else(|| e.field("name"))
                .or_else(|| Some(e.text()).filter(|t| !t.is_empty()))
                .unwrap_or_else(|| id.clone());
            (id, label)
        })
        .collect()
}

/// Hands out document-unique node ids, preferring the declared one.
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    used: HashSet<String>,
    counter: usize,
}

impl IdAllocator {
    pub(crate) fn claim(&mut self, preferred: Option<&str>, prefix: &str) -> String {
        if let Some(id) = preferred.map(str::trim).filter(|id| !id.is_empty()) {
            if self.used.insert(id.to_string()) {
                return id.to_string();
            }
        }
        loop {
            self.counter += 1;
            let candidate = match preferred.map(str::trim).filter(|id| !id.is_empty()) {
                Some(id) => format!("{}-{}", id, self.counter),
                None => format!("{}-{}", prefix, self.counter),
            };
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cctm_parser::parse_document;

    fn pattern(xml: &str) -> FaultPattern {
        let element = parse_document(xml).unwrap();
        FaultPattern::from_element(&element, &mut IdAllocator::default())
    }

    #[test]
    fn test_declared_kind() {
        let p = pattern(r#"<pattern type="safety_property"><topEvent label="T"/></pattern>"#);
        assert_eq!(p.kind, PatternKind::SafetyProperty);
    }

    #[test]
    fn test_structural_fallback() {
        let p = pattern(
            r#"<pattern><mappings><mapping>GFR &gt;= 90 -> RISK</mapping></mappings>
               <topEvent label="T"><basicEvent label="GFR &gt;= 90"/></topEvent></pattern>"#,
        );
        assert_eq!(p.kind, PatternKind::InvalidMapping);
        assert_eq!(p.mappings[0].stage.as_deref(), Some("RISK"));

        let p = pattern(r#"<pattern><topEvent label="T"><basicEvent id="Age" min="121" max="200"/></topEvent></pattern>"#);
        assert_eq!(p.kind, PatternKind::InvalidRange);

        let p = pattern(r#"<pattern><topEvent label="T"><basicEvent label="Door opens while moving"/></topEvent></pattern>"#);
        assert_eq!(p.kind, PatternKind::SafetyProperty);
    }

    #[test]
    fn test_structured_mapping() {
        let p = pattern(
            r#"<pattern><mappings><mapping variable="GFR" min="60" max="89" stage="Stage 2"/></mappings>
               <topEvent label="T"/></pattern>"#,
        );
        assert_eq!(p.mappings[0].span, NumericSpan::closed(60.0, 89.0));
        assert_eq!(p.mappings[0].stage.as_deref(), Some("Stage 2"));
    }

    #[test]
    fn test_scenarios_and_ids() {
        let p = pattern(
            r#"<pattern><topEvent id="t" label="Top">
                 <intermediateEvent id="i" label="Mid"><basicEvent id="b" label="Leaf A"/></intermediateEvent>
                 <basicEvent id="b" label="Leaf B"/>
               </topEvent></pattern>"#,
        );
        assert_eq!(
            p.scenarios(),
            vec![
                vec!["Top".to_string(), "Mid".into(), "Leaf A".into()],
                vec!["Top".to_string(), "Leaf B".into()],
            ]
        );
        // duplicate declared ids are made unique
        assert_eq!(p.top.children[1].id, "b-1");
        assert_eq!(p.intermediates().len(), 1);
    }
}

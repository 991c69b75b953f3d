//! Reader for draw.io diagrams.
//!
//! The diagram is a flat list of cells. Shape style decides what a vertex
//! is (ellipse = terminal class, thick rectangle = variable, plain
//! rectangle = classification) and edges give the hierarchy. The use case
//! is the parentless vertex nearest the top.

use crate::range::{looks_invalid, parse_range, RangeContent, RangeMode};
use crate::{Element, ParseError, ParseResult};
use cctm_core::{ClassificationTree, Output, TerminalClass, UseCase, Value, Variable, VariableType};
use std::collections::HashMap;

const OUTPUT_NAME: &str = "controllerAction";
const USE_CASE_ID: &str = "UC_Default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Terminal,
    Variable,
    Classification,
    Unknown,
}

impl CellKind {
    fn from_style(style: &str) -> Self {
        if style.contains("ellipse") {
            CellKind::Terminal
        } else if style.contains("rounded=0") && style.contains("strokeWidth=2") {
            CellKind::Variable
        } else if style.contains("rounded=0") {
            CellKind::Classification
        } else {
            CellKind::Unknown
        }
    }
}

#[derive(Debug)]
struct Vertex {
    value: String,
    kind: CellKind,
    y: f64,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Vertices in document order plus edges resolved to indices.
#[derive(Debug, Default)]
struct Graph {
    vertices: Vec<Vertex>,
}

impl Graph {
    /// True when `candidate` is `idx` or lies on its parent chain.
    fn is_ancestor(&self, candidate: usize, idx: usize) -> bool {
        let mut current = Some(idx);
        while let Some(i) = current {
            if i == candidate {
                return true;
            }
            current = self.vertices[i].parent;
        }
        false
    }
}

/// Intermediate hierarchy below the use case.
#[derive(Debug, Clone)]
enum Shape {
    Var(Variable),
    Group { name: String, children: Vec<Shape> },
}

impl Shape {
    fn variable_names(&self, out: &mut Vec<String>) {
        match self {
            Shape::Var(v) => out.push(v.name.clone()),
            Shape::Group { children, .. } => children.iter().for_each(|c| c.variable_names(out)),
        }
    }
}

pub fn read_diagram(root: &Element) -> ParseResult<ClassificationTree> {
    let graph = collect_graph(root);
    let root_idx = find_root(&graph).ok_or_else(|| {
        ParseError::new("diagram contains no vertices", root.span)
            .with_expected(vec!["mxCell vertex".to_string()])
    })?;

    let root_vertex = &graph.vertices[root_idx];
    let use_case = UseCase {
        id: USE_CASE_ID.to_string(),
        name: if root_vertex.value.is_empty() {
            UseCase::default().name
        } else {
            root_vertex.value.clone()
        },
        description: String::new(),
    };

    let shapes: Vec<Shape> = root_vertex
        .children
        .iter()
        .filter_map(|&child| build_shape(&graph, child, None, &mut vec![root_idx]))
        .collect();
    let variables = flatten(shapes);

    let output_nodes: Vec<&Vertex> = root_vertex
        .children
        .iter()
        .map(|&c| &graph.vertices[c])
        .filter(|v| v.kind == CellKind::Terminal)
        .filter(|v| !variables.iter().any(|var| v.value.contains(&var.name)))
        .collect();
    let output = if output_nodes.is_empty() {
        None
    } else {
        let mut output = Output::new(OUTPUT_NAME);
        for (idx, node) in output_nodes.iter().enumerate() {
            output.terminal_classes.push(TerminalClass::literal(
                format!("output-{}-{}", node.value, idx),
                node.value.clone(),
                vec![Value::String(node.value.clone())],
                true,
            ));
        }
        Some(output)
    };

    tracing::debug!(
        vertices = graph.vertices.len(),
        variables = variables.len(),
        "read diagram"
    );

    Ok(ClassificationTree {
        system: Some(use_case.name.clone()),
        use_case,
        variables,
        output,
    })
}

fn collect_graph(root: &Element) -> Graph {
    let mut graph = Graph::default();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut edges: Vec<(String, String)> = Vec::new();

    for cell in cells(root) {
        let Some(id) = cell.id else { continue };
        let is_edge = cell.edge || (cell.source.is_some() && cell.target.is_some());
        let is_vertex =
            cell.vertex || (!cell.value.is_empty() && cell.source.is_none() && cell.target.is_none());
        if is_edge {
            if let (Some(s), Some(t)) = (cell.source, cell.target) {
                edges.push((s, t));
            }
        } else if is_vertex {
            index.insert(id, graph.vertices.len());
            graph.vertices.push(Vertex {
                value: cell.value,
                kind: CellKind::from_style(&cell.style),
                y: cell.y,
                parent: None,
                children: Vec::new(),
            });
        }
    }

    for (source, target) in edges {
        if let (Some(&s), Some(&t)) = (index.get(&source), index.get(&target)) {
            if graph.is_ancestor(t, s) {
                tracing::warn!(source = %source, target = %target, "ignoring edge that closes a cycle");
                continue;
            }
            graph.vertices[t].parent = Some(s);
            if !graph.vertices[s].children.contains(&t) {
                graph.vertices[s].children.push(t);
            }
        }
    }
    graph
}

struct Cell {
    id: Option<String>,
    value: String,
    style: String,
    vertex: bool,
    edge: bool,
    source: Option<String>,
    target: Option<String>,
    y: f64,
}

/// All `mxCell`s, including those wrapped in `<UserObject>`/`<object>`,
/// which carry the id and label on the wrapper.
fn cells(root: &Element) -> Vec<Cell> {
    let mut out = Vec::new();
    for model in models(root) {
        let Some(cell_root) = model.child("root") else { continue };
        for element in cell_root.elements() {
            let (wrapper, cell) = match element.name.as_str() {
                "mxCell" => (None, element),
                "UserObject" | "object" => match element.child("mxCell") {
                    Some(inner) => (Some(element), inner),
                    None => continue,
                },
                _ => continue,
            };
            let id = wrapper
                .and_then(|w| w.attr("id"))
                .or_else(|| cell.attr("id"))
                .map(str::to_string);
            let value = wrapper
                .and_then(|w| w.attr("label").or_else(|| w.attr("value")))
                .or_else(|| cell.attr("value"))
                .unwrap_or("")
                .trim()
                .to_string();
            let flag = |name: &str| matches!(cell.attr(name), Some("1") | Some("true"));
            let y = cell
                .child("mxGeometry")
                .and_then(|g| g.attr("y"))
                .and_then(|y| y.parse().ok())
                .unwrap_or(0.0);
            out.push(Cell {
                id,
                value,
                style: cell.attr("style").unwrap_or("").to_string(),
                vertex: flag("vertex"),
                edge: flag("edge"),
                source: cell.attr("source").map(str::to_string),
                target: cell.attr("target").map(str::to_string),
                y,
            });
        }
    }
    out
}

fn models(root: &Element) -> Vec<&Element> {
    if root.name == "mxGraphModel" {
        vec![root]
    } else {
        root.descendants_named("mxGraphModel")
    }
}

/// The parentless vertex with the smallest y; any vertex if every one has
/// a parent.
fn find_root(graph: &Graph) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, vertex) in graph.vertices.iter().enumerate() {
        if vertex.parent.is_some() {
            continue;
        }
        match best {
            Some(b) if graph.vertices[b].y <= vertex.y => {}
            _ => best = Some(i),
        }
    }
    best.or_else(|| {
        graph
            .vertices
            .iter()
            .enumerate()
            .fold(None, |best: Option<usize>, (i, v)| match best {
                Some(b) if graph.vertices[b].y <= v.y => Some(b),
                _ => Some(i),
            })
    })
}

/// `path` holds the vertices above `idx`; a vertex already on it is skipped.
fn build_shape(graph: &Graph, idx: usize, parent: Option<&str>, path: &mut Vec<usize>) -> Option<Shape> {
    if path.contains(&idx) {
        return None;
    }
    let vertex = &graph.vertices[idx];
    match vertex.kind {
        CellKind::Variable => {
            if vertex.value.is_empty() {
                return None;
            }
            let name = vertex.value.clone();
            let classes: Vec<TerminalClass> = vertex
                .children
                .iter()
                .map(|&c| &graph.vertices[c])
                .filter(|c| c.kind == CellKind::Terminal)
                .enumerate()
                .map(|(i, c)| terminal_class(&name, &c.value, i))
                .collect();
            if classes.is_empty() {
                return None;
            }
            let mut variable = Variable::new(name, infer_type(&classes));
            variable.terminal_classes = classes;
            variable.parent_classification = parent.map(str::to_string);
            Some(Shape::Var(variable))
        }
        CellKind::Classification => {
            let name = vertex.value.clone();
            path.push(idx);
            let children: Vec<Shape> = vertex
                .children
                .iter()
                .filter_map(|&c| build_shape(graph, c, Some(name.as_str()), path))
                .collect();
            path.pop();
            if children.is_empty() {
                None
            } else {
                Some(Shape::Group { name, children })
            }
        }
        CellKind::Terminal | CellKind::Unknown => None,
    }
}

fn terminal_class(variable: &str, label: &str, idx: usize) -> TerminalClass {
    let id = format!("{}-{}-{}", variable, label, idx);
    let parsed = parse_range(label, RangeMode::Lenient);
    let invalid = looks_invalid(label, label) || parsed.as_ref().map_or(false, |p| !p.valid);
    match parsed.map(|p| p.content) {
        Some(RangeContent::Interval(iv)) => TerminalClass::interval(id, label, iv, !invalid),
        Some(RangeContent::Literal(values)) => TerminalClass::literal(id, label, values, !invalid),
        None => TerminalClass::literal(id, label, vec![Value::String(label.to_string())], !invalid),
    }
}

fn infer_type(classes: &[TerminalClass]) -> VariableType {
    let text = classes
        .iter()
        .map(|c| c.label.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    if text.contains("true") || text.contains("false") {
        VariableType::Boolean
    } else if text.chars().any(|c| c.is_ascii_digit()) {
        VariableType::Float
    } else if text.contains("cc_") || text.contains("active") || text.contains("passive") {
        VariableType::Enum
    } else {
        VariableType::String
    }
}

/// Direct variables first, then classification groups. Groups covering the
/// same variable set are combined under an `A/B/C` label.
fn flatten(shapes: Vec<Shape>) -> Vec<Variable> {
    let mut variables: Vec<Variable> = Vec::new();
    let mut groups: Vec<(String, Vec<(String, Vec<Shape>)>)> = Vec::new();

    for shape in shapes {
        match shape {
            Shape::Var(v) => variables.push(v),
            Shape::Group { name, children } => {
                let mut names = Vec::new();
                children.iter().for_each(|c| c.variable_names(&mut names));
                names.sort();
                let key = names.join(",");
                match groups.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, members)) => members.push((name, children)),
                    None => groups.push((key, vec![(name, children)])),
                }
            }
        }
    }

    for (_, members) in groups {
        let combined = members
            .iter()
            .map(|(n, _)| n.as_str())
            .collect::<Vec<_>>()
            .join("/");
        let Some((_, children)) = members.into_iter().next() else { continue };
        let mut members_vars = Vec::new();
        collect_variables(children, &mut members_vars);
        for mut child in members_vars {
            match variables.iter_mut().find(|v| v.name == child.name) {
                Some(existing) => {
                    for tc in child.terminal_classes {
                        if existing.class_by_label(&tc.label).is_none() {
                            existing.terminal_classes.push(tc);
                        }
                    }
                    existing.parent_classification = match existing.parent_classification.take() {
                        None => Some(combined.clone()),
                        Some(p) if p.contains(&combined) => Some(p),
                        Some(p) => Some(format!("{}/{}", p, combined)),
                    };
                }
                None => {
                    child.parent_classification = Some(combined.clone());
                    variables.push(child);
                }
            }
        }
    }
    variables
}

fn collect_variables(shapes: Vec<Shape>, out: &mut Vec<Variable>) {
    for shape in shapes {
        match shape {
            Shape::Var(v) => out.push(v),
            Shape::Group { children, .. } => collect_variables(children, out),
        }
    }
}

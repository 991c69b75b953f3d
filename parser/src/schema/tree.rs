//! Readers for `<classificationTree>` and `<classificationTrees>` documents.

use crate::range::{looks_invalid, parse_range, RangeContent, RangeMode};
use crate::Element;
use cctm_core::{ClassificationTree, Output, TerminalClass, UseCase, Value, Variable, VariableType};

/// `<classificationTrees system=".."><treeVersion>...</treeVersion>*`
pub fn read_versions(root: &Element) -> Vec<ClassificationTree> {
    let system = system_of(root);
    root.children_named("treeVersion")
        .map(|version| {
            let mut tree = match version.child("useCase") {
                Some(uc) => read_use_case(uc),
                None => ClassificationTree::default(),
            };
            tree.system = system.clone();
            tree
        })
        .collect()
}

/// `<classificationTree system=".."><useCase>...`
pub fn read_single(root: &Element) -> ClassificationTree {
    let mut tree = match root.child("useCase") {
        Some(uc) => read_use_case(uc),
        None => ClassificationTree::default(),
    };
    tree.system = system_of(root);
    tree
}

fn system_of(root: &Element) -> Option<String> {
    root.field("system")
}

fn read_use_case(uc: &Element) -> ClassificationTree {
    let defaults = UseCase::default();
    let use_case = UseCase {
        id: uc.field("id").unwrap_or(defaults.id),
        name: uc.field("name").unwrap_or(defaults.name),
        description: uc.field("description").unwrap_or(defaults.description),
    };

    let variables = uc
        .children_named("variable")
        .enumerate()
        .map(|(idx, v)| read_variable(v, idx))
        .collect();

    ClassificationTree {
        use_case,
        system: None,
        variables,
        output: uc.child("output").map(read_output),
    }
}

fn read_variable(element: &Element, idx: usize) -> Variable {
    let name = element.field("name").unwrap_or_else(|| format!("var_{}", idx));
    let kind = VariableType::parse(&element.field("type").unwrap_or_else(|| "string".into()));
    let mut variable = Variable::new(name.clone(), kind);
    if let Some(parent) = element.field("classification") {
        variable.parent_classification = Some(parent);
    }

    for (i, tc) in element.children_named("terminalClass").enumerate() {
        let tc_name = tc.field("name").unwrap_or_else(|| format!("tc_{}", i));
        let content = class_content(tc);
        let id = format!("{}-{}-{}", name, tc_name, i);
        let valid = !looks_invalid(&tc_name, &content);

        let class = match parse_range(&content, RangeMode::Strict) {
            Some(parsed) => match parsed.content {
                RangeContent::Interval(iv) => TerminalClass::interval(id, tc_name, iv, valid),
                RangeContent::Literal(values) => TerminalClass::literal(id, tc_name, values, valid),
            },
            None if content.is_empty() => TerminalClass::literal(id, tc_name, Vec::new(), valid),
            None => TerminalClass::literal(id, tc_name, vec![Value::String(content)], valid),
        };
        variable.terminal_classes.push(class);
    }
    variable
}

fn read_output(element: &Element) -> Output {
    let name = element.field("name").unwrap_or_else(|| "output".into());
    let mut output = Output::new(name.clone());
    for (i, tc) in element.children_named("terminalClass").enumerate() {
        let tc_name = tc.field("name").unwrap_or_else(|| format!("tc_{}", i));
        let content = class_content(tc);
        let values = if content.is_empty() {
            Vec::new()
        } else {
            vec![Value::String(content)]
        };
        output.terminal_classes.push(TerminalClass::literal(
            format!("{}-{}-{}", name, tc_name, i),
            tc_name,
            values,
            true,
        ));
    }
    output
}

/// Element text, else the `value` attribute.
fn class_content(tc: &Element) -> String {
    let text = tc.text();
    if !text.is_empty() {
        return text;
    }
    tc.attr("value").map(|v| v.trim().to_string()).unwrap_or_default()
}

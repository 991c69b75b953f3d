//! Reader for legacy `<DataDictionary>` documents.

use crate::range::scale_of;
use crate::Element;
use cctm_core::{ClassificationTree, Interval, TerminalClass, Value, Variable, VariableType};

pub fn read_dictionary(root: &Element) -> ClassificationTree {
    let variables = root
        .children_named("Variable")
        .enumerate()
        .map(|(idx, v)| read_variable(v, idx))
        .collect();
    ClassificationTree {
        variables,
        ..Default::default()
    }
}

fn read_variable(element: &Element, idx: usize) -> Variable {
    let name = element.field("Name").unwrap_or_else(|| format!("var_{}", idx));
    let kind = VariableType::parse(&element.field("Type").unwrap_or_else(|| "string".into()));
    let mut variable = Variable::new(name.clone(), kind);

    for (i, range) in element.children_named("Range").enumerate() {
        let min_text = range.field("Min");
        let max_text = range.field("Max");
        let label = range.field("label").unwrap_or_else(|| {
            format!(
                "{}-{}",
                min_text.as_deref().unwrap_or(""),
                max_text.as_deref().unwrap_or("")
            )
        });
        // Explicit `valid` wins; absent means valid.
        let valid = range
            .field("valid")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(true);
        let min = number_or(min_text.as_deref(), f64::NEG_INFINITY);
        let max = number_or(max_text.as_deref(), f64::INFINITY);
        let scale = scale_of(&format!(
            "{} {}",
            min_text.as_deref().unwrap_or(""),
            max_text.as_deref().unwrap_or("")
        ));
        variable.terminal_classes.push(TerminalClass::interval(
            format!("{}-range-{}", name, i),
            label,
            Interval::new(min, max).with_scale(scale),
            valid,
        ));
    }

    if let Some(enumeration) = element.child("Enum") {
        for (i, value) in enumeration.children_named("Value").enumerate() {
            let text = value.text();
            variable.terminal_classes.push(TerminalClass::literal(
                format!("{}-enum-{}", name, i),
                format!("{}={}", name, text),
                vec![Value::String(text)],
                true,
            ));
        }
        variable.terminal_classes.push(TerminalClass::literal(
            format!("{}-enum-invalid", name),
            format!("{}=other", name),
            Vec::new(),
            false,
        ));
    }
    variable
}

fn number_or(text: Option<&str>, fallback: f64) -> f64 {
    text.and_then(|t| t.trim().parse::<f64>().ok())
        .unwrap_or(fallback)
}

//! Basic events and the inputs they trigger.

use crate::condition::{Comparison, Condition, NumericSpan};
use cctm_core::{interval_sample, Inputs, Interval, Value, VariableType};
use cctm_parser::range::scale_of;
use cctm_parser::Element;

/// How a basic event described its trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum EventSource {
    /// `<basicEvent id="GFR" min="0" max="14"/>`
    Range { variable: String, interval: Interval },
    /// `<basicEvent id="Mode" value="manual"/>`
    Value { variable: String, value: Value },
    /// `VAR = VALUE` / `VAR OP VALUE` in the label.
    Label { variable: String, op: Comparison, value: Value },
    /// Nothing could be read; the raw description becomes the input key.
    Raw,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicEvent {
    pub id: String,
    pub label: String,
    pub source: EventSource,
}

impl BasicEvent {
    pub(crate) fn from_element(element: &Element, id: String) -> Self {
        let label = event_label(element);
        let variable = element
            .attr("variable")
            .or_else(|| element.attr("id"))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let min = element.attr("min");
        let max = element.attr("max");
        let source = match (variable, min, max, element.attr("value")) {
            (Some(variable), min, max, _) if min.is_some() || max.is_some() => {
                let lo = min.and_then(|m| m.trim().parse().ok()).unwrap_or(f64::NEG_INFINITY);
                let hi = max.and_then(|m| m.trim().parse().ok()).unwrap_or(f64::INFINITY);
                let scale = scale_of(&format!("{} {}", min.unwrap_or(""), max.unwrap_or("")));
                EventSource::Range {
                    variable,
                    interval: Interval::new(lo, hi).with_scale(scale),
                }
            }
            (Some(variable), _, _, Some(value)) => EventSource::Value {
                variable,
                value: Value::from_literal(value),
            },
            _ => parse_label(&label),
        };
        Self { id, label, source }
    }

    /// True for the attribute forms.
    pub fn is_structured(&self) -> bool {
        matches!(self.source, EventSource::Range { .. } | EventSource::Value { .. })
    }

    pub fn variable(&self) -> Option<&str> {
        match &self.source {
            EventSource::Range { variable, .. }
            | EventSource::Value { variable, .. }
            | EventSource::Label { variable, .. } => Some(variable),
            EventSource::Raw => None,
        }
    }

    /// The input assignment that triggers this event.
    pub fn inputs(&self) -> Inputs {
        let mut inputs = Inputs::new();
        match &self.source {
            EventSource::Range { variable, interval } => {
                inputs.insert(variable.clone(), interval_sample(interval, VariableType::Range));
            }
            EventSource::Value { variable, value } | EventSource::Label { variable, value, .. } => {
                inputs.insert(variable.clone(), value.clone());
            }
            EventSource::Raw => {
                inputs.insert(self.label.clone(), Value::Bool(true));
            }
        }
        inputs
    }

    /// The numeric condition this event stands for, used to bind it to a
    /// mapping.
    pub fn condition(&self) -> Option<Condition> {
        match &self.source {
            EventSource::Range { variable, interval } => Some(Condition {
                variable: variable.clone(),
                op: Comparison::Eq,
                span: NumericSpan::closed(interval.min, interval.max),
                stage: None,
            }),
            EventSource::Value { variable, value } => value.as_f64().map(|n| Condition {
                variable: variable.clone(),
                op: Comparison::Eq,
                span: NumericSpan::closed(n, n),
                stage: None,
            }),
            EventSource::Label { .. } => Condition::parse(&self.label),
            EventSource::Raw => None,
        }
    }
}

fn event_label(element: &Element) -> String {
    element
        .field("label")
        .or_else(|| element.field("name"))
        .or_else(|| element.field("description"))
        .or_else(|| Some(element.text()).filter(|t| !t.is_empty()))
        .or_else(|| element.attr("id").map(str::to_string))
        .unwrap_or_default()
}

/// `VAR = VALUE` or `VAR OP VALUE`. Comparisons pick a value that satisfies
/// the comparison (`> 120` gives 121).
fn parse_label(label: &str) -> EventSource {
    if let Some(cond) = Condition::parse(label) {
        if cond.stage.is_none() {
            let value = match cond.op {
                Comparison::Eq if cond.span.lo == cond.span.hi => Value::number(cond.span.lo),
                Comparison::Ne => Value::number(cond.span.lo + 1.0),
                _ => Value::number(cond.span.witness()),
            };
            return EventSource::Label {
                variable: cond.variable,
                op: cond.op,
                value,
            };
        }
    }
    for op in ["!=", ">=", "<=", "==", "=", ">", "<"] {
        if let Some((lhs, rhs)) = label.split_once(op) {
            let (lhs, rhs) = (lhs.trim(), rhs.trim());
            if !lhs.is_empty() && !rhs.is_empty() && !lhs.contains(char::is_whitespace) {
                if let Some(comparison) = Comparison::parse(op) {
                    return EventSource::Label {
                        variable: lhs.to_string(),
                        op: comparison,
                        value: Value::from_literal(rhs),
                    };
                }
            }
        }
    }
    EventSource::Raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use cctm_core::inputs;
    use cctm_parser::parse_document;
    use pretty_assertions::assert_eq;

    fn event(xml: &str) -> BasicEvent {
        let element = parse_document(xml).unwrap();
        BasicEvent::from_element(&element, "e".into())
    }

    #[test]
    fn test_structured_range() {
        let e = event(r#"<basicEvent id="GFR" min="0" max="14"/>"#);
        assert!(e.is_structured());
        assert_eq!(e.inputs(), inputs! { "GFR" => 7i64 });
        assert_eq!(e.condition().unwrap().span, NumericSpan::closed(0.0, 14.0));
    }

    #[test]
    fn test_structured_value() {
        let e = event(r#"<basicEvent id="Mode" value="manual" label="Manual mode"/>"#);
        assert_eq!(e.label, "Manual mode");
        assert_eq!(e.inputs(), inputs! { "Mode" => "manual" });
        assert!(e.condition().is_none());
    }

    #[test]
    fn test_structured_numeric_value_binds_to_mapping() {
        let e = event(r#"<basicEvent id="GFR" value="90"/>"#);
        assert_eq!(e.inputs(), inputs! { "GFR" => 90i64 });
        let cond = e.condition().unwrap();
        assert_eq!(cond.span, NumericSpan::closed(90.0, 90.0));

        let mapping = Condition::parse("GFR >= 90 -> RISK").unwrap();
        assert!(cond.matches(&mapping));
        let lower = Condition::parse("GFR = 60-89 -> Stage 2").unwrap();
        assert!(!cond.matches(&lower));
    }

    #[test]
    fn test_legacy_labels() {
        let e = event(r#"<basicEvent label="Speed = 0"/>"#);
        assert_eq!(e.inputs(), inputs! { "Speed" => 0i64 });

        let e = event(r#"<basicEvent label="GFR &gt;= 90"/>"#);
        assert_eq!(e.inputs(), inputs! { "GFR" => 90i64 });
        assert_eq!(e.condition().unwrap().op, Comparison::Ge);

        let e = event(r#"<basicEvent label="Age &gt; 120"/>"#);
        assert_eq!(e.inputs(), inputs! { "Age" => 121i64 });

        let e = event(r#"<basicEvent label="Mode = OFF"/>"#);
        assert_eq!(e.inputs(), inputs! { "Mode" => "OFF" });
    }

    #[test]
    fn test_unparseable_label_degrades() {
        let e = event(r#"<basicEvent label="Sensor fails silently"/>"#);
        assert_eq!(e.source, EventSource::Raw);
        assert_eq!(e.inputs(), inputs! { "Sensor fails silently" => true });
    }
}

//! Representative-value sampling for terminal classes.
//!
//! Every terminal class contributes exactly one sample to generation:
//! - numeric classes use the midpoint, rounded to the declared precision
//! - half-open classes step inward from the finite bound
//! - discrete classes use the first literal value, falling back to the label
//! - boolean classes resolve from values, then label keywords, then validity

use crate::{Interval, TerminalClass, Value, VariableType};

/// Minimum number of decimal places kept for decimal samples.
pub const MIN_DECIMAL_PLACES: u32 = 2;

const INTEGER_STEP: f64 = 1.0;
const DECIMAL_STEP: f64 = 0.1;
const PERCENTAGE_DEFAULT: i64 = 50;

/// Pick the representative value of `class` under variable type `kind`.
pub fn representative(class: &TerminalClass, kind: VariableType) -> Value {
    if kind == VariableType::Boolean {
        return boolean_sample(class);
    }
    if let Some(range) = &class.range {
        return interval_sample(range, kind);
    }
    if kind == VariableType::Percentage {
        return Value::Int(PERCENTAGE_DEFAULT);
    }
    class
        .values
        .first()
        .cloned()
        .unwrap_or_else(|| Value::String(class.label.clone()))
}

/// Midpoint of an interval, or a step inside its finite bound.
pub fn interval_sample(range: &Interval, kind: VariableType) -> Value {
    let decimal = kind.is_decimal() || range.scale > 0;
    let places = range.scale.max(MIN_DECIMAL_PLACES);
    let step = if decimal { DECIMAL_STEP } else { INTEGER_STEP };

    let raw = match (range.min.is_finite(), range.max.is_finite()) {
        (true, true) => (range.min + range.max) / 2.0,
        (true, false) => range.min + step,
        (false, true) => range.max - step,
        (false, false) if kind == VariableType::Percentage => PERCENTAGE_DEFAULT as f64,
        (false, false) => 0.0,
    };

    if decimal {
        Value::Float(round_to(raw, places))
    } else {
        let mut n = round_half_up(raw);
        if range.min.is_finite() && range.max.is_finite() {
            n = n.clamp(range.min.ceil(), range.max.floor().max(range.min.ceil()));
        }
        Value::number(n)
    }
}

fn boolean_sample(class: &TerminalClass) -> Value {
    if let Some(first) = class.values.first() {
        return match first {
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => first.clone(),
            },
            other => other.clone(),
        };
    }
    let label = class.label.to_ascii_lowercase();
    label
        .split(|c: char| !c.is_ascii_alphanumeric())
        .find_map(|word| match word {
            "enabled" | "yes" | "true" => Some(true),
            "disabled" | "no" | "false" => Some(false),
            _ => None,
        })
        .map_or(Value::Bool(class.valid), Value::Bool)
}

/// Rounds .5 towards positive infinity.
pub fn round_half_up(n: f64) -> f64 {
    (n + 0.5).floor()
}

pub fn round_to(n: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    round_half_up(n * factor) / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranged(min: f64, max: f64) -> TerminalClass {
        TerminalClass::interval("t", "t", Interval::new(min, max), true)
    }

    #[test]
    fn test_integer_midpoint_rounds_half_up() {
        assert_eq!(representative(&ranged(0.0, 17.0), VariableType::Range), Value::Int(9));
        assert_eq!(representative(&ranged(18.0, 65.0), VariableType::Range), Value::Int(42));
        assert_eq!(representative(&ranged(-3.0, 0.0), VariableType::Range), Value::Int(-1));
    }

    #[test]
    fn test_decimal_midpoint_keeps_precision() {
        let tc = TerminalClass::interval("t", "t", Interval::new(0.5, 1.25).with_scale(2), true);
        assert_eq!(representative(&tc, VariableType::Range), Value::Float(0.88));
        assert_eq!(representative(&ranged(0.0, 1.0), VariableType::Float), Value::Float(0.5));
    }

    #[test]
    fn test_open_bounds_step_inward() {
        let over = TerminalClass::interval("t", ">120", Interval::at_least(120.0), false);
        let under = TerminalClass::interval("t", "<0", Interval::at_most(0.0), false);
        assert_eq!(representative(&over, VariableType::Range), Value::Int(121));
        assert_eq!(representative(&under, VariableType::Range), Value::Int(-1));
        assert_eq!(representative(&over, VariableType::Float), Value::Float(120.1));
    }

    #[test]
    fn test_discrete_and_boolean() {
        let tc = TerminalClass::literal("g", "Male", vec!["M".into()], true);
        assert_eq!(representative(&tc, VariableType::Enum), Value::String("M".into()));
        let tc = TerminalClass::literal("g", "Other", vec![], false);
        assert_eq!(representative(&tc, VariableType::Nominal), Value::String("Other".into()));

        let on = TerminalClass::literal("b", "enabled", vec![], true);
        let off = TerminalClass::literal("b", "No", vec![], true);
        let fallback = TerminalClass::literal("b", "weird", vec![], false);
        assert_eq!(representative(&on, VariableType::Boolean), Value::Bool(true));
        assert_eq!(representative(&off, VariableType::Boolean), Value::Bool(false));
        assert_eq!(representative(&fallback, VariableType::Boolean), Value::Bool(false));
    }

    #[test]
    fn test_boolean_label_matches_whole_words() {
        let on = TerminalClass::literal("b", "Brake enabled", vec![], false);
        let off = TerminalClass::literal("b", "brake_disabled", vec![], true);
        let partial = TerminalClass::literal("b", "Notable", vec![], true);
        assert_eq!(representative(&on, VariableType::Boolean), Value::Bool(true));
        assert_eq!(representative(&off, VariableType::Boolean), Value::Bool(false));
        assert_eq!(representative(&partial, VariableType::Boolean), Value::Bool(true));
    }

    #[test]
    fn test_percentage_default() {
        let tc = TerminalClass::literal("p", "any", vec![], true);
        assert_eq!(representative(&tc, VariableType::Percentage), Value::Int(50));
    }
}

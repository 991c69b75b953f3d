//! Range-string parsing.
//!
//! Terminal-class content is free text such as `0-30`, `30.1-120`,
//! `-inf-0, >300`, `<5`, `true` or `M`. It is read into either a numeric
//! interval or a literal value set, plus a validity flag.

use cctm_core::{Interval, Value};
use regex_lite::Regex;
use std::sync::OnceLock;

/// How permissive the reader is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    /// Tree documents: the whole token must be a range or a literal.
    Strict,
    /// Diagram labels: the first number or number pair found anywhere wins.
    Lenient,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RangeContent {
    Interval(Interval),
    Literal(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRange {
    pub content: RangeContent,
    pub valid: bool,
}

impl ParsedRange {
    fn interval(interval: Interval, valid: bool) -> Self {
        Self {
            content: RangeContent::Interval(interval),
            valid,
        }
    }

    fn literal(values: Vec<Value>) -> Self {
        Self {
            content: RangeContent::Literal(values),
            valid: true,
        }
    }

    pub fn as_interval(&self) -> Option<Interval> {
        match self.content {
            RangeContent::Interval(iv) => Some(iv),
            RangeContent::Literal(_) => None,
        }
    }
}

const OPEN_BOUND_STEP: f64 = 0.1;

fn pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(-?\d+(?:\.\d+)?)\s*-\s*(-?\d+(?:\.\d+)?)$").expect("valid regex")
    })
}

fn comparison_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([<>])\s*(=?)\s*(-?\d+(?:\.\d+)?)").expect("valid regex"))
}

fn neg_inf_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-inf\s*-\s*(-?\d+(?:\.\d+)?)").expect("valid regex"))
}

fn lenient_pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*-\s*(\d+(?:\.\d+)?|max)").expect("valid regex")
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"))
}

/// Parse one terminal-class token. `None` means the text is neither a
/// range nor a single literal; callers keep it as a raw literal.
pub fn parse_range(text: &str, mode: RangeMode) -> Option<ParsedRange> {
    match mode {
        RangeMode::Strict => parse_strict(text),
        RangeMode::Lenient => parse_lenient(text),
    }
}

fn parse_strict(text: &str) -> Option<ParsedRange> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if has_open_marker(trimmed) {
        // Only the first comma-separated part is kept as the primary range.
        let first = trimmed.split(',').next().unwrap_or(trimmed).trim();
        let scale = scale_of(first);
        if let Some(caps) = neg_inf_re().captures(first) {
            let max = caps[1].parse().ok()?;
            return Some(ParsedRange::interval(Interval::at_most(max).with_scale(scale), false));
        }
        if let Some(iv) = comparison(first) {
            return Some(ParsedRange::interval(iv.with_scale(scale), false));
        }
        if let Some((lo, hi)) = split_pair(first) {
            if let (Some(min), Some(max)) = (bound(lo), bound(hi)) {
                return Some(ParsedRange::interval(Interval::new(min, max).with_scale(scale), false));
            }
        }
        return Some(ParsedRange::interval(Interval::unbounded(), false));
    }

    if let Some(caps) = pair_re().captures(trimmed) {
        let min: f64 = caps[1].parse().ok()?;
        let max: f64 = caps[2].parse().ok()?;
        return Some(ParsedRange::interval(
            Interval::new(min, max).with_scale(scale_of(trimmed)),
            true,
        ));
    }

    if trimmed.contains('-') && trimmed.parse::<f64>().is_err() {
        return None;
    }

    match Value::from_literal(trimmed) {
        Value::Int(i) => Some(ParsedRange::interval(Interval::point(i as f64), true)),
        Value::Float(f) => Some(ParsedRange::interval(
            Interval::point(f).with_scale(scale_of(trimmed)),
            true,
        )),
        literal => Some(ParsedRange::literal(vec![literal])),
    }
}

fn parse_lenient(text: &str) -> Option<ParsedRange> {
    let decoded = text.trim();
    if decoded.is_empty() {
        return None;
    }
    let valid = !has_open_marker(decoded);
    let scale = scale_of(decoded);

    if let Some(caps) = lenient_pair_re().captures(decoded) {
        let min: f64 = caps[1].parse().ok()?;
        let max = if caps[2].eq_ignore_ascii_case("max") {
            f64::INFINITY
        } else {
            caps[2].parse().ok()?
        };
        return Some(ParsedRange::interval(Interval::new(min, max).with_scale(scale), valid));
    }
    if let Some(iv) = comparison(decoded) {
        return Some(ParsedRange::interval(iv.with_scale(scale), false));
    }
    if let Some(m) = number_re().find(decoded) {
        let n: f64 = m.as_str().parse().ok()?;
        return Some(ParsedRange::interval(Interval::point(n).with_scale(scale), valid));
    }
    None
}

/// `>300` is `[300.1, inf)`, `<0` is `(-inf, -0.1]`; the `>=`/`<=` forms
/// keep the bound itself.
fn comparison(text: &str) -> Option<Interval> {
    let caps = comparison_re().captures(text)?;
    let n: f64 = caps[3].parse().ok()?;
    let inclusive = !caps[2].is_empty();
    let iv = match (&caps[1], inclusive) {
        (">", true) => Interval::at_least(n),
        (">", false) => Interval::at_least(n + OPEN_BOUND_STEP),
        (_, true) => Interval::at_most(n),
        (_, false) => Interval::at_most(n - OPEN_BOUND_STEP),
    };
    Some(iv)
}

/// Split `a-b` at the first dash that is not a leading sign.
fn split_pair(text: &str) -> Option<(&str, &str)> {
    let body_start = usize::from(text.starts_with('-'));
    let dash = text[body_start..].find('-')? + body_start;
    Some((text[..dash].trim(), text[dash + 1..].trim()))
}

fn bound(text: &str) -> Option<f64> {
    match text.to_ascii_lowercase().as_str() {
        "inf" | "+inf" | "\u{221e}" | "max" => Some(f64::INFINITY),
        "-inf" | "-\u{221e}" | "min" => Some(f64::NEG_INFINITY),
        other => other.parse().ok(),
    }
}

fn has_open_marker(text: &str) -> bool {
    text.to_ascii_lowercase().contains("inf") || text.contains('>') || text.contains('<')
}

/// Invalidity heuristic for tree documents: the class name mentions
/// "invalid", or the content has an open bound or a comparison operator.
pub fn looks_invalid(name: &str, content: &str) -> bool {
    name.to_ascii_lowercase().contains("invalid") || has_open_marker(content)
}

/// Largest number of decimal places among the numbers in `text`.
pub fn scale_of(text: &str) -> u32 {
    number_re()
        .find_iter(text)
        .filter_map(|m| m.as_str().split_once('.').map(|(_, frac)| frac.len() as u32))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(text: &str) -> Option<ParsedRange> {
        parse_range(text, RangeMode::Strict)
    }

    fn interval(text: &str, mode: RangeMode) -> (f64, f64, bool) {
        let parsed = parse_range(text, mode).unwrap();
        let iv = parsed.as_interval().unwrap();
        (iv.min, iv.max, parsed.valid)
    }

    #[test]
    fn test_plain_ranges() {
        assert_eq!(interval("0-30", RangeMode::Strict), (0.0, 30.0, true));
        assert_eq!(interval(" 30.1 - 120 ", RangeMode::Strict), (30.1, 120.0, true));
        assert_eq!(interval("-5-0", RangeMode::Strict), (-5.0, 0.0, true));
        assert_eq!(strict("30.1-120").unwrap().as_interval().unwrap().scale, 1);
    }

    #[test]
    fn test_open_ranges_are_invalid() {
        assert_eq!(interval("-inf-0, >300", RangeMode::Strict), (f64::NEG_INFINITY, 0.0, false));
        assert_eq!(interval(">300", RangeMode::Strict), (300.1, f64::INFINITY, false));
        assert_eq!(interval("<0", RangeMode::Strict), (f64::NEG_INFINITY, -0.1, false));
        assert_eq!(interval(">=18", RangeMode::Strict), (18.0, f64::INFINITY, false));
        assert_eq!(interval("300-inf", RangeMode::Strict), (300.0, f64::INFINITY, false));
        assert_eq!(
            interval("inf?", RangeMode::Strict),
            (f64::NEG_INFINITY, f64::INFINITY, false)
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(interval("0", RangeMode::Strict), (0.0, 0.0, true));
        assert_eq!(
            strict("true").unwrap().content,
            RangeContent::Literal(vec![Value::Bool(true)])
        );
        assert_eq!(
            strict("M").unwrap().content,
            RangeContent::Literal(vec![Value::String("M".into())])
        );
        assert_eq!(strict("low-high"), None);
        assert_eq!(strict("  "), None);
    }

    #[test]
    fn test_lenient_finds_numbers_anywhere() {
        assert_eq!(interval("speed 10 - 20 km/h", RangeMode::Lenient), (10.0, 20.0, true));
        assert_eq!(interval("100-Max", RangeMode::Lenient), (100.0, f64::INFINITY, true));
        assert_eq!(interval("<5", RangeMode::Lenient), (f64::NEG_INFINITY, 4.9, false));
        assert_eq!(interval("level 3", RangeMode::Lenient), (3.0, 3.0, true));
        assert_eq!(parse_range("cc_active", RangeMode::Lenient), None);
    }

    #[test]
    fn test_invalid_heuristic() {
        assert!(looks_invalid("invalid_age", "0-17"));
        assert!(looks_invalid("high", ">120"));
        assert!(looks_invalid("neg", "-inf-0"));
        assert!(!looks_invalid("adult", "18-65"));
    }
}

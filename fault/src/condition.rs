//! Variable/operator/range triples extracted from condition text.

use regex_lite::Regex;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparison {
    pub fn parse(op: &str) -> Option<Self> {
        match op.trim() {
            "=" | "==" => Some(Comparison::Eq),
            "!=" | "<>" => Some(Comparison::Ne),
            ">" => Some(Comparison::Gt),
            ">=" | "=>" | "\u{2265}" => Some(Comparison::Ge),
            "<" => Some(Comparison::Lt),
            "<=" | "=<" | "\u{2264}" => Some(Comparison::Le),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "!=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
        }
    }
}

/// A numeric range with per-end inclusivity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericSpan {
    pub lo: f64,
    pub hi: f64,
    pub lo_inclusive: bool,
    pub hi_inclusive: bool,
}

impl NumericSpan {
    pub fn closed(lo: f64, hi: f64) -> Self {
        Self {
            lo,
            hi,
            lo_inclusive: true,
            hi_inclusive: true,
        }
    }

    /// The set of values satisfying `x op n`. `!=` has no single span.
    pub fn from_comparison(op: Comparison, n: f64) -> Option<Self> {
        let span = match op {
            Comparison::Eq => Self::closed(n, n),
            Comparison::Ge => Self::closed(n, f64::INFINITY),
            Comparison::Gt => Self {
                lo_inclusive: false,
                ..Self::closed(n, f64::INFINITY)
            },
            Comparison::Le => Self::closed(f64::NEG_INFINITY, n),
            Comparison::Lt => Self {
                hi_inclusive: false,
                ..Self::closed(f64::NEG_INFINITY, n)
            },
            Comparison::Ne => return None,
        };
        Some(span)
    }

    /// True when some number lies in both spans.
    pub fn overlaps(&self, other: &NumericSpan) -> bool {
        let (lo, lo_inc) = if self.lo > other.lo {
            (self.lo, self.lo_inclusive)
        } else if other.lo > self.lo {
            (other.lo, other.lo_inclusive)
        } else {
            (self.lo, self.lo_inclusive && other.lo_inclusive)
        };
        let (hi, hi_inc) = if self.hi < other.hi {
            (self.hi, self.hi_inclusive)
        } else if other.hi < self.hi {
            (other.hi, other.hi_inclusive)
        } else {
            (self.hi, self.hi_inclusive && other.hi_inclusive)
        };
        lo < hi || (lo == hi && lo_inc && hi_inc)
    }

    /// A concrete value inside the span.
    pub fn witness(&self) -> f64 {
        match (self.lo.is_finite(), self.hi.is_finite()) {
            (true, true) if self.lo == self.hi => self.lo,
            (true, true) => (self.lo + self.hi) / 2.0,
            (true, false) if self.lo_inclusive => self.lo,
            (true, false) => self.lo + 1.0,
            (false, true) if self.hi_inclusive => self.hi,
            (false, true) => self.hi - 1.0,
            (false, false) => 0.0,
        }
    }
}

/// `variable op range`, optionally bound to a stage (`... -> STAGE`).
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub variable: String,
    pub op: Comparison,
    pub span: NumericSpan,
    pub stage: Option<String>,
}

impl Condition {
    /// Parses `GFR >= 90`, `GFR = 60-89`, or `GFR >= 90 -> RISK`.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = condition_re().captures(text.trim())?;
        let variable = caps[1].trim().to_string();
        let op = Comparison::parse(&caps[2])?;
        let n: f64 = caps[3].parse().ok()?;
        let span = match caps.get(4) {
            Some(upper) if op == Comparison::Eq => NumericSpan::closed(n, upper.as_str().parse().ok()?),
            Some(_) => return None,
            None => NumericSpan::from_comparison(op, n)?,
        };
        let stage = caps
            .get(5)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty());
        Some(Self {
            variable,
            op,
            span,
            stage,
        })
    }

    /// Same variable (ignoring case) and intersecting ranges.
    pub fn matches(&self, other: &Condition) -> bool {
        self.variable.eq_ignore_ascii_case(&other.variable) && self.span.overlaps(&other.span)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.variable, self.op.as_str())?;
        if self.op == Comparison::Eq && self.span.lo != self.span.hi {
            write!(f, "{}-{}", self.span.lo, self.span.hi)?;
        } else {
            write!(f, "{}", self.span.witness())?;
        }
        if let Some(stage) = &self.stage {
            write!(f, " -> {}", stage)?;
        }
        Ok(())
    }
}

fn condition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^([A-Za-z_][\w .]*?)\s*(>=|<=|==|!=|=>|=<|<>|=|>|<|\x{2265}|\x{2264})\s*(-?\d+(?:\.\d+)?)(?:\s*(?:-|to)\s*(-?\d+(?:\.\d+)?))?\s*(?:(?:->|=>|\x{2192})\s*(.+))?$",
        )
        .expect("valid regex")
    })
}

/// True when `stage` appears in `label` as whole words, ignoring case.
pub(crate) fn mentions_stage(label: &str, stage: &str) -> bool {
    let words = |s: &str| -> Vec<String> {
        s.split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect()
    };
    let haystack = words(label);
    let needle = words(stage);
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping_condition() {
        let c = Condition::parse("GFR >= 90 -> RISK").unwrap();
        assert_eq!(c.variable, "GFR");
        assert_eq!(c.op, Comparison::Ge);
        assert_eq!(c.span, NumericSpan::closed(90.0, f64::INFINITY));
        assert_eq!(c.stage.as_deref(), Some("RISK"));
    }

    #[test]
    fn test_parse_range_condition() {
        let c = Condition::parse("gfr = 60-89 -> Stage 2").unwrap();
        assert_eq!(c.span, NumericSpan::closed(60.0, 89.0));
        assert_eq!(c.stage.as_deref(), Some("Stage 2"));
        assert!(Condition::parse("GFR > 60-89").is_none());
        assert!(Condition::parse("no numbers here").is_none());
    }

    #[test]
    fn test_matching_is_case_insensitive_overlap() {
        let event = Condition::parse("GFR >= 90").unwrap();
        let mapping = Condition::parse("gfr >= 90 -> RISK").unwrap();
        assert!(event.matches(&mapping));
        let low = Condition::parse("GFR < 15").unwrap();
        assert!(!low.matches(&mapping));
    }

    #[test]
    fn test_open_ends_touching() {
        let a = NumericSpan::from_comparison(Comparison::Lt, 90.0).unwrap();
        let b = NumericSpan::from_comparison(Comparison::Ge, 90.0).unwrap();
        assert!(!a.overlaps(&b));
        let c = NumericSpan::from_comparison(Comparison::Le, 90.0).unwrap();
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_mentions_stage() {
        assert!(mentions_stage("Incorrect RISK stage", "RISK"));
        assert!(mentions_stage("Wrong stage 2 assigned", "Stage 2"));
        assert!(!mentions_stage("Incorrect RISKY stage", "RISK"));
    }
}

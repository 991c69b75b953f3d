//! Closed numeric intervals with optionally open (infinite) bounds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A numeric bucket `[min, max]`. Either bound may be infinite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    #[serde(with = "bound")]
    pub min: f64,
    #[serde(with = "bound")]
    pub max: f64,
    /// Number of decimal places declared in the source text.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub scale: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl Interval {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max, scale: 0 }
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// A degenerate interval holding one point.
    pub fn point(n: f64) -> Self {
        Self::new(n, n)
    }

    pub fn at_least(min: f64) -> Self {
        Self::new(min, f64::INFINITY)
    }

    pub fn at_most(max: f64) -> Self {
        Self::new(f64::NEG_INFINITY, max)
    }

    pub fn unbounded() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    /// True when the intervals share no point.
    pub fn is_disjoint(&self, other: &Interval) -> bool {
        self.max < other.min || other.max < self.min
    }

    /// Smallest interval covering both. Keeps the finer declared scale.
    pub fn hull(&self, other: &Interval) -> Interval {
        Interval {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            scale: self.scale.max(other.scale),
        }
    }

    /// Same bounds, ignoring declared scale.
    pub fn same_bounds(&self, other: &Interval) -> bool {
        self.min == other.min && self.max == other.max
    }
}

/// Renders `min-max` with `inf`/`-inf` for open bounds.
impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_bound(self.min), format_bound(self.max))
    }
}

pub fn format_bound(n: f64) -> String {
    if n == f64::INFINITY {
        "inf".to_string()
    } else if n == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{}", n)
    }
}

/// JSON has no infinity, so open bounds travel as the strings `inf`/`-inf`.
mod bound {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(n: &f64, s: S) -> Result<S::Ok, S::Error> {
        if n.is_finite() {
            s.serialize_f64(*n)
        } else {
            s.serialize_str(&super::format_bound(*n))
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Num(n) => Ok(n),
            Raw::Text(t) => match t.trim().to_ascii_lowercase().as_str() {
                "inf" | "+inf" | "infinity" => Ok(f64::INFINITY),
                "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
                other => other
                    .parse::<f64>()
                    .map_err(|_| serde::de::Error::custom(format!("invalid bound: {}", t))),
            },
        }
    }
}

//! CMCD field values and the report field map.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Magnitudes at or above this are written in exponent form.
const EXPONENT_ABOVE: f64 = 1e21;
/// Non-zero magnitudes below this are written in exponent form.
const EXPONENT_BELOW: f64 = 1e-6;

/// A single CMCD value.
///
/// Integral numbers are kept apart from fractional ones so that JSON bodies
/// carry `120` rather than `120.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CmcdValue {
    Integer(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

/// Report fields keyed by CMCD short code. Ordered so encodings are stable.
pub type CmcdFields = BTreeMap<String, CmcdValue>;

impl CmcdValue {
    /// Builds a numeric value, collapsing integral floats to integers.
    ///
    /// Returns `None` for NaN and infinities, which have no CMCD encoding.
    pub fn number(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
            Some(Self::Integer(value as i64))
        } else {
            Some(Self::Float(value))
        }
    }

    /// Rounds to the nearest integer, halves toward positive infinity.
    pub fn rounded(value: f64) -> Option<Self> {
        let floor = value.floor();
        let rounded = if value - floor >= 0.5 {
            floor + 1.0
        } else {
            floor
        };
        Self::number(rounded)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for CmcdValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u64> for CmcdValue {
    fn from(value: u64) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u16> for CmcdValue {
    fn from(value: u16) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for CmcdValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for CmcdValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for CmcdValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for CmcdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => f.write_str(&format_number(*v)),
            Self::String(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Shortest textual form of a number, with integral values printed without
/// a fractional part and `-0` printed as `0`.
///
/// Very large and very small magnitudes use exponent notation with an
/// explicit exponent sign (`1e+21`, `1.5e-7`), the same form web players
/// produce.
pub fn format_number(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= EXPONENT_ABOVE || (magnitude != 0.0 && magnitude < EXPONENT_BELOW) {
        let formatted = format!("{value:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => formatted,
        };
    }

    if value.fract() == 0.0 && magnitude <= MAX_SAFE_INTEGER {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

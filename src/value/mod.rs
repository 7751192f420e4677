//! Spreadsheet cell [`Value`] and numeric normalization.


use crate::utils::round2;
use calamine::Data;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

// ----------------------------------------------------------------------------
// Value
// ----------------------------------------------------------------------------

/// A single spreadsheet cell.
///
/// Variant order matters for sorting: empty cells sort first, then numbers, then text.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, PartialOrd, Serialize)]
pub enum Value {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&Data> for Value {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Value::Empty,
            Data::Int(i) => Value::Number(*i as f64),
            Data::Float(n) => Value::Number(*n),
            Data::String(s) if s.is_empty() => Value::Empty,
            Data::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        match s.is_empty() {
            true => Value::Empty,
            false => Value::Text(s.to_string()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl Value {
    /// Returns true if the cell holds nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Normalize a reported assay value.
    ///
    /// - Numbers are rounded to two decimal places.
    /// - Text has every `>` marker removed and is parsed as a number, then rounded.
    /// - Text that still fails to parse is returned unchanged, as are empty cells.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use ccsp::Value;
    ///
    /// assert_eq!(Value::from(">1000.555").normalize(), Value::Number(1000.56));
    /// assert_eq!(Value::from(">10000").normalize(), Value::Number(10000.0));
    /// assert_eq!(Value::from(12.3456).normalize(), Value::Number(12.35));
    /// assert_eq!(Value::from("n.d.").normalize(), Value::from("n.d."));
    /// ```
    pub fn normalize(&self) -> Value {
        match self {
            Value::Empty => Value::Empty,
            Value::Number(n) => Value::Number(round2(*n)),
            Value::Text(s) => match s.replace('>', "").trim().parse::<f64>() {
                Ok(n) => Value::Number(round2(n)),
                Err(_) => self.clone(),
            },
        }
    }
}

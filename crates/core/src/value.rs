use std::cmp::Ordering;
use std::fmt;

use ordered_float::OrderedFloat;

/// Column element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Int,
    Float,
    Bool,
    Str,
}

impl DType {
    /// Name as shown by `dtypes` and series footers.
    pub fn name(&self) -> &'static str {
        match self {
            DType::Int => "int64",
            DType::Float => "float64",
            DType::Bool => "bool",
            DType::Str => "object",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DType::Int | DType::Float)
    }

    /// Smallest dtype able to hold values of both `self` and `other`.
    pub fn unify(self, other: DType) -> DType {
        match (self, other) {
            (a, b) if a == b => a,
            (DType::Int, DType::Float) | (DType::Float, DType::Int) => DType::Float,
            _ => DType::Str,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Dtype this value naturally belongs to (`None` for null).
    pub fn dtype(&self) -> Option<DType> {
        match self {
            Value::Null => None,
            Value::Int(_) => Some(DType::Int),
            Value::Float(_) => Some(DType::Float),
            Value::Bool(_) => Some(DType::Bool),
            Value::Str(_) => Some(DType::Str),
        }
    }

    /// Numeric view. Bools count as 0/1, strings and nulls have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if !f.is_nan() => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Coerce into a column of the given dtype.
    pub fn cast(self, dtype: DType) -> Value {
        match (self, dtype) {
            (Value::Null, _) => Value::Null,
            (Value::Int(i), DType::Float) => Value::Float(i as f64),
            (v @ Value::Str(_), DType::Str) => v,
            (v, DType::Str) => Value::Str(v.to_string()),
            (v, _) => v,
        }
    }

    /// Total order used for sorting: nulls last, numbers before bools
    /// before strings.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Int(_) | Value::Float(_) if !v.is_null() => 0,
                Value::Bool(_) => 1,
                Value::Str(_) => 2,
                _ => 3,
            }
        }
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => match (rank(self), rank(other)) {
                (0, 0) => {
                    let a = OrderedFloat(self.as_f64().unwrap_or(f64::NAN));
                    let b = OrderedFloat(other.as_f64().unwrap_or(f64::NAN));
                    a.cmp(&b)
                }
                (ra, rb) => ra.cmp(&rb),
            },
        }
    }

    /// Hashable key for grouping and counting.
    pub fn key(&self) -> ValueKey {
        match self {
            v if v.is_null() => ValueKey::Null,
            Value::Int(i) => ValueKey::Int(*i),
            Value::Float(f) => ValueKey::Float(OrderedFloat(*f)),
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Str(s) => ValueKey::Str(s.clone()),
            Value::Null => ValueKey::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NaN"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// Grouping key derived from a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey {
    Int(i64),
    Float(OrderedFloat<f64>),
    Bool(bool),
    Str(String),
    Null,
}

impl ValueKey {
    pub fn into_value(self) -> Value {
        match self {
            ValueKey::Int(i) => Value::Int(i),
            ValueKey::Float(f) => Value::Float(f.into_inner()),
            ValueKey::Bool(b) => Value::Bool(b),
            ValueKey::Str(s) => Value::Str(s),
            ValueKey::Null => Value::Null,
        }
    }
}

/// Format a float the way analysis output expects: whole numbers keep one
/// decimal, others are rounded to six and trailing zeros dropped.
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if x.fract() == 0.0 && x.abs() < 1e15 {
        return format!("{x:.1}");
    }
    if x.abs() >= 1e15 || x.abs() < 1e-4 {
        return format!("{x:e}");
    }
    let s = format!("{x:.6}");
    let s = s.trim_end_matches('0');
    s.trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(1.0 / 3.0), "0.333333");
        assert_eq!(format_float(f64::NAN), "NaN");
    }

    #[test]
    fn test_sort_cmp_nulls_last() {
        let mut vals = vec![Value::Null, Value::Int(3), Value::Float(1.5), Value::Int(2)];
        vals.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(vals, vec![Value::Float(1.5), Value::Int(2), Value::Int(3), Value::Null]);
    }

    #[test]
    fn test_cast_to_str() {
        assert_eq!(Value::Int(4).cast(DType::Str), Value::Str("4".into()));
        assert_eq!(Value::Int(4).cast(DType::Float), Value::Float(4.0));
        assert_eq!(Value::Null.cast(DType::Str), Value::Null);
    }

    #[test]
    fn test_nan_is_null() {
        assert!(Value::Float(f64::NAN).is_null());
        assert_eq!(Value::Float(f64::NAN).key(), ValueKey::Null);
    }

    #[test]
    fn test_unify() {
        assert_eq!(DType::Int.unify(DType::Float), DType::Float);
        assert_eq!(DType::Int.unify(DType::Bool), DType::Str);
    }
}

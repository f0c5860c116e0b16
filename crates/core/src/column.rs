use rustc_hash::FxHashMap;

use crate::error::FrameError;
use crate::stats;
use crate::value::{DType, Value, ValueKey};

/// A named, typed vector of cells. Every non-null value matches `dtype`.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    dtype: DType,
    values: Vec<Value>,
}

impl Column {
    /// Build a column, inferring the dtype from the values and coercing
    /// mixed int/float to float and anything else mixed to strings.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let dtype = values
            .iter()
            .filter(|v| !v.is_null())
            .filter_map(Value::dtype)
            .reduce(DType::unify)
            .unwrap_or(DType::Float);
        Self::with_dtype(name, dtype, values)
    }

    /// Build a column with an explicit dtype, casting values as needed.
    pub fn with_dtype(name: impl Into<String>, dtype: DType, values: Vec<Value>) -> Self {
        let values = values
            .into_iter()
            .map(|v| if v.is_null() { Value::Null } else { v.cast(dtype) })
            .collect();
        Self { name: name.into(), dtype, values }
    }

    pub fn from_f64(name: impl Into<String>, values: Vec<f64>) -> Self {
        let values = values
            .into_iter()
            .map(|x| if x.is_nan() { Value::Null } else { Value::Float(x) })
            .collect();
        Self { name: name.into(), dtype: DType::Float, values }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn renamed(&self, name: impl Into<String>) -> Column {
        Column { name: name.into(), ..self.clone() }
    }

    /// Rows at the given indices, in order.
    pub fn take(&self, indices: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            dtype: self.dtype,
            values: indices.iter().filter_map(|&i| self.values.get(i).cloned()).collect(),
        }
    }

    pub fn slice(&self, start: usize, end: usize) -> Column {
        let end = end.min(self.len());
        let start = start.min(end);
        Column {
            name: self.name.clone(),
            dtype: self.dtype,
            values: self.values[start..end].to_vec(),
        }
    }

    /// Non-null numeric values. Errors for non-numeric columns.
    pub fn numbers(&self) -> Result<Vec<f64>, FrameError> {
        if !self.dtype.is_numeric() && self.dtype != DType::Bool {
            return Err(FrameError::TypeMismatch { column: self.name.clone(), expected: "numeric" });
        }
        Ok(self.values.iter().filter_map(Value::as_f64).collect())
    }

    /// Count of non-null values.
    pub fn count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_null()).count()
    }

    pub fn null_count(&self) -> usize {
        self.len() - self.count()
    }

    pub fn sum(&self) -> Result<Value, FrameError> {
        let xs = self.numbers()?;
        Ok(match self.dtype {
            DType::Int | DType::Bool => Value::Int(xs.iter().map(|x| *x as i64).sum()),
            _ => Value::Float(stats::sum(&xs)),
        })
    }

    pub fn mean(&self) -> Result<Option<f64>, FrameError> {
        Ok(stats::mean(&self.numbers()?))
    }

    /// Sample standard deviation.
    pub fn std(&self) -> Result<Option<f64>, FrameError> {
        Ok(stats::std(&self.numbers()?, 1))
    }

    /// Sample variance.
    pub fn var(&self) -> Result<Option<f64>, FrameError> {
        Ok(stats::var(&self.numbers()?, 1))
    }

    pub fn median(&self) -> Result<Option<f64>, FrameError> {
        Ok(stats::median(&self.numbers()?))
    }

    pub fn quantile(&self, q: f64) -> Result<Option<f64>, FrameError> {
        if !(0.0..=1.0).contains(&q) {
            return Err(FrameError::Invalid(format!("quantile must be within [0, 1], got {q}")));
        }
        Ok(stats::quantile(&self.numbers()?, q))
    }

    /// Minimum non-null value. Works on every dtype.
    pub fn min(&self) -> Option<Value> {
        self.values.iter().filter(|v| !v.is_null()).min_by(|a, b| a.sort_cmp(b)).cloned()
    }

    pub fn max(&self) -> Option<Value> {
        self.values.iter().filter(|v| !v.is_null()).max_by(|a, b| a.sort_cmp(b)).cloned()
    }

    /// Distinct non-null values in first-seen order.
    pub fn unique(&self) -> Vec<Value> {
        let mut seen = FxHashMap::default();
        let mut out = Vec::new();
        for v in self.values.iter().filter(|v| !v.is_null()) {
            if seen.insert(v.key(), ()).is_none() {
                out.push(v.clone());
            }
        }
        out
    }

    pub fn nunique(&self) -> usize {
        self.unique().len()
    }

    /// Distinct values with their counts, most frequent first. Ties keep
    /// first-seen order.
    pub fn value_counts(&self) -> Vec<(Value, usize)> {
        let mut counts: FxHashMap<ValueKey, (usize, usize)> = FxHashMap::default();
        for (pos, v) in self.values.iter().filter(|v| !v.is_null()).enumerate() {
            let entry = counts.entry(v.key()).or_insert((0, pos));
            entry.0 += 1;
        }
        let mut pairs: Vec<(ValueKey, (usize, usize))> = counts.into_iter().collect();
        pairs.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
        pairs.into_iter().map(|(k, (n, _))| (k.into_value(), n)).collect()
    }

    /// Row indices ordered by value; nulls always last.
    pub fn argsort(&self, ascending: bool) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..self.len()).collect();
        idx.sort_by(|&a, &b| {
            let (va, vb) = (&self.values[a], &self.values[b]);
            match (va.is_null(), vb.is_null()) {
                (true, true) => std::cmp::Ordering::Equal,
                (true, false) => std::cmp::Ordering::Greater,
                (false, true) => std::cmp::Ordering::Less,
                _ if ascending => va.sort_cmp(vb),
                _ => vb.sort_cmp(va),
            }
        });
        idx
    }

    /// Concatenate `other` below `self`, unifying dtypes.
    pub fn append(&self, other: &Column) -> Column {
        let dtype = if self.count() == 0 {
            other.dtype
        } else if other.count() == 0 {
            self.dtype
        } else {
            self.dtype.unify(other.dtype)
        };
        let values = self.values.iter().chain(other.values.iter()).cloned().collect();
        Column::with_dtype(self.name.clone(), dtype, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(name: &str, xs: &[i64]) -> Column {
        Column::new(name, xs.iter().map(|&x| Value::Int(x)).collect())
    }

    #[test]
    fn test_infers_float_from_mixed_numbers() {
        let col = Column::new("x", vec![Value::Int(1), Value::Float(2.5), Value::Null]);
        assert_eq!(col.dtype(), DType::Float);
        assert_eq!(col.values()[0], Value::Float(1.0));
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn test_infers_object_from_mixed_kinds() {
        let col = Column::new("x", vec![Value::Int(1), Value::Str("a".into())]);
        assert_eq!(col.dtype(), DType::Str);
        assert_eq!(col.values()[0], Value::Str("1".into()));
    }

    #[test]
    fn test_int_sum_stays_int() {
        assert_eq!(ints("a", &[1, 2, 3]).sum().unwrap(), Value::Int(6));
    }

    #[test]
    fn test_string_mean_is_type_error() {
        let col = Column::new("s", vec![Value::from("a")]);
        assert!(matches!(col.mean(), Err(FrameError::TypeMismatch { .. })));
    }

    #[test]
    fn test_value_counts_order() {
        let col = Column::new("s", vec!["b".into(), "a".into(), "a".into(), "b".into(), "c".into(), "a".into()]);
        let counts = col.value_counts();
        assert_eq!(counts[0], (Value::from("a"), 3));
        assert_eq!(counts[1], (Value::from("b"), 2));
        assert_eq!(counts[2], (Value::from("c"), 1));
    }

    #[test]
    fn test_argsort_nulls_last_both_directions() {
        let col = Column::new("x", vec![Value::Int(2), Value::Null, Value::Int(1)]);
        assert_eq!(col.argsort(true), vec![2, 0, 1]);
        assert_eq!(col.argsort(false), vec![0, 2, 1]);
    }

    #[test]
    fn test_unique_first_seen() {
        let col = ints("a", &[3, 1, 3, 2, 1]);
        assert_eq!(col.unique(), vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
        assert_eq!(col.nunique(), 3);
    }
}

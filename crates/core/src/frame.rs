use rustc_hash::FxHashMap;

use crate::column::Column;
use crate::error::FrameError;
use crate::stats;
use crate::value::{DType, Value, ValueKey};

/// Comparison used by [`DataFrame::filter_cmp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn parse(op: &str) -> Result<CmpOp, FrameError> {
        match op {
            "==" | "=" => Ok(CmpOp::Eq),
            "~=" | "!=" => Ok(CmpOp::Ne),
            "<" => Ok(CmpOp::Lt),
            "<=" => Ok(CmpOp::Le),
            ">" => Ok(CmpOp::Gt),
            ">=" => Ok(CmpOp::Ge),
            other => Err(FrameError::Invalid(format!("unknown comparison operator '{other}'"))),
        }
    }

    /// Nulls never match, except that `~=` matches a null against a value.
    pub fn matches(&self, left: &Value, right: &Value) -> bool {
        if left.is_null() || right.is_null() {
            return *self == CmpOp::Ne && left.is_null() != right.is_null();
        }
        let ord = match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) if !matches!(left, Value::Str(_)) && !matches!(right, Value::Str(_)) => {
                a.partial_cmp(&b)
            }
            _ => match (left, right) {
                (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                _ => None,
            },
        };
        match (self, ord) {
            (CmpOp::Eq, Some(o)) => o.is_eq(),
            (CmpOp::Ne, Some(o)) => o.is_ne(),
            (CmpOp::Ne, None) => true,
            (CmpOp::Lt, Some(o)) => o.is_lt(),
            (CmpOp::Le, Some(o)) => o.is_le(),
            (CmpOp::Gt, Some(o)) => o.is_gt(),
            (CmpOp::Ge, Some(o)) => o.is_ge(),
            _ => false,
        }
    }
}

/// Aggregation used by [`DataFrame::groupby`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agg {
    Sum,
    Mean,
    Min,
    Max,
    Count,
    Median,
    Std,
}

impl Agg {
    pub fn parse(name: &str) -> Result<Agg, FrameError> {
        match name {
            "sum" => Ok(Agg::Sum),
            "mean" => Ok(Agg::Mean),
            "min" => Ok(Agg::Min),
            "max" => Ok(Agg::Max),
            "count" | "size" => Ok(Agg::Count),
            "median" => Ok(Agg::Median),
            "std" => Ok(Agg::Std),
            other => Err(FrameError::Invalid(format!("unknown aggregation '{other}'"))),
        }
    }

    fn apply(&self, col: &Column) -> Result<Value, FrameError> {
        let opt = |x: Option<f64>| x.map(Value::Float).unwrap_or(Value::Null);
        Ok(match self {
            Agg::Sum => col.sum()?,
            Agg::Mean => opt(col.mean()?),
            Agg::Median => opt(col.median()?),
            Agg::Std => opt(col.std()?),
            Agg::Min => col.min().unwrap_or(Value::Null),
            Agg::Max => col.max().unwrap_or(Value::Null),
            Agg::Count => Value::Int(col.count() as i64),
        })
    }
}

/// Two-dimensional table of equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataFrame {
    columns: Vec<Column>,
    nrows: usize,
}

impl DataFrame {
    pub fn new(columns: Vec<Column>) -> Result<Self, FrameError> {
        let nrows = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = FxHashMap::default();
        for col in &columns {
            if seen.insert(col.name().to_string(), ()).is_some() {
                return Err(FrameError::DuplicateColumn(col.name().to_string()));
            }
            if col.len() != nrows {
                return Err(FrameError::LengthMismatch {
                    column: col.name().to_string(),
                    expected: nrows,
                    found: col.len(),
                });
            }
        }
        Ok(Self { columns, nrows })
    }

    /// Build from row-major data with the given header.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, FrameError> {
        let mut cols: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); header.len()];
        for row in rows {
            for (i, slot) in cols.iter_mut().enumerate() {
                slot.push(row.get(i).cloned().unwrap_or(Value::Null));
            }
        }
        let columns = header.into_iter().zip(cols).map(|(name, values)| Column::new(name, values)).collect();
        Self::new(columns)
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.columns.len())
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column, FrameError> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| FrameError::UnknownColumn(name.to_string()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name() == name)
    }

    /// Cells of one row, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<(&str, &Value)>> {
        if index >= self.nrows {
            return None;
        }
        Some(self.columns.iter().map(|c| (c.name(), &c.values()[index])).collect())
    }

    pub fn head(&self, n: usize) -> DataFrame {
        self.slice(0, n)
    }

    pub fn tail(&self, n: usize) -> DataFrame {
        self.slice(self.nrows.saturating_sub(n), self.nrows)
    }

    pub fn slice(&self, start: usize, end: usize) -> DataFrame {
        let columns: Vec<Column> = self.columns.iter().map(|c| c.slice(start, end)).collect();
        let nrows = columns.first().map(Column::len).unwrap_or(0);
        DataFrame { columns, nrows }
    }

    pub fn take(&self, indices: &[usize]) -> DataFrame {
        let indices: Vec<usize> = indices.iter().copied().filter(|&i| i < self.nrows).collect();
        DataFrame {
            columns: self.columns.iter().map(|c| c.take(&indices)).collect(),
            nrows: indices.len(),
        }
    }

    pub fn select(&self, names: &[&str]) -> Result<DataFrame, FrameError> {
        let columns = names
            .iter()
            .map(|n| self.column(n).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        let mut out = DataFrame::new(columns)?;
        out.nrows = self.nrows;
        Ok(out)
    }

    pub fn drop_columns(&self, names: &[&str]) -> Result<DataFrame, FrameError> {
        for n in names {
            self.column(n)?;
        }
        Ok(DataFrame {
            columns: self.columns.iter().filter(|c| !names.contains(&c.name())).cloned().collect(),
            nrows: self.nrows,
        })
    }

    pub fn rename(&self, mapping: &[(String, String)]) -> Result<DataFrame, FrameError> {
        for (old, _) in mapping {
            self.column(old)?;
        }
        let columns = self
            .columns
            .iter()
            .map(|c| match mapping.iter().find(|(old, _)| old == c.name()) {
                Some((_, new)) => c.renamed(new.clone()),
                None => c.clone(),
            })
            .collect();
        DataFrame::new(columns)
    }

    /// Rows where `mask` is true.
    pub fn filter_mask(&self, mask: &[bool]) -> Result<DataFrame, FrameError> {
        if mask.len() != self.nrows {
            return Err(FrameError::LengthMismatch {
                column: "mask".into(),
                expected: self.nrows,
                found: mask.len(),
            });
        }
        let idx: Vec<usize> = mask.iter().enumerate().filter(|(_, m)| **m).map(|(i, _)| i).collect();
        Ok(self.take(&idx))
    }

    /// Rows where `column <op> value` holds.
    pub fn filter_cmp(&self, column: &str, op: CmpOp, value: &Value) -> Result<DataFrame, FrameError> {
        let col = self.column(column)?;
        let mask: Vec<bool> = col.values().iter().map(|v| op.matches(v, value)).collect();
        self.filter_mask(&mask)
    }

    pub fn sort_by(&self, column: &str, ascending: bool) -> Result<DataFrame, FrameError> {
        let order = self.column(column)?.argsort(ascending);
        Ok(self.take(&order))
    }

    /// Rows without any null cell.
    pub fn dropna(&self) -> DataFrame {
        let idx: Vec<usize> = (0..self.nrows)
            .filter(|&i| self.columns.iter().all(|c| !c.values()[i].is_null()))
            .collect();
        self.take(&idx)
    }

    /// Add or replace a column.
    pub fn with_column(&self, column: Column) -> Result<DataFrame, FrameError> {
        if !self.columns.is_empty() && column.len() != self.nrows {
            return Err(FrameError::LengthMismatch {
                column: column.name().to_string(),
                expected: self.nrows,
                found: column.len(),
            });
        }
        let mut columns = self.columns.clone();
        match columns.iter().position(|c| c.name() == column.name()) {
            Some(i) => columns[i] = column,
            None => columns.push(column),
        }
        DataFrame::new(columns)
    }

    /// Summary statistics of the numeric columns: count, mean, std, min,
    /// quartiles and max, one row per statistic.
    pub fn describe(&self) -> Result<DataFrame, FrameError> {
        let numeric: Vec<&Column> = self.columns.iter().filter(|c| c.dtype().is_numeric()).collect();
        if numeric.is_empty() {
            return Err(FrameError::Empty("describe (numeric column)"));
        }
        let labels = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];
        let mut columns = vec![Column::new(
            "",
            labels.iter().map(|l| Value::from(*l)).collect(),
        )];
        for col in numeric {
            let xs = col.numbers()?;
            let stats = [
                Some(xs.len() as f64),
                stats::mean(&xs),
                stats::std(&xs, 1),
                stats::min(&xs),
                stats::quantile(&xs, 0.25),
                stats::quantile(&xs, 0.5),
                stats::quantile(&xs, 0.75),
                stats::max(&xs),
            ];
            columns.push(Column::from_f64(col.name(), stats.iter().map(|s| s.unwrap_or(f64::NAN)).collect()));
        }
        DataFrame::new(columns)
    }

    /// Group rows by `key` and aggregate each `(column, agg)` pair. Groups
    /// come out sorted by key.
    pub fn groupby(&self, key: &str, aggs: &[(String, Agg)]) -> Result<DataFrame, FrameError> {
        let key_col = self.column(key)?;
        let mut groups: FxHashMap<ValueKey, Vec<usize>> = FxHashMap::default();
        for (i, v) in key_col.values().iter().enumerate() {
            if !v.is_null() {
                groups.entry(v.key()).or_default().push(i);
            }
        }
        let mut keys: Vec<ValueKey> = groups.keys().cloned().collect();
        keys.sort();

        let key_values = keys.iter().cloned().map(ValueKey::into_value).collect();
        let mut columns = vec![Column::with_dtype(key, key_col.dtype(), key_values)];
        for (name, agg) in aggs {
            let col = self.column(name)?;
            let values = keys
                .iter()
                .map(|k| agg.apply(&col.take(&groups[k])))
                .collect::<Result<Vec<_>, _>>()?;
            columns.push(Column::new(name.clone(), values));
        }
        DataFrame::new(columns)
    }

    /// Two-column frame of distinct values and their counts.
    pub fn value_counts(&self, column: &str) -> Result<DataFrame, FrameError> {
        let col = self.column(column)?;
        let (values, counts): (Vec<Value>, Vec<Value>) = col
            .value_counts()
            .into_iter()
            .map(|(v, n)| (v, Value::Int(n as i64)))
            .unzip();
        DataFrame::new(vec![
            Column::with_dtype(column, col.dtype(), values),
            Column::with_dtype("count", DType::Int, counts),
        ])
    }

    /// Pairwise Pearson correlation of numeric columns over rows where both
    /// values are present.
    pub fn corr(&self) -> Result<DataFrame, FrameError> {
        let numeric: Vec<&Column> = self.columns.iter().filter(|c| c.dtype().is_numeric()).collect();
        if numeric.is_empty() {
            return Err(FrameError::Empty("corr (numeric column)"));
        }
        let mut columns = vec![Column::new(
            "",
            numeric.iter().map(|c| Value::from(c.name())).collect(),
        )];
        for a in &numeric {
            let values = numeric
                .iter()
                .map(|b| {
                    let (xs, ys): (Vec<f64>, Vec<f64>) = a
                        .values()
                        .iter()
                        .zip(b.values())
                        .filter_map(|(x, y)| Some((x.as_f64()?, y.as_f64()?)))
                        .unzip();
                    stats::pearson(&xs, &ys).unwrap_or(f64::NAN)
                })
                .collect();
            columns.push(Column::from_f64(a.name(), values));
        }
        DataFrame::new(columns)
    }

    /// Stack frames vertically. Columns are matched by name; columns missing
    /// from a frame are filled with nulls.
    pub fn concat(frames: &[&DataFrame]) -> Result<DataFrame, FrameError> {
        let mut names: Vec<String> = Vec::new();
        for f in frames {
            for n in f.column_names() {
                if !names.iter().any(|x| x == n) {
                    names.push(n.to_string());
                }
            }
        }
        let mut columns = Vec::with_capacity(names.len());
        for name in &names {
            let mut acc: Option<Column> = None;
            for f in frames {
                let part = match f.column(name) {
                    Ok(c) => c.clone(),
                    Err(_) => Column::new(name.clone(), vec![Value::Null; f.nrows]),
                };
                acc = Some(match acc {
                    Some(prev) => prev.append(&part),
                    None => part,
                });
            }
            if let Some(col) = acc {
                columns.push(col);
            }
        }
        DataFrame::new(columns)
    }

    /// Inner join on a shared key column. Non-key columns present in both
    /// frames get `_x` / `_y` suffixes.
    pub fn merge(&self, right: &DataFrame, on: &str) -> Result<DataFrame, FrameError> {
        let lkey = self.column(on)?;
        let rkey = right.column(on)?;
        let mut index: FxHashMap<ValueKey, Vec<usize>> = FxHashMap::default();
        for (i, v) in rkey.values().iter().enumerate() {
            if !v.is_null() {
                index.entry(v.key()).or_default().push(i);
            }
        }
        let mut left_idx = Vec::new();
        let mut right_idx = Vec::new();
        for (i, v) in lkey.values().iter().enumerate() {
            if let Some(matches) = index.get(&v.key()) {
                for &j in matches {
                    left_idx.push(i);
                    right_idx.push(j);
                }
            }
        }

        let mut columns = Vec::new();
        for c in &self.columns {
            let name = if c.name() != on && right.has_column(c.name()) {
                format!("{}_x", c.name())
            } else {
                c.name().to_string()
            };
            columns.push(c.take(&left_idx).renamed(name));
        }
        for c in right.columns.iter().filter(|c| c.name() != on) {
            let name = if self.has_column(c.name()) {
                format!("{}_y", c.name())
            } else {
                c.name().to_string()
            };
            columns.push(c.take(&right_idx).renamed(name));
        }
        DataFrame::new(columns)
    }

    /// Numeric columns as row vectors, skipping rows with nulls.
    pub fn numeric_rows(&self) -> Result<(Vec<String>, Vec<Vec<f64>>), FrameError> {
        let numeric: Vec<&Column> = self.columns.iter().filter(|c| c.dtype().is_numeric()).collect();
        if numeric.is_empty() {
            return Err(FrameError::Empty("numeric column"));
        }
        let names = numeric.iter().map(|c| c.name().to_string()).collect();
        let rows = (0..self.nrows)
            .filter_map(|i| numeric.iter().map(|c| c.values()[i].as_f64()).collect::<Option<Vec<f64>>>())
            .collect();
        Ok((names, rows))
    }

    /// Apply `f` to every numeric column, keeping others unchanged.
    pub fn map_numeric<F>(&self, f: F) -> Result<DataFrame, FrameError>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                if !c.dtype().is_numeric() {
                    return c.clone();
                }
                let present: Vec<f64> = c.values().iter().filter_map(Value::as_f64).collect();
                let mut mapped = f(&present).into_iter();
                let values = c
                    .values()
                    .iter()
                    .map(|v| match v.as_f64() {
                        Some(_) => mapped.next().map(Value::Float).unwrap_or(Value::Null),
                        None => Value::Null,
                    })
                    .collect();
                Column::with_dtype(c.name(), DType::Float, values)
            })
            .collect();
        DataFrame::new(columns)
    }
}

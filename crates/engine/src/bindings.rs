//! Lua userdata for frames and series.
//!
//! Scripts never hold a mutable reference to a stored dataset. A frame
//! handle wraps an `Arc<DataFrame>` and every method returns a new handle,
//! so rebinding or transforming a dataset inside a script leaves the store
//! untouched until the caller asks for write-back.
//!
//! # API (1-indexed for Lua convention)
//!
//! ## Frame
//! - `df.shape` → `(rows, cols)`, also `df.shape[1]`, `df.shape.rows`
//! - `df.columns`, `df.dtypes`, `#df`
//! - `df.price` / `df["price"]` / `df:col("price")` → Series
//! - `df:head(n)`, `df:tail(n)`, `df:select{...}`, `df:drop{...}`
//! - `df:where("age", ">", 30)`, `df:filter(function(row) ... end)`
//! - `df:sort("age", false)`, `df:dropna()`, `df:rename{old = "new"}`
//! - `df:with_column(name, series | array | function(row))`
//! - `df:describe()`, `df:groupby(key, {col = "mean"})`, `df:value_counts(col)`
//! - `df:corr()`, `df:mean()`, `df:sum()`, `df:row(i)`, `df:rows()`, `df:copy()`
//!
//! ## Series
//! - `s.name`, `s.dtype`, `#s`, `s[i]`, arithmetic with numbers or series
//! - `s:sum()`, `mean`, `std`, `var`, `min`, `max`, `median`, `quantile(q)`
//! - `s:count()`, `nunique`, `unique`, `value_counts`, `values`, `map(fn)`
//! - `s:head(n)`, `s:describe()`

use std::sync::Arc;

use mlua::{
    Function, Lua, MetaMethod, Result as LuaResult, Table, UserData, UserDataFields, UserDataMethods,
    Value as LuaValue,
};

use dataprobe_core::{Agg, CmpOp, Column, DType, DataFrame, FrameError, Value};

// ============================================================================
// Conversions
// ============================================================================

pub(crate) fn frame_err(e: FrameError) -> mlua::Error {
    mlua::Error::RuntimeError(e.to_string())
}

/// Cell → Lua. Nulls become nil.
pub(crate) fn value_to_lua(lua: &Lua, value: &Value) -> LuaResult<LuaValue> {
    Ok(match value {
        v if v.is_null() => LuaValue::Nil,
        Value::Int(i) => LuaValue::Integer(*i),
        Value::Float(f) => LuaValue::Number(*f),
        Value::Bool(b) => LuaValue::Boolean(*b),
        Value::Str(s) => LuaValue::String(lua.create_string(s)?),
        Value::Null => LuaValue::Nil,
    })
}

/// Lua → cell. Only scalars are accepted.
pub(crate) fn lua_to_value(value: &LuaValue) -> LuaResult<Value> {
    Ok(match value {
        LuaValue::Nil => Value::Null,
        LuaValue::Boolean(b) => Value::Bool(*b),
        LuaValue::Integer(i) => Value::Int(*i),
        LuaValue::Number(n) if n.is_nan() => Value::Null,
        LuaValue::Number(n) => Value::Float(*n),
        LuaValue::String(s) => Value::Str(s.to_str()?.to_string()),
        other => {
            return Err(mlua::Error::RuntimeError(format!(
                "cannot store a {} in a column",
                other.type_name()
            )))
        }
    })
}

/// Array part of a table, 1..=n, keeping nil holes as nulls.
///
/// Holes may not outnumber the stored values, so `{[1e15] = 1}` is an
/// error rather than a 10^15-element array.
pub(crate) fn table_values(table: &Table) -> LuaResult<Vec<Value>> {
    let len = table.raw_len();
    let mut max = len;
    let mut count = 0usize;
    for pair in table.clone().pairs::<LuaValue, LuaValue>() {
        let (k, _) = pair?;
        if let LuaValue::Integer(i) = k {
            if i > 0 {
                count += 1;
                max = max.max(i as usize);
            }
        }
    }
    if max > len && max > count.saturating_mul(2) {
        return Err(mlua::Error::RuntimeError(format!(
            "table is too sparse to use as an array ({count} values, largest index {max})"
        )));
    }
    (1..=max).map(|i| table.raw_get::<LuaValue>(i).and_then(|v| lua_to_value(&v))).collect()
}

/// Numbers from an array table or a series, skipping nulls.
pub(crate) fn numbers_from_lua(value: &LuaValue) -> LuaResult<Vec<f64>> {
    match value {
        LuaValue::Table(t) => {
            let mut out = Vec::new();
            for v in table_values(t)? {
                match v {
                    Value::Null => {}
                    Value::Str(s) => {
                        return Err(mlua::Error::RuntimeError(format!("expected numbers, found string '{s}'")))
                    }
                    other => out.extend(other.as_f64()),
                }
            }
            Ok(out)
        }
        LuaValue::UserData(ud) => {
            if let Ok(series) = ud.borrow::<SeriesHandle>() {
                return series.0.numbers().map_err(frame_err);
            }
            Err(mlua::Error::RuntimeError("expected an array or a Series".into()))
        }
        other => Err(mlua::Error::RuntimeError(format!(
            "expected an array or a Series, got {}",
            other.type_name()
        ))),
    }
}

/// Extract the frame behind a userdata value.
pub(crate) fn frame_from_lua(value: &LuaValue) -> LuaResult<Arc<DataFrame>> {
    if let LuaValue::UserData(ud) = value {
        if let Ok(frame) = ud.borrow::<FrameHandle>() {
            return Ok(frame.0.clone());
        }
    }
    Err(mlua::Error::RuntimeError(format!("expected a DataFrame, got {}", value.type_name())))
}

fn row_table(lua: &Lua, frame: &DataFrame, index: usize) -> LuaResult<Table> {
    let table = lua.create_table()?;
    if let Some(cells) = frame.row(index) {
        for (name, value) in cells {
            table.set(name, value_to_lua(lua, value)?)?;
        }
    }
    Ok(table)
}

fn truthy(value: &LuaValue) -> bool {
    !matches!(value, LuaValue::Nil | LuaValue::Boolean(false))
}

fn opt_number(x: Option<f64>) -> LuaValue {
    x.map(LuaValue::Number).unwrap_or(LuaValue::Nil)
}

fn string_list(names: &[String]) -> Vec<&str> {
    names.iter().map(String::as_str).collect()
}

/// Build a column from a script value: a series, an array table, or a
/// function called with each row of `frame`.
fn column_from_lua(lua: &Lua, name: &str, value: LuaValue, frame: &DataFrame) -> LuaResult<Column> {
    match value {
        LuaValue::UserData(ud) => {
            let series = ud
                .borrow::<SeriesHandle>()
                .map_err(|_| mlua::Error::RuntimeError("expected a Series, array or function".into()))?;
            Ok(series.0.renamed(name))
        }
        LuaValue::Table(t) => Ok(Column::new(name, table_values(&t)?)),
        LuaValue::Function(f) => {
            let mut values = Vec::with_capacity(frame.nrows());
            for i in 0..frame.nrows() {
                let out: LuaValue = f.call(row_table(lua, frame, i)?)?;
                values.push(lua_to_value(&out)?);
            }
            Ok(Column::new(name, values))
        }
        other => {
            let v = lua_to_value(&other)?;
            Ok(Column::new(name, vec![v; frame.nrows()]))
        }
    }
}

// ============================================================================
// Shape
// ============================================================================

/// `(rows, cols)` pair returned by `df.shape`.
#[derive(Debug, Clone, Copy)]
pub struct ShapeHandle {
    pub rows: usize,
    pub cols: usize,
}

impl UserData for ShapeHandle {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("rows", |_, this| Ok(this.rows));
        fields.add_field_method_get("cols", |_, this| Ok(this.cols));
    }

    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!("({}, {})", this.rows, this.cols))
        });
        methods.add_meta_method(MetaMethod::Len, |_, _, ()| Ok(2));
        methods.add_meta_method(MetaMethod::Index, |_, this, key: LuaValue| match key {
            LuaValue::Integer(1) => Ok(this.rows),
            LuaValue::Integer(2) => Ok(this.cols),
            other => Err(mlua::Error::RuntimeError(format!(
                "shape index out of range: {}",
                other.to_string().unwrap_or_else(|_| other.type_name().to_string())
            ))),
        });
        methods.add_meta_method(MetaMethod::Eq, |_, this, other: LuaValue| {
            Ok(match other {
                LuaValue::UserData(ud) => ud
                    .borrow::<ShapeHandle>()
                    .map(|o| o.rows == this.rows && o.cols == this.cols)
                    .unwrap_or(false),
                _ => false,
            })
        });
    }
}

// ============================================================================
// Frame
// ============================================================================

/// Script-side handle to an immutable frame.
#[derive(Debug, Clone)]
pub struct FrameHandle(pub Arc<DataFrame>);

impl FrameHandle {
    pub fn new(frame: DataFrame) -> Self {
        Self(Arc::new(frame))
    }
}

impl UserData for FrameHandle {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("shape", |_, this| {
            let (rows, cols) = this.0.shape();
            Ok(ShapeHandle { rows, cols })
        });
        fields.add_field_method_get("columns", |lua, this| lua.create_sequence_from(this.0.column_names()));
        fields.add_field_method_get("dtypes", |lua, this| {
            let table = lua.create_table()?;
            for col in this.0.columns() {
                table.set(col.name(), col.dtype().name())?;
            }
            Ok(table)
        });
    }

    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("head", |_, this, n: Option<usize>| Ok(FrameHandle::new(this.0.head(n.unwrap_or(5)))));
        methods.add_method("tail", |_, this, n: Option<usize>| Ok(FrameHandle::new(this.0.tail(n.unwrap_or(5)))));
        methods.add_method("nrows", |_, this, ()| Ok(this.0.nrows()));
        methods.add_method("ncols", |_, this, ()| Ok(this.0.ncols()));
        methods.add_method("copy", |_, this, ()| Ok(FrameHandle::new((*this.0).clone())));

        methods.add_method("col", |_, this, name: String| {
            let col = this.0.column(&name).map_err(frame_err)?;
            Ok(SeriesHandle::new(col.clone()))
        });

        methods.add_method("select", |_, this, names: Vec<String>| {
            this.0.select(&string_list(&names)).map(FrameHandle::new).map_err(frame_err)
        });

        methods.add_method("drop", |_, this, names: Vec<String>| {
            this.0.drop_columns(&string_list(&names)).map(FrameHandle::new).map_err(frame_err)
        });

        methods.add_method("where", |_, this, (column, op, value): (String, String, LuaValue)| {
            let op = CmpOp::parse(&op).map_err(frame_err)?;
            let value = lua_to_value(&value)?;
            this.0.filter_cmp(&column, op, &value).map(FrameHandle::new).map_err(frame_err)
        });

        methods.add_method("filter", |lua, this, predicate: Function| {
            let mut mask = Vec::with_capacity(this.0.nrows());
            for i in 0..this.0.nrows() {
                let keep: LuaValue = predicate.call(row_table(lua, &this.0, i)?)?;
                mask.push(truthy(&keep));
            }
            this.0.filter_mask(&mask).map(FrameHandle::new).map_err(frame_err)
        });

        methods.add_method("sort", |_, this, (column, ascending): (String, Option<bool>)| {
            this.0
                .sort_by(&column, ascending.unwrap_or(true))
                .map(FrameHandle::new)
                .map_err(frame_err)
        });

        methods.add_method("dropna", |_, this, ()| Ok(FrameHandle::new(this.0.dropna())));

        methods.add_method("rename", |_, this, mapping: Table| {
            let mut pairs = Vec::new();
            for pair in mapping.pairs::<String, String>() {
                pairs.push(pair?);
            }
            pairs.sort();
            this.0.rename(&pairs).map(FrameHandle::new).map_err(frame_err)
        });

        methods.add_method("with_column", |lua, this, (name, value): (String, LuaValue)| {
            let column = column_from_lua(lua, &name, value, &this.0)?;
            this.0.with_column(column).map(FrameHandle::new).map_err(frame_err)
        });

        methods.add_method("describe", |_, this, ()| {
            this.0.describe().map(FrameHandle::new).map_err(frame_err)
        });

        methods.add_method("groupby", |_, this, (key, aggs): (String, Table)| {
            let mut specs = Vec::new();
            for pair in aggs.pairs::<String, String>() {
                let (column, agg) = pair?;
                specs.push((column, Agg::parse(&agg).map_err(frame_err)?));
            }
            // Table iteration order is unspecified; keep the output stable
            specs.sort_by(|a, b| a.0.cmp(&b.0));
            this.0.groupby(&key, &specs).map(FrameHandle::new).map_err(frame_err)
        });

        methods.add_method("value_counts", |_, this, column: String| {
            this.0.value_counts(&column).map(FrameHandle::new).map_err(frame_err)
        });

        methods.add_method("corr", |_, this, ()| this.0.corr().map(FrameHandle::new).map_err(frame_err));

        methods.add_method("mean", |lua, this, ()| {
            let table = lua.create_table()?;
            for col in this.0.columns().iter().filter(|c| c.dtype().is_numeric()) {
                table.set(col.name(), opt_number(col.mean().map_err(frame_err)?))?;
            }
            Ok(table)
        });

        methods.add_method("sum", |lua, this, ()| {
            let table = lua.create_table()?;
            for col in this.0.columns().iter().filter(|c| c.dtype().is_numeric()) {
                table.set(col.name(), value_to_lua(lua, &col.sum().map_err(frame_err)?)?)?;
            }
            Ok(table)
        });

        methods.add_method("row", |lua, this, index: usize| {
            if index == 0 || index > this.0.nrows() {
                return Err(mlua::Error::RuntimeError(format!(
                    "row {index} out of range (1..{})",
                    this.0.nrows()
                )));
            }
            row_table(lua, &this.0, index - 1)
        });

        methods.add_method("rows", |lua, this, ()| {
            let rows = (0..this.0.nrows())
                .map(|i| row_table(lua, &this.0, i))
                .collect::<LuaResult<Vec<_>>>()?;
            lua.create_sequence_from(rows)
        });

        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| Ok(this.0.to_string()));
        methods.add_meta_method(MetaMethod::Len, |_, this, ()| Ok(this.0.nrows()));

        // Column access by name; methods and fields take precedence
        methods.add_meta_method(MetaMethod::Index, |_, this, key: String| {
            let col = this.0.column(&key).map_err(frame_err)?;
            Ok(SeriesHandle::new(col.clone()))
        });
    }
}

// ============================================================================
// Series
// ============================================================================

/// Script-side handle to an immutable column.
#[derive(Debug, Clone)]
pub struct SeriesHandle(pub Arc<Column>);

impl SeriesHandle {
    pub fn new(column: Column) -> Self {
        Self(Arc::new(column))
    }
}

/// Elementwise arithmetic between a series and a number or another series.
fn series_arith(lhs: LuaValue, rhs: LuaValue, op: fn(f64, f64) -> f64) -> LuaResult<SeriesHandle> {
    enum Operand {
        Scalar(f64),
        Series(Arc<Column>),
    }
    let operand = |v: &LuaValue| -> LuaResult<Operand> {
        match v {
            LuaValue::Integer(i) => Ok(Operand::Scalar(*i as f64)),
            LuaValue::Number(n) => Ok(Operand::Scalar(*n)),
            LuaValue::UserData(ud) => ud
                .borrow::<SeriesHandle>()
                .map(|s| Operand::Series(s.0.clone()))
                .map_err(|_| mlua::Error::RuntimeError("arithmetic on a non-Series userdata".into())),
            other => Err(mlua::Error::RuntimeError(format!("cannot do arithmetic with a {}", other.type_name()))),
        }
    };
    let (a, b) = (operand(&lhs)?, operand(&rhs)?);
    let get = |o: &Operand, i: usize| -> Option<f64> {
        match o {
            Operand::Scalar(x) => Some(*x),
            Operand::Series(c) => c.get(i).and_then(Value::as_f64),
        }
    };
    let (name, len) = match (&a, &b) {
        (Operand::Series(x), Operand::Series(y)) => {
            if x.len() != y.len() {
                return Err(frame_err(FrameError::LengthMismatch {
                    column: y.name().to_string(),
                    expected: x.len(),
                    found: y.len(),
                }));
            }
            (x.name().to_string(), x.len())
        }
        (Operand::Series(x), _) | (_, Operand::Series(x)) => (x.name().to_string(), x.len()),
        _ => return Err(mlua::Error::RuntimeError("arithmetic needs a Series operand".into())),
    };
    let values = (0..len)
        .map(|i| match (get(&a, i), get(&b, i)) {
            (Some(x), Some(y)) => Value::Float(op(x, y)),
            _ => Value::Null,
        })
        .collect();
    Ok(SeriesHandle::new(Column::with_dtype(name, DType::Float, values)))
}

impl UserData for SeriesHandle {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("name", |_, this| Ok(this.0.name().to_string()));
        fields.add_field_method_get("dtype", |_, this| Ok(this.0.dtype().name()));
    }

    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("sum", |lua, this, ()| value_to_lua(lua, &this.0.sum().map_err(frame_err)?));
        methods.add_method("mean", |_, this, ()| Ok(opt_number(this.0.mean().map_err(frame_err)?)));
        methods.add_method("std", |_, this, ()| Ok(opt_number(this.0.std().map_err(frame_err)?)));
        methods.add_method("var", |_, this, ()| Ok(opt_number(this.0.var().map_err(frame_err)?)));
        methods.add_method("median", |_, this, ()| Ok(opt_number(this.0.median().map_err(frame_err)?)));
        methods.add_method("quantile", |_, this, q: f64| {
            Ok(opt_number(this.0.quantile(q).map_err(frame_err)?))
        });
        methods.add_method("min", |lua, this, ()| match this.0.min() {
            Some(v) => value_to_lua(lua, &v),
            None => Ok(LuaValue::Nil),
        });
        methods.add_method("max", |lua, this, ()| match this.0.max() {
            Some(v) => value_to_lua(lua, &v),
            None => Ok(LuaValue::Nil),
        });
        methods.add_method("count", |_, this, ()| Ok(this.0.count()));
        methods.add_method("nunique", |_, this, ()| Ok(this.0.nunique()));

        methods.add_method("unique", |lua, this, ()| {
            let values = this.0.unique().iter().map(|v| value_to_lua(lua, v)).collect::<LuaResult<Vec<_>>>()?;
            lua.create_sequence_from(values)
        });

        methods.add_method("values", |lua, this, ()| {
            let table = lua.create_table()?;
            for (i, v) in this.0.values().iter().enumerate() {
                table.raw_set(i + 1, value_to_lua(lua, v)?)?;
            }
            Ok(table)
        });

        methods.add_method("value_counts", |_, this, ()| {
            let frame = DataFrame::new(vec![(*this.0).clone()]).map_err(frame_err)?;
            frame.value_counts(this.0.name()).map(FrameHandle::new).map_err(frame_err)
        });

        methods.add_method("describe", |_, this, ()| {
            let frame = DataFrame::new(vec![(*this.0).clone()]).map_err(frame_err)?;
            frame.describe().map(FrameHandle::new).map_err(frame_err)
        });

        methods.add_method("head", |_, this, n: Option<usize>| {
            Ok(SeriesHandle::new(this.0.slice(0, n.unwrap_or(5))))
        });

        methods.add_method("map", |lua, this, f: Function| {
            let mut values = Vec::with_capacity(this.0.len());
            for v in this.0.values() {
                let out: LuaValue = f.call(value_to_lua(lua, v)?)?;
                values.push(lua_to_value(&out)?);
            }
            Ok(SeriesHandle::new(Column::new(this.0.name(), values)))
        });

        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| Ok(this.0.to_string()));
        methods.add_meta_method(MetaMethod::Len, |_, this, ()| Ok(this.0.len()));
        methods.add_meta_method(MetaMethod::Index, |lua, this, index: usize| {
            match index.checked_sub(1).and_then(|i| this.0.get(i)) {
                Some(v) => value_to_lua(lua, v),
                None => Err(mlua::Error::RuntimeError(format!(
                    "index {index} out of range (1..{})",
                    this.0.len()
                ))),
            }
        });

        methods.add_meta_function(MetaMethod::Add, |_, (a, b): (LuaValue, LuaValue)| series_arith(a, b, |x, y| x + y));
        methods.add_meta_function(MetaMethod::Sub, |_, (a, b): (LuaValue, LuaValue)| series_arith(a, b, |x, y| x - y));
        methods.add_meta_function(MetaMethod::Mul, |_, (a, b): (LuaValue, LuaValue)| series_arith(a, b, |x, y| x * y));
        methods.add_meta_function(MetaMethod::Div, |_, (a, b): (LuaValue, LuaValue)| series_arith(a, b, |x, y| x / y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lua_with_frame() -> Lua {
        let lua = Lua::new();
        let frame = DataFrame::from_rows(
            vec!["name".into(), "age".into()],
            vec![
                vec!["ann".into(), Value::Int(31)],
                vec!["bob".into(), Value::Int(25)],
                vec!["cy".into(), Value::Null],
            ],
        )
        .unwrap();
        lua.globals().set("people", FrameHandle::new(frame)).unwrap();
        lua
    }

    #[test]
    fn test_sparse_table_is_not_an_array() {
        let lua = Lua::new();
        let t: Table = lua.load("return {[2^53] = 1}").eval().unwrap();
        let err = table_values(&t).unwrap_err();
        assert!(err.to_string().contains("too sparse"));

        let t: Table = lua.load("return {1, nil, 3}").eval().unwrap();
        assert_eq!(table_values(&t).unwrap(), vec![Value::Int(1), Value::Null, Value::Int(3)]);
    }

    #[test]
    fn test_shape_tostring() {
        let lua = lua_with_frame();
        let s: String = lua.load("tostring(people.shape)").eval().unwrap();
        assert_eq!(s, "(3, 2)");
        let rows: usize = lua.load("people.shape[1]").eval().unwrap();
        assert_eq!(rows, 3);
    }

    #[test]
    fn test_column_access_styles() {
        let lua = lua_with_frame();
        let a: i64 = lua.load("people.age:sum()").eval().unwrap();
        let b: i64 = lua.load("people['age']:sum()").eval().unwrap();
        let c: i64 = lua.load("people:col('age'):sum()").eval().unwrap();
        assert_eq!((a, b, c), (56, 56, 56));
    }

    #[test]
    fn test_unknown_column_errors() {
        let lua = lua_with_frame();
        let err = lua.load("return people.salary").eval::<LuaValue>().unwrap_err();
        assert!(err.to_string().contains("unknown column 'salary'"));
    }

    #[test]
    fn test_where_and_len() {
        let lua = lua_with_frame();
        let n: usize = lua.load("#people:where('age', '>', 26)").eval().unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_filter_with_function() {
        let lua = lua_with_frame();
        let n: usize = lua.load("#people:filter(function(r) return r.age ~= nil end)").eval().unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn test_with_column_from_function() {
        let lua = lua_with_frame();
        let code = "local df = people:with_column('upper', function(r) return string.upper(r.name) end)\n\
                    return df.upper[2]";
        let s: String = lua.load(code).eval().unwrap();
        assert_eq!(s, "BOB");
    }

    #[test]
    fn test_series_arithmetic() {
        let lua = lua_with_frame();
        let x: f64 = lua.load("(people.age * 2)[1]").eval().unwrap();
        assert_eq!(x, 62.0);
        let nil: LuaValue = lua.load("(1 + people.age)[3]").eval().unwrap();
        assert!(nil.is_nil());
    }

    #[test]
    fn test_methods_return_new_frames() {
        let lua = lua_with_frame();
        lua.load("people2 = people:head(1)").exec().unwrap();
        let n: usize = lua.load("#people").eval().unwrap();
        assert_eq!(n, 3);
    }

    #[test]
    fn test_numbers_from_series_and_table() {
        let lua = lua_with_frame();
        let series: LuaValue = lua.load("people.age").eval().unwrap();
        assert_eq!(numbers_from_lua(&series).unwrap(), vec![31.0, 25.0]);
        let table: LuaValue = lua.load("{1, 2.5, 3}").eval().unwrap();
        assert_eq!(numbers_from_lua(&table).unwrap(), vec![1.0, 2.5, 3.0]);
    }
}

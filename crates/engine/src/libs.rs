//! Library tables installed into every script namespace.
//!
//! - `pd`: frame construction, CSV reading, concat and merge
//! - `np`: numeric reductions, elementwise math, ranges
//! - `stats`: correlation, regression and test statistics
//! - `sm`: ordinary least squares
//! - `ml`: k-means clustering and feature scaling

use std::path::Path;

use mlua::{Lua, Result as LuaResult, Table, Value as LuaValue};

use dataprobe_core::{stats, Column, DType, DataFrame, Value};

use crate::bindings::{
    frame_err, frame_from_lua, lua_to_value, numbers_from_lua, table_values, FrameHandle, SeriesHandle,
};

/// Names of the library globals, in install order.
pub const LIBRARY_NAMES: &[&str] = &["pd", "np", "stats", "sm", "ml"];

pub fn install(lua: &Lua) -> LuaResult<()> {
    let globals = lua.globals();
    globals.set("pd", pandas(lua)?)?;
    globals.set("np", numpy(lua)?)?;
    globals.set("stats", scistats(lua)?)?;
    globals.set("sm", statsmodels(lua)?)?;
    globals.set("ml", learn(lua)?)?;
    Ok(())
}

fn runtime_err(msg: impl Into<String>) -> mlua::Error {
    mlua::Error::RuntimeError(msg.into())
}

fn nan_or(x: Option<f64>) -> f64 {
    x.unwrap_or(f64::NAN)
}

// ============================================================================
// pd
// ============================================================================

fn pandas(lua: &Lua) -> LuaResult<Table> {
    let pd = lua.create_table()?;

    // pd.DataFrame{a = {...}, b = {...}} or pd.DataFrame{{a = 1}, {a = 2}}
    pd.set(
        "DataFrame",
        lua.create_function(|_, (data, columns): (Table, Option<Vec<String>>)| {
            frame_from_table(&data, columns).map(FrameHandle::new)
        })?,
    )?;

    pd.set(
        "Series",
        lua.create_function(|_, (data, name): (LuaValue, Option<String>)| {
            let name = name.unwrap_or_default();
            match data {
                LuaValue::Table(t) => Ok(SeriesHandle::new(Column::new(name, table_values(&t)?))),
                LuaValue::UserData(ud) => {
                    let s = ud.borrow::<SeriesHandle>()?;
                    Ok(SeriesHandle::new(s.0.renamed(name)))
                }
                other => Err(runtime_err(format!("Series expects an array, got {}", other.type_name()))),
            }
        })?,
    )?;

    pd.set(
        "read_csv",
        lua.create_function(|_, path: String| {
            dataprobe_io::csv::import(Path::new(&path))
                .map(FrameHandle::new)
                .map_err(|e| runtime_err(e.to_string()))
        })?,
    )?;

    pd.set(
        "concat",
        lua.create_function(|_, frames: Vec<LuaValue>| {
            let frames = frames.iter().map(frame_from_lua).collect::<LuaResult<Vec<_>>>()?;
            let refs: Vec<&DataFrame> = frames.iter().map(|f| f.as_ref()).collect();
            DataFrame::concat(&refs).map(FrameHandle::new).map_err(frame_err)
        })?,
    )?;

    pd.set(
        "merge",
        lua.create_function(|_, (left, right, on): (LuaValue, LuaValue, String)| {
            let (left, right) = (frame_from_lua(&left)?, frame_from_lua(&right)?);
            left.merge(&right, &on).map(FrameHandle::new).map_err(frame_err)
        })?,
    )?;

    Ok(pd)
}

fn frame_from_table(data: &Table, columns: Option<Vec<String>>) -> LuaResult<DataFrame> {
    // Records form: a non-empty array of row tables
    if data.raw_len() > 0 {
        let mut rows: Vec<Table> = Vec::new();
        for v in data.clone().sequence_values::<LuaValue>() {
            match v? {
                LuaValue::Table(t) => rows.push(t),
                other => return Err(runtime_err(format!("expected row tables, got {}", other.type_name()))),
            }
        }
        let names = match columns {
            Some(names) => names,
            None => {
                let mut names: Vec<String> = Vec::new();
                for row in &rows {
                    for pair in row.clone().pairs::<String, LuaValue>() {
                        let (k, _) = pair?;
                        if !names.contains(&k) {
                            names.push(k);
                        }
                    }
                }
                names.sort();
                names
            }
        };
        let mut cells = Vec::with_capacity(rows.len());
        for row in &rows {
            let values = names
                .iter()
                .map(|n| row.raw_get::<LuaValue>(n.as_str()).and_then(|v| lua_to_value(&v)))
                .collect::<LuaResult<Vec<_>>>()?;
            cells.push(values);
        }
        return DataFrame::from_rows(names, cells).map_err(frame_err);
    }

    // Columns form: name -> array
    let mut by_name: Vec<(String, Vec<Value>)> = Vec::new();
    for pair in data.clone().pairs::<String, LuaValue>() {
        let (name, values) = pair?;
        let values = match values {
            LuaValue::Table(t) => table_values(&t)?,
            LuaValue::UserData(ud) => ud.borrow::<SeriesHandle>()?.0.values().to_vec(),
            other => return Err(runtime_err(format!("column '{name}' must be an array, got {}", other.type_name()))),
        };
        by_name.push((name, values));
    }
    let order = match columns {
        Some(names) => names,
        None => {
            let mut names: Vec<String> = by_name.iter().map(|(n, _)| n.clone()).collect();
            names.sort();
            names
        }
    };
    let mut cols = Vec::with_capacity(order.len());
    for name in order {
        let values = by_name
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| runtime_err(format!("unknown column '{name}'")))?;
        cols.push(Column::new(name, values));
    }
    DataFrame::new(cols).map_err(frame_err)
}

// ============================================================================
// np
// ============================================================================

/// Apply `f` to a number, an array or a series, keeping the shape.
fn elementwise(lua: &Lua, value: LuaValue, f: impl Fn(f64) -> f64) -> LuaResult<LuaValue> {
    match value {
        LuaValue::Integer(i) => Ok(LuaValue::Number(f(i as f64))),
        LuaValue::Number(n) => Ok(LuaValue::Number(f(n))),
        LuaValue::UserData(ud) => {
            let series = ud.borrow::<SeriesHandle>()?;
            let values = series
                .0
                .values()
                .iter()
                .map(|v| v.as_f64().map(|x| Value::Float(f(x))).unwrap_or(Value::Null))
                .collect();
            let out = SeriesHandle::new(Column::with_dtype(series.0.name(), DType::Float, values));
            lua.create_userdata(out).map(LuaValue::UserData)
        }
        LuaValue::Table(t) => {
            let out = lua.create_table()?;
            for (i, v) in table_values(&t)?.iter().enumerate() {
                if let Some(x) = v.as_f64() {
                    out.raw_set(i + 1, f(x))?;
                }
            }
            Ok(LuaValue::Table(out))
        }
        other => Err(runtime_err(format!("expected a number or array, got {}", other.type_name()))),
    }
}

fn numpy(lua: &Lua) -> LuaResult<Table> {
    let np = lua.create_table()?;

    np.set("nan", f64::NAN)?;
    np.set("inf", f64::INFINITY)?;
    np.set("pi", std::f64::consts::PI)?;
    np.set("e", std::f64::consts::E)?;

    np.set("sum", lua.create_function(|_, x: LuaValue| Ok(stats::sum(&numbers_from_lua(&x)?)))?)?;
    np.set("mean", lua.create_function(|_, x: LuaValue| Ok(nan_or(stats::mean(&numbers_from_lua(&x)?))))?)?;
    np.set(
        "std",
        lua.create_function(|_, (x, ddof): (LuaValue, Option<usize>)| {
            Ok(nan_or(stats::std(&numbers_from_lua(&x)?, ddof.unwrap_or(0))))
        })?,
    )?;
    np.set(
        "var",
        lua.create_function(|_, (x, ddof): (LuaValue, Option<usize>)| {
            Ok(nan_or(stats::var(&numbers_from_lua(&x)?, ddof.unwrap_or(0))))
        })?,
    )?;
    np.set("min", lua.create_function(|_, x: LuaValue| Ok(nan_or(stats::min(&numbers_from_lua(&x)?))))?)?;
    np.set("max", lua.create_function(|_, x: LuaValue| Ok(nan_or(stats::max(&numbers_from_lua(&x)?))))?)?;
    np.set("median", lua.create_function(|_, x: LuaValue| Ok(nan_or(stats::median(&numbers_from_lua(&x)?))))?)?;
    np.set(
        "percentile",
        lua.create_function(|_, (x, q): (LuaValue, f64)| {
            if !(0.0..=100.0).contains(&q) {
                return Err(runtime_err("percentiles must be in the range [0, 100]"));
            }
            Ok(nan_or(stats::quantile(&numbers_from_lua(&x)?, q / 100.0)))
        })?,
    )?;

    np.set("sqrt", lua.create_function(|lua, x: LuaValue| elementwise(lua, x, f64::sqrt))?)?;
    np.set("log", lua.create_function(|lua, x: LuaValue| elementwise(lua, x, f64::ln))?)?;
    np.set("exp", lua.create_function(|lua, x: LuaValue| elementwise(lua, x, f64::exp))?)?;
    np.set("abs", lua.create_function(|lua, x: LuaValue| elementwise(lua, x, f64::abs))?)?;
    np.set(
        "round",
        lua.create_function(|lua, (x, digits): (LuaValue, Option<i32>)| {
            let scale = 10f64.powi(digits.unwrap_or(0));
            elementwise(lua, x, move |v| (v * scale).round() / scale)
        })?,
    )?;

    np.set("cumsum", lua.create_function(|_, x: LuaValue| Ok(stats::cumsum(&numbers_from_lua(&x)?)))?)?;

    // np.arange(stop) or np.arange(start, stop, step)
    np.set(
        "arange",
        lua.create_function(|_, (a, b, step): (f64, Option<f64>, Option<f64>)| {
            let (start, stop) = match b {
                Some(stop) => (a, stop),
                None => (0.0, a),
            };
            stats::arange(start, stop, step.unwrap_or(1.0)).map_err(frame_err)
        })?,
    )?;
    np.set(
        "linspace",
        lua.create_function(|_, (start, stop, n): (f64, f64, Option<usize>)| {
            stats::linspace(start, stop, n.unwrap_or(50)).map_err(frame_err)
        })?,
    )?;
    np.set(
        "dot",
        lua.create_function(|_, (a, b): (LuaValue, LuaValue)| {
            stats::dot(&numbers_from_lua(&a)?, &numbers_from_lua(&b)?).map_err(frame_err)
        })?,
    )?;
    // Correlation coefficient of two vectors as a scalar
    np.set(
        "corrcoef",
        lua.create_function(|_, (a, b): (LuaValue, LuaValue)| {
            stats::pearson(&numbers_from_lua(&a)?, &numbers_from_lua(&b)?).map_err(frame_err)
        })?,
    )?;

    Ok(np)
}

// ============================================================================
// stats
// ============================================================================

fn scistats(lua: &Lua) -> LuaResult<Table> {
    let st = lua.create_table()?;

    st.set(
        "pearsonr",
        lua.create_function(|_, (x, y): (LuaValue, LuaValue)| {
            stats::pearson(&numbers_from_lua(&x)?, &numbers_from_lua(&y)?).map_err(frame_err)
        })?,
    )?;
    st.set(
        "spearmanr",
        lua.create_function(|_, (x, y): (LuaValue, LuaValue)| {
            stats::spearman(&numbers_from_lua(&x)?, &numbers_from_lua(&y)?).map_err(frame_err)
        })?,
    )?;
    st.set(
        "zscore",
        lua.create_function(|_, x: LuaValue| {
            stats::zscore(&numbers_from_lua(&x)?).ok_or_else(|| runtime_err("zscore of an empty array"))
        })?,
    )?;
    st.set(
        "linregress",
        lua.create_function(|lua, (x, y): (LuaValue, LuaValue)| {
            let fit = stats::linregress(&numbers_from_lua(&x)?, &numbers_from_lua(&y)?).map_err(frame_err)?;
            let t = lua.create_table()?;
            t.set("slope", fit.slope)?;
            t.set("intercept", fit.intercept)?;
            t.set("rvalue", fit.rvalue)?;
            Ok(t)
        })?,
    )?;
    st.set(
        "ttest_ind",
        lua.create_function(|lua, (a, b): (LuaValue, LuaValue)| {
            let (t_stat, df) = stats::welch_t(&numbers_from_lua(&a)?, &numbers_from_lua(&b)?).map_err(frame_err)?;
            let t = lua.create_table()?;
            t.set("statistic", t_stat)?;
            t.set("df", df)?;
            Ok(t)
        })?,
    )?;
    st.set(
        "describe",
        lua.create_function(|lua, x: LuaValue| {
            let xs = numbers_from_lua(&x)?;
            let t = lua.create_table()?;
            t.set("nobs", xs.len())?;
            t.set("mean", nan_or(stats::mean(&xs)))?;
            t.set("std", nan_or(stats::std(&xs, 1)))?;
            t.set("min", nan_or(stats::min(&xs)))?;
            t.set("max", nan_or(stats::max(&xs)))?;
            Ok(t)
        })?,
    )?;
    st.set("norm_cdf", lua.create_function(|_, z: f64| Ok(stats::norm_cdf(z)))?)?;

    Ok(st)
}

// ============================================================================
// sm
// ============================================================================

/// Regressors from a frame (numeric columns), an array of arrays, or a
/// single array.
fn regressors_from_lua(value: &LuaValue) -> LuaResult<(Vec<String>, Vec<Vec<f64>>)> {
    if let Ok(frame) = frame_from_lua(value) {
        let mut names = Vec::new();
        let mut xs = Vec::new();
        for col in frame.columns().iter().filter(|c| c.dtype().is_numeric()) {
            names.push(col.name().to_string());
            xs.push(col.numbers().map_err(frame_err)?);
        }
        return Ok((names, xs));
    }
    if let LuaValue::Table(t) = value {
        let nested = matches!(t.raw_get::<LuaValue>(1)?, LuaValue::Table(_) | LuaValue::UserData(_));
        if nested {
            let mut xs = Vec::new();
            for v in t.clone().sequence_values::<LuaValue>() {
                xs.push(numbers_from_lua(&v?)?);
            }
            let names = (1..=xs.len()).map(|i| format!("x{i}")).collect();
            return Ok((names, xs));
        }
    }
    Ok((vec!["x1".to_string()], vec![numbers_from_lua(value)?]))
}

fn statsmodels(lua: &Lua) -> LuaResult<Table> {
    let sm = lua.create_table()?;

    sm.set(
        "ols",
        lua.create_function(|lua, (y, x): (LuaValue, LuaValue)| {
            let y = numbers_from_lua(&y)?;
            let (names, xs) = regressors_from_lua(&x)?;
            let fit = stats::ols(&y, &xs).map_err(frame_err)?;
            let t = lua.create_table()?;
            t.set("params", fit.params)?;
            let mut all_names = vec!["const".to_string()];
            all_names.extend(names);
            t.set("names", all_names)?;
            t.set("rsquared", fit.rsquared)?;
            t.set("nobs", fit.nobs)?;
            Ok(t)
        })?,
    )?;

    Ok(sm)
}

// ============================================================================
// ml
// ============================================================================

fn learn(lua: &Lua) -> LuaResult<Table> {
    let ml = lua.create_table()?;

    // Labels are 1-based cluster ids
    ml.set(
        "kmeans",
        lua.create_function(|lua, (data, k, max_iter): (LuaValue, usize, Option<usize>)| {
            let frame = frame_from_lua(&data)?;
            let (_, points) = frame.numeric_rows().map_err(frame_err)?;
            let fit = stats::kmeans(&points, k, max_iter.unwrap_or(100)).map_err(frame_err)?;
            let t = lua.create_table()?;
            t.set("labels", fit.labels.iter().map(|l| l + 1).collect::<Vec<_>>())?;
            t.set("centers", fit.centers)?;
            t.set("inertia", fit.inertia)?;
            Ok(t)
        })?,
    )?;

    ml.set(
        "standard_scale",
        lua.create_function(|_, data: LuaValue| {
            let frame = frame_from_lua(&data)?;
            frame
                .map_numeric(|xs| match (stats::mean(xs), stats::std(xs, 0)) {
                    (Some(m), Some(s)) if s > 0.0 => xs.iter().map(|x| (x - m) / s).collect(),
                    _ => vec![0.0; xs.len()],
                })
                .map(FrameHandle::new)
                .map_err(frame_err)
        })?,
    )?;

    ml.set(
        "minmax_scale",
        lua.create_function(|_, data: LuaValue| {
            let frame = frame_from_lua(&data)?;
            frame
                .map_numeric(|xs| match (stats::min(xs), stats::max(xs)) {
                    (Some(lo), Some(hi)) if hi > lo => xs.iter().map(|x| (x - lo) / (hi - lo)).collect(),
                    _ => vec![0.0; xs.len()],
                })
                .map(FrameHandle::new)
                .map_err(frame_err)
        })?,
    )?;

    Ok(ml)
}

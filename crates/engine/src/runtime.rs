//! Script runner.
//!
//! Each call builds a fresh Lua state holding the library tables and one
//! global per stored dataset, runs the script to completion and drops the
//! state. `print` writes into a per-call buffer rather than the process
//! stdout, so concurrent transports never see script output.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::{Function, Lua, MultiValue, Result as LuaResult, Value as LuaValue};

use crate::bindings::FrameHandle;
use crate::error::EngineError;
use crate::libs;
use crate::store::DatasetStore;

/// Returned when a script prints nothing.
pub const NO_OUTPUT: &str = "<no output>";

/// Globals removed from every namespace.
/// We keep: basic, string, table, math, utf8
const SANDBOXED: &[&str] = &["os", "io", "debug", "package", "require", "loadfile", "dofile", "load"];

/// Reads of unassigned globals raise instead of yielding nil.
const STRICT_GLOBALS: &str = r#"
setmetatable(_G, {
    __index = function(_, name)
        error("name '" .. tostring(name) .. "' is not defined", 2)
    end,
})
"#;

/// Lines captured from `print` during one execution.
#[derive(Debug, Clone, Default)]
struct OutputBuffer(Rc<RefCell<Vec<String>>>);

impl OutputBuffer {
    fn push(&self, line: String) {
        self.0.borrow_mut().push(line);
    }

    /// Joined and trimmed, or the no-output sentinel.
    fn text(&self) -> String {
        let joined = self.0.borrow().join("\n");
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            NO_OUTPUT.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptRunner;

impl ScriptRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `script` against the datasets in `store`.
    ///
    /// On success the captured output is returned and logged, then every
    /// name in `persist` that is bound to a frame is written back into the
    /// store. On failure the store's datasets are untouched; only the
    /// pre-execution log entry remains.
    pub fn execute(
        &self,
        store: &mut DatasetStore,
        script: &str,
        persist: Option<&[String]>,
    ) -> Result<String, EngineError> {
        store.record(format!("Executing script:\n{script}"));

        let output = OutputBuffer::default();
        let lua = build_namespace(store, &output).map_err(|e| EngineError::Setup(format_lua_error(&e)))?;

        if let Err(e) = lua.load(script).set_name("=script").exec() {
            let message = format_lua_error(&e);
            log::warn!("Script error: {}", message);
            return Err(EngineError::ScriptExecution(message));
        }

        let text = output.text();
        store.record(format!("Script output: {text}"));

        let globals = lua.globals();
        for name in persist.unwrap_or_default() {
            let value: LuaValue = globals
                .raw_get(name.as_str())
                .map_err(|e| EngineError::ScriptExecution(format_lua_error(&e)))?;
            let frame = match &value {
                LuaValue::UserData(ud) => ud.borrow::<FrameHandle>().ok().map(|f| f.0.clone()),
                _ => None,
            };
            match frame {
                Some(frame) => {
                    store.put(name.clone(), frame);
                    store.record(format!("Saved DataFrame '{name}' to memory"));
                    log::info!("Saved DataFrame '{}' to memory", name);
                }
                None => log::debug!("not persisting '{}': {} is not a DataFrame", name, value.type_name()),
            }
        }

        Ok(text)
    }
}

fn build_namespace(store: &DatasetStore, output: &OutputBuffer) -> LuaResult<Lua> {
    let lua = Lua::new();
    let globals = lua.globals();

    {
        let sink = output.clone();
        let tostring: Function = globals.get("tostring")?;
        let print_fn = lua.create_function(move |_, args: MultiValue| {
            let parts = args
                .iter()
                .map(|v| render_value(v, &tostring, 0))
                .collect::<LuaResult<Vec<_>>>()?;
            sink.push(parts.join("\t"));
            Ok(())
        })?;
        globals.set("print", print_fn)?;
    }

    for name in SANDBOXED {
        globals.set(*name, LuaValue::Nil)?;
    }

    libs::install(&lua)?;

    // Datasets last so they shadow library names
    for (name, frame) in store.iter() {
        globals.set(name, FrameHandle(frame.clone()))?;
    }

    lua.load(STRICT_GLOBALS).set_name("=strict").exec()?;
    Ok(lua)
}

/// Display form used by `print`. Plain tables render their contents with
/// sorted keys; everything else goes through `tostring`.
fn render_value(value: &LuaValue, tostring: &Function, depth: usize) -> LuaResult<String> {
    match value {
        LuaValue::String(s) if depth > 0 => Ok(format!("{:?}", s.to_string_lossy())),
        LuaValue::String(s) => Ok(s.to_string_lossy().to_string()),
        LuaValue::Table(_) if depth >= 3 => Ok("{...}".to_string()),
        LuaValue::Table(t) => {
            let len = t.raw_len();
            let mut parts = Vec::with_capacity(len);
            for i in 1..=len {
                parts.push(render_value(&t.raw_get::<LuaValue>(i)?, tostring, depth + 1)?);
            }
            let mut keyed = Vec::new();
            for pair in t.clone().pairs::<LuaValue, LuaValue>() {
                let (k, v) = pair?;
                if let LuaValue::Integer(i) = k {
                    if i >= 1 && (i as usize) <= len {
                        continue;
                    }
                }
                let key = match &k {
                    LuaValue::String(s) => s.to_string_lossy().to_string(),
                    other => format!("[{}]", render_value(other, tostring, depth + 1)?),
                };
                keyed.push((key, render_value(&v, tostring, depth + 1)?));
            }
            keyed.sort();
            parts.extend(keyed.into_iter().map(|(k, v)| format!("{k} = {v}")));
            Ok(format!("{{{}}}", parts.join(", ")))
        }
        other => tostring.call::<String>(other.clone()),
    }
}

/// Error text for the caller: the innermost cause, without traceback.
fn format_lua_error(error: &mlua::Error) -> String {
    let message = match error {
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        mlua::Error::RuntimeError(msg) => msg.clone(),
        mlua::Error::CallbackError { cause, .. } => return format_lua_error(cause),
        mlua::Error::WithContext { cause, .. } => return format_lua_error(cause),
        _ => error.to_string(),
    };
    match message.find("\nstack traceback:") {
        Some(idx) => message[..idx].to_string(),
        None => message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use dataprobe_core::{DataFrame, Value};

    fn store_with_people() -> DatasetStore {
        let mut store = DatasetStore::new();
        let frame = DataFrame::from_rows(
            vec!["name".into(), "age".into()],
            vec![
                vec!["ann".into(), Value::Int(31)],
                vec!["bob".into(), Value::Int(25)],
            ],
        )
        .unwrap();
        store.put("people", Arc::new(frame));
        store
    }

    fn run(store: &mut DatasetStore, script: &str) -> Result<String, EngineError> {
        ScriptRunner::new().execute(store, script, None)
    }

    #[test]
    fn test_print_capture() {
        let mut store = DatasetStore::new();
        assert_eq!(run(&mut store, "print('hello', 'world')").unwrap(), "hello\tworld");
    }

    #[test]
    fn test_multiple_prints() {
        let mut store = DatasetStore::new();
        let out = run(&mut store, "print('one'); print('two'); print('three')").unwrap();
        assert_eq!(out, "one\ntwo\nthree");
    }

    #[test]
    fn test_for_loop() {
        let mut store = DatasetStore::new();
        assert_eq!(run(&mut store, "for i = 1, 3 do print(i) end").unwrap(), "1\n2\n3");
    }

    #[test]
    fn test_no_output_sentinel() {
        let mut store = DatasetStore::new();
        assert_eq!(run(&mut store, "local x = 42").unwrap(), NO_OUTPUT);
        assert_eq!(run(&mut store, "print('   ')").unwrap(), NO_OUTPUT);
        assert_eq!(run(&mut store, "").unwrap(), NO_OUTPUT);
    }

    #[test]
    fn test_output_is_trimmed() {
        let mut store = DatasetStore::new();
        assert_eq!(run(&mut store, "print(''); print('  x  '); print('')").unwrap(), "x");
    }

    #[test]
    fn test_syntax_error() {
        let mut store = DatasetStore::new();
        let err = run(&mut store, "if then").unwrap_err();
        assert!(matches!(err, EngineError::ScriptExecution(_)));
        assert!(!err.message().is_empty());
    }

    #[test]
    fn test_runtime_error() {
        let mut store = DatasetStore::new();
        let err = run(&mut store, "error('boom')").unwrap_err();
        assert!(err.message().contains("boom"));
        assert!(!err.message().contains("stack traceback"));
        assert!(err.to_string().starts_with("Script error: "));
    }

    #[test]
    fn test_undefined_name() {
        let mut store = DatasetStore::new();
        let err = run(&mut store, "print(df_9.shape)").unwrap_err();
        assert!(err.message().contains("name 'df_9' is not defined"));
    }

    #[test]
    fn test_callback_error_is_unwrapped() {
        let mut store = store_with_people();
        let err = run(&mut store, "print(people.salary)").unwrap_err();
        assert_eq!(err.message(), "unknown column 'salary'");
    }

    #[test]
    fn test_sandbox_no_os() {
        let mut store = DatasetStore::new();
        assert!(run(&mut store, "os.execute('ls')").is_err());
    }

    #[test]
    fn test_sandbox_no_io() {
        let mut store = DatasetStore::new();
        assert!(run(&mut store, "io.open('/etc/passwd')").is_err());
    }

    #[test]
    fn test_sandbox_no_require() {
        let mut store = DatasetStore::new();
        assert!(run(&mut store, "require('os')").is_err());
    }

    #[test]
    fn test_sandbox_no_load() {
        let mut store = DatasetStore::new();
        assert!(run(&mut store, "load('return 1')()").is_err());
    }

    #[test]
    fn test_standard_libraries_available() {
        let mut store = DatasetStore::new();
        let out = run(&mut store, "print(math.floor(3.7), string.upper('a'), table.concat({1, 2}, '-'))").unwrap();
        assert_eq!(out, "3\tA\t1-2");
    }

    #[test]
    fn test_tables_print_deterministically() {
        let mut store = DatasetStore::new();
        let out = run(&mut store, "print({3, 'x', b = 2, a = {1}})").unwrap();
        assert_eq!(out, "{3, \"x\", a = {1}, b = 2}");
    }

    #[test]
    fn test_dataset_visible_and_shape_prints() {
        let mut store = store_with_people();
        assert_eq!(run(&mut store, "print(people.shape)").unwrap(), "(2, 2)");
    }

    #[test]
    fn test_datasets_shadow_libraries() {
        let mut store = store_with_people();
        let frame = store.get("people").unwrap();
        store.put("np", frame);
        assert_eq!(run(&mut store, "print(#np)").unwrap(), "2");
    }

    #[test]
    fn test_write_back_frame() {
        let mut store = store_with_people();
        let persist = vec!["young".to_string()];
        ScriptRunner::new()
            .execute(&mut store, "young = people:where('age', '<', 30)", Some(&persist))
            .unwrap();
        assert_eq!(store.get("young").unwrap().shape(), (1, 2));
        assert_eq!(store.log_entries().last().unwrap(), "Saved DataFrame 'young' to memory");
    }

    #[test]
    fn test_write_back_skips_non_frames_and_missing() {
        let mut store = store_with_people();
        let persist = vec!["n".to_string(), "missing".to_string()];
        ScriptRunner::new().execute(&mut store, "n = 5", Some(&persist)).unwrap();
        assert!(!store.contains("n"));
        assert!(!store.contains("missing"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rebinding_does_not_touch_store() {
        let mut store = store_with_people();
        run(&mut store, "people = people:head(1)").unwrap();
        assert_eq!(store.get("people").unwrap().nrows(), 2);
    }

    #[test]
    fn test_failure_leaves_datasets_and_logs_only_request() {
        let mut store = store_with_people();
        let persist = vec!["x".to_string()];
        let err = ScriptRunner::new().execute(&mut store, "x = people:head(1)\nerror('late')", Some(&persist));
        assert!(err.is_err());
        assert!(!store.contains("x"));
        assert_eq!(store.log_entries(), &["Executing script:\nx = people:head(1)\nerror('late')".to_string()]);
    }

    #[test]
    fn test_log_order_on_success() {
        let mut store = store_with_people();
        let persist = vec!["a".to_string(), "b".to_string()];
        ScriptRunner::new()
            .execute(&mut store, "a = people:head(1)\nb = people:tail(1)\nprint('ok')", Some(&persist))
            .unwrap();
        let log = store.log_entries();
        assert_eq!(log.len(), 4);
        assert!(log[0].starts_with("Executing script:\n"));
        assert_eq!(log[1], "Script output: ok");
        assert_eq!(log[2], "Saved DataFrame 'a' to memory");
        assert_eq!(log[3], "Saved DataFrame 'b' to memory");
    }
}

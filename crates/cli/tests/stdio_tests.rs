// End-to-end tests for the `dataprobe` binary over the stdio transport.
// Run with: cargo test -p dataprobe-cli --test stdio_tests

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::{json, Value};
use tempfile::TempDir;

fn dataprobe(dir: &Path) -> Command {
    // Empty config file so the user's own config never leaks in
    let config = dir.join("config.toml");
    fs::write(&config, "").unwrap();

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dataprobe"));
    cmd.arg("--config").arg(&config);
    cmd.env("RUST_LOG", "off");
    cmd
}

/// Send every request, close stdin, and parse each stdout line.
fn session(dir: &Path, requests: &[Value]) -> Vec<Value> {
    let mut child = dataprobe(dir)
        .args(["--transport", "stdio"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn dataprobe");

    {
        let mut stdin = child.stdin.take().unwrap();
        for req in requests {
            writeln!(stdin, "{}", req).unwrap();
        }
    }

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn rpc(id: u64, method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
}

#[test]
fn full_exploration_session() {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("scores.csv");
    fs::write(&csv, "student,score\nana,81\nben,67\ncai,92\n").unwrap();

    let responses = session(
        dir.path(),
        &[
            rpc(1, "initialize", json!({"protocolVersion": "2024-11-05", "capabilities": {}})),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            rpc(2, "tools/call", json!({"name": "load_dataset", "arguments": {"csv_path": csv, "df_name": "scores"}})),
            rpc(
                3,
                "tools/call",
                json!({"name": "run_script", "arguments": {
                    "script": "top = scores:where('score', '>', 70)\nprint(#top)",
                    "save_to_memory": ["top"]
                }}),
            ),
            rpc(4, "tools/call", json!({"name": "run_script", "arguments": {"script": "print(top.student[2])"}})),
            rpc(5, "resources/read", json!({"uri": "dataprobe://notes"})),
        ],
    );

    // The notification produced no line
    assert_eq!(responses.len(), 5);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[1]["result"]["content"][0]["text"], "Loaded CSV into 'scores' (3 rows, 2 cols)");
    assert_eq!(responses[2]["result"]["content"][0]["text"], "2");
    assert_eq!(responses[3]["result"]["content"][0]["text"], "cai");

    let notes = responses[4]["result"]["contents"][0]["text"].as_str().unwrap();
    assert!(notes.starts_with("Loaded CSV into 'scores' (3 rows, 2 cols)\nExecuting script:\n"));
    assert!(notes.contains("Saved DataFrame 'top' to memory"));
    assert!(notes.ends_with("Script output: cai"));
}

#[test]
fn errors_keep_the_server_alive() {
    let dir = TempDir::new().unwrap();

    let responses = session(
        dir.path(),
        &[
            rpc(1, "tools/call", json!({"name": "run_script", "arguments": {"script": "print(nope)"}})),
            json!("garbage"),
            rpc(2, "ping", Value::Null),
        ],
    );

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["error"]["code"], -32603);
    assert!(responses[0]["error"]["message"].as_str().unwrap().contains("name 'nope' is not defined"));
    assert_eq!(responses[1]["error"]["code"], -32700);
    assert_eq!(responses[2]["result"], json!({}));
}

#[test]
fn missing_config_file_exits_with_config_code() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_dataprobe"))
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .stdin(Stdio::null())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("config file not found"));
}

#[test]
fn invalid_port_flag_rejected() {
    let dir = TempDir::new().unwrap();
    let output = dataprobe(dir.path()).args(["--port", "0"]).stdin(Stdio::null()).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
}

//! JSON-RPC server: one dispatcher shared by every transport.

pub mod dispatch;
pub mod prompt;
pub mod stdio;
pub mod tcp;

use std::io::{BufRead, Write};

pub use dispatch::Dispatcher;

/// Read newline-delimited requests until EOF, writing one response line per
/// request. Notifications and blank lines get no reply.
pub fn serve_lines<R: BufRead, W: Write>(reader: R, mut writer: W, dispatcher: &Dispatcher) -> std::io::Result<()> {
    for line in reader.lines() {
        let line = line?;
        if let Some(response) = dispatcher.handle_line(&line) {
            writeln!(writer, "{}", response)?;
            writer.flush()?;
        }
    }
    Ok(())
}

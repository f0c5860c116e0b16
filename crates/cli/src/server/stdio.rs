//! stdio transport: requests on stdin, responses on stdout.

use std::io;

use super::{serve_lines, Dispatcher};

pub fn run(dispatcher: &Dispatcher) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve_lines(stdin.lock(), stdout.lock(), dispatcher)
}

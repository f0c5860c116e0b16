//! TCP transport.
//!
//! Newline-delimited JSON-RPC, one thread per connection. Connections share
//! the session; the session lock serializes their requests.

use std::io::BufReader;
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use super::{serve_lines, Dispatcher};

pub fn bind(addr: &str) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr)?;
    if let Ok(local) = listener.local_addr() {
        log::info!("Listening on {}", local);
    }
    Ok(listener)
}

/// Run the accept loop on its own thread.
pub fn spawn(listener: TcpListener, dispatcher: Dispatcher) -> JoinHandle<()> {
    thread::spawn(move || run_listener(listener, dispatcher))
}

fn run_listener(listener: TcpListener, dispatcher: Dispatcher) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let addr = stream.peer_addr().map(|a| a.to_string()).unwrap_or_else(|_| "?".to_string());
                log::debug!("Accepted connection from {}", addr);
                let dispatcher = dispatcher.clone();

                // Handle each connection in its own thread
                thread::spawn(move || {
                    if let Err(e) = handle_connection(stream, &dispatcher) {
                        log::warn!("Connection error from {}: {}", addr, e);
                    }
                    log::debug!("Connection from {} closed", addr);
                });
            }
            Err(e) => log::error!("Accept error: {}", e),
        }
    }
}

fn handle_connection(stream: TcpStream, dispatcher: &Dispatcher) -> std::io::Result<()> {
    let reader = BufReader::new(stream.try_clone()?);
    serve_lines(reader, stream, dispatcher)
}

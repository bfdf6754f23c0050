//! Plain-text `/metrics` scrape endpoint.
//!
//! HTTP/1.0, one response per connection, any path. Served from a detached
//! thread; it lives until the process exits.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use eyre::Report;
use soil_core::{SoilError, SoilMetrics};

const CONTENT_TYPE: &str = "text/plain; version=0.0.4";
const CLIENT_TIMEOUT: Duration = Duration::from_secs(2);

/// Bind `addr` and start serving `metrics`. Returns the bound address.
pub fn spawn(addr: SocketAddr, metrics: Arc<SoilMetrics>) -> eyre::Result<SocketAddr> {
    let listener = TcpListener::bind(addr)
        .map_err(|e| Report::new(SoilError::Init(format!("bind metrics on {addr}: {e}"))))?;
    let local = listener.local_addr()?;
    std::thread::Builder::new()
        .name("soil-metrics".into())
        .spawn(move || serve(&listener, &metrics))
        .map_err(|e| Report::new(SoilError::Init(format!("spawn metrics thread: {e}"))))?;
    Ok(local)
}

fn serve(listener: &TcpListener, metrics: &SoilMetrics) {
    for conn in listener.incoming() {
        match conn {
            Ok(stream) => {
                if let Err(e) = respond(stream, metrics) {
                    tracing::debug!(error = %e, "metrics client dropped");
                }
            }
            Err(e) => tracing::warn!(error = %e, "metrics accept failed"),
        }
    }
}

fn respond(stream: TcpStream, metrics: &SoilMetrics) -> std::io::Result<()> {
    stream.set_read_timeout(Some(CLIENT_TIMEOUT))?;
    stream.set_write_timeout(Some(CLIENT_TIMEOUT))?;

    // drain the request head; its content does not matter
    let mut reader = BufReader::new(&stream);
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 || line.trim_end().is_empty() {
            break;
        }
    }

    let body = metrics.render();
    let mut out = &stream;
    write!(
        out,
        "HTTP/1.0 200 OK\r\nContent-Type: {CONTENT_TYPE}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )?;
    out.flush()
}

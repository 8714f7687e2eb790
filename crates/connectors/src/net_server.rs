//! The `NET_SERVER` connector.
//!
//! Listens on `0.0.0.0:PORT`, accepts any number of TCP connections and reads
//! newline-delimited JSON records from each. An acceptor thread hands every
//! connection to its own thread; connection threads forward complete lines
//! through a bounded channel that the reader task drains. Lines from one
//! connection arrive in the order they were sent. When the channel is full,
//! connection threads stop reading until the reader catches up, pushing back
//! on the senders through TCP flow control.

use crate::codec::decode_line;
use crate::config::{ConnectorInfo, ConnectorOptions, ConnectorSettings, OptionSpec};
use crate::connector::{ConnectorContext, SourceReader};
use crate::error::ConnectorError;
use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use parking_lot::Mutex;
use sluice_core::schema::StreamSchema;
use sluice_core::Row;
use std::io::{BufRead, BufReader, ErrorKind};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Connector type tag.
pub const NET_SERVER: &str = "NET_SERVER";

/// Returns the connector's metadata.
pub fn info() -> ConnectorInfo {
    ConnectorInfo {
        name: NET_SERVER.to_string(),
        is_source: true,
        is_sink: false,
        options: vec![
            OptionSpec::required("PROTOCOL", "transport protocol, 'TCP'"),
            OptionSpec::required("PORT", "port to listen on, '0' for any free port"),
        ],
    }
}

/// Network transport of the net connectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
}

impl Protocol {
    /// Parses the `PROTOCOL` option of `connector`.
    pub fn from_options(connector: &str, options: &ConnectorOptions) -> Result<Self, ConnectorError> {
        let value = options.require(connector, "PROTOCOL")?;
        if value.trim().eq_ignore_ascii_case("TCP") {
            Ok(Protocol::Tcp)
        } else {
            Err(ConnectorError::InvalidOption {
                connector: connector.to_string(),
                key: "PROTOCOL".to_string(),
                message: format!("unsupported protocol '{}'", value),
            })
        }
    }
}

/// Typed options of the `NET_SERVER` connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetServerOptions {
    pub protocol: Protocol,
    pub port: u16,
}

impl NetServerOptions {
    /// Parses validated options.
    pub fn from_options(options: &ConnectorOptions) -> Result<Self, ConnectorError> {
        Ok(Self {
            protocol: Protocol::from_options(NET_SERVER, options)?,
            port: options.require_parsed(NET_SERVER, "PORT")?,
        })
    }
}

/// A complete line received on one connection.
struct Line {
    peer: SocketAddr,
    bytes: Vec<u8>,
}

/// Source reader accepting JSON lines over TCP.
pub struct NetServerSource {
    name: String,
    schema: Arc<StreamSchema>,
    local_addr: SocketAddr,
    lines: Receiver<Line>,
    running: Arc<AtomicBool>,
    acceptor: Option<JoinHandle<()>>,
    connections: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl NetServerSource {
    /// Binds the listener and starts accepting connections.
    pub fn open(options: &ConnectorOptions, ctx: &ConnectorContext) -> Result<Self, ConnectorError> {
        let options = NetServerOptions::from_options(options)?;
        let listener = TcpListener::bind(("0.0.0.0", options.port))?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let (tx, rx) = crossbeam_channel::bounded(ctx.settings.net_line_buffer.max(1));
        let running = Arc::new(AtomicBool::new(true));
        let connections = Arc::new(Mutex::new(Vec::new()));

        let acceptor = {
            let running = Arc::clone(&running);
            let connections = Arc::clone(&connections);
            let settings = ctx.settings;
            let reader = ctx.name.clone();
            thread::Builder::new()
                .name(format!("sluice-accept-{}", ctx.name))
                .spawn(move || accept_loop(reader, listener, tx, running, connections, settings))?
        };

        tracing::info!(reader = %ctx.name, addr = %local_addr, "NET_SERVER listening");
        Ok(Self {
            name: ctx.name.clone(),
            schema: Arc::clone(&ctx.schema),
            local_addr,
            lines: rx,
            running,
            acceptor: Some(acceptor),
            connections,
        })
    }
}

fn accept_loop(
    reader: String,
    listener: TcpListener,
    lines: Sender<Line>,
    running: Arc<AtomicBool>,
    connections: Arc<Mutex<Vec<JoinHandle<()>>>>,
    settings: ConnectorSettings,
) {
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                tracing::debug!(reader = %reader, peer = %peer, "accepted connection");
                let lines = lines.clone();
                let running = Arc::clone(&running);
                let spawned = thread::Builder::new()
                    .name(format!("sluice-conn-{}", reader))
                    .spawn(move || read_connection(stream, peer, lines, running, settings));
                match spawned {
                    Ok(handle) => {
                        let mut conns = connections.lock();
                        conns.retain(|h| !h.is_finished());
                        conns.push(handle);
                    }
                    Err(e) => tracing::error!(reader = %reader, "failed to spawn connection thread: {}", e),
                }
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(settings.poll_interval.min(Duration::from_millis(20)));
            }
            Err(e) => {
                tracing::warn!(reader = %reader, "failed to accept remote connection: {}", e);
            }
        }
    }
    tracing::debug!(reader = %reader, "acceptor stopped");
}

/// Hands a line to the reader task, waiting while the channel is full.
///
/// Returns false once the source stops or the reader is gone.
fn forward(lines: &Sender<Line>, mut line: Line, running: &AtomicBool, poll: Duration) -> bool {
    loop {
        if !running.load(Ordering::SeqCst) {
            return false;
        }
        match lines.send_timeout(line, poll) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(back)) => line = back,
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}

fn read_connection(
    stream: TcpStream,
    peer: SocketAddr,
    lines: Sender<Line>,
    running: Arc<AtomicBool>,
    settings: ConnectorSettings,
) {
    let configured = stream
        .set_nonblocking(false)
        .and_then(|_| stream.set_read_timeout(Some(settings.net_read_timeout)));
    if let Err(e) = configured {
        tracing::warn!(peer = %peer, "failed to configure connection: {}", e);
        return;
    }

    let poll = settings.poll_interval.min(Duration::from_millis(20));
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    while running.load(Ordering::SeqCst) {
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() != Some(&b'\n') {
                    // EOF in the middle of a line; forward what arrived.
                    if !buf.is_empty() {
                        forward(&lines, Line { peer, bytes: std::mem::take(&mut buf) }, &running, poll);
                    }
                    break;
                }
                buf.pop();
                if buf.iter().all(u8::is_ascii_whitespace) {
                    buf.clear();
                    continue;
                }
                if !forward(&lines, Line { peer, bytes: std::mem::take(&mut buf) }, &running, poll) {
                    break;
                }
            }
            Err(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                tracing::warn!(peer = %peer, "connection read error: {}", e);
                break;
            }
        }
    }
    tracing::debug!(peer = %peer, "connection closed");
}

impl SourceReader for NetServerSource {
    fn next_row(&mut self, timeout: Duration) -> Result<Option<Row>, ConnectorError> {
        let line = match self.lines.recv_timeout(timeout) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => return Ok(None),
            Err(RecvTimeoutError::Disconnected) => return Err(ConnectorError::Closed),
        };
        let text = std::str::from_utf8(&line.bytes)
            .map_err(|e| ConnectorError::Codec(format!("from {}: {}", line.peer, e)))?;
        decode_line(text, &self.schema)
            .map(Some)
            .map_err(|e| match e {
                ConnectorError::Codec(message) => {
                    ConnectorError::Codec(format!("from {}: {}", line.peer, message))
                }
                other => other,
            })
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(self.local_addr)
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(acceptor) = self.acceptor.take() {
            let _ = acceptor.join();
        }
        let connections = std::mem::take(&mut *self.connections.lock());
        for handle in connections {
            let _ = handle.join();
        }
        tracing::debug!(reader = %self.name, "NET_SERVER shut down");
    }
}

impl Drop for NetServerSource {
    fn drop(&mut self) {
        if self.acceptor.is_some() {
            self.shutdown();
        }
    }
}

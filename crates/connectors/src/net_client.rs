//! The `NET_CLIENT` connector.
//!
//! Connects to a remote TCP endpoint. As a source reader it reads JSON lines
//! from the connection; as a sink writer it writes one JSON line per row.

use crate::codec::{decode_line, encode_row};
use crate::config::{ConnectorInfo, ConnectorOptions, OptionSpec};
use crate::connector::{ConnectorContext, SinkWriter, SourceReader};
use crate::error::ConnectorError;
use crate::net_server::Protocol;
use parking_lot::Mutex;
use sluice_core::schema::StreamSchema;
use sluice_core::Row;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

/// Connector type tag.
pub const NET_CLIENT: &str = "NET_CLIENT";

/// Returns the connector's metadata.
pub fn info() -> ConnectorInfo {
    ConnectorInfo {
        name: NET_CLIENT.to_string(),
        is_source: true,
        is_sink: true,
        options: vec![
            OptionSpec::required("PROTOCOL", "transport protocol, 'TCP'"),
            OptionSpec::required("REMOTE_HOST", "host name or address to connect to"),
            OptionSpec::required("REMOTE_PORT", "port to connect to"),
        ],
    }
}

/// Typed options of the `NET_CLIENT` connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetClientOptions {
    pub protocol: Protocol,
    pub remote_host: String,
    pub remote_port: u16,
}

impl NetClientOptions {
    /// Parses validated options.
    pub fn from_options(options: &ConnectorOptions) -> Result<Self, ConnectorError> {
        let protocol = Protocol::from_options(NET_CLIENT, options)?;
        let remote_host = options.require(NET_CLIENT, "REMOTE_HOST")?.trim();
        if remote_host.is_empty() {
            return Err(ConnectorError::InvalidOption {
                connector: NET_CLIENT.to_string(),
                key: "REMOTE_HOST".to_string(),
                message: "host cannot be empty".to_string(),
            });
        }
        Ok(Self {
            protocol,
            remote_host: remote_host.to_string(),
            remote_port: options.require_parsed(NET_CLIENT, "REMOTE_PORT")?,
        })
    }
}

/// Resolves the remote endpoint and connects to the first address that
/// answers within `timeout`.
fn connect(options: &NetClientOptions, timeout: Duration) -> Result<TcpStream, ConnectorError> {
    let target = format!("{}:{}", options.remote_host, options.remote_port);
    let addrs: Vec<SocketAddr> = (options.remote_host.as_str(), options.remote_port)
        .to_socket_addrs()
        .map_err(|e| ConnectorError::ConnectionFailed(format!("cannot resolve {}: {}", target, e)))?
        .collect();

    let mut last_error = None;
    for addr in &addrs {
        match TcpStream::connect_timeout(addr, timeout) {
            Ok(stream) => {
                tracing::debug!(remote = %addr, "connected");
                return Ok(stream);
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(ConnectorError::ConnectionFailed(match last_error {
        Some(e) => format!("{}: {}", target, e),
        None => format!("{}: no addresses", target),
    }))
}

/// Source reader consuming JSON lines from a remote endpoint.
pub struct NetClientSource {
    name: String,
    schema: Arc<StreamSchema>,
    reader: BufReader<TcpStream>,
    buf: Vec<u8>,
}

impl NetClientSource {
    /// Connects to the remote endpoint.
    pub fn open(options: &ConnectorOptions, ctx: &ConnectorContext) -> Result<Self, ConnectorError> {
        let options = NetClientOptions::from_options(options)?;
        let stream = connect(&options, ctx.settings.net_connect_timeout)?;
        tracing::info!(
            reader = %ctx.name,
            remote = %format!("{}:{}", options.remote_host, options.remote_port),
            "NET_CLIENT reader connected"
        );
        Ok(Self {
            name: ctx.name.clone(),
            schema: Arc::clone(&ctx.schema),
            reader: BufReader::new(stream),
            buf: Vec::new(),
        })
    }
}

impl SourceReader for NetClientSource {
    fn next_row(&mut self, timeout: Duration) -> Result<Option<Row>, ConnectorError> {
        let timeout = if timeout.is_zero() { Duration::from_millis(1) } else { timeout };
        self.reader.get_ref().set_read_timeout(Some(timeout))?;
        loop {
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    if self.buf.is_empty() {
                        return Err(ConnectorError::Closed);
                    }
                }
                Ok(_) if self.buf.last() == Some(&b'\n') => {
                    self.buf.pop();
                }
                // EOF after a partial line: decode what arrived.
                Ok(_) => {}
                Err(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(None);
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }

            let line = std::mem::take(&mut self.buf);
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let text = std::str::from_utf8(&line).map_err(|e| ConnectorError::Codec(e.to_string()))?;
            return decode_line(text, &self.schema).map(Some);
        }
    }

    fn shutdown(&mut self) {
        let _ = self.reader.get_ref().shutdown(Shutdown::Both);
        tracing::debug!(reader = %self.name, "NET_CLIENT reader shut down");
    }
}

/// Sink writer sending JSON lines to a remote endpoint.
pub struct NetClientSink {
    name: String,
    schema: Arc<StreamSchema>,
    writer: Mutex<Option<BufWriter<TcpStream>>>,
}

impl NetClientSink {
    /// Connects to the remote endpoint.
    pub fn open(options: &ConnectorOptions, ctx: &ConnectorContext) -> Result<Self, ConnectorError> {
        let options = NetClientOptions::from_options(options)?;
        let stream = connect(&options, ctx.settings.net_connect_timeout)?;
        stream.set_write_timeout(Some(ctx.settings.net_write_timeout))?;
        stream.set_nodelay(true)?;
        tracing::info!(
            writer = %ctx.name,
            remote = %format!("{}:{}", options.remote_host, options.remote_port),
            "NET_CLIENT writer connected"
        );
        Ok(Self {
            name: ctx.name.clone(),
            schema: Arc::clone(&ctx.schema),
            writer: Mutex::new(Some(BufWriter::new(stream))),
        })
    }
}

impl SinkWriter for NetClientSink {
    fn write(&self, row: &Row) -> Result<(), ConnectorError> {
        let mut line = encode_row(row, &self.schema)?;
        line.push('\n');
        let mut guard = self.writer.lock();
        let writer = guard.as_mut().ok_or(ConnectorError::Closed)?;
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn close(&self) {
        if let Some(mut writer) = self.writer.lock().take() {
            if let Err(e) = writer.flush() {
                tracing::warn!(writer = %self.name, "failed to flush on close: {}", e);
            }
            let _ = writer.get_ref().shutdown(Shutdown::Both);
            tracing::debug!(writer = %self.name, "NET_CLIENT writer closed");
        }
    }
}

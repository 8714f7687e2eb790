//! Connector tasks: the reader thread loop and the sink writer subscriber.

use crate::diagnostics::ErrorSink;
use crate::error::Error;
use crate::pipeline::Lifecycle;
use sluice_connectors::{ConnectorError, SinkWriter, SourceReader};
use sluice_reactive::{StreamHub, SubscriptionId};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Spawns the thread driving a source reader.
///
/// The thread hands the reader back when it stops so that the pipeline can
/// shut it down.
pub(crate) fn spawn_reader(
    name: &str,
    reader: Box<dyn SourceReader>,
    hub: Arc<StreamHub>,
    lifecycle: Arc<Lifecycle>,
    errors: Arc<dyn ErrorSink>,
    poll_interval: Duration,
) -> io::Result<JoinHandle<Box<dyn SourceReader>>> {
    let reader_name = name.to_string();
    thread::Builder::new()
        .name(format!("sluice-reader-{}", name))
        .spawn(move || run_reader(reader_name, reader, hub, lifecycle, errors, poll_interval))
}

fn run_reader(
    name: String,
    mut reader: Box<dyn SourceReader>,
    hub: Arc<StreamHub>,
    lifecycle: Arc<Lifecycle>,
    errors: Arc<dyn ErrorSink>,
    poll_interval: Duration,
) -> Box<dyn SourceReader> {
    tracing::debug!(reader = %name, stream = %hub.name(), "reader started");
    let mut rows = 0u64;
    while lifecycle.is_running() {
        match reader.next_row(poll_interval) {
            Ok(Some(row)) => {
                if !lifecycle.is_running() {
                    break;
                }
                hub.publish(&row);
                rows += 1;
            }
            Ok(None) => {}
            Err(ConnectorError::Closed) => {
                tracing::debug!(reader = %name, "input closed");
                break;
            }
            Err(e) if e.is_record_level() => {
                let error = Error::from(e);
                tracing::warn!(reader = %name, "skipping record: {}", error);
                errors.report(&name, &error);
            }
            Err(e) => {
                let error = Error::from(e);
                tracing::error!(reader = %name, "reader stopped: {}", error);
                errors.report(&name, &error);
                break;
            }
        }
    }
    if !lifecycle.is_running() {
        reader.shutdown();
    }
    tracing::debug!(reader = %name, rows, "reader finished");
    reader
}

/// Subscribes `writer` to every row `hub` emits.
pub(crate) fn attach_writer(
    name: &str,
    writer: Arc<dyn SinkWriter>,
    hub: &StreamHub,
    lifecycle: Arc<Lifecycle>,
    errors: Arc<dyn ErrorSink>,
) -> SubscriptionId {
    let name = name.to_string();
    hub.subscribe(move |row| {
        if !lifecycle.is_running() {
            return;
        }
        if let Err(e) = writer.write(row) {
            let error = Error::from(e);
            tracing::warn!(writer = %name, "failed to write row: {}", error);
            errors.report(&name, &error);
        }
    })
}

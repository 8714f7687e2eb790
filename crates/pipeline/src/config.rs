//! Pipeline configuration.
//!
//! A [`Config`] is built from defaults, optionally overridden by a TOML
//! document. Only the keys present in the document change:
//!
//! ```toml
//! [pipeline]
//! row_error_policy = "abort"
//!
//! [source_reader]
//! poll_interval_msec = 50
//!
//! [sink_writer]
//! net_write_timeout_msec = 1000
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use sluice_connectors::ConnectorSettings;
use std::path::Path;
use std::time::Duration;

/// What a pump does when evaluating a row fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowErrorPolicy {
    /// Report the error and drop the row.
    #[default]
    Drop,
    /// Report the error and abort the whole pipeline.
    Abort,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub row_error_policy: RowErrorPolicy,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceReaderConfig {
    /// How often reader tasks wake up to check for shutdown.
    #[serde(default = "default_poll_interval_msec")]
    pub poll_interval_msec: u64,
    #[serde(default = "default_net_connect_timeout_msec")]
    pub net_connect_timeout_msec: u64,
    #[serde(default = "default_net_read_timeout_msec")]
    pub net_read_timeout_msec: u64,
    /// Lines a NET_SERVER reader buffers before its connections block.
    #[serde(default = "default_net_line_buffer")]
    pub net_line_buffer: usize,
}

impl Default for SourceReaderConfig {
    fn default() -> Self {
        Self {
            poll_interval_msec: default_poll_interval_msec(),
            net_connect_timeout_msec: default_net_connect_timeout_msec(),
            net_read_timeout_msec: default_net_read_timeout_msec(),
            net_line_buffer: default_net_line_buffer(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkWriterConfig {
    #[serde(default = "default_net_connect_timeout_msec")]
    pub net_connect_timeout_msec: u64,
    #[serde(default = "default_net_write_timeout_msec")]
    pub net_write_timeout_msec: u64,
}

impl Default for SinkWriterConfig {
    fn default() -> Self {
        Self {
            net_connect_timeout_msec: default_net_connect_timeout_msec(),
            net_write_timeout_msec: default_net_write_timeout_msec(),
        }
    }
}

fn default_poll_interval_msec() -> u64 {
    100
}

fn default_net_connect_timeout_msec() -> u64 {
    1_000
}

fn default_net_read_timeout_msec() -> u64 {
    100
}

fn default_net_write_timeout_msec() -> u64 {
    100
}

fn default_net_line_buffer() -> usize {
    1_024
}

/// Configuration of a pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub source_reader: SourceReaderConfig,
    #[serde(default)]
    pub sink_writer: SinkWriterConfig,
}

impl Config {
    /// Parses a TOML document, starting from the defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("read {}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Sets the row error policy.
    pub fn with_row_error_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.pipeline.row_error_policy = policy;
        self
    }

    /// Checks that every duration and buffer size is positive.
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("source_reader.poll_interval_msec", self.source_reader.poll_interval_msec),
            ("source_reader.net_connect_timeout_msec", self.source_reader.net_connect_timeout_msec),
            ("source_reader.net_read_timeout_msec", self.source_reader.net_read_timeout_msec),
            ("sink_writer.net_connect_timeout_msec", self.sink_writer.net_connect_timeout_msec),
            ("sink_writer.net_write_timeout_msec", self.sink_writer.net_write_timeout_msec),
            ("source_reader.net_line_buffer", self.source_reader.net_line_buffer as u64),
        ];
        match durations.iter().find(|(_, msec)| *msec == 0) {
            Some((key, _)) => Err(Error::config(format!("{} must be greater than 0", key))),
            None => Ok(()),
        }
    }

    /// Settings handed to source readers.
    pub fn source_settings(&self) -> ConnectorSettings {
        ConnectorSettings {
            poll_interval: Duration::from_millis(self.source_reader.poll_interval_msec),
            net_connect_timeout: Duration::from_millis(self.source_reader.net_connect_timeout_msec),
            net_read_timeout: Duration::from_millis(self.source_reader.net_read_timeout_msec),
            net_write_timeout: Duration::from_millis(self.sink_writer.net_write_timeout_msec),
            net_line_buffer: self.source_reader.net_line_buffer,
        }
    }

    /// Settings handed to sink writers.
    pub fn sink_settings(&self) -> ConnectorSettings {
        ConnectorSettings {
            net_connect_timeout: Duration::from_millis(self.sink_writer.net_connect_timeout_msec),
            ..self.source_settings()
        }
    }
}

//! Connector configuration types.
//!
//! Provides a generic configuration model for connectors:
//! - [`ConnectorOptions`]: Untyped key-value options from the `OPTIONS (...)` clause
//! - [`OptionSpec`]: Specification for an option key
//! - [`ConnectorInfo`]: Metadata about a connector implementation
//! - [`ConnectorSettings`]: Pipeline-wide runtime settings handed to connectors

use crate::error::ConnectorError;
use hashbrown::HashMap;
use std::fmt;
use std::time::Duration;

/// Options for a connector instance.
///
/// Keys are case-insensitive and stored upper-cased.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectorOptions {
    /// Option values by upper-cased key.
    values: HashMap<String, String>,
}

impl ConnectorOptions {
    /// Creates an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options from declared pairs.
    ///
    /// A key given twice is an error.
    pub fn from_pairs<I, K, V>(connector: &str, pairs: I) -> Result<Self, ConnectorError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut options = Self::new();
        for (key, value) in pairs {
            let key = key.as_ref().to_ascii_uppercase();
            if options.values.contains_key(&key) {
                return Err(ConnectorError::InvalidOption {
                    connector: connector.to_string(),
                    key,
                    message: "given more than once".into(),
                });
            }
            options.values.insert(key, value.into());
        }
        Ok(options)
    }

    /// Sets an option.
    pub fn set(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.values
            .insert(key.as_ref().to_ascii_uppercase(), value.into());
    }

    /// Gets an option.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&key.to_ascii_uppercase())
            .map(String::as_str)
    }

    /// Gets a required option, returning an error if missing.
    pub fn require(&self, connector: &str, key: &str) -> Result<&str, ConnectorError> {
        self.get(key).ok_or_else(|| ConnectorError::MissingOption {
            connector: connector.to_string(),
            key: key.to_string(),
        })
    }

    /// Gets a required option parsed as the given type.
    pub fn require_parsed<T>(&self, connector: &str, key: &str) -> Result<T, ConnectorError>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        let value = self.require(connector, key)?;
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConnectorError::InvalidOption {
                connector: connector.to_string(),
                key: key.to_string(),
                message: format!("'{}': {}", value, e),
            })
    }

    /// Returns the number of options.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no options are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the option keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Validates the options against a connector's option specs.
    ///
    /// Rejects keys the connector does not declare and required keys that are
    /// missing.
    pub fn validate(&self, info: &ConnectorInfo) -> Result<(), ConnectorError> {
        for key in self.keys() {
            if !info.options.iter().any(|spec| spec.key == key) {
                return Err(ConnectorError::UnknownOption {
                    connector: info.name.clone(),
                    key: key.to_string(),
                });
            }
        }
        for spec in info.options.iter().filter(|spec| spec.required) {
            if self.get(&spec.key).is_none() {
                return Err(ConnectorError::MissingOption {
                    connector: info.name.clone(),
                    key: spec.key.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Specification for an option key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    /// The upper-cased option key.
    pub key: String,
    /// Human-readable description.
    pub description: String,
    /// Whether this key is required.
    pub required: bool,
}

impl OptionSpec {
    /// Creates a required option spec.
    pub fn required(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            required: true,
        }
    }

    /// Creates an optional option spec.
    pub fn optional(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            required: false,
        }
    }
}

/// Metadata about a connector implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorInfo {
    /// Connector type tag (e.g., "IN_MEMORY_QUEUE").
    pub name: String,
    /// Whether this connector can act as a source reader.
    pub is_source: bool,
    /// Whether this connector can act as a sink writer.
    pub is_sink: bool,
    /// Options this connector accepts.
    pub options: Vec<OptionSpec>,
}

/// Runtime settings shared by every connector of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorSettings {
    /// How long a reader task waits for a row before re-checking for shutdown.
    pub poll_interval: Duration,
    /// Timeout for establishing outbound TCP connections.
    pub net_connect_timeout: Duration,
    /// Socket read timeout; blocked reads wake at this interval.
    pub net_read_timeout: Duration,
    /// Socket write timeout.
    pub net_write_timeout: Duration,
    /// Capacity of the line channel between NET_SERVER connections and the
    /// reader task.
    pub net_line_buffer: usize,
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            net_connect_timeout: Duration::from_millis(5_000),
            net_read_timeout: Duration::from_millis(500),
            net_write_timeout: Duration::from_millis(5_000),
            net_line_buffer: 1_024,
        }
    }
}

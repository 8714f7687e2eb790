//! Connector error types.

use thiserror::Error;

/// Errors that can occur during connector operations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// No connector is registered under the type tag.
    #[error("unknown connector type: '{0}'")]
    UnknownConnector(String),

    /// The connector type cannot be used in this role.
    #[error("connector type '{tag}' cannot be used as a {role}")]
    UnsupportedRole {
        /// The connector type tag.
        tag: String,
        /// "source reader" or "sink writer".
        role: &'static str,
    },

    /// An option key the connector does not accept.
    #[error("{connector}: unknown option '{key}'")]
    UnknownOption {
        /// The connector type tag.
        connector: String,
        /// The offending key.
        key: String,
    },

    /// A required option key is missing.
    #[error("{connector}: missing required option '{key}'")]
    MissingOption {
        /// The connector type tag.
        connector: String,
        /// The missing key.
        key: String,
    },

    /// An option value could not be interpreted.
    #[error("{connector}: invalid value for option '{key}': {message}")]
    InvalidOption {
        /// The connector type tag.
        connector: String,
        /// The option key.
        key: String,
        /// Details about the failure.
        message: String,
    },

    /// A queue with this name already exists.
    #[error("queue '{0}' already exists")]
    DuplicateQueue(String),

    /// No queue with this name exists in the requested role.
    #[error("no {role} queue named '{name}'")]
    UnknownQueue {
        /// The queue name.
        name: String,
        /// "source" or "sink".
        role: &'static str,
    },

    /// A row does not conform to the stream schema.
    #[error("invalid row: {0}")]
    InvalidRow(#[from] sluice_core::Error),

    /// A record could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// Failed to connect to the remote endpoint.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The connector or queue has been closed.
    #[error("connector closed")]
    Closed,

    /// An I/O error from the underlying system.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConnectorError {
    /// Returns whether the error concerns a single record only.
    ///
    /// A reader task reports record-level errors and keeps running; any other
    /// error stops it.
    pub fn is_record_level(&self) -> bool {
        matches!(self, ConnectorError::Codec(_) | ConnectorError::InvalidRow(_))
    }

    /// Returns whether the error concerns connector options.
    pub fn is_option_error(&self) -> bool {
        matches!(
            self,
            ConnectorError::UnknownConnector(_)
                | ConnectorError::UnsupportedRole { .. }
                | ConnectorError::UnknownOption { .. }
                | ConnectorError::MissingOption { .. }
                | ConnectorError::InvalidOption { .. }
                | ConnectorError::DuplicateQueue(_)
        )
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(e: serde_json::Error) -> Self {
        ConnectorError::Codec(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ConnectorError::MissingOption {
            connector: "NET_SERVER".into(),
            key: "PORT".into(),
        };
        assert_eq!(err.to_string(), "NET_SERVER: missing required option 'PORT'");
        assert_eq!(
            ConnectorError::UnknownQueue { name: "q".into(), role: "sink" }.to_string(),
            "no sink queue named 'q'"
        );
    }

    #[test]
    fn test_classification() {
        assert!(ConnectorError::Codec("bad".into()).is_record_level());
        assert!(!ConnectorError::Closed.is_record_level());
        assert!(ConnectorError::DuplicateQueue("q".into()).is_option_error());
        assert!(!ConnectorError::ConnectionFailed("x".into()).is_option_error());
    }

    #[test]
    fn test_from_core_error() {
        let err: ConnectorError = sluice_core::Error::null_constraint("ts").into();
        assert!(matches!(err, ConnectorError::InvalidRow(_)));
    }
}

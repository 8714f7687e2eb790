//! Error surface of the pipeline API.

use sluice_connectors::ConnectorError;
use sluice_core::DataType;
use sluice_query::ast::StreamKind;
use sluice_query::parser::ParseError;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConfigInvalid,
    Sql,
    DuplicateName,
    UnknownStreamReference,
    StreamKindMismatch,
    SchemaInvalid,
    ConnectorOptionInvalid,
    ConnectorIoError,
    RowBuildInvalid,
    ColumnAccessInvalid,
    Evaluation,
    UnknownQueue,
    PipelineClosed,
}

/// Errors returned by the pipeline API.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration could not be loaded or holds an invalid value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A statement could not be parsed.
    #[error("SQL error: {0}")]
    Sql(#[from] ParseError),

    /// An object with this name already exists.
    #[error("name '{0}' is already in use")]
    DuplicateName(String),

    /// A statement references a stream that does not exist.
    #[error("unknown stream '{0}'")]
    UnknownStream(String),

    /// A stream of the wrong kind was referenced.
    #[error("'{name}' is a {actual}; {usage} requires {expected}")]
    StreamKindMismatch {
        name: String,
        actual: StreamKind,
        expected: &'static str,
        usage: &'static str,
    },

    /// A stream or pump definition is invalid.
    #[error("{0}")]
    Schema(sluice_core::Error),

    /// A pump would close a cycle in the dataflow graph.
    #[error("pump '{pump}' would create a cycle through stream '{stream}'")]
    Cycle { pump: String, stream: String },

    /// A connector failed.
    #[error(transparent)]
    Connector(ConnectorError),

    /// A source row does not fit the queue's stream.
    #[error("invalid source row: {0}")]
    RowBuild(String),

    /// A sink row column could not be read as requested.
    #[error(transparent)]
    ColumnAccess(#[from] ColumnAccessError),

    /// Evaluating a pump expression failed for one row.
    #[error("evaluation failed: {0}")]
    Evaluation(sluice_core::Error),

    /// The pipeline is closed.
    #[error("pipeline is closed")]
    PipelineClosed,
}

impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::ConfigInvalid,
            Error::Sql(_) => ErrorKind::Sql,
            Error::DuplicateName(_) => ErrorKind::DuplicateName,
            Error::UnknownStream(_) => ErrorKind::UnknownStreamReference,
            Error::StreamKindMismatch { .. } => ErrorKind::StreamKindMismatch,
            Error::Schema(_) | Error::Cycle { .. } => ErrorKind::SchemaInvalid,
            Error::Connector(e) => match e {
                ConnectorError::UnknownQueue { .. } => ErrorKind::UnknownQueue,
                ConnectorError::InvalidRow(_) => ErrorKind::RowBuildInvalid,
                ConnectorError::Closed => ErrorKind::PipelineClosed,
                e if e.is_option_error() => ErrorKind::ConnectorOptionInvalid,
                _ => ErrorKind::ConnectorIoError,
            },
            Error::RowBuild(_) => ErrorKind::RowBuildInvalid,
            Error::ColumnAccess(_) => ErrorKind::ColumnAccessInvalid,
            Error::Evaluation(_) => ErrorKind::Evaluation,
            Error::PipelineClosed => ErrorKind::PipelineClosed,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub(crate) fn row_build(message: impl Into<String>) -> Self {
        Error::RowBuild(message.into())
    }
}

impl From<ConnectorError> for Error {
    fn from(e: ConnectorError) -> Self {
        match e {
            ConnectorError::Closed => Error::PipelineClosed,
            ConnectorError::InvalidRow(inner) => Error::RowBuild(inner.to_string()),
            other => Error::Connector(other),
        }
    }
}

/// Failure to read a column of a sink row.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ColumnAccessError {
    #[error("column index {index} is out of range for a row of {len} columns")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("column {index} is {actual}, which cannot be read as {expected}")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        actual: DataType,
    },

    #[error("column {index} is NULL")]
    Null { index: usize },

    #[error("buffer of {provided} bytes is too small, {required} bytes required")]
    BufferTooSmall { required: usize, provided: usize },
}

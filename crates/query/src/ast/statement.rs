//! DDL statement AST definitions.

use super::expr::Expr;
use std::fmt;

/// Kind of stream a `CREATE ... STREAM` statement declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Fed by source readers, read by pumps.
    Source,
    /// Fed by pumps, drained by sink writers.
    Sink,
    /// Fed by pumps, read by pumps.
    Intermediate,
}

impl StreamKind {
    /// Returns whether pumps may read from this kind of stream.
    pub fn is_pump_input(&self) -> bool {
        matches!(self, StreamKind::Source | StreamKind::Intermediate)
    }

    /// Returns whether pumps may write into this kind of stream.
    pub fn is_pump_target(&self) -> bool {
        matches!(self, StreamKind::Sink | StreamKind::Intermediate)
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StreamKind::Source => "source stream",
            StreamKind::Sink => "sink stream",
            StreamKind::Intermediate => "stream",
        })
    }
}

/// A column definition as written in DDL.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Type name as written; resolved when the schema is built.
    pub type_name: String,
    /// Whether `NOT NULL` was given.
    pub not_null: bool,
    /// Number of `ROWTIME` markers given.
    pub rowtime_markers: usize,
}

/// `CREATE [SOURCE | SINK] STREAM name (columns)`.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateStream {
    pub name: String,
    pub kind: StreamKind,
    pub columns: Vec<ColumnDef>,
}

/// `CREATE PUMP name AS INSERT INTO target (cols) SELECT STREAM exprs FROM inputs [WHERE pred]`.
#[derive(Clone, Debug, PartialEq)]
pub struct CreatePump {
    pub name: String,
    pub target: String,
    pub target_columns: Vec<String>,
    pub projections: Vec<Expr>,
    pub inputs: Vec<String>,
    pub filter: Option<Expr>,
}

/// `CREATE SOURCE READER | SINK WRITER name FOR stream TYPE tag OPTIONS (...)`.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateConnector {
    pub name: String,
    pub stream: String,
    pub connector_type: String,
    /// Option pairs in declared order; keys upper-cased.
    pub options: Vec<(String, String)>,
}

/// A parsed DDL statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    CreateStream(CreateStream),
    CreatePump(CreatePump),
    CreateSourceReader(CreateConnector),
    CreateSinkWriter(CreateConnector),
}

impl Statement {
    /// Returns the name of the object the statement creates.
    pub fn object_name(&self) -> &str {
        match self {
            Statement::CreateStream(s) => &s.name,
            Statement::CreatePump(p) => &p.name,
            Statement::CreateSourceReader(c) | Statement::CreateSinkWriter(c) => &c.name,
        }
    }
}

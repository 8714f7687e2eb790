//! AST module for expressions and DDL statements.

mod expr;
mod statement;

pub use expr::{BinaryOp, ColumnRef, Expr, UnaryOp};
pub use statement::{ColumnDef, CreateConnector, CreatePump, CreateStream, Statement, StreamKind};

//! Sluice Query - Streaming SQL front end and expression engine.
//!
//! This crate turns DDL text into statements and pump programs:
//!
//! - `ast`: Expression and statement AST definitions
//! - `parser`: Lexer and recursive-descent parser for the DDL dialect
//! - `planner`: Column binding, type inference and pump program construction
//! - `executor`: Expression evaluation and row projection
//!
//! # Example
//!
//! ```rust
//! use sluice_query::ast::Statement;
//! use sluice_query::parser::parse_statement;
//!
//! let stmt = parse_statement(
//!     "CREATE SOURCE STREAM s (ts TIMESTAMP NOT NULL ROWTIME, v FLOAT NOT NULL);",
//! )
//! .unwrap();
//!
//! match stmt {
//!     Statement::CreateStream(create) => assert_eq!(create.columns.len(), 2),
//!     _ => unreachable!(),
//! }
//! ```

pub mod ast;
pub mod executor;
pub mod parser;
pub mod planner;

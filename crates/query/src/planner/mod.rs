//! Pump planning.
//!
//! A pump is compiled into one [`PumpProgram`] per input stream. The program
//! holds the SELECT expressions and WHERE predicate bound to that input's
//! column indices, each paired with the target column it writes.

mod binder;

pub use binder::bind_expr;

use crate::ast::{CreatePump, Expr};
use sluice_core::schema::StreamSchema;
use sluice_core::{DataType, Error, Result};

/// One SELECT expression and the target column it feeds.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    /// Target column name.
    pub target_column: String,
    /// Target column position.
    pub target_index: usize,
    /// Target column type; results are cast to it.
    pub target_type: DataType,
    /// Whether the target column accepts NULL.
    pub nullable: bool,
    /// Bound expression.
    pub expr: Expr,
}

/// The per-input compiled form of a pump.
#[derive(Clone, Debug, PartialEq)]
pub struct PumpProgram {
    /// Input stream this program is bound to.
    pub input: String,
    /// Projections in SELECT order.
    pub projections: Vec<Projection>,
    /// Bound WHERE predicate.
    pub filter: Option<Expr>,
    /// Number of target columns.
    pub target_arity: usize,
}

/// Compiles `pump` against one of its inputs.
///
/// Checks the INSERT/SELECT arity, resolves target columns, binds every
/// expression to `input_schema`, requires unlisted target columns to be
/// nullable and each projection to be assignable to its target column.
pub fn plan_pump(
    pump: &CreatePump,
    input: &str,
    input_schema: &StreamSchema,
    target_schema: &StreamSchema,
) -> Result<PumpProgram> {
    if pump.target_columns.len() != pump.projections.len() {
        return Err(Error::invalid_schema(format!(
            "pump {} inserts {} columns but selects {} expressions",
            pump.name,
            pump.target_columns.len(),
            pump.projections.len()
        )));
    }

    let mut listed = vec![false; target_schema.len()];
    let mut projections = Vec::with_capacity(pump.projections.len());

    for (column_name, expr) in pump.target_columns.iter().zip(&pump.projections) {
        let target_index = target_schema
            .get_column_index(column_name)
            .ok_or_else(|| Error::column_not_found(pump.target.as_str(), column_name.as_str()))?;
        if listed[target_index] {
            return Err(Error::invalid_schema(format!(
                "column {} listed twice in pump {}",
                column_name, pump.name
            )));
        }
        listed[target_index] = true;

        let column = target_schema
            .column(target_index)
            .ok_or_else(|| Error::column_not_found(pump.target.as_str(), column_name.as_str()))?;

        let mut expr = expr.clone();
        match bind_expr(&mut expr, input, input_schema)? {
            None if !column.is_nullable() => {
                return Err(Error::null_constraint(column.name()));
            }
            Some(dt) if !dt.is_assignable_to(column.data_type()) => {
                return Err(Error::type_mismatch(column.data_type(), dt));
            }
            _ => {}
        }

        projections.push(Projection {
            target_column: column.name().to_string(),
            target_index,
            target_type: column.data_type(),
            nullable: column.is_nullable(),
            expr,
        });
    }

    for (column, _) in target_schema
        .columns()
        .iter()
        .zip(&listed)
        .filter(|(_, listed)| !**listed)
    {
        if !column.is_nullable() {
            return Err(Error::null_constraint(column.name()));
        }
    }

    let filter = match &pump.filter {
        Some(predicate) => {
            let mut predicate = predicate.clone();
            match bind_expr(&mut predicate, input, input_schema)? {
                None | Some(DataType::Boolean) => Some(predicate),
                Some(other) => return Err(Error::type_mismatch(DataType::Boolean, other)),
            }
        }
        None => None,
    };

    Ok(PumpProgram {
        input: input.to_string(),
        projections,
        filter,
        target_arity: target_schema.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;
    use crate::parser::parse_statement;
    use sluice_core::schema::{Column, StreamSchemaBuilder};

    fn source() -> StreamSchema {
        StreamSchemaBuilder::new()
            .add_column(Column::new("ts", DataType::Timestamp).nullable(false).rowtime(true))
            .unwrap()
            .add_column(Column::new("temperature", DataType::Float).nullable(false))
            .unwrap()
            .build()
            .unwrap()
    }

    fn sink() -> StreamSchema {
        StreamSchemaBuilder::new()
            .add_column(Column::new("ts", DataType::Timestamp).nullable(false).rowtime(true))
            .unwrap()
            .add_column(Column::new("fahrenheit", DataType::Float).nullable(false))
            .unwrap()
            .add_column(Column::new("note", DataType::Text))
            .unwrap()
            .build()
            .unwrap()
    }

    fn pump(sql: &str) -> CreatePump {
        match parse_statement(sql).unwrap() {
            Statement::CreatePump(p) => p,
            other => panic!("unexpected {:?}", other),
        }
    }

    fn plan(sql: &str) -> Result<PumpProgram> {
        plan_pump(&pump(sql), "src", &source(), &sink())
    }

    #[test]
    fn test_plan_celsius_to_fahrenheit() {
        let program = plan(
            "CREATE PUMP p AS INSERT INTO snk (ts, fahrenheit) \
             SELECT STREAM ts, 32.0 + temperature * 1.8 FROM src",
        )
        .unwrap();
        assert_eq!(program.input, "src");
        assert_eq!(program.target_arity, 3);
        assert_eq!(program.projections.len(), 2);
        assert_eq!(program.projections[1].target_index, 1);
        assert_eq!(program.projections[1].target_type, DataType::Float);
        assert!(!program.projections[1].nullable);
        assert!(program.filter.is_none());
    }

    #[test]
    fn test_plan_reordered_targets() {
        let program = plan(
            "CREATE PUMP p AS INSERT INTO snk (fahrenheit, ts) SELECT temperature, ts FROM src",
        )
        .unwrap();
        assert_eq!(program.projections[0].target_index, 1);
        assert_eq!(program.projections[1].target_index, 0);
    }

    #[test]
    fn test_arity_mismatch() {
        let err = plan("CREATE PUMP p AS INSERT INTO snk (ts, fahrenheit) SELECT ts FROM src");
        assert!(matches!(err, Err(Error::InvalidSchema { .. })));
    }

    #[test]
    fn test_unknown_columns() {
        assert!(matches!(
            plan("CREATE PUMP p AS INSERT INTO snk (ts, nope) SELECT ts, temperature FROM src"),
            Err(Error::ColumnNotFound { .. })
        ));
        assert!(matches!(
            plan("CREATE PUMP p AS INSERT INTO snk (ts, fahrenheit) SELECT ts, nope FROM src"),
            Err(Error::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_target_column() {
        assert!(matches!(
            plan("CREATE PUMP p AS INSERT INTO snk (ts, ts) SELECT ts, ts FROM src"),
            Err(Error::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_unlisted_not_null_target() {
        assert!(matches!(
            plan("CREATE PUMP p AS INSERT INTO snk (ts) SELECT ts FROM src"),
            Err(Error::NullConstraint { .. })
        ));
    }

    #[test]
    fn test_null_literal_into_not_null() {
        assert!(matches!(
            plan("CREATE PUMP p AS INSERT INTO snk (ts, fahrenheit) SELECT ts, NULL FROM src"),
            Err(Error::NullConstraint { .. })
        ));
        assert!(plan(
            "CREATE PUMP p AS INSERT INTO snk (ts, fahrenheit, note) SELECT ts, temperature, NULL FROM src"
        )
        .is_ok());
    }

    #[test]
    fn test_incompatible_types() {
        assert!(matches!(
            plan("CREATE PUMP p AS INSERT INTO snk (ts, fahrenheit) SELECT temperature, temperature FROM src"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(plan(
            "CREATE PUMP p AS INSERT INTO snk (ts, fahrenheit) SELECT '2021-01-01 00:00:00', 1 FROM src"
        )
        .is_ok());
    }

    #[test]
    fn test_filter_must_be_boolean() {
        assert!(plan(
            "CREATE PUMP p AS INSERT INTO snk (ts, fahrenheit) SELECT ts, temperature FROM src WHERE temperature > 0"
        )
        .unwrap()
        .filter
        .is_some());
        assert!(matches!(
            plan("CREATE PUMP p AS INSERT INTO snk (ts, fahrenheit) SELECT ts, temperature FROM src WHERE temperature"),
            Err(Error::TypeMismatch { .. })
        ));
    }
}

//! Row projection for compiled pumps.

use super::eval::{evaluate, evaluate_predicate};
use crate::planner::PumpProgram;
use sluice_core::{Error, Result, Row, Value};

impl PumpProgram {
    /// Runs the program over one input row.
    ///
    /// Returns `Ok(None)` when the WHERE predicate rejects the row. The output
    /// row has one value per target column: projected values cast to the
    /// column type, NULL for unlisted columns. It carries the input row's
    /// processing time.
    pub fn apply(&self, row: &Row) -> Result<Option<Row>> {
        if let Some(filter) = &self.filter {
            if !evaluate_predicate(filter, row)? {
                return Ok(None);
            }
        }

        let mut values = vec![Value::Null; self.target_arity];
        for projection in &self.projections {
            let value = evaluate(&projection.expr, row)?.cast_to(projection.target_type)?;
            if value.is_null() && !projection.nullable {
                return Err(Error::null_constraint(projection.target_column.as_str()));
            }
            match values.get_mut(projection.target_index) {
                Some(slot) => *slot = value,
                None => {
                    return Err(Error::invalid_operation(format!(
                        "projection index {} out of range for {} target columns",
                        projection.target_index, self.target_arity
                    )))
                }
            }
        }

        Ok(Some(Row::with_ptime(values, row.ptime())))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Statement;
    use crate::parser::parse_statement;
    use crate::planner::{plan_pump, PumpProgram};
    use sluice_core::schema::{Column, StreamSchema, StreamSchemaBuilder};
    use sluice_core::{DataType, Error, Row, Value};

    fn source() -> StreamSchema {
        StreamSchemaBuilder::new()
            .add_column(Column::new("ts", DataType::Timestamp).nullable(false).rowtime(true))
            .unwrap()
            .add_column(Column::new("temperature", DataType::Float))
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
            .add_column(Column::new("rounded", DataType::SmallInt))
            .unwrap()
            .build()
            .unwrap()
    }

    fn program(sql: &str) -> PumpProgram {
        let Statement::CreatePump(pump) = parse_statement(sql).unwrap() else {
            panic!("Expected CreatePump");
        };
        plan_pump(&pump, "src", &source(), &sink()).unwrap()
    }

    fn input(temperature: Value) -> Row {
        Row::new(vec![
            Value::parse_timestamp("2021-06-01 12:00:00").unwrap(),
            temperature,
        ])
    }

    #[test]
    fn test_apply_projects_and_fills_null() {
        let program = program(
            "CREATE PUMP p AS INSERT INTO snk (ts, fahrenheit) \
             SELECT STREAM ts, 32.0 + temperature * 1.8 FROM src",
        );
        let row = input(Value::Float(0.0));
        let out = program.apply(&row).unwrap().unwrap();
        assert_eq!(
            out.values(),
            &[
                Value::parse_timestamp("2021-06-01 12:00:00").unwrap(),
                Value::Float(32.0),
                Value::Null
            ]
        );
        assert_eq!(out.ptime(), row.ptime());
    }

    #[test]
    fn test_apply_casts_to_target_type() {
        let program = program(
            "CREATE PUMP p AS INSERT INTO snk (ts, fahrenheit, rounded) \
             SELECT ts, temperature, temperature FROM src",
        );
        let out = program.apply(&input(Value::Float(21.7))).unwrap().unwrap();
        assert_eq!(out.get(2), Some(&Value::SmallInt(21)));

        assert!(matches!(
            program.apply(&input(Value::Float(1e9))),
            Err(Error::Overflow { .. })
        ));
    }

    #[test]
    fn test_apply_filter() {
        let program = program(
            "CREATE PUMP p AS INSERT INTO snk (ts, fahrenheit) \
             SELECT ts, temperature FROM src WHERE temperature > 10",
        );
        assert!(program.apply(&input(Value::Float(5.0))).unwrap().is_none());
        assert!(program.apply(&input(Value::Null)).unwrap().is_none());
        assert!(program.apply(&input(Value::Float(15.0))).unwrap().is_some());
    }

    #[test]
    fn test_apply_enforces_not_null() {
        let program = program(
            "CREATE PUMP p AS INSERT INTO snk (ts, fahrenheit) SELECT ts, temperature FROM src",
        );
        assert!(matches!(
            program.apply(&input(Value::Null)),
            Err(Error::NullConstraint { .. })
        ));
    }
}

//! Property-based tests for expression evaluation.
//!
//! These tests check the evaluator against native Rust arithmetic for
//! randomly generated rows.

use proptest::prelude::*;
use sluice_core::schema::{Column, StreamSchema, StreamSchemaBuilder};
use sluice_core::{DataType, Error, Row, Value};
use sluice_query::executor::evaluate;
use sluice_query::parser::parse_expr;
use sluice_query::planner::bind_expr;

fn schema() -> StreamSchema {
    StreamSchemaBuilder::new()
        .add_column(Column::new("a", DataType::Integer))
        .unwrap()
        .add_column(Column::new("b", DataType::Integer))
        .unwrap()
        .build()
        .unwrap()
}

fn eval(sql: &str, a: i32, b: i32) -> Result<Value, Error> {
    let mut expr = parse_expr(sql).unwrap();
    bind_expr(&mut expr, "s", &schema()).unwrap();
    evaluate(&expr, &Row::new(vec![Value::Integer(a), Value::Integer(b)]))
}

/// Strategy for generating integers whose products may overflow 32 bits.
fn operand_strategy() -> impl Strategy<Value = i32> {
    -1_000_000i32..1_000_000i32
}

proptest! {
    /// Property: INTEGER addition matches i32 addition.
    #[test]
    fn addition_matches_native(a in operand_strategy(), b in operand_strategy()) {
        prop_assert_eq!(eval("a + b", a, b).unwrap(), Value::Integer(a + b));
    }

    /// Property: INTEGER multiplication matches checked i32 multiplication,
    /// failing with an overflow exactly when i32 would overflow.
    #[test]
    fn multiplication_overflow_matches_native(a in operand_strategy(), b in operand_strategy()) {
        match a.checked_mul(b) {
            Some(product) => prop_assert_eq!(eval("a * b", a, b).unwrap(), Value::Integer(product)),
            None => prop_assert!(matches!(eval("a * b", a, b), Err(Error::Overflow { .. })), "expected overflow error"),
        }
    }

    /// Property: comparisons agree with native ordering.
    #[test]
    fn comparison_matches_native(a in operand_strategy(), b in operand_strategy()) {
        prop_assert_eq!(eval("a < b", a, b).unwrap(), Value::Boolean(a < b));
        prop_assert_eq!(eval("a >= b", a, b).unwrap(), Value::Boolean(a >= b));
        prop_assert_eq!(eval("a <> b", a, b).unwrap(), Value::Boolean(a != b));
    }

    /// Property: integer division and remainder reconstruct the dividend.
    #[test]
    fn division_identity(a in operand_strategy(), b in operand_strategy()) {
        prop_assume!(b != 0);
        let q = eval("a / b", a, b).unwrap().as_i32().unwrap();
        let r = eval("a % b", a, b).unwrap().as_i32().unwrap();
        prop_assert_eq!(q * b + r, a);
    }
}

proptest! {
    /// Property: any integer literal parses back to the value it prints.
    #[test]
    fn integer_literal_round_trip(n in any::<i64>()) {
        let expected = match i32::try_from(n) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::BigInt(n),
        };
        let expr = parse_expr(&n.to_string()).unwrap();
        prop_assert_eq!(evaluate(&expr, &Row::new(vec![])).unwrap(), expected);
    }
}

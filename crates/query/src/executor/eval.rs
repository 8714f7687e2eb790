//! Expression evaluation against a single row.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use sluice_core::{DataType, Error, Result, Row, Value};

/// Evaluates a bound expression against `row`.
///
/// NULL propagates through arithmetic, comparisons and functions; `AND`/`OR`
/// follow SQL three-valued logic. Integer arithmetic is checked.
pub fn evaluate(expr: &Expr, row: &Row) -> Result<Value> {
    match expr {
        Expr::Column(col) => row.get(col.index).cloned().ok_or_else(|| {
            Error::invalid_operation(format!(
                "column {} bound to index {} but row has {} values",
                col.column,
                col.index,
                row.len()
            ))
        }),

        Expr::Literal(value) => Ok(value.clone()),

        Expr::BinaryOp { left, op, right } => {
            let left_val = evaluate(left, row)?;
            // Short-circuit only when the result is already decided.
            match (op, &left_val) {
                (BinaryOp::And, Value::Boolean(false)) => return Ok(Value::Boolean(false)),
                (BinaryOp::Or, Value::Boolean(true)) => return Ok(Value::Boolean(true)),
                _ => {}
            }
            let right_val = evaluate(right, row)?;
            eval_binary_op(*op, &left_val, &right_val)
        }

        Expr::UnaryOp { op, expr } => {
            let val = evaluate(expr, row)?;
            eval_unary_op(*op, &val)
        }

        Expr::Function { name, args } => {
            let arg_values = args
                .iter()
                .map(|a| evaluate(a, row))
                .collect::<Result<Vec<_>>>()?;
            eval_function(name, &arg_values)
        }
    }
}

/// Evaluates a predicate. NULL and false both reject the row.
pub fn evaluate_predicate(expr: &Expr, row: &Row) -> Result<bool> {
    match evaluate(expr, row)? {
        Value::Boolean(b) => Ok(b),
        Value::Null => Ok(false),
        other => Err(Error::type_mismatch(
            DataType::Boolean,
            other.data_type().unwrap_or(DataType::Boolean),
        )),
    }
}

fn eval_binary_op(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    match op {
        BinaryOp::And => eval_and(left, right),
        BinaryOp::Or => eval_or(left, right),
        _ if left.is_null() || right.is_null() => Ok(Value::Null),
        _ if op.is_comparison() => Ok(eval_comparison(op, left, right)),
        _ => eval_arithmetic(op, left, right),
    }
}

fn eval_and(left: &Value, right: &Value) -> Result<Value> {
    match (as_logic(left)?, as_logic(right)?) {
        (Some(false), _) | (_, Some(false)) => Ok(Value::Boolean(false)),
        (Some(true), Some(true)) => Ok(Value::Boolean(true)),
        _ => Ok(Value::Null),
    }
}

fn eval_or(left: &Value, right: &Value) -> Result<Value> {
    match (as_logic(left)?, as_logic(right)?) {
        (Some(true), _) | (_, Some(true)) => Ok(Value::Boolean(true)),
        (Some(false), Some(false)) => Ok(Value::Boolean(false)),
        _ => Ok(Value::Null),
    }
}

fn as_logic(value: &Value) -> Result<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        Value::Boolean(b) => Ok(Some(*b)),
        other => Err(Error::type_mismatch(
            DataType::Boolean,
            other.data_type().unwrap_or(DataType::Boolean),
        )),
    }
}

fn eval_comparison(op: BinaryOp, left: &Value, right: &Value) -> Value {
    let ord = match left.sql_cmp(right) {
        Some(ord) => ord,
        None => return Value::Null,
    };
    let result = match op {
        BinaryOp::Eq => ord.is_eq(),
        BinaryOp::Ne => ord.is_ne(),
        BinaryOp::Lt => ord.is_lt(),
        BinaryOp::Le => ord.is_le(),
        BinaryOp::Gt => ord.is_gt(),
        BinaryOp::Ge => ord.is_ge(),
        _ => return Value::Null,
    };
    Value::Boolean(result)
}

fn eval_arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    let (lt, rt) = match (left.data_type(), right.data_type()) {
        (Some(l), Some(r)) => (l, r),
        _ => return Ok(Value::Null),
    };
    let result_type = DataType::promote(lt, rt).ok_or_else(|| {
        Error::invalid_operation(format!("cannot apply {} to {} and {}", op.symbol(), lt, rt))
    })?;

    if result_type == DataType::Float {
        let (a, b) = match (left.float_value(), right.float_value()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(Error::type_mismatch(DataType::Float, lt)),
        };
        let value = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div if b == 0.0 => return Err(Error::DivisionByZero),
            BinaryOp::Div => a / b,
            BinaryOp::Mod if b == 0.0 => return Err(Error::DivisionByZero),
            BinaryOp::Mod => a % b,
            _ => return Err(Error::invalid_operation(format!("{} is not arithmetic", op.symbol()))),
        };
        return Ok(Value::Float(value));
    }

    let (a, b) = match (left.integer_value(), right.integer_value()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(Error::type_mismatch(result_type, lt)),
    };
    let wide = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div if b == 0 => return Err(Error::DivisionByZero),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Mod if b == 0 => return Err(Error::DivisionByZero),
        BinaryOp::Mod => a.checked_rem(b),
        _ => return Err(Error::invalid_operation(format!("{} is not arithmetic", op.symbol()))),
    };
    match wide {
        Some(v) => narrow_integer(v, result_type),
        None => Err(Error::overflow(format!(
            "{} {} {} overflows {}",
            a,
            op.symbol(),
            b,
            result_type
        ))),
    }
}

fn narrow_integer(value: i64, target: DataType) -> Result<Value> {
    Value::BigInt(value).cast_to(target)
}

fn eval_unary_op(op: UnaryOp, val: &Value) -> Result<Value> {
    match op {
        UnaryOp::IsNull => Ok(Value::Boolean(val.is_null())),
        UnaryOp::IsNotNull => Ok(Value::Boolean(!val.is_null())),
        UnaryOp::Not => Ok(match as_logic(val)? {
            Some(b) => Value::Boolean(!b),
            None => Value::Null,
        }),
        UnaryOp::Neg => match val {
            Value::Null => Ok(Value::Null),
            Value::SmallInt(v) => v
                .checked_neg()
                .map(Value::SmallInt)
                .ok_or_else(|| Error::overflow(format!("-({}) overflows SMALLINT", v))),
            Value::Integer(v) => v
                .checked_neg()
                .map(Value::Integer)
                .ok_or_else(|| Error::overflow(format!("-({}) overflows INTEGER", v))),
            Value::BigInt(v) => v
                .checked_neg()
                .map(Value::BigInt)
                .ok_or_else(|| Error::overflow(format!("-({}) overflows BIGINT", v))),
            Value::Float(v) => Ok(Value::Float(-v)),
            other => Err(Error::invalid_operation(format!("cannot negate {}", other))),
        },
    }
}

fn eval_function(name: &str, args: &[Value]) -> Result<Value> {
    let arg = match args {
        [arg] => arg,
        _ => {
            return Err(Error::invalid_operation(format!(
                "{} expects 1 argument, got {}",
                name,
                args.len()
            )))
        }
    };
    if arg.is_null() {
        return Ok(Value::Null);
    }

    match (name, arg) {
        ("ABS", Value::Float(v)) => Ok(Value::Float(v.abs())),
        ("ABS", _) if arg.data_type().map_or(false, |t| t.is_integer()) => {
            match (arg.integer_value(), arg.data_type()) {
                (Some(v), Some(dt)) => match v.checked_abs() {
                    Some(abs) => narrow_integer(abs, dt),
                    None => Err(Error::overflow(format!("ABS({}) overflows {}", v, dt))),
                },
                _ => Ok(Value::Null),
            }
        }
        ("UPPER", Value::Text(s)) => Ok(Value::Text(s.to_uppercase())),
        ("LOWER", Value::Text(s)) => Ok(Value::Text(s.to_lowercase())),
        ("LENGTH", Value::Text(s)) => length_value(s.chars().count()),
        ("LENGTH", Value::Blob(b)) => length_value(b.len()),
        _ => Err(Error::invalid_operation(format!(
            "{} is not defined for {}",
            name, arg
        ))),
    }
}

fn length_value(len: usize) -> Result<Value> {
    i32::try_from(len)
        .map(Value::Integer)
        .map_err(|_| Error::overflow(format!("length {} overflows INTEGER", len)))
}

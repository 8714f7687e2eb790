//! Column binding and type inference.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use sluice_core::schema::StreamSchema;
use sluice_core::{DataType, Error, Result};

/// Binds every column reference in `expr` to its index in `schema` and returns
/// the inferred result type. `None` means the expression is the untyped NULL.
///
/// A qualified reference must name `stream`.
pub fn bind_expr(expr: &mut Expr, stream: &str, schema: &StreamSchema) -> Result<Option<DataType>> {
    match expr {
        Expr::Column(col) => {
            if let Some(qualifier) = &col.stream {
                if qualifier != stream {
                    return Err(Error::column_not_found(qualifier.as_str(), col.column.as_str()));
                }
            }
            let index = schema
                .get_column_index(&col.column)
                .ok_or_else(|| Error::column_not_found(stream, col.column.as_str()))?;
            col.index = index;
            Ok(schema.column(index).map(|c| c.data_type()))
        }

        Expr::Literal(value) => Ok(value.data_type()),

        Expr::BinaryOp { left, op, right } => {
            let lt = bind_expr(left, stream, schema)?;
            let rt = bind_expr(right, stream, schema)?;
            infer_binary(*op, lt, rt)
        }

        Expr::UnaryOp { op, expr } => {
            let t = bind_expr(expr, stream, schema)?;
            infer_unary(*op, t)
        }

        Expr::Function { name, args } => {
            let mut types = Vec::with_capacity(args.len());
            for arg in args.iter_mut() {
                types.push(bind_expr(arg, stream, schema)?);
            }
            infer_function(name, &types)
        }
    }
}

fn infer_binary(op: BinaryOp, lt: Option<DataType>, rt: Option<DataType>) -> Result<Option<DataType>> {
    match op {
        BinaryOp::And | BinaryOp::Or => {
            expect_boolean(lt)?;
            expect_boolean(rt)?;
            Ok(Some(DataType::Boolean))
        }

        _ if op.is_comparison() => match (lt, rt) {
            (Some(a), Some(b)) if a == b || (a.is_numeric() && b.is_numeric()) => {
                Ok(Some(DataType::Boolean))
            }
            (Some(a), Some(b)) => Err(Error::invalid_operation(format!(
                "cannot compare {} {} {}",
                a,
                op.symbol(),
                b
            ))),
            _ => Ok(Some(DataType::Boolean)),
        },

        _ => match (lt, rt) {
            (Some(a), Some(b)) => DataType::promote(a, b).map(Some).ok_or_else(|| {
                Error::invalid_operation(format!("cannot apply {} to {} and {}", op.symbol(), a, b))
            }),
            (Some(t), None) | (None, Some(t)) => {
                if t.is_numeric() {
                    Ok(Some(t))
                } else {
                    Err(Error::invalid_operation(format!(
                        "cannot apply {} to {}",
                        op.symbol(),
                        t
                    )))
                }
            }
            (None, None) => Ok(None),
        },
    }
}

fn infer_unary(op: UnaryOp, t: Option<DataType>) -> Result<Option<DataType>> {
    match op {
        UnaryOp::Not => {
            expect_boolean(t)?;
            Ok(Some(DataType::Boolean))
        }
        UnaryOp::Neg => match t {
            Some(dt) if !dt.is_numeric() => {
                Err(Error::invalid_operation(format!("cannot negate {}", dt)))
            }
            _ => Ok(t),
        },
        UnaryOp::IsNull | UnaryOp::IsNotNull => Ok(Some(DataType::Boolean)),
    }
}

fn infer_function(name: &str, args: &[Option<DataType>]) -> Result<Option<DataType>> {
    let arg = match args {
        [arg] => *arg,
        _ => {
            return Err(Error::invalid_operation(format!(
                "{} expects 1 argument, got {}",
                name,
                args.len()
            )))
        }
    };
    let accepted = |ok: bool| -> Result<()> {
        match arg {
            Some(dt) if !ok => Err(Error::invalid_operation(format!(
                "{} does not accept {}",
                name, dt
            ))),
            _ => Ok(()),
        }
    };

    match name {
        "ABS" => {
            accepted(arg.map_or(true, |t| t.is_numeric()))?;
            Ok(arg)
        }
        "UPPER" | "LOWER" => {
            accepted(arg == Some(DataType::Text) || arg.is_none())?;
            Ok(Some(DataType::Text))
        }
        "LENGTH" => {
            accepted(arg.map_or(true, |t| t.is_variable_length()))?;
            Ok(Some(DataType::Integer))
        }
        _ => Err(Error::invalid_operation(format!("unknown function {}", name))),
    }
}

fn expect_boolean(t: Option<DataType>) -> Result<()> {
    match t {
        None | Some(DataType::Boolean) => Ok(()),
        Some(other) => Err(Error::type_mismatch(DataType::Boolean, other)),
    }
}

//! Expression AST definitions.

use sluice_core::Value;

/// Reference to a column of an input stream.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Stream qualifier, when written as `stream.column`.
    pub stream: Option<String>,
    /// Column name.
    pub column: String,
    /// Column index in the input schema. Set by the binder.
    pub index: usize,
}

impl ColumnRef {
    /// Creates an unbound column reference.
    pub fn new(stream: Option<String>, column: impl Into<String>) -> Self {
        Self {
            stream,
            column: column.into(),
            index: 0,
        }
    }

    /// Returns the normalized name (stream.column or column).
    pub fn normalized_name(&self) -> String {
        match &self.stream {
            Some(stream) => format!("{}.{}", stream, self.column),
            None => self.column.clone(),
        }
    }
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// Returns whether this is a comparison operator.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Returns whether this is an arithmetic operator.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    /// Returns the SQL symbol for this operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
}

/// Expression AST node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Column reference.
    Column(ColumnRef),
    /// Literal value.
    Literal(Value),
    /// Binary operation.
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Unary operation.
    UnaryOp { op: UnaryOp, expr: Box<Expr> },
    /// Scalar function call.
    Function { name: String, args: Vec<Expr> },
}

impl Expr {
    /// Creates an unqualified column reference expression.
    pub fn column(column: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::new(None, column))
    }

    /// Creates a qualified column reference expression.
    pub fn qualified_column(stream: impl Into<String>, column: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::new(Some(stream.into()), column))
    }

    /// Creates a literal expression.
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// Creates a binary expression.
    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Creates a unary expression.
    pub fn unary(op: UnaryOp, expr: Expr) -> Self {
        Expr::UnaryOp {
            op,
            expr: Box::new(expr),
        }
    }

    /// Creates an addition expression.
    pub fn add(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Add, right)
    }

    /// Creates a multiplication expression.
    pub fn mul(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Mul, right)
    }

    /// Creates an equality expression.
    pub fn eq(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Eq, right)
    }

    /// Creates a greater-than expression.
    pub fn gt(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Gt, right)
    }

    /// Creates an AND expression.
    pub fn and(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::And, right)
    }

    /// Visits every column reference in this expression.
    pub fn for_each_column<F>(&self, f: &mut F)
    where
        F: FnMut(&ColumnRef),
    {
        match self {
            Expr::Column(col) => f(col),
            Expr::Literal(_) => {}
            Expr::BinaryOp { left, right, .. } => {
                left.for_each_column(f);
                right.for_each_column(f);
            }
            Expr::UnaryOp { expr, .. } => expr.for_each_column(f),
            Expr::Function { args, .. } => {
                for arg in args {
                    arg.for_each_column(f);
                }
            }
        }
    }

    /// Collects the normalized names of all referenced columns.
    pub fn referenced_columns(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.for_each_column(&mut |col| {
            let name = col.normalized_name();
            if !names.contains(&name) {
                names.push(name);
            }
        });
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_ref() {
        let col = ColumnRef::new(Some("source_trade".into()), "price");
        assert_eq!(col.normalized_name(), "source_trade.price");
        assert_eq!(ColumnRef::new(None, "price").normalized_name(), "price");
    }

    #[test]
    fn test_expr_builders() {
        let e = Expr::add(Expr::literal(32.0), Expr::mul(Expr::column("c"), Expr::literal(1.8)));
        match e {
            Expr::BinaryOp { op, .. } => assert_eq!(op, BinaryOp::Add),
            _ => panic!("Expected BinaryOp"),
        }
    }

    #[test]
    fn test_referenced_columns() {
        let e = Expr::and(
            Expr::gt(Expr::qualified_column("s", "a"), Expr::literal(1i32)),
            Expr::eq(Expr::column("b"), Expr::qualified_column("s", "a")),
        );
        assert_eq!(e.referenced_columns(), vec!["s.a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_operator_classes() {
        assert!(BinaryOp::Le.is_comparison());
        assert!(!BinaryOp::And.is_comparison());
        assert!(BinaryOp::Mod.is_arithmetic());
        assert_eq!(BinaryOp::Ne.symbol(), "<>");
    }
}

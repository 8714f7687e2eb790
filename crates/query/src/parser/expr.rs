//! Expression parsing.
//!
//! Precedence, lowest first: `OR`, `AND`, `NOT`, comparison and `IS [NOT] NULL`,
//! `+ -`, `* / %`, unary `-`, primary.

use super::{ParseError, Parser, Token};
use crate::ast::{BinaryOp, ColumnRef, Expr, UnaryOp};
use sluice_core::Value;

impl Parser {
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.consume_keyword("OR") {
            let right = self.parse_and()?;
            left = Expr::binary(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not()?;
        while self.consume_keyword("AND") {
            let right = self.parse_not()?;
            left = Expr::binary(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.consume_keyword("NOT") {
            let expr = self.parse_not()?;
            return Ok(Expr::unary(UnaryOp::Not, expr));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_additive()?;

        if self.consume_keyword("IS") {
            let negated = self.consume_keyword("NOT");
            self.expect_keyword("NULL")?;
            let op = if negated { UnaryOp::IsNotNull } else { UnaryOp::IsNull };
            return Ok(Expr::unary(op, left));
        }

        let op = match self.peek() {
            Some(Token::Eq) => BinaryOp::Eq,
            Some(Token::Ne) => BinaryOp::Ne,
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Ge) => BinaryOp::Ge,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.parse_additive()?;
        Ok(Expr::binary(left, op, right))
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::binary(left, op, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.peek() == Some(&Token::Minus) {
            let start = self.position();
            self.pos += 1;
            // Fold a negated numeric literal so that i32::MIN stays an INTEGER.
            if let Some(Token::Number(text)) = self.peek() {
                let text = format!("-{}", text);
                self.pos += 1;
                return number_literal(&text, start).map(Expr::Literal);
            }
            let expr = self.parse_unary()?;
            return Ok(Expr::unary(UnaryOp::Neg, expr));
        }
        if self.consume(&Token::Plus) {
            return self.parse_unary();
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.position();
        let token = match self.peek() {
            Some(tok) => tok.clone(),
            None => return Err(self.error_here("expression")),
        };

        match token {
            Token::Number(text) => {
                self.pos += 1;
                number_literal(&text, start).map(Expr::Literal)
            }
            Token::Str(text) => {
                self.pos += 1;
                Ok(Expr::Literal(Value::Text(text)))
            }
            Token::LParen => {
                self.pos += 1;
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Token::Ident(ref word) if word.eq_ignore_ascii_case("TRUE") => {
                self.pos += 1;
                Ok(Expr::Literal(Value::Boolean(true)))
            }
            Token::Ident(ref word) if word.eq_ignore_ascii_case("FALSE") => {
                self.pos += 1;
                Ok(Expr::Literal(Value::Boolean(false)))
            }
            Token::Ident(ref word) if word.eq_ignore_ascii_case("NULL") => {
                self.pos += 1;
                Ok(Expr::Literal(Value::Null))
            }
            Token::Ident(_) | Token::QuotedIdent(_) => {
                let name = self.parse_identifier()?;
                if self.peek() == Some(&Token::LParen) {
                    return self.parse_function_call(name);
                }
                if self.peek() == Some(&Token::Dot)
                    && matches!(
                        self.peek_nth(1),
                        Some(Token::Ident(_)) | Some(Token::QuotedIdent(_))
                    )
                {
                    self.pos += 1;
                    let column = self.parse_identifier()?;
                    return Ok(Expr::Column(ColumnRef::new(Some(name), column)));
                }
                Ok(Expr::Column(ColumnRef::new(None, name)))
            }
            _ => Err(self.error_here("expression")),
        }
    }

    fn parse_function_call(&mut self, name: String) -> Result<Expr, ParseError> {
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if !self.consume(&Token::RParen) {
            args.push(self.parse_expr()?);
            while self.consume(&Token::Comma) {
                args.push(self.parse_expr()?);
            }
            self.expect(&Token::RParen)?;
        }
        Ok(Expr::Function {
            name: name.to_ascii_uppercase(),
            args,
        })
    }
}

/// Converts numeric literal text to the narrowest fitting value.
///
/// Integers become INTEGER when they fit 32 bits and BIGINT otherwise; text
/// with a fraction or exponent becomes FLOAT.
fn number_literal(text: &str, position: usize) -> Result<Value, ParseError> {
    if text.contains(['.', 'e', 'E']) {
        return text
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| ParseError::new(format!("Invalid number {}", text), position));
    }
    let n = text
        .parse::<i64>()
        .map_err(|_| ParseError::new(format!("Integer literal out of range: {}", text), position))?;
    Ok(match i32::try_from(n) {
        Ok(i) => Value::Integer(i),
        Err(_) => Value::BigInt(n),
    })
}

//! Recursive-descent parser for the streaming DDL dialect.
//!
//! Supported statements:
//! - `CREATE [SOURCE | SINK] STREAM name (col TYPE [NOT NULL] [ROWTIME], ...)`
//! - `CREATE PUMP name AS INSERT INTO t (cols) SELECT STREAM exprs FROM s [, s] [WHERE pred]`
//! - `CREATE SOURCE READER name FOR s TYPE tag [OPTIONS (KEY 'value', ...)]`
//! - `CREATE SINK WRITER name FOR s TYPE tag [OPTIONS (KEY 'value', ...)]`

mod expr;
mod lexer;
mod statement;

pub use lexer::{tokenize, Spanned, Token};

use crate::ast::{Expr, Statement};
use std::fmt;

/// Error type for DDL parsing.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseError {
    pub message: String,
    /// Byte offset in the input where the error was detected.
    pub position: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.message, self.position)
    }
}

impl std::error::Error for ParseError {}

/// Parses a single DDL statement, optionally terminated by `;`.
pub fn parse_statement(input: &str) -> Result<Statement, ParseError> {
    let mut parser = Parser::new(input)?;
    let stmt = parser.parse_statement()?;
    parser.consume(&Token::Semicolon);
    parser.expect_end()?;
    Ok(stmt)
}

/// Parses a standalone expression.
pub fn parse_expr(input: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(input)?;
    let expr = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parser state over a token buffer.
pub(crate) struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Self, ParseError> {
        Ok(Self {
            tokens: tokenize(input)?,
            pos: 0,
            end: input.len(),
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|s| &s.token)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |s| s.position)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|s| s.token.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn error_here(&self, expected: &str) -> ParseError {
        let found = match self.peek() {
            Some(tok) => format!("'{}'", tok.describe()),
            None => "end of input".to_string(),
        };
        ParseError::new(format!("Expected {}, found {}", expected, found), self.position())
    }

    /// Consumes `token` if it is next.
    fn consume(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), ParseError> {
        if self.consume(token) {
            Ok(())
        } else {
            Err(self.error_here(&format!("'{}'", token.describe())))
        }
    }

    /// Consumes `keyword` if it is next.
    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().map_or(false, |t| t.is_keyword(keyword)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.consume_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error_here(keyword))
        }
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::Ident(_)) | Some(Token::QuotedIdent(_)) => match self.next() {
                Some(Token::Ident(s)) | Some(Token::QuotedIdent(s)) => Ok(s),
                _ => Err(self.error_here("identifier")),
            },
            _ => Err(self.error_here("identifier")),
        }
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::Str(_)) => match self.next() {
                Some(Token::Str(s)) => Ok(s),
                _ => Err(self.error_here("string literal")),
            },
            _ => Err(self.error_here("string literal")),
        }
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut names = vec![self.parse_identifier()?];
        while self.consume(&Token::Comma) {
            names.push(self.parse_identifier()?);
        }
        Ok(names)
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        if self.peek().is_some() {
            Err(self.error_here("end of statement"))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_semicolon_optional() {
        let sql = "CREATE STREAM s (a INT)";
        assert_eq!(
            parse_statement(sql).unwrap(),
            parse_statement(&format!("{};", sql)).unwrap()
        );
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let err = parse_statement("CREATE STREAM s (a INT); extra").unwrap_err();
        assert!(err.message.contains("end of statement"));
        assert_eq!(err.position, 25);
    }

    #[test]
    fn test_empty_input() {
        let err = parse_statement("  -- only a comment").unwrap_err();
        assert!(err.message.contains("end of input"));
    }

    #[test]
    fn test_display() {
        let err = ParseError::new("Expected ')'", 7);
        assert_eq!(err.to_string(), "Expected ')' at position 7");
    }
}

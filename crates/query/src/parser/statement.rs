//! Statement parsing.

use super::{ParseError, Parser, Token};
use crate::ast::{ColumnDef, CreateConnector, CreatePump, CreateStream, Statement, StreamKind};

impl Parser {
    pub(crate) fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword("CREATE")?;

        if self.consume_keyword("SOURCE") {
            if self.consume_keyword("STREAM") {
                return self.parse_create_stream(StreamKind::Source);
            }
            self.expect_keyword("READER")?;
            return Ok(Statement::CreateSourceReader(self.parse_create_connector()?));
        }
        if self.consume_keyword("SINK") {
            if self.consume_keyword("STREAM") {
                return self.parse_create_stream(StreamKind::Sink);
            }
            self.expect_keyword("WRITER")?;
            return Ok(Statement::CreateSinkWriter(self.parse_create_connector()?));
        }
        if self.consume_keyword("STREAM") {
            return self.parse_create_stream(StreamKind::Intermediate);
        }
        if self.consume_keyword("PUMP") {
            return self.parse_create_pump();
        }
        Err(self.error_here("SOURCE, SINK, STREAM or PUMP"))
    }

    fn parse_create_stream(&mut self, kind: StreamKind) -> Result<Statement, ParseError> {
        let name = self.parse_identifier()?;
        self.expect(&Token::LParen)?;
        let mut columns = vec![self.parse_column_def()?];
        while self.consume(&Token::Comma) {
            columns.push(self.parse_column_def()?);
        }
        self.expect(&Token::RParen)?;
        Ok(Statement::CreateStream(CreateStream {
            name,
            kind,
            columns,
        }))
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef, ParseError> {
        let name = self.parse_identifier()?;
        let type_name = match self.peek() {
            Some(Token::Ident(_)) => self.parse_identifier()?,
            _ => return Err(self.error_here("column type")),
        };
        let mut def = ColumnDef {
            name,
            type_name,
            not_null: false,
            rowtime_markers: 0,
        };
        loop {
            if self.consume_keyword("NOT") {
                self.expect_keyword("NULL")?;
                def.not_null = true;
            } else if self.consume_keyword("ROWTIME") {
                def.rowtime_markers += 1;
            } else {
                break;
            }
        }
        Ok(def)
    }

    fn parse_create_pump(&mut self) -> Result<Statement, ParseError> {
        let name = self.parse_identifier()?;
        self.expect_keyword("AS")?;
        self.expect_keyword("INSERT")?;
        self.expect_keyword("INTO")?;
        let target = self.parse_identifier()?;
        self.expect(&Token::LParen)?;
        let target_columns = self.parse_identifier_list()?;
        self.expect(&Token::RParen)?;

        self.expect_keyword("SELECT")?;
        self.consume_keyword("STREAM");
        let mut projections = vec![self.parse_expr()?];
        while self.consume(&Token::Comma) {
            projections.push(self.parse_expr()?);
        }

        self.expect_keyword("FROM")?;
        let inputs = self.parse_identifier_list()?;
        let filter = if self.consume_keyword("WHERE") {
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(Statement::CreatePump(CreatePump {
            name,
            target,
            target_columns,
            projections,
            inputs,
            filter,
        }))
    }

    fn parse_create_connector(&mut self) -> Result<CreateConnector, ParseError> {
        let name = self.parse_identifier()?;
        self.expect_keyword("FOR")?;
        let stream = self.parse_identifier()?;
        self.expect_keyword("TYPE")?;
        let connector_type = self.parse_identifier()?.to_ascii_uppercase();

        let mut options = Vec::new();
        if self.consume_keyword("OPTIONS") {
            self.expect(&Token::LParen)?;
            if !self.consume(&Token::RParen) {
                loop {
                    let key = self.parse_identifier()?.to_ascii_uppercase();
                    let value = self.parse_string()?;
                    options.push((key, value));
                    if !self.consume(&Token::Comma) {
                        break;
                    }
                }
                self.expect(&Token::RParen)?;
            }
        }

        Ok(CreateConnector {
            name,
            stream,
            connector_type,
            options,
        })
    }
}

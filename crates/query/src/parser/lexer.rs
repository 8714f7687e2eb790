//! Tokenizer for the streaming DDL dialect.

use super::ParseError;

/// A lexical token.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Bare identifier or keyword, as written.
    Ident(String),
    /// Double-quoted identifier.
    QuotedIdent(String),
    /// Numeric literal text.
    Number(String),
    /// Single-quoted string literal, with `''` unescaped.
    Str(String),
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Token {
    /// Returns whether this token is the given keyword (case-insensitive).
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Ident(s) if s.eq_ignore_ascii_case(keyword))
    }

    /// Returns a short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(s) => s.clone(),
            Token::QuotedIdent(s) => format!("\"{}\"", s),
            Token::Number(s) => s.clone(),
            Token::Str(s) => format!("'{}'", s),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Comma => ",".into(),
            Token::Semicolon => ";".into(),
            Token::Dot => ".".into(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Percent => "%".into(),
            Token::Eq => "=".into(),
            Token::Ne => "<>".into(),
            Token::Lt => "<".into(),
            Token::Le => "<=".into(),
            Token::Gt => ">".into(),
            Token::Ge => ">=".into(),
        }
    }
}

/// A token with its byte offset in the input.
#[derive(Clone, Debug, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Lexer state.
struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.advance(),
                Some('-') if self.peek_second() == Some('-') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn take_while<F: Fn(char) -> bool>(&mut self, f: F) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if f(c) {
                self.advance();
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    fn lex_number(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        self.take_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') {
            self.advance();
            self.take_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            if self.take_while(|c| c.is_ascii_digit()).is_empty() {
                return Err(ParseError::new("Malformed exponent in number", start));
            }
        }
        Ok(Token::Number(self.input[start..self.pos].to_string()))
    }

    fn lex_quoted(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.pos;
        self.advance();
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.advance();
            if c == quote {
                if self.peek() == Some(quote) {
                    out.push(quote);
                    self.advance();
                } else {
                    return Ok(out);
                }
            } else {
                out.push(c);
            }
        }
        Err(ParseError::new("Unterminated quoted text", start))
    }

    fn next_token(&mut self) -> Result<Option<Spanned>, ParseError> {
        self.skip_whitespace_and_comments();
        let position = self.pos;
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(None),
        };

        let token = match c {
            c if c.is_ascii_alphabetic() || c == '_' => {
                Token::Ident(self.take_while(|c| c.is_ascii_alphanumeric() || c == '_').to_string())
            }
            c if c.is_ascii_digit() => self.lex_number()?,
            '.' if self.peek_second().map_or(false, |c| c.is_ascii_digit()) => self.lex_number()?,
            '\'' => Token::Str(self.lex_quoted('\'')?),
            '"' => Token::QuotedIdent(self.lex_quoted('"')?),
            _ => {
                self.advance();
                match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    ';' => Token::Semicolon,
                    '.' => Token::Dot,
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    '=' => Token::Eq,
                    '!' if self.peek() == Some('=') => {
                        self.advance();
                        Token::Ne
                    }
                    '<' => match self.peek() {
                        Some('=') => {
                            self.advance();
                            Token::Le
                        }
                        Some('>') => {
                            self.advance();
                            Token::Ne
                        }
                        _ => Token::Lt,
                    },
                    '>' => {
                        if self.peek() == Some('=') {
                            self.advance();
                            Token::Ge
                        } else {
                            Token::Gt
                        }
                    }
                    other => {
                        return Err(ParseError::new(
                            format!("Unexpected character '{}'", other),
                            position,
                        ))
                    }
                }
            }
        };
        Ok(Some(Spanned { token, position }))
    }
}

/// Splits `input` into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(tok) = lexer.next_token()? {
        tokens.push(tok);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_identifiers_and_punctuation() {
        assert_eq!(
            kinds("create stream s(a INT);"),
            vec![
                Token::Ident("create".into()),
                Token::Ident("stream".into()),
                Token::Ident("s".into()),
                Token::LParen,
                Token::Ident("a".into()),
                Token::Ident("INT".into()),
                Token::RParen,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1 1.8 .5 2e3 7E-2"),
            vec![
                Token::Number("1".into()),
                Token::Number("1.8".into()),
                Token::Number(".5".into()),
                Token::Number("2e3".into()),
                Token::Number("7E-2".into()),
            ]
        );
        assert!(tokenize("3e").is_err());
    }

    #[test]
    fn test_string_escape() {
        assert_eq!(kinds("'it''s'"), vec![Token::Str("it's".into())]);
        assert_eq!(kinds("\"Col\""), vec![Token::QuotedIdent("Col".into())]);
        assert!(tokenize("'open").is_err());
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("= <> != < <= > >= + - * / %"),
            vec![
                Token::Eq,
                Token::Ne,
                Token::Ne,
                Token::Lt,
                Token::Le,
                Token::Gt,
                Token::Ge,
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Percent,
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("a -- trailing comment\n- b"),
            vec![Token::Ident("a".into()), Token::Minus, Token::Ident("b".into())]
        );
    }

    #[test]
    fn test_positions() {
        let toks = tokenize("  ab , c").unwrap();
        assert_eq!(toks[0].position, 2);
        assert_eq!(toks[1].position, 5);
        assert_eq!(toks[2].position, 7);
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("a # b").unwrap_err();
        assert_eq!(err.position, 2);
    }
}

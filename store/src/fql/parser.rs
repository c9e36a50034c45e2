// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! FQL Parser - Recursive descent parser for FQL queries.
//!
//! Grammar:
//!   query       = [ expression ] [ order_by ] ;
//!   expression  = or_expr ;
//!   or_expr     = and_expr { "OR" and_expr } ;
//!   and_expr    = unary_expr { "AND" unary_expr } ;
//!   unary_expr  = "NOT" unary_expr | primary ;
//!   primary     = comparison | "(" expression ")" ;
//!   comparison  = field operator value
//!               | field "IN" "(" value { "," value } ")"
//!               | value "IN" field
//!               | field ( "EMPTY" | "NULL" ) ;
//!   order_by    = "ORDER" "BY" field [ "ASC" | "DESC" ] ;
//!
//! Which comparison forms and keyword spellings are accepted is controlled
//! by the [`Dialect`]. An empty query parses to [`Expression::MatchAll`].

use super::ast::{
    Expression, FqlError, FqlErrorKind, Operator, OrderBy, ParsedQuery, Position, SortDirection,
    Value,
};
use super::dialect::Dialect;

/// Queries longer than this are rejected before tokenization.
pub const MAX_QUERY_LEN: usize = 4096;

/// Maximum parenthesis/NOT nesting depth. Bounds parser recursion on
/// adversarial input.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Token types for the lexer.
#[derive(Debug, Clone, PartialEq)]
enum TokenType {
    And,
    Or,
    Not,
    In,
    LParen,
    RParen,
    Comma,
    Op(Operator),
    String(String),
    Ident(String),
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    token_type: TokenType,
    position: Position,
}

/// Lexer for FQL queries.
struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    pos: usize,
    line: usize,
    column: usize,
    dialect: &'a Dialect,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, dialect: &'a Dialect) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            pos: 0,
            line: 1,
            column: 1,
            dialect,
        }
    }

    fn current_position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.pos,
        }
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.pos = pos + ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(ch)
        } else {
            None
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self, quote: char) -> Result<Token, FqlError> {
        let start_pos = self.current_position();
        self.advance(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.peek() {
                None => {
                    return Err(FqlError {
                        kind: FqlErrorKind::Tokenize,
                        message: format!(
                            "Unterminated string starting at line {}, column {}",
                            start_pos.line, start_pos.column
                        ),
                        position: Some(start_pos),
                    });
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some('\'') => value.push('\''),
                        Some(ch) => value.push(ch),
                        None => {
                            return Err(FqlError {
                                kind: FqlErrorKind::Tokenize,
                                message: "Unterminated escape sequence".into(),
                                position: Some(self.current_position()),
                            });
                        }
                    }
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        Ok(Token {
            token_type: TokenType::String(value),
            position: start_pos,
        })
    }

    fn read_identifier(&mut self) -> Token {
        let start_pos = self.current_position();
        let start = self.pos;

        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                self.advance();
            } else {
                break;
            }
        }

        let value = &self.input[start..self.pos];
        let dialect = self.dialect;
        let token_type = if dialect.keyword_eq(value, "AND") {
            TokenType::And
        } else if dialect.keyword_eq(value, "OR") {
            TokenType::Or
        } else if dialect.keyword_eq(value, "NOT") {
            TokenType::Not
        } else if (dialect.in_lists || dialect.containment_in) && dialect.keyword_eq(value, "IN") {
            TokenType::In
        } else if dialect.contains_word && dialect.keyword_eq(value, "CONTAINS") {
            TokenType::Op(Operator::Contains)
        } else if dialect.like_operator && dialect.keyword_eq(value, "LIKE") {
            TokenType::Op(Operator::Like)
        } else if dialect.empty_operators && dialect.keyword_eq(value, "EMPTY") {
            TokenType::Op(Operator::Empty)
        } else if dialect.empty_operators && dialect.keyword_eq(value, "NULL") {
            TokenType::Op(Operator::Null)
        } else {
            TokenType::Ident(value.to_string())
        };

        Token {
            token_type,
            position: start_pos,
        }
    }

    fn next_token(&mut self) -> Result<Token, FqlError> {
        self.skip_whitespace();

        let start_pos = self.current_position();

        match self.peek() {
            None => Ok(Token {
                token_type: TokenType::Eof,
                position: start_pos,
            }),
            Some('"') | Some('\'') => {
                let quote = self.peek().unwrap();
                self.read_string(quote)
            }
            Some(ch) if ch.is_alphanumeric() || ch == '_' || ch == '.' => {
                Ok(self.read_identifier())
            }
            Some('(') => {
                self.advance();
                Ok(Token {
                    token_type: TokenType::LParen,
                    position: start_pos,
                })
            }
            Some(')') => {
                self.advance();
                Ok(Token {
                    token_type: TokenType::RParen,
                    position: start_pos,
                })
            }
            Some(',') => {
                self.advance();
                Ok(Token {
                    token_type: TokenType::Comma,
                    position: start_pos,
                })
            }
            Some('=') => {
                self.advance();
                Ok(Token {
                    token_type: TokenType::Op(Operator::Eq),
                    position: start_pos,
                })
            }
            Some('!') => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token {
                        token_type: TokenType::Op(Operator::Ne),
                        position: start_pos,
                    })
                } else if self.peek() == Some('~') {
                    self.advance();
                    Ok(Token {
                        token_type: TokenType::Op(Operator::NotContains),
                        position: start_pos,
                    })
                } else {
                    Err(FqlError {
                        kind: FqlErrorKind::Tokenize,
                        message: format!(
                            "Expected '=' or '~' after '!' at line {}, column {}",
                            start_pos.line, start_pos.column
                        ),
                        position: Some(start_pos),
                    })
                }
            }
            Some('~') => {
                self.advance();
                Ok(Token {
                    token_type: TokenType::Op(Operator::Contains),
                    position: start_pos,
                })
            }
            Some('>') => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token {
                        token_type: TokenType::Op(Operator::Ge),
                        position: start_pos,
                    })
                } else {
                    Ok(Token {
                        token_type: TokenType::Op(Operator::Gt),
                        position: start_pos,
                    })
                }
            }
            Some('<') => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token {
                        token_type: TokenType::Op(Operator::Le),
                        position: start_pos,
                    })
                } else {
                    Ok(Token {
                        token_type: TokenType::Op(Operator::Lt),
                        position: start_pos,
                    })
                }
            }
            Some(ch) => Err(FqlError {
                kind: FqlErrorKind::Tokenize,
                message: format!(
                    "Unexpected character '{}' at line {}, column {}",
                    ch, start_pos.line, start_pos.column
                ),
                position: Some(start_pos),
            }),
        }
    }

    fn tokenize(&mut self) -> Result<Vec<Token>, FqlError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.token_type, TokenType::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}

/// Parser for FQL queries.
pub struct Parser<'a> {
    dialect: &'a Dialect,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(dialect: &'a Dialect) -> Self {
        Self {
            dialect,
            tokens: Vec::new(),
            pos: 0,
            depth: 0,
        }
    }

    fn current(&self) -> &Token {
        // tokenize() always terminates the stream with an Eof token, and
        // advance() never moves past it.
        &self.tokens[self.pos]
    }

    fn advance(&mut self) {
        if !matches!(self.current().token_type, TokenType::Eof) {
            self.pos += 1;
        }
    }

    fn check(&self, expected: &TokenType) -> bool {
        std::mem::discriminant(&self.current().token_type) == std::mem::discriminant(expected)
    }

    fn match_token(&mut self, expected: &TokenType) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn enter_nested(&mut self, position: Position) -> Result<(), FqlError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(FqlError {
                kind: FqlErrorKind::Parse,
                message: "Query nesting too deep".into(),
                position: Some(position),
            });
        }
        Ok(())
    }

    pub fn parse(&mut self, input: &str) -> Result<ParsedQuery, FqlError> {
        if input.len() > MAX_QUERY_LEN {
            return Err(FqlError {
                kind: FqlErrorKind::Tokenize,
                message: format!("Query exceeds {} bytes", MAX_QUERY_LEN),
                position: None,
            });
        }

        let mut lexer = Lexer::new(input, self.dialect);
        self.tokens = lexer.tokenize()?;
        self.pos = 0;
        self.depth = 0;

        let expr = if matches!(self.current().token_type, TokenType::Eof) || self.at_order_by() {
            Expression::MatchAll
        } else {
            self.parse_or_expr()?
        };

        let order_by = if self.at_order_by() {
            Some(self.parse_order_by()?)
        } else {
            None
        };

        if !matches!(self.current().token_type, TokenType::Eof) {
            return Err(FqlError {
                kind: FqlErrorKind::Parse,
                message: "Unexpected token after expression".to_string(),
                position: Some(self.current().position),
            });
        }

        Ok(ParsedQuery {
            raw: input.to_string(),
            expr,
            order_by,
        })
    }

    fn parse_or_expr(&mut self) -> Result<Expression, FqlError> {
        let mut left = self.parse_and_expr()?;

        while self.match_token(&TokenType::Or) {
            let right = self.parse_and_expr()?;
            left = Expression::Or {
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expression, FqlError> {
        let mut left = self.parse_unary_expr()?;

        while self.match_token(&TokenType::And) {
            let right = self.parse_unary_expr()?;
            left = Expression::And {
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expression, FqlError> {
        if self.check(&TokenType::Not) {
            let position = self.current().position;
            self.advance();
            self.enter_nested(position)?;
            let inner = self.parse_unary_expr()?;
            self.depth -= 1;
            return Ok(Expression::Not {
                inner: Box::new(inner),
            });
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expression, FqlError> {
        if self.check(&TokenType::LParen) {
            let position = self.current().position;
            self.advance();
            self.enter_nested(position)?;
            let expr = self.parse_or_expr()?;
            self.depth -= 1;
            if !self.match_token(&TokenType::RParen) {
                return Err(FqlError {
                    kind: FqlErrorKind::Parse,
                    message: "Expected ')' after expression".into(),
                    position: Some(self.current().position),
                });
            }
            return Ok(expr);
        }

        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expression, FqlError> {
        let first = self.current().clone();
        match &first.token_type {
            // Containment form puts the value first: 'x' IN labels.
            TokenType::String(value) if self.dialect.containment_in => {
                let value = value.clone();
                self.advance();
                if !self.match_token(&TokenType::In) {
                    return Err(FqlError {
                        kind: FqlErrorKind::Parse,
                        message: "Expected IN after quoted value".into(),
                        position: Some(self.current().position),
                    });
                }
                let field = self.expect_ident("Expected field name after IN")?;
                Ok(Expression::Comparison {
                    field,
                    operator: Operator::In,
                    value: Value::String { value },
                })
            }
            TokenType::Ident(name) => {
                let name = name.clone();
                self.advance();

                if self.check(&TokenType::In) {
                    if self.dialect.in_lists {
                        self.advance();
                        let value = self.parse_list()?;
                        return Ok(Expression::Comparison {
                            field: name,
                            operator: Operator::In,
                            value,
                        });
                    }
                    // Bare containment value: root in parents.
                    self.advance();
                    let field = self.expect_ident("Expected field name after IN")?;
                    return Ok(Expression::Comparison {
                        field,
                        operator: Operator::In,
                        value: Value::String { value: name },
                    });
                }

                let op_token = self.current().clone();
                let operator = match &op_token.token_type {
                    TokenType::Op(op) => *op,
                    _ => {
                        return Err(FqlError {
                            kind: FqlErrorKind::Parse,
                            message: "Expected operator".into(),
                            position: Some(op_token.position),
                        });
                    }
                };
                self.advance();

                let value = match operator {
                    Operator::Empty | Operator::Null => Value::Missing,
                    _ => self.parse_value()?,
                };

                Ok(Expression::Comparison {
                    field: name,
                    operator,
                    value,
                })
            }
            _ => Err(FqlError {
                kind: FqlErrorKind::Parse,
                message: "Expected field name".to_string(),
                position: Some(first.position),
            }),
        }
    }

    fn expect_ident(&mut self, message: &str) -> Result<String, FqlError> {
        let token = self.current().clone();
        match token.token_type {
            TokenType::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(FqlError {
                kind: FqlErrorKind::Parse,
                message: message.to_string(),
                position: Some(token.position),
            }),
        }
    }

    fn parse_value(&mut self) -> Result<Value, FqlError> {
        let value = self.parse_scalar()?;
        Ok(Value::String { value })
    }

    fn parse_scalar(&mut self) -> Result<String, FqlError> {
        let token = self.current().clone();
        match &token.token_type {
            TokenType::String(s) => {
                self.advance();
                Ok(s.clone())
            }
            TokenType::Ident(s) if self.dialect.bare_values => {
                self.advance();
                Ok(s.clone())
            }
            _ => Err(FqlError {
                kind: FqlErrorKind::Parse,
                message: "Expected value".into(),
                position: Some(token.position),
            }),
        }
    }

    fn parse_list(&mut self) -> Result<Value, FqlError> {
        if !self.match_token(&TokenType::LParen) {
            return Err(FqlError {
                kind: FqlErrorKind::Parse,
                message: "Expected '(' after IN".into(),
                position: Some(self.current().position),
            });
        }

        let mut values = Vec::new();

        // First value
        values.push(self.parse_scalar()?);

        // Additional values
        while self.match_token(&TokenType::Comma) {
            values.push(self.parse_scalar()?);
        }

        if !self.match_token(&TokenType::RParen) {
            return Err(FqlError {
                kind: FqlErrorKind::Parse,
                message: "Expected ')' after list values".into(),
                position: Some(self.current().position),
            });
        }

        Ok(Value::List { values })
    }

    fn at_order_by(&self) -> bool {
        if !self.dialect.order_by {
            return false;
        }
        let next = self.tokens.get(self.pos + 1);
        matches!(
            (&self.current().token_type, next.map(|t| &t.token_type)),
            (TokenType::Ident(a), Some(TokenType::Ident(b)))
                if a.eq_ignore_ascii_case("order") && b.eq_ignore_ascii_case("by")
        )
    }

    fn parse_order_by(&mut self) -> Result<OrderBy, FqlError> {
        self.advance(); // ORDER
        self.advance(); // BY
        let field = self.expect_ident("Expected field name after ORDER BY")?;

        let direction = match &self.current().token_type {
            TokenType::Ident(word) if word.eq_ignore_ascii_case("asc") => {
                self.advance();
                SortDirection::Ascending
            }
            TokenType::Ident(word) if word.eq_ignore_ascii_case("desc") => {
                self.advance();
                SortDirection::Descending
            }
            _ => SortDirection::Ascending,
        };

        Ok(OrderBy { field, direction })
    }
}

/// Parse an FQL query string under the default (CQL) dialect.
pub fn parse(input: &str) -> Result<ParsedQuery, FqlError> {
    parse_with(input, &Dialect::default())
}

/// Parse an FQL query string under a specific dialect.
pub fn parse_with(input: &str, dialect: &Dialect) -> Result<ParsedQuery, FqlError> {
    let mut parser = Parser::new(dialect);
    parser.parse(input)
}

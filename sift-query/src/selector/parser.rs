//! Parser for textual selector descriptions.
//!
//! Accepted syntax:
//!
//! ```text
//! selector    := [ '|' IDENT '|' ] expr
//! expr        := 'if' expr 'then' expr 'else' expr | additive
//! additive    := term (('+' | '-') term)*
//! term        := cast (('*' | '/' | '%') cast)*
//! cast        := unary ('as' TYPE)*
//! unary       := '-' unary | postfix
//! postfix     := primary ('.' IDENT [ '(' args ')' ])*
//! primary     := INT | FLOAT | STRING | 'true' | 'false' | 'null'
//!              | IDENT [ '(' args ')' ] | '{' args '}' | '(' expr ')'
//! ```
//!
//! With a `|r|` parameter, `r.year` denotes the record field `year`;
//! without one, a bare `year` does.

use smol_str::SmolStr;
use tracing::trace;

use super::{BinaryOp, SelectorExpr};
use crate::error::{QueryError, QueryResult};
use crate::filter::{FieldType, FilterValue};

/// Deepest nesting of expressions the parser accepts.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Punct(char),
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    offset: usize,
}

/// Parse a textual selector into its shape.
pub fn parse(input: &str) -> QueryResult<SelectorExpr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
        param: None,
        depth: 0,
    };
    let expr = parser.parse_selector()?;
    trace!(input = input, selector = %expr, "Parsed selector");
    Ok(expr)
}

fn tokenize(input: &str) -> QueryResult<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    ident.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Spanned {
                token: Token::Ident(ident),
                offset,
            });
        } else if c.is_ascii_digit() {
            let mut number = String::new();
            let mut is_float = false;
            while let Some(&(_, c)) = chars.peek() {
                if c.is_ascii_digit() || c == '_' {
                    number.push(c);
                    chars.next();
                } else if c == '.' && !is_float {
                    // `1.5` is a float, `1.max()` is not
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    match lookahead.peek() {
                        Some(&(_, d)) if d.is_ascii_digit() => {
                            is_float = true;
                            number.push(c);
                            chars.next();
                        }
                        _ => break,
                    }
                } else {
                    break;
                }
            }
            let digits = number.replace('_', "");
            let token = if is_float {
                digits
                    .parse::<f64>()
                    .map(Token::Float)
                    .map_err(|e| QueryError::invalid_selector_syntax(input, offset, e.to_string()))?
            } else {
                digits
                    .parse::<i64>()
                    .map(Token::Int)
                    .map_err(|e| QueryError::invalid_selector_syntax(input, offset, e.to_string()))?
            };
            tokens.push(Spanned { token, offset });
        } else if c == '"' {
            chars.next();
            let mut text = String::new();
            let mut closed = false;
            while let Some((_, c)) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some((_, escaped)) => text.push(escaped),
                        None => break,
                    },
                    other => text.push(other),
                }
            }
            if !closed {
                return Err(QueryError::invalid_selector_syntax(
                    input,
                    offset,
                    "unterminated string literal",
                ));
            }
            tokens.push(Spanned {
                token: Token::Str(text),
                offset,
            });
        } else if "+-*/%.,(){}|".contains(c) {
            chars.next();
            tokens.push(Spanned {
                token: Token::Punct(c),
                offset,
            });
        } else {
            return Err(QueryError::invalid_selector_syntax(
                input,
                offset,
                format!("unexpected character `{}`", c),
            ));
        }
    }

    Ok(tokens)
}

fn cast_target(name: &str) -> Option<FieldType> {
    match name {
        "bool" => Some(FieldType::Bool),
        "int" | "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" => Some(FieldType::Int),
        "float" | "f32" | "f64" => Some(FieldType::Float),
        "text" | "string" | "String" => Some(FieldType::Text),
        "date" | "NaiveDate" => Some(FieldType::Date),
        "datetime" | "NaiveDateTime" => Some(FieldType::DateTime),
        _ => None,
    }
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    param: Option<String>,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.input.len(), |t| t.offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|t| t.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        QueryError::invalid_selector_syntax(self.input, self.offset(), message)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek() == Some(&Token::Punct(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> QueryResult<()> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", c)))
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(Token::Ident(ident)) if ident == keyword => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect_ident(&mut self) -> QueryResult<String> {
        match self.peek() {
            Some(Token::Ident(ident)) => {
                let ident = ident.clone();
                self.pos += 1;
                Ok(ident)
            }
            _ => Err(self.error("expected identifier")),
        }
    }

    fn enter(&mut self) -> QueryResult<()> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("selector nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_selector(&mut self) -> QueryResult<SelectorExpr> {
        if self.eat_punct('|') {
            let param = self.expect_ident()?;
            self.expect_punct('|')?;
            self.param = Some(param);
        }

        let expr = self.parse_expr()?;
        if self.pos < self.tokens.len() {
            return Err(self.error("unexpected trailing input"));
        }
        Ok(expr)
    }

    fn parse_expr(&mut self) -> QueryResult<SelectorExpr> {
        self.enter()?;
        let expr = self.parse_expr_inner();
        self.depth -= 1;
        expr
    }

    fn parse_expr_inner(&mut self) -> QueryResult<SelectorExpr> {
        if self.eat_keyword("if") {
            let test = self.parse_expr()?;
            if !self.eat_keyword("then") {
                return Err(self.error("expected `then`"));
            }
            let then = self.parse_expr()?;
            if !self.eat_keyword("else") {
                return Err(self.error("expected `else`"));
            }
            let otherwise = self.parse_expr()?;
            return Ok(SelectorExpr::Conditional {
                test: Box::new(test),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> QueryResult<SelectorExpr> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = if self.eat_punct('+') {
                BinaryOp::Add
            } else if self.eat_punct('-') {
                BinaryOp::Sub
            } else {
                return Ok(lhs);
            };
            let rhs = self.parse_term()?;
            lhs = SelectorExpr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_term(&mut self) -> QueryResult<SelectorExpr> {
        let mut lhs = self.parse_cast()?;
        loop {
            let op = if self.eat_punct('*') {
                BinaryOp::Mul
            } else if self.eat_punct('/') {
                BinaryOp::Div
            } else if self.eat_punct('%') {
                BinaryOp::Rem
            } else {
                return Ok(lhs);
            };
            let rhs = self.parse_cast()?;
            lhs = SelectorExpr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_cast(&mut self) -> QueryResult<SelectorExpr> {
        let mut expr = self.parse_unary()?;
        while self.eat_keyword("as") {
            let name = self.expect_ident()?;
            let target = cast_target(&name)
                .ok_or_else(|| self.error(format!("unknown conversion target `{}`", name)))?;
            expr = expr.convert(target);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> QueryResult<SelectorExpr> {
        if self.eat_punct('-') {
            self.enter()?;
            let operand = self.parse_unary();
            self.depth -= 1;
            let operand = operand?;
            return Ok(match operand {
                SelectorExpr::Literal(FilterValue::Int(v)) => SelectorExpr::Literal(FilterValue::Int(-v)),
                SelectorExpr::Literal(FilterValue::Float(v)) => {
                    SelectorExpr::Literal(FilterValue::Float(-v))
                }
                other => SelectorExpr::Binary {
                    op: BinaryOp::Sub,
                    lhs: Box::new(SelectorExpr::Literal(FilterValue::Int(0))),
                    rhs: Box::new(other),
                },
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> QueryResult<SelectorExpr> {
        let mut expr = self.parse_primary()?;
        while self.eat_punct('.') {
            let name = self.expect_ident()?;
            if self.eat_punct('(') {
                let mut args = vec![expr];
                args.extend(self.parse_list(')')?);
                expr = SelectorExpr::Call {
                    method: SmolStr::new(name),
                    args,
                };
            } else {
                expr = SelectorExpr::Member {
                    base: Box::new(expr),
                    name: SmolStr::new(name),
                };
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> QueryResult<SelectorExpr> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Int(v)) => Ok(SelectorExpr::Literal(FilterValue::Int(v))),
            Some(Token::Float(v)) => Ok(SelectorExpr::Literal(FilterValue::Float(v))),
            Some(Token::Str(s)) => Ok(SelectorExpr::Literal(FilterValue::String(s))),
            Some(Token::Punct('{')) => Ok(SelectorExpr::Composite(self.parse_list('}')?)),
            Some(Token::Punct('(')) => {
                let inner = self.parse_expr()?;
                self.expect_punct(')')?;
                Ok(inner)
            }
            Some(Token::Ident(ident)) => {
                let literal = match ident.as_str() {
                    "true" => Some(FilterValue::Bool(true)),
                    "false" => Some(FilterValue::Bool(false)),
                    "null" => Some(FilterValue::Null),
                    _ => None,
                };
                if let Some(value) = literal {
                    return Ok(SelectorExpr::Literal(value));
                }
                if self.eat_punct('(') {
                    return Ok(SelectorExpr::Call {
                        method: SmolStr::new(&ident),
                        args: self.parse_list(')')?,
                    });
                }
                self.parse_path(ident, offset)
            }
            Some(Token::Punct(c)) => Err(QueryError::invalid_selector_syntax(
                self.input,
                offset,
                format!("unexpected `{}`", c),
            )),
            None => Err(self.error("unexpected end of selector")),
        }
    }

    /// Resolve an identifier either as the record parameter's field or as a bare field.
    fn parse_path(&mut self, ident: String, offset: usize) -> QueryResult<SelectorExpr> {
        let param = self.param.clone();
        match param {
            Some(param) if param == ident => {
                if !self.eat_punct('.') {
                    return Err(QueryError::invalid_selector_syntax(
                        self.input,
                        offset,
                        format!("`{}` must be followed by a field access", ident),
                    ));
                }
                let field = self.expect_ident()?;
                if self.peek() == Some(&Token::Punct('(')) {
                    // `r.method()` is a call on the record itself
                    self.pos += 1;
                    let mut args = vec![SelectorExpr::Field(SmolStr::new(&ident))];
                    args.extend(self.parse_list(')')?);
                    return Ok(SelectorExpr::Call {
                        method: SmolStr::new(field),
                        args,
                    });
                }
                Ok(SelectorExpr::Field(SmolStr::new(field)))
            }
            Some(param) => Err(QueryError::invalid_selector_syntax(
                self.input,
                offset,
                format!("unknown name `{}`; fields are accessed through `{}`", ident, param),
            )),
            None => Ok(SelectorExpr::Field(SmolStr::new(ident))),
        }
    }

    fn parse_list(&mut self, close: char) -> QueryResult<Vec<SelectorExpr>> {
        let mut items = Vec::new();
        if self.eat_punct(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expr()?);
            if self.eat_punct(close) {
                return Ok(items);
            }
            self.expect_punct(',')?;
            // trailing comma
            if self.eat_punct(close) {
                return Ok(items);
            }
        }
    }
}

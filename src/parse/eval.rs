//! @module "Expression Evaluator"
//! @summary "Scoped expression language backing the `eval` annotation type"
//! @domain core
//! @layer logic
//!
//! Evaluates a single expression into a JSON value. Supported:
//! - literals: `42`, `-4.5`, `.5`, `1e3`, `"text"`, `'text'`, `true`, `false`, `null`
//! - collections: `[1, 2]`, `{"key": 1}`, `{key: 1}`
//! - operators: `! - +` (unary), `* / %`, `+ -`, `< <= > >=`, `== !=`, `&&`, `||`, `??`
//! - functions: `min`, `max`, `abs`, `floor`, `ceil`, `round`, `sqrt`, `pow`,
//!   `len`, `upper`, `lower`, `concat`
//! - constants: `PI`, `E`
//!
//! There are no variables, assignments or side effects; evaluation always
//! terminates in time proportional to the input.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// @summary "Reason an expression could not be evaluated"
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("type error: {0}")]
    Type(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    #[error("result is not a finite number")]
    NonFinite,

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{name}() expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },
}

type EvalResult<T> = std::result::Result<T, EvalError>;

/// Parse and evaluate an expression
pub fn evaluate(source: &str) -> EvalResult<Value> {
    let expr = Expr::parse(source)?;
    expr.eval()
}

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AmpAmp,
    PipePipe,
    DoubleQuestion,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

fn syntax(offset: usize, message: impl Into<String>) -> EvalError {
    EvalError::Syntax {
        offset,
        message: message.into(),
    }
}

fn tokenize(source: &str) -> EvalResult<Vec<Token>> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        let next = chars.get(i + 1).map(|(_, c)| *c);

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let (kind, width) = match (c, next) {
            ('=', Some('=')) => (TokenKind::EqEq, 2),
            ('!', Some('=')) => (TokenKind::NotEq, 2),
            ('<', Some('=')) => (TokenKind::LtEq, 2),
            ('>', Some('=')) => (TokenKind::GtEq, 2),
            ('&', Some('&')) => (TokenKind::AmpAmp, 2),
            ('|', Some('|')) => (TokenKind::PipePipe, 2),
            ('?', Some('?')) => (TokenKind::DoubleQuestion, 2),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('%', _) => (TokenKind::Percent, 1),
            ('!', _) => (TokenKind::Bang, 1),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', _) => (TokenKind::Gt, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            ('[', _) => (TokenKind::LBracket, 1),
            (']', _) => (TokenKind::RBracket, 1),
            ('{', _) => (TokenKind::LBrace, 1),
            ('}', _) => (TokenKind::RBrace, 1),
            (',', _) => (TokenKind::Comma, 1),
            (':', _) => (TokenKind::Colon, 1),
            ('"' | '\'', _) => {
                let (value, consumed) = lex_string(&chars, i)?;
                tokens.push(Token {
                    kind: TokenKind::Str(value),
                    offset,
                });
                i += consumed;
                continue;
            }
            (c, next) if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let (kind, consumed) = lex_number(&chars, i)?;
                tokens.push(Token { kind, offset });
                i += consumed;
                continue;
            }
            (c, _) if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_alphanumeric() || chars[i].1 == '_') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().map(|(_, c)| *c).collect();
                tokens.push(Token {
                    kind: TokenKind::Ident(ident),
                    offset,
                });
                continue;
            }
            (c, _) => return Err(syntax(offset, format!("unexpected character '{}'", c))),
        };

        tokens.push(Token { kind, offset });
        i += width;
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        offset: source.len(),
    });
    Ok(tokens)
}

/// Lex a quoted string starting at `start`; returns the value and chars consumed
fn lex_string(chars: &[(usize, char)], start: usize) -> EvalResult<(String, usize)> {
    let (offset, quote) = chars[start];
    let mut value = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        let c = chars[i].1;
        if c == quote {
            return Ok((value, i - start + 1));
        }
        if c == '\\' {
            let escaped = chars
                .get(i + 1)
                .map(|(_, c)| *c)
                .ok_or_else(|| syntax(chars[i].0, "dangling escape"))?;
            value.push(match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '0' => '\0',
                '\\' | '\'' | '"' => escaped,
                other => {
                    return Err(syntax(chars[i].0, format!("unknown escape '\\{}'", other)));
                }
            });
            i += 2;
            continue;
        }
        value.push(c);
        i += 1;
    }

    Err(syntax(offset, "unterminated string"))
}

/// Lex a numeric literal starting at `start`; returns the token and chars consumed
fn lex_number(chars: &[(usize, char)], start: usize) -> EvalResult<(TokenKind, usize)> {
    let mut i = start;
    let mut is_float = false;

    while i < chars.len() && chars[i].1.is_ascii_digit() {
        i += 1;
    }
    if i < chars.len() && chars[i].1 == '.' {
        is_float = true;
        i += 1;
        while i < chars.len() && chars[i].1.is_ascii_digit() {
            i += 1;
        }
    }
    if i < chars.len() && matches!(chars[i].1, 'e' | 'E') {
        let mut j = i + 1;
        if j < chars.len() && matches!(chars[j].1, '+' | '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].1.is_ascii_digit() {
            is_float = true;
            i = j;
            while i < chars.len() && chars[i].1.is_ascii_digit() {
                i += 1;
            }
        }
    }

    let text: String = chars[start..i].iter().map(|(_, c)| *c).collect();
    let offset = chars[start].0;
    let kind = if is_float {
        TokenKind::Float(
            text.parse()
                .map_err(|_| syntax(offset, format!("invalid number '{}'", text)))?,
        )
    } else {
        TokenKind::Int(text.parse().map_err(|_| EvalError::Overflow)?)
    };
    Ok((kind, i - start))
}

// ============================================================================
// Syntax tree
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Coalesce,
}

impl BinaryOp {
    /// Precedence level (lower = tighter binding)
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 3,
            BinaryOp::Add | BinaryOp::Sub => 4,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 6,
            BinaryOp::Eq | BinaryOp::Ne => 7,
            BinaryOp::And => 11,
            BinaryOp::Or => 12,
            BinaryOp::Coalesce => 13,
        }
    }

    fn from_token(kind: &TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LtEq => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::GtEq => BinaryOp::Ge,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::Ne,
            TokenKind::AmpAmp => BinaryOp::And,
            TokenKind::PipePipe => BinaryOp::Or,
            TokenKind::DoubleQuestion => BinaryOp::Coalesce,
            _ => return None,
        })
    }
}

const LOWEST_PRECEDENCE: u8 = 13;

/// Deepest expression tree the parser builds, same bound as serde_json
const MAX_DEPTH: usize = 128;

/// A parsed expression
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Constant(String),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Expr {
    fn parse(source: &str) -> EvalResult<Expr> {
        let mut parser = ExprParser {
            tokens: tokenize(source)?,
            pos: 0,
            depth: 0,
        };
        if parser.check(&TokenKind::Eof) {
            return Err(syntax(0, "empty expression"));
        }
        let expr = parser.expression()?;
        if !parser.check(&TokenKind::Eof) {
            return Err(syntax(parser.offset(), "unexpected trailing input"));
        }
        Ok(expr)
    }
}

impl ExprParser {
    fn current(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos].offset
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.current() == kind
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.tokens[self.pos].kind.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn consume(&mut self, kind: &TokenKind, message: &str) -> EvalResult<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(syntax(self.offset(), message))
        }
    }

    /// Count one more level of tree depth; every caller restores `depth`
    fn enter(&mut self, offset: usize) -> EvalResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(syntax(offset, "expression nested too deeply"));
        }
        Ok(())
    }

    fn expression(&mut self) -> EvalResult<Expr> {
        self.parse_precedence(LOWEST_PRECEDENCE)
    }

    fn parse_precedence(&mut self, max_prec: u8) -> EvalResult<Expr> {
        let entry = self.depth;
        let mut left = self.unary()?;

        // A chain of operators deepens the left spine by one per operator
        while let Some(op) = BinaryOp::from_token(self.current()) {
            let prec = op.precedence();
            if prec > max_prec {
                break;
            }
            self.enter(self.offset())?;
            self.advance();
            // All operators are left-associative
            let right = self.parse_precedence(prec - 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth = entry;
        Ok(left)
    }

    fn unary(&mut self) -> EvalResult<Expr> {
        let op = match self.current() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        };

        match op {
            Some(op) => {
                self.enter(self.offset())?;
                self.advance();
                let operand = self.unary()?;
                self.depth -= 1;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> EvalResult<Expr> {
        let offset = self.offset();
        match self.advance() {
            TokenKind::Int(n) => Ok(Expr::Literal(Value::from(n))),
            TokenKind::Float(f) => Ok(Expr::Literal(float_value(f)?)),
            TokenKind::Str(s) => Ok(Expr::Literal(Value::String(s))),
            TokenKind::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" => Ok(Expr::Literal(Value::Null)),
                _ if self.check(&TokenKind::LParen) => {
                    self.enter(offset)?;
                    self.advance();
                    let args = self.list(&TokenKind::RParen, "expected ')' after arguments")?;
                    self.depth -= 1;
                    Ok(Expr::Call { name, args })
                }
                _ => Ok(Expr::Constant(name)),
            },
            TokenKind::LParen => {
                self.enter(offset)?;
                let inner = self.expression()?;
                self.consume(&TokenKind::RParen, "expected ')'")?;
                self.depth -= 1;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.enter(offset)?;
                let items = self.list(&TokenKind::RBracket, "expected ']' after array items")?;
                self.depth -= 1;
                Ok(Expr::Array(items))
            }
            TokenKind::LBrace => {
                self.enter(offset)?;
                let object = self.object()?;
                self.depth -= 1;
                Ok(object)
            }
            TokenKind::Eof => Err(syntax(offset, "unexpected end of expression")),
            other => Err(syntax(offset, format!("unexpected token {:?}", other))),
        }
    }

    /// Comma-separated expressions up to `close`, trailing comma allowed
    fn list(&mut self, close: &TokenKind, message: &str) -> EvalResult<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(self.expression()?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.consume(close, message)?;
        Ok(items)
    }

    fn object(&mut self) -> EvalResult<Expr> {
        let mut entries = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let offset = self.offset();
            let key = match self.advance() {
                TokenKind::Str(s) | TokenKind::Ident(s) => s,
                _ => return Err(syntax(offset, "expected object key")),
            };
            self.consume(&TokenKind::Colon, "expected ':' after object key")?;
            entries.push((key, self.expression()?));
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.consume(&TokenKind::RBrace, "expected '}' after object entries")?;
        Ok(Expr::Object(entries))
    }
}

// ============================================================================
// Evaluation
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn from_value(value: &Value) -> Option<Num> {
        let Value::Number(n) = value else {
            return None;
        };
        n.as_i64()
            .map(Num::Int)
            .or_else(|| n.as_f64().map(Num::Float))
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn into_value(self) -> EvalResult<Value> {
        match self {
            Num::Int(i) => Ok(Value::from(i)),
            Num::Float(f) => float_value(f),
        }
    }
}

fn float_value(f: f64) -> EvalResult<Value> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or(EvalError::NonFinite)
}

/// Integral float results (floor, ceil, round) come back as integers when they fit
fn integral_value(f: f64) -> EvalResult<Value> {
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(Value::from(f as i64))
    } else {
        float_value(f)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_num(value: &Value, context: &str) -> EvalResult<Num> {
    Num::from_value(value).ok_or_else(|| {
        EvalError::Type(format!("{} expects a number, got {}", context, type_name(value)))
    })
}

fn expect_bool(value: &Value, context: &str) -> EvalResult<bool> {
    value.as_bool().ok_or_else(|| {
        EvalError::Type(format!("{} expects a bool, got {}", context, type_name(value)))
    })
}

fn expect_str<'v>(value: &'v Value, context: &str) -> EvalResult<&'v str> {
    value.as_str().ok_or_else(|| {
        EvalError::Type(format!("{} expects a string, got {}", context, type_name(value)))
    })
}

impl Expr {
    fn eval(&self) -> EvalResult<Value> {
        match self {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Constant(name) => match name.as_str() {
                "PI" => float_value(std::f64::consts::PI),
                "E" => float_value(std::f64::consts::E),
                _ => Err(EvalError::UnknownIdentifier(name.clone())),
            },
            Expr::Array(items) => Ok(Value::Array(
                items.iter().map(Expr::eval).collect::<EvalResult<_>>()?,
            )),
            Expr::Object(entries) => {
                let mut map = Map::new();
                for (key, expr) in entries {
                    map.insert(key.clone(), expr.eval()?);
                }
                Ok(Value::Object(map))
            }
            Expr::Unary { op, operand } => eval_unary(*op, operand.eval()?),
            Expr::Binary { op, left, right } => eval_binary(*op, left, right),
            Expr::Call { name, args } => {
                let args = args.iter().map(Expr::eval).collect::<EvalResult<Vec<_>>>()?;
                eval_call(name, &args)
            }
        }
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> EvalResult<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!expect_bool(&value, "'!'")?)),
        UnaryOp::Plus => expect_num(&value, "unary '+'")?.into_value(),
        UnaryOp::Neg => match expect_num(&value, "unary '-'")? {
            Num::Int(i) => Ok(Value::from(i.checked_neg().ok_or(EvalError::Overflow)?)),
            Num::Float(f) => float_value(-f),
        },
    }
}

fn eval_binary(op: BinaryOp, left: &Expr, right: &Expr) -> EvalResult<Value> {
    // Short-circuiting operators evaluate the right side lazily
    match op {
        BinaryOp::And => {
            let l = expect_bool(&left.eval()?, "'&&'")?;
            return Ok(Value::Bool(l && expect_bool(&right.eval()?, "'&&'")?));
        }
        BinaryOp::Or => {
            let l = expect_bool(&left.eval()?, "'||'")?;
            return Ok(Value::Bool(l || expect_bool(&right.eval()?, "'||'")?));
        }
        BinaryOp::Coalesce => {
            let l = left.eval()?;
            return if l.is_null() { right.eval() } else { Ok(l) };
        }
        _ => {}
    }

    let l = left.eval()?;
    let r = right.eval()?;

    match op {
        BinaryOp::Add => match (&l, &r) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            (Value::Array(a), Value::Array(b)) => {
                Ok(Value::Array(a.iter().chain(b.iter()).cloned().collect()))
            }
            _ => arithmetic(op, expect_num(&l, "'+'")?, expect_num(&r, "'+'")?),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic(op, expect_num(&l, "arithmetic")?, expect_num(&r, "arithmetic")?)
        }
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&l, &r))),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(&l, &r))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(&l, &r)?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => unreachable!("handled above"),
    }
}

fn arithmetic(op: BinaryOp, l: Num, r: Num) -> EvalResult<Value> {
    if let (Num::Int(a), Num::Int(b)) = (l, r) {
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div | BinaryOp::Mod if b == 0 => return Err(EvalError::DivisionByZero),
            // Inexact integer division falls through to float division
            BinaryOp::Div if a.checked_rem(b) != Some(0) => None,
            BinaryOp::Div => a.checked_div(b),
            _ => a.checked_rem(b),
        };
        return match result {
            Some(n) => Ok(Value::from(n)),
            None if op == BinaryOp::Div => float_value(a as f64 / b as f64),
            None => Err(EvalError::Overflow),
        };
    }

    let (a, b) = (l.as_f64(), r.as_f64());
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::Mod if b == 0.0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Div => a / b,
        _ => a % b,
    };
    float_value(result)
}

fn values_equal(l: &Value, r: &Value) -> bool {
    match (Num::from_value(l), Num::from_value(r)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
        (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
        _ => l == r,
    }
}

fn compare(l: &Value, r: &Value) -> EvalResult<std::cmp::Ordering> {
    if let (Some(a), Some(b)) = (Num::from_value(l), Num::from_value(r)) {
        return match (a, b) {
            (Num::Int(a), Num::Int(b)) => Ok(a.cmp(&b)),
            _ => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .ok_or(EvalError::NonFinite),
        };
    }
    match (l, r) {
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => Err(EvalError::Type(format!(
            "cannot compare {} with {}",
            type_name(l),
            type_name(r)
        ))),
    }
}

fn arity(name: &str, args: &[Value], expected: &'static str, ok: bool) -> EvalResult<()> {
    if ok {
        Ok(())
    } else {
        Err(EvalError::Arity {
            name: name.to_string(),
            expected,
            got: args.len(),
        })
    }
}

fn eval_call(name: &str, args: &[Value]) -> EvalResult<Value> {
    match name {
        "min" | "max" => {
            arity(name, args, "at least 1", !args.is_empty())?;
            let mut best = &args[0];
            expect_num(best, name)?;
            for candidate in &args[1..] {
                expect_num(candidate, name)?;
                let ordering = compare(candidate, best)?;
                if (name == "min" && ordering.is_lt()) || (name == "max" && ordering.is_gt()) {
                    best = candidate;
                }
            }
            Ok(best.clone())
        }
        "abs" => {
            arity(name, args, "1", args.len() == 1)?;
            match expect_num(&args[0], name)? {
                Num::Int(i) => Ok(Value::from(i.checked_abs().ok_or(EvalError::Overflow)?)),
                Num::Float(f) => float_value(f.abs()),
            }
        }
        "floor" | "ceil" | "round" => {
            arity(name, args, "1", args.len() == 1)?;
            let f = expect_num(&args[0], name)?.as_f64();
            integral_value(match name {
                "floor" => f.floor(),
                "ceil" => f.ceil(),
                _ => f.round(),
            })
        }
        "sqrt" => {
            arity(name, args, "1", args.len() == 1)?;
            float_value(expect_num(&args[0], name)?.as_f64().sqrt())
        }
        "pow" => {
            arity(name, args, "2", args.len() == 2)?;
            let base = expect_num(&args[0], name)?;
            let exp = expect_num(&args[1], name)?;
            match (base, exp) {
                (Num::Int(b), Num::Int(e)) if (0..=i64::from(u32::MAX)).contains(&e) => {
                    let e = u32::try_from(e).map_err(|_| EvalError::Overflow)?;
                    Ok(Value::from(b.checked_pow(e).ok_or(EvalError::Overflow)?))
                }
                _ => float_value(base.as_f64().powf(exp.as_f64())),
            }
        }
        "len" => {
            arity(name, args, "1", args.len() == 1)?;
            let len = match &args[0] {
                Value::String(s) => s.chars().count(),
                Value::Array(a) => a.len(),
                Value::Object(o) => o.len(),
                other => {
                    return Err(EvalError::Type(format!(
                        "len expects a string, array or object, got {}",
                        type_name(other)
                    )));
                }
            };
            Ok(Value::from(len))
        }
        "upper" | "lower" => {
            arity(name, args, "1", args.len() == 1)?;
            let s = expect_str(&args[0], name)?;
            Ok(Value::String(if name == "upper" {
                s.to_uppercase()
            } else {
                s.to_lowercase()
            }))
        }
        "concat" => {
            let mut out = String::new();
            for arg in args {
                match arg {
                    Value::String(s) => out.push_str(s),
                    other => out.push_str(&other.to_string()),
                }
            }
            Ok(Value::String(out))
        }
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}

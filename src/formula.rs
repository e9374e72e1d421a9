//! Damage formula language.
//!
//! Formulas are small arithmetic expressions evaluated over two stat records: `a` is the
//! subject using an ability and `b` is its target. The language is closed: it has
//! `+ - * /`, parentheses, unary minus, numeric literals, `a.<field>`/`b.<field>` lookups
//! and a fixed set of functions.
//!
//! | function          | result                                                  |
//! |-------------------|---------------------------------------------------------|
//! | `floor(x)`        | `x` rounded down                                        |
//! | `ceil(x)`         | `x` rounded up                                          |
//! | `round(x)`        | `x` rounded to the nearest integer                      |
//! | `abs(x)`          | absolute value                                          |
//! | `max(x, ...)`     | greatest argument                                       |
//! | `min(x, ...)`     | smallest argument                                       |
//! | `physical(d)`     | `(a.atk - b.def / d) * 2 * a.level`                     |
//! | `magical(d)`      | `(a.mat - b.mdf / d) * 2 * a.level`                     |
//! | `graze(d)`        | `physical(d)`, or a uniform draw in {0, 1, 2} if `<= 0` |
//!
//! Anything resembling a general purpose script is rejected with a parse error.

use crate::entropy::Entropy;
use crate::error::{FormulaError, FormulaResult};
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Formula used when an ability's own formula fails to parse or evaluate.
pub const DEFAULT_FORMULA: &str = "a.atk * 4 - b.def * 2";

/// Immutable snapshot of a battler's statistics, used as formula evaluation context.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct CharacterStats {
    /// Current hit points.
    pub hp: i32,
    /// Current magic points.
    pub mp: i32,
    /// Attack.
    pub atk: i32,
    /// Defense.
    pub def: i32,
    /// Magic attack.
    pub mat: i32,
    /// Magic defense.
    pub mdf: i32,
    /// Agility.
    pub agi: i32,
    /// Luck.
    pub luk: i32,
    /// Level.
    pub level: i32,
}

impl CharacterStats {
    fn field(&self, field: Field) -> f64 {
        let value = match field {
            Field::Hp => self.hp,
            Field::Mp => self.mp,
            Field::Atk => self.atk,
            Field::Def => self.def,
            Field::Mat => self.mat,
            Field::Mdf => self.mdf,
            Field::Agi => self.agi,
            Field::Luk => self.luk,
            Field::Level => self.level,
        };
        f64::from(value)
    }
}

/// Parses and evaluates `expr` with `a` as attacker and `b` as defender.
///
/// `entropy` is only consumed by helpers with a random component.
pub fn evaluate(
    expr: &str,
    a: &CharacterStats,
    b: &CharacterStats,
    entropy: &mut Entropy,
) -> FormulaResult<f64> {
    Formula::parse(expr)?.evaluate(a, b, entropy)
}

/// Evaluates the default physical formula. It never fails.
pub fn default_damage(a: &CharacterStats, b: &CharacterStats) -> f64 {
    f64::from(a.atk) * 4.0 - f64::from(b.def) * 2.0
}

/// A parsed formula, ready to be evaluated any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    root: Expr,
}

impl Formula {
    /// Parses a formula.
    pub fn parse(expr: &str) -> FormulaResult<Self> {
        let tokens = tokenize(expr)?;
        let mut parser = Parser {
            tokens,
            cursor: 0,
            end: expr.len(),
        };
        let root = parser.parse_expr()?;
        if let Some(token) = parser.peek() {
            return Err(FormulaError::parse(
                token.position,
                format!("unexpected {}", token.kind.describe()),
            ));
        }
        Ok(Self { root })
    }

    /// Evaluates this formula.
    pub fn evaluate(
        &self,
        a: &CharacterStats,
        b: &CharacterStats,
        entropy: &mut Entropy,
    ) -> FormulaResult<f64> {
        let mut context = Context { a, b, entropy };
        context.eval(&self.root)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Hp,
    Mp,
    Atk,
    Def,
    Mat,
    Mdf,
    Agi,
    Luk,
    Level,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "hp" => Self::Hp,
            "mp" => Self::Mp,
            "atk" => Self::Atk,
            "def" => Self::Def,
            "mat" => Self::Mat,
            "mdf" => Self::Mdf,
            "agi" => Self::Agi,
            "luk" => Self::Luk,
            "level" => Self::Level,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Function {
    Floor,
    Ceil,
    Round,
    Abs,
    Max,
    Min,
    Physical,
    Magical,
    Graze,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "round" => Self::Round,
            "abs" => Self::Abs,
            "max" => Self::Max,
            "min" => Self::Min,
            "physical" => Self::Physical,
            "magical" => Self::Magical,
            "graze" => Self::Graze,
            _ => return None,
        })
    }

    /// Returns true if `count` arguments are accepted.
    fn accepts(self, count: usize) -> bool {
        match self {
            Self::Max | Self::Min => count >= 1,
            _ => count == 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Stat(Side, Field),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

/// Words that belong to a scripting language rather than to a formula.
const SCRIPT_KEYWORDS: &[&str] = &[
    "if", "else", "function", "var", "let", "const", "return", "while", "for", "new", "this",
];

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f64),
    Ident(String),
    Dot,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            Self::Number(n) => format!("number `{}`", n),
            Self::Ident(name) => format!("identifier `{}`", name),
            Self::Dot => "`.`".into(),
            Self::Comma => "`,`".into(),
            Self::Plus => "`+`".into(),
            Self::Minus => "`-`".into(),
            Self::Star => "`*`".into(),
            Self::Slash => "`/`".into(),
            Self::LParen => "`(`".into(),
            Self::RParen => "`)`".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    position: usize,
}

fn tokenize(source: &str) -> FormulaResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();
    while let Some(&(position, ch)) = chars.peek() {
        let kind = match ch {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            c if c.is_ascii_digit() => {
                let mut end = position;
                let mut seen_dot = false;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() {
                        end = i + 1;
                    } else if c == '.' && !seen_dot {
                        // A dot is part of the number only when a digit follows.
                        let rest = &source[i + 1..];
                        if !rest.starts_with(|d: char| d.is_ascii_digit()) {
                            break;
                        }
                        seen_dot = true;
                        end = i + 1;
                    } else {
                        break;
                    }
                    chars.next();
                }
                let literal = &source[position..end];
                let value = literal.parse::<f64>().map_err(|_| {
                    FormulaError::parse(position, format!("invalid number `{}`", literal))
                })?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    position,
                });
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = position;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let word = &source[position..end];
                if SCRIPT_KEYWORDS.contains(&word) {
                    return Err(FormulaError::parse(
                        position,
                        format!("scripting construct `{}` is not allowed", word),
                    ));
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(word.to_string()),
                    position,
                });
                continue;
            }
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            other => {
                return Err(FormulaError::parse(
                    position,
                    format!("unexpected character `{}`", other),
                ))
            }
        };
        chars.next();
        tokens.push(Token { kind, position });
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|token| &token.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn position(&self) -> usize {
        self.peek().map_or(self.end, |token| token.position)
    }

    fn expect(&mut self, kind: TokenKind) -> FormulaResult<()> {
        match self.advance() {
            Some(token) if token.kind == kind => Ok(()),
            Some(token) => Err(FormulaError::parse(
                token.position,
                format!("expected {}, found {}", kind.describe(), token.kind.describe()),
            )),
            None => Err(FormulaError::parse(
                self.end,
                format!("expected {}, found end of formula", kind.describe()),
            )),
        }
    }

    fn parse_expr(&mut self) -> FormulaResult<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> FormulaResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> FormulaResult<Expr> {
        if let Some(TokenKind::Minus) = self.peek_kind() {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(operand)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        let position = self.position();
        let token = self.advance().ok_or_else(|| {
            FormulaError::parse(position, "unexpected end of formula".to_string())
        })?;
        match token.kind {
            TokenKind::Number(value) => Ok(Expr::Number(value)),
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => match self.peek_kind() {
                Some(TokenKind::Dot) => {
                    self.advance();
                    self.parse_stat(&name, token.position)
                }
                Some(TokenKind::LParen) => {
                    self.advance();
                    self.parse_call(&name, token.position)
                }
                _ => Err(FormulaError::parse(
                    token.position,
                    format!("unknown identifier `{}`", name),
                )),
            },
            other => Err(FormulaError::parse(
                token.position,
                format!("unexpected {}", other.describe()),
            )),
        }
    }

    fn parse_stat(&mut self, side: &str, position: usize) -> FormulaResult<Expr> {
        let side = match side {
            "a" => Side::A,
            "b" => Side::B,
            other => {
                return Err(FormulaError::parse(
                    position,
                    format!("unknown stat owner `{}`", other),
                ))
            }
        };
        let field_position = self.position();
        match self.advance().map(|token| token.kind) {
            Some(TokenKind::Ident(name)) => Field::from_name(&name)
                .map(|field| Expr::Stat(side, field))
                .ok_or_else(|| {
                    FormulaError::parse(field_position, format!("unknown stat `{}`", name))
                }),
            _ => Err(FormulaError::parse(
                field_position,
                "expected a stat name".to_string(),
            )),
        }
    }

    fn parse_call(&mut self, name: &str, position: usize) -> FormulaResult<Expr> {
        let function = Function::from_name(name).ok_or_else(|| {
            FormulaError::parse(position, format!("unknown function `{}`", name))
        })?;
        let mut args = Vec::new();
        if let Some(TokenKind::RParen) = self.peek_kind() {
            self.advance();
        } else {
            loop {
                args.push(self.parse_expr()?);
                match self.peek_kind() {
                    Some(TokenKind::Comma) => {
                        self.advance();
                    }
                    _ => {
                        self.expect(TokenKind::RParen)?;
                        break;
                    }
                }
            }
        }
        if !function.accepts(args.len()) {
            return Err(FormulaError::parse(
                position,
                format!("wrong number of arguments for `{}`", name),
            ));
        }
        Ok(Expr::Call(function, args))
    }
}

struct Context<'a> {
    a: &'a CharacterStats,
    b: &'a CharacterStats,
    entropy: &'a mut Entropy,
}

impl Context<'_> {
    fn eval(&mut self, expr: &Expr) -> FormulaResult<f64> {
        match expr {
            Expr::Number(value) => Ok(*value),
            Expr::Stat(Side::A, field) => Ok(self.a.field(*field)),
            Expr::Stat(Side::B, field) => Ok(self.b.field(*field)),
            Expr::Neg(operand) => Ok(-self.eval(operand)?),
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                match op {
                    BinOp::Add => Ok(lhs + rhs),
                    BinOp::Sub => Ok(lhs - rhs),
                    BinOp::Mul => Ok(lhs * rhs),
                    BinOp::Div => divide(lhs, rhs),
                }
            }
            Expr::Call(function, args) => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                self.call(*function, &values)
            }
        }
    }

    fn call(&mut self, function: Function, args: &[f64]) -> FormulaResult<f64> {
        let first = args[0];
        match function {
            Function::Floor => Ok(first.floor()),
            Function::Ceil => Ok(first.ceil()),
            Function::Round => Ok(first.round()),
            Function::Abs => Ok(first.abs()),
            Function::Max => Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            Function::Min => Ok(args.iter().copied().fold(f64::INFINITY, f64::min)),
            Function::Physical => self.helper(Field::Atk, Field::Def, first),
            Function::Magical => self.helper(Field::Mat, Field::Mdf, first),
            Function::Graze => {
                let value = self.helper(Field::Atk, Field::Def, first)?;
                if value <= 0.0 {
                    Ok(self.entropy.generate_int(0, 3) as f64)
                } else {
                    Ok(value)
                }
            }
        }
    }

    /// `(primary - secondary / divisor) * 2 * level`.
    fn helper(&self, primary: Field, secondary: Field, divisor: f64) -> FormulaResult<f64> {
        let reduced = divide(self.b.field(secondary), divisor)?;
        Ok((self.a.field(primary) - reduced) * 2.0 * self.a.field(Field::Level))
    }
}

fn divide(lhs: f64, rhs: f64) -> FormulaResult<f64> {
    if rhs == 0.0 {
        Err(FormulaError::DivisionByZero)
    } else {
        Ok(lhs / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::entropy::{FixedAverage, FixedHigh};

    fn stats(atk: i32, def: i32, level: i32) -> CharacterStats {
        CharacterStats {
            atk,
            def,
            level,
            ..Default::default()
        }
    }

    #[test]
    fn precedence_and_unary_minus() {
        let mut entropy = Entropy::new(FixedAverage);
        let zero = CharacterStats::default();
        let value = evaluate("-2 + 3 * (4 - 1) / 2", &zero, &zero, &mut entropy).unwrap();
        assert_eq!(value, 2.5);
        assert_eq!(evaluate("--3", &zero, &zero, &mut entropy).unwrap(), 3.0);
    }

    #[test]
    fn decimal_literals() {
        let mut entropy = Entropy::new(FixedAverage);
        let a = stats(10, 0, 1);
        let value = evaluate("a.atk * 1.5", &a, &a, &mut entropy).unwrap();
        assert_eq!(value, 15.0);
    }

    #[test]
    fn helpers() {
        let mut entropy = Entropy::new(FixedAverage);
        let a = stats(50, 0, 3);
        let b = stats(0, 40, 1);
        assert_eq!(evaluate("physical(2)", &a, &b, &mut entropy).unwrap(), 180.0);
        let weak = stats(5, 0, 3);
        assert_eq!(evaluate("physical(2)", &weak, &b, &mut entropy).unwrap(), -90.0);
        // Fallback draws from {0, 1, 2}.
        assert_eq!(evaluate("graze(2)", &weak, &b, &mut entropy).unwrap(), 1.0);
        let mut high = Entropy::new(FixedHigh);
        assert_eq!(evaluate("graze(2)", &weak, &b, &mut high).unwrap(), 2.0);
        assert_eq!(
            evaluate("graze(0)", &weak, &b, &mut entropy),
            Err(FormulaError::DivisionByZero)
        );
    }

    #[test]
    fn arity_is_checked() {
        assert!(Formula::parse("floor(1, 2)").unwrap_err().is_parse());
        assert!(Formula::parse("max()").unwrap_err().is_parse());
        assert!(Formula::parse("max(1, 2, 3)").is_ok());
    }

    #[test]
    fn scripting_is_rejected() {
        for source in &[
            "if (a.atk > 1) 2",
            "function f() { return 1 }",
            "var x = 1; x",
            "a.atk; b.def",
            "{ 1 }",
            "a.atk > b.def",
        ] {
            assert!(Formula::parse(source).unwrap_err().is_parse(), "{}", source);
        }
    }
}

// AST types for assignment expressions
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Bool(bool),
    Ident(String), // e.g. CL, A_central, t
    UnaryOp {
        op: String,
        rhs: Box<Expr>,
    },
    BinaryOp {
        lhs: Box<Expr>,
        op: String,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Num(f64),
    Bool(bool),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Op(char),
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    Ne,
    And,
    Or,
    Bang,
    Question,
    Colon,
    BadNumber(String), // e.g. 1.2.3
    Unknown(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub source: String,
    pub pos: usize,
    pub found: Option<Token>,
    pub expected: Vec<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.expected.is_empty() {
            write!(
                f,
                "parse error in '{}' at token {} found={:?} expected={:?}",
                self.source, self.pos, self.found, self.expected
            )
        } else if let Some(tok) = &self.found {
            write!(
                f,
                "parse error in '{}' at token {} found={:?}",
                self.source, self.pos, tok
            )
        } else {
            write!(
                f,
                "parse error in '{}' at token {} found=<end>",
                self.source, self.pos
            )
        }
    }
}

impl std::error::Error for ParseError {}

//! Assignment expressions
//!
//! Right-hand sides in a structural model (variable assignments, derivative
//! equations, event conditions) are kept as source text and parsed once into an
//! [`Expr`] tree. The tree is only inspected for its dependencies; evaluation is
//! left to the generated target code.

mod ast;
mod deps;
mod parser;

pub use ast::{Expr, ParseError, Token};
pub use deps::Dependencies;
pub use parser::{parse, tokenize, Parser};

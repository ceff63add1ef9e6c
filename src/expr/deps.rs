//! Dependency analysis over parsed assignment expressions
//!
//! A [`Dependencies`] value records every symbol an expression reads, and
//! separately the symbols read through a delay call such as `delay(A, tau)`.
//! Classification of structural blocks (regressors, delay-differential
//! systems) is computed from these sets.

use std::collections::BTreeSet;

use crate::expr::ast::Expr;

/// Symbols referenced by an expression
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    symbols: BTreeSet<String>,
    delayed: BTreeSet<String>,
}

impl Dependencies {
    /// Collect the dependencies of `expr`, treating calls named in
    /// `delay_functions` as delayed references.
    pub fn collect<S: AsRef<str>>(expr: &Expr, delay_functions: &[S]) -> Self {
        let mut collector = DependencyCollector {
            delay_functions,
            deps: Dependencies::default(),
            delay_depth: 0,
        };
        collector.visit(expr);
        collector.deps
    }

    /// All symbols read by the expression, delayed or not
    pub fn symbols(&self) -> &BTreeSet<String> {
        &self.symbols
    }

    /// Symbols read inside a delay call
    pub fn delayed_symbols(&self) -> &BTreeSet<String> {
        &self.delayed
    }

    /// Whether the expression reads `symbol`
    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    /// Whether the expression reads the delayed value of some symbol
    pub fn has_delay(&self) -> bool {
        !self.delayed.is_empty()
    }
}

struct DependencyCollector<'a, S> {
    delay_functions: &'a [S],
    deps: Dependencies,
    delay_depth: usize,
}

impl<S: AsRef<str>> DependencyCollector<'_, S> {
    fn is_delay(&self, name: &str) -> bool {
        self.delay_functions.iter().any(|f| f.as_ref() == name)
    }

    fn visit(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(_) | Expr::Bool(_) => {}
            Expr::Ident(name) => {
                self.deps.symbols.insert(name.clone());
                if self.delay_depth > 0 {
                    self.deps.delayed.insert(name.clone());
                }
            }
            Expr::UnaryOp { rhs, .. } => self.visit(rhs),
            Expr::BinaryOp { lhs, rhs, .. } => {
                self.visit(lhs);
                self.visit(rhs);
            }
            Expr::Call { name, args } => {
                if self.is_delay(name) {
                    // only the first argument is the lagged quantity
                    let mut args = args.iter();
                    if let Some(lagged) = args.next() {
                        self.delay_depth += 1;
                        self.visit(lagged);
                        self.delay_depth -= 1;
                    }
                    for arg in args {
                        self.visit(arg);
                    }
                } else {
                    for arg in args {
                        self.visit(arg);
                    }
                }
            }
            Expr::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                self.visit(cond);
                self.visit(then_branch);
                self.visit(else_branch);
            }
        }
    }
}

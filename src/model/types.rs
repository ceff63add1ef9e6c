//! Core type definitions for structural model declarations

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::expr::{self, Dependencies, Expr, ParseError};

// ═══════════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════════

/// A parsed assignment expression
///
/// Serialises as its source text. Deserialising parses the text, so a model
/// that loaded successfully never holds a malformed expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    /// Parse an expression from source text
    pub fn parse(source: impl Into<String>) -> Result<Self, ParseError> {
        let source = source.into();
        let ast = expr::parse(&source)?;
        Ok(Self { source, ast })
    }

    /// Get the source text
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Get the parsed tree
    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Collect the symbols this expression reads
    pub fn dependencies<S: AsRef<str>>(&self, delay_functions: &[S]) -> Dependencies {
        Dependencies::collect(&self.ast, delay_functions)
    }

    /// Check if the expression reads `symbol`
    pub fn references(&self, symbol: &str) -> bool {
        Dependencies::collect::<&str>(&self.ast, &[]).contains(symbol)
    }

    /// Check if the expression reads a symbol through one of `delay_functions`
    pub fn has_delayed_reference<S: AsRef<str>>(&self, delay_functions: &[S]) -> bool {
        self.dependencies(delay_functions).has_delay()
    }
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Expression {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<Expression> for String {
    fn from(e: Expression) -> Self {
        e.source
    }
}

impl AsRef<str> for Expression {
    fn as_ref(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Declarations
// ═══════════════════════════════════════════════════════════════════════════════

/// An algebraic variable, optionally with a defining expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub symbol_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assign: Option<Expression>,
}

impl VariableDefinition {
    pub fn new(symbol_id: impl Into<String>, assign: Option<Expression>) -> Self {
        Self {
            symbol_id: symbol_id.into(),
            assign,
        }
    }
}

/// A derivative (state) variable: `d(symbol_id)/dt = assign`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivativeVariable {
    pub symbol_id: String,

    /// Right-hand side of the differential equation
    pub assign: Expression,

    /// Initial value of the state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_condition: Option<Expression>,

    /// Time at which the initial condition applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_time: Option<Expression>,
}

impl DerivativeVariable {
    pub fn new(symbol_id: impl Into<String>, assign: Expression) -> Self {
        Self {
            symbol_id: symbol_id.into(),
            assign,
            initial_condition: None,
            initial_time: None,
        }
    }

    pub fn with_initial_condition(mut self, initial_condition: Expression) -> Self {
        self.initial_condition = Some(initial_condition);
        self
    }
}

/// A population parameter referenced by the structural model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationParameter {
    pub symbol_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assign: Option<Expression>,
}

impl PopulationParameter {
    pub fn new(symbol_id: impl Into<String>) -> Self {
        Self {
            symbol_id: symbol_id.into(),
            assign: None,
        }
    }
}

/// Any element declared in a structural model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Element {
    Variable(VariableDefinition),
    Derivative(DerivativeVariable),
    Parameter(PopulationParameter),
}

impl Element {
    /// Identifier of the declared symbol
    pub fn symbol_id(&self) -> &str {
        match self {
            Element::Variable(v) => &v.symbol_id,
            Element::Derivative(d) => &d.symbol_id,
            Element::Parameter(p) => &p.symbol_id,
        }
    }

    /// Defining expression, if any
    pub fn assignment(&self) -> Option<&Expression> {
        match self {
            Element::Variable(v) => v.assign.as_ref(),
            Element::Derivative(d) => Some(&d.assign),
            Element::Parameter(p) => p.assign.as_ref(),
        }
    }

    /// Variables and derivatives; parameters are not
    pub fn is_variable(&self) -> bool {
        !matches!(self, Element::Parameter(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Element::Variable(_) => "variable",
            Element::Derivative(_) => "derivative",
            Element::Parameter(_) => "parameter",
        }
    }
}

impl From<VariableDefinition> for Element {
    fn from(v: VariableDefinition) -> Self {
        Element::Variable(v)
    }
}

impl From<DerivativeVariable> for Element {
    fn from(d: DerivativeVariable) -> Self {
        Element::Derivative(d)
    }
}

impl From<PopulationParameter> for Element {
    fn from(p: PopulationParameter) -> Self {
        Element::Parameter(p)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Events
// ═══════════════════════════════════════════════════════════════════════════════

/// A discrete event resetting a state variable when its condition holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivativeEvent {
    /// State variable that is reset
    pub target: String,

    /// Trigger condition
    pub condition: Expression,

    /// Value assigned to the target when triggered
    pub value: Expression,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PK Macros
// ═══════════════════════════════════════════════════════════════════════════════

/// PK macro kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroKind {
    Compartment,
    Peripheral,
    Effect,
    Depot,
    Absorption,
    Oral,
    Iv,
    Elimination,
    Transfer,
}

impl std::fmt::Display for MacroKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Compartment => "compartment",
            Self::Peripheral => "peripheral",
            Self::Effect => "effect",
            Self::Depot => "depot",
            Self::Absorption => "absorption",
            Self::Oral => "oral",
            Self::Iv => "iv",
            Self::Elimination => "elimination",
            Self::Transfer => "transfer",
        };
        write!(f, "{}", name)
    }
}

/// Named macro argument, e.g. `cmt = 1` or `ka = KA`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroArgument {
    pub name: String,
    pub value: Expression,
}

/// A shorthand PK construct expanded into equations by a translator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PkMacro {
    pub kind: MacroKind,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<MacroArgument>,
}

impl PkMacro {
    pub fn new(kind: MacroKind) -> Self {
        Self {
            kind,
            arguments: Vec::new(),
        }
    }

    /// Add an argument, keeping declaration order
    pub fn with_argument(mut self, name: impl Into<String>, value: Expression) -> Self {
        self.arguments.push(MacroArgument {
            name: name.into(),
            value,
        });
        self
    }

    /// Look up an argument by name
    pub fn argument(&self, name: &str) -> Option<&Expression> {
        self.arguments
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }
}

/// Equations produced by translating a list of PK macros
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroOutput {
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,

    #[serde(default)]
    pub derivatives: Vec<DerivativeVariable>,
}

impl MacroOutput {
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.derivatives.is_empty()
    }

    /// Translated equations as declarations: variables first, then derivatives
    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.variables
            .iter()
            .cloned()
            .map(Element::Variable)
            .chain(self.derivatives.iter().cloned().map(Element::Derivative))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Model structure
// ═══════════════════════════════════════════════════════════════════════════════

/// Population (mixed-effect) or individual model structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelStructure {
    #[default]
    MixedEffect,
    Individual,
}

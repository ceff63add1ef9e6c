//! Source structural model description

use serde::{Deserialize, Serialize};

use crate::model::types::*;

fn default_independent_variable() -> String {
    "t".to_string()
}

/// A structural model as handed over by the model loader
///
/// Declarations are kept in source order; the structural block derives its
/// state vector and variable lists from that order.
///
/// # Example
///
/// ```ignore
/// use pmconvert::model::StructuralModel;
///
/// let json = r#"{
///     "id": "sm1",
///     "declarations": [
///         { "kind": "parameter", "symbol_id": "k" },
///         { "kind": "derivative", "symbol_id": "A", "assign": "-k * A" }
///     ]
/// }"#;
///
/// let model = StructuralModel::from_str(json)?;
/// assert_eq!(model.independent_variable, "t");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuralModel {
    /// Block identifier (e.g. "sm1")
    pub id: String,

    /// Symbol of the independent variable
    #[serde(default = "default_independent_variable")]
    pub independent_variable: String,

    /// Population or individual structure
    #[serde(default)]
    pub structure: ModelStructure,

    /// Declared variables, derivatives and parameters in source order
    #[serde(default)]
    pub declarations: Vec<Element>,

    /// State reset / dosing events
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<DerivativeEvent>,

    /// Symbol of the dose timing (DT) variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose_timing: Option<String>,

    /// Source PK macros
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pk_macros: Vec<PkMacro>,
}

impl StructuralModel {
    /// Create an empty model with the default independent variable
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            independent_variable: default_independent_variable(),
            structure: ModelStructure::default(),
            declarations: Vec::new(),
            events: Vec::new(),
            dose_timing: None,
            pk_macros: Vec::new(),
        }
    }

    /// Parse a JSON string into a StructuralModel
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse from a JSON Value
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Append a declaration
    pub fn declare(mut self, element: impl Into<Element>) -> Self {
        self.declarations.push(element.into());
        self
    }

    /// Append a source PK macro
    pub fn with_macro(mut self, pk_macro: PkMacro) -> Self {
        self.pk_macros.push(pk_macro);
        self
    }

    /// Find a declaration by symbol
    pub fn find(&self, symbol: &str) -> Option<&Element> {
        self.declarations.iter().find(|d| d.symbol_id() == symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let model = StructuralModel::from_str(r#"{ "id": "sm1" }"#).unwrap();
        assert_eq!(model.id, "sm1");
        assert_eq!(model.independent_variable, "t");
        assert_eq!(model.structure, ModelStructure::MixedEffect);
        assert!(model.declarations.is_empty());
    }

    #[test]
    fn test_parse_full() {
        let json = r#"{
            "id": "sm1",
            "independent_variable": "T",
            "structure": "individual",
            "declarations": [
                { "kind": "parameter", "symbol_id": "CL" },
                { "kind": "parameter", "symbol_id": "V" },
                { "kind": "variable", "symbol_id": "k", "assign": "CL / V" },
                { "kind": "variable", "symbol_id": "DT" },
                { "kind": "derivative", "symbol_id": "A", "assign": "-k * A", "initial_condition": "0" }
            ],
            "events": [
                { "target": "A", "condition": "T == DT", "value": "A + 100" }
            ],
            "dose_timing": "DT",
            "pk_macros": [
                { "kind": "compartment", "arguments": [{ "name": "cmt", "value": "1" }] }
            ]
        }"#;

        let model = StructuralModel::from_str(json).unwrap();
        assert_eq!(model.independent_variable, "T");
        assert_eq!(model.structure, ModelStructure::Individual);
        assert_eq!(model.declarations.len(), 5);
        assert_eq!(model.events.len(), 1);
        assert_eq!(model.dose_timing.as_deref(), Some("DT"));
        assert_eq!(model.pk_macros[0].kind, MacroKind::Compartment);
        assert!(matches!(model.find("A"), Some(Element::Derivative(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = StructuralModel::from_str(r#"{ "id": "sm1", "bogus": 1 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_expression_rejected() {
        let json = r#"{
            "id": "sm1",
            "declarations": [{ "kind": "variable", "symbol_id": "k", "assign": "CL / (V" }]
        }"#;
        let err = StructuralModel::from_str(json).unwrap_err();
        assert!(err.to_string().contains("parse error"));
    }

    #[test]
    fn test_json_roundtrip_preserves_order() {
        let model = StructuralModel::new("sm1")
            .declare(PopulationParameter::new("k"))
            .declare(DerivativeVariable::new(
                "A",
                Expression::parse("-k * A").unwrap(),
            ));
        let back = StructuralModel::from_str(&model.to_json().unwrap()).unwrap();
        assert_eq!(back, model);
    }
}

//! Structural blocks for pharmacometric model conversion
//!
//! A conversion run reads a model description, interprets its structural
//! model (differential equations, algebraic assignments or PK macros) and
//! emits it in a target form. This crate holds the interpreted structural
//! block: it classifies the block as a plain function, ODE or DDE system,
//! keeps the state vector in a stable order, reports regressors, and stores
//! the output of PK macro translation.
//!
//! ```ignore
//! use pmconvert::prelude::*;
//!
//! let mut block = pmconvert::load_block(json)?;
//! block.translate_pk_macros(&my_translator)?;
//! let ordered = block.declarations().to_vec();
//! block.set_ordered_variable_list(&ordered)?;
//! let ready = block.finalize()?;
//! for (slot, name) in ready.state_vector() {
//!     println!("x[{}] = {}", slot, name);
//! }
//! ```

pub mod block;
pub mod error;
pub mod expr;
pub mod model;

pub use crate::block::{
    finalize_all, BlockKind, BlockOptions, MacroTranslator, Part, ReadyBlock, StructuralBlock,
    StructuralBlockError,
};
pub use crate::model::{
    DerivativeEvent, DerivativeVariable, Element, Expression, MacroKind, MacroOutput,
    ModelStructure, PkMacro, PopulationParameter, StructuralModel, VariableDefinition,
};
pub use error::ConverterError;

/// Parse a structural model from JSON and build its block
pub fn load_block(json: &str) -> Result<StructuralBlock, ConverterError> {
    let model = StructuralModel::from_str(json)?;
    Ok(StructuralBlock::new(model)?)
}

/// Parse a structural model from JSON and build its block with the given options
pub fn load_block_with_options(
    json: &str,
    options: BlockOptions,
) -> Result<StructuralBlock, ConverterError> {
    let model = StructuralModel::from_str(json)?;
    Ok(StructuralBlock::with_options(model, options)?)
}

pub mod prelude {
    pub use crate::block::{
        finalize_all, BlockKind, BlockOptions, MacroTranslator, Part, ReadyBlock,
        StructuralBlock, StructuralBlockError,
    };
    pub use crate::error::ConverterError;
    pub use crate::model::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_block_reports_parse_errors() {
        let result = load_block(r#"{ "declarations": [] }"#);
        assert!(matches!(result, Err(ConverterError::ModelParseError(_))));
    }

    #[test]
    fn test_load_block_reports_block_errors() {
        let json = r#"{
            "id": "sm1",
            "declarations": [],
            "dose_timing": "DT"
        }"#;
        let result = load_block(json);
        assert!(matches!(
            result,
            Err(ConverterError::StructuralBlockError(
                StructuralBlockError::NotFound { .. }
            ))
        ));
    }

    #[test]
    fn test_expression_error_converts() {
        let err: ConverterError = Expression::parse("(").unwrap_err().into();
        assert!(err.to_string().starts_with("Error in expression"));
    }
}

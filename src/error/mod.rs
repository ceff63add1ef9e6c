use thiserror::Error;

use crate::block::StructuralBlockError;
use crate::expr::ParseError;

#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("Error in structural block: {0}")]
    StructuralBlockError(#[from] StructuralBlockError),
    #[error("Error in expression: {0}")]
    ExpressionError(#[from] ParseError),
    #[error("Failed to parse model description: {0}")]
    ModelParseError(#[from] serde_json::Error),
}

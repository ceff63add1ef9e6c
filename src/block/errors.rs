//! Error types for structural blocks

use thiserror::Error;

/// Errors that can occur while populating or finalising a structural block
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructuralBlockError {
    /// A name referenced by the source model does not resolve
    #[error("{kind} '{name}' not found in structural block '{block}'")]
    NotFound {
        kind: String,
        name: String,
        block: String,
    },

    /// Out-of-order mutation of the block
    #[error("Invalid state in structural block '{block}': {message}")]
    InvalidState { block: String, message: String },

    /// The ordered variable list does not match the block's declarations
    #[error("Inconsistent ordered variable list for structural block '{block}': {message}")]
    InconsistentState { block: String, message: String },

    /// Two declarations share a symbol
    #[error("Duplicate symbol '{name}' in structural block '{block}'")]
    DuplicateSymbol { name: String, block: String },

    /// The macro translator failed
    #[error("PK macro translation failed for structural block '{block}': {message}")]
    Translation { block: String, message: String },
}

impl StructuralBlockError {
    /// Create a not found error
    pub fn not_found(
        kind: impl Into<String>,
        name: impl Into<String>,
        block: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
            block: block.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(block: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidState {
            block: block.into(),
            message: message.into(),
        }
    }

    /// Create an inconsistent state error
    pub fn inconsistent(block: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InconsistentState {
            block: block.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate symbol error
    pub fn duplicate(name: impl Into<String>, block: impl Into<String>) -> Self {
        Self::DuplicateSymbol {
            name: name.into(),
            block: block.into(),
        }
    }
}

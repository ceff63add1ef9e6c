//! Finalisation of structural blocks

use rayon::prelude::*;
use std::ops::Deref;

use crate::block::{Part, StructuralBlock, StructuralBlockError};

/// A finalised structural block
///
/// This wrapper type guarantees that the contained block carries no
/// untranslated PK macros and, unless the block's options say otherwise, that
/// its ordered variable list has been set. It is what code generators consume.
#[derive(Debug, Clone)]
pub struct ReadyBlock(StructuralBlock);

impl ReadyBlock {
    /// Get the inner block
    pub fn inner(&self) -> &StructuralBlock {
        &self.0
    }

    /// Consume the wrapper and return the inner block
    pub fn into_inner(self) -> StructuralBlock {
        self.0
    }

    /// State vector slots paired with their state symbols
    pub fn state_vector(&self) -> Vec<(usize, &str)> {
        self.0
            .state_variables()
            .iter()
            .enumerate()
            .map(|(slot, s)| (slot, s.symbol_id.as_str()))
            .collect()
    }
}

impl Deref for ReadyBlock {
    type Target = StructuralBlock;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl StructuralBlock {
    /// Check the block is complete and hand it over for code generation
    pub fn finalize(self) -> Result<ReadyBlock, StructuralBlockError> {
        if self.is_using_untranslated_pk_macros() {
            return Err(StructuralBlockError::invalid_state(
                self.name(),
                "PK macros have not been translated",
            ));
        }
        if let Some(target) = self.unresolved_event_target(&[]) {
            return Err(StructuralBlockError::not_found(
                "state variable",
                target,
                self.name(),
            ));
        }
        if self.ordering.is_none() {
            if self.options.require_ordering {
                return Err(StructuralBlockError::invalid_state(
                    self.name(),
                    "ordered variable list has not been set",
                ));
            }
            tracing::warn!(
                block = %self.name(),
                "finalising without an ordered variable list, declaration order is used"
            );
        }

        tracing::debug!(
            block = %self.name(),
            kind = %self.kind(),
            states = self.state_variables.len(),
            "structural block finalised"
        );
        Ok(ReadyBlock(self))
    }
}

/// Finalise independent blocks in parallel
///
/// Each block is owned by exactly one worker. Results keep the input order.
pub fn finalize_all(
    blocks: Vec<StructuralBlock>,
) -> Vec<Result<ReadyBlock, StructuralBlockError>> {
    blocks
        .into_par_iter()
        .map(StructuralBlock::finalize)
        .collect()
}

//! Structural model declarations
//!
//! Types describing what the model loader extracts from a model description:
//! variables, derivatives, population parameters, events and PK macros, plus
//! the [`MacroOutput`] a macro translator hands back.

mod structural;
mod types;

pub use structural::StructuralModel;
pub use types::*;

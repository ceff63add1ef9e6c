//! Seam for the external PK macro translator

use crate::model::{MacroOutput, PkMacro};

/// Expands source PK macros into explicit equations
///
/// Implemented by the translation pass outside this crate. Any
/// `Fn(&[PkMacro]) -> anyhow::Result<MacroOutput>` closure works as a translator.
pub trait MacroTranslator {
    fn translate(&self, macros: &[PkMacro]) -> anyhow::Result<MacroOutput>;
}

impl<F> MacroTranslator for F
where
    F: Fn(&[PkMacro]) -> anyhow::Result<MacroOutput>,
{
    fn translate(&self, macros: &[PkMacro]) -> anyhow::Result<MacroOutput> {
        self(macros)
    }
}

//! Structural blocks
//!
//! A [`StructuralBlock`] holds the declarations of one structural model and
//! answers the questions a code generator asks before emitting target code:
//! which mathematical form the block takes, which slot each state variable
//! occupies in the state vector, and which variables depend directly on the
//! independent variable.
//!
//! # Lifecycle
//!
//! 1. The loader builds the block from a [`StructuralModel`].
//! 2. If the block uses PK macros, a [`MacroTranslator`] supplies the translated
//!    equations ([`StructuralBlock::translate_pk_macros`] or
//!    [`StructuralBlock::set_pk_macro_output`]).
//! 3. An ordering pass supplies the ordered variable list
//!    ([`StructuralBlock::set_ordered_variable_list`]).
//! 4. [`StructuralBlock::finalize`] checks the block is complete and returns a
//!    [`ReadyBlock`] for code generation.
//!
//! ```ignore
//! use pmconvert::prelude::*;
//!
//! let mut block = StructuralBlock::new(model)?;
//! let ordered = block.declarations().to_vec();
//! block.set_ordered_variable_list(&ordered)?;
//!
//! let ready = block.finalize()?;
//! assert!(ready.is_ode());
//! assert_eq!(ready.state_variable_index("A_central"), Some(0));
//! ```

mod errors;
mod options;
mod part;
mod translate;
mod validation;

pub use errors::StructuralBlockError;
pub use options::BlockOptions;
pub use part::Part;
pub use translate::MacroTranslator;
pub use validation::{finalize_all, ReadyBlock};

use std::collections::HashSet;
use std::sync::Arc;

use crate::model::*;

/// Mathematical form of a structural block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Algebraic assignments only, no state variables
    PlainFunction,
    /// Ordinary differential equations
    Ode,
    /// Differential equations reading a delayed state
    Dde,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PlainFunction => write!(f, "plain function"),
            Self::Ode => write!(f, "ode"),
            Self::Dde => write!(f, "dde"),
        }
    }
}

/// Interpreted structural block of a model
#[derive(Debug, Clone)]
pub struct StructuralBlock {
    model: Arc<StructuralModel>,
    options: BlockOptions,
    declarations: Vec<Element>,
    /// Positions into `declarations`, set once by the ordering pass
    ordering: Option<Vec<usize>>,
    local_variables: Vec<VariableDefinition>,
    parameters: Vec<PopulationParameter>,
    /// Append-only; a state's position is its slot in the state vector
    state_variables: Vec<DerivativeVariable>,
    events: Vec<DerivativeEvent>,
    dose_timing_variable: Option<VariableDefinition>,
    pk_macros: Vec<PkMacro>,
    pk_macro_output: Option<MacroOutput>,
}

impl StructuralBlock {
    /// Build a block from a source model with default options
    pub fn new(model: impl Into<Arc<StructuralModel>>) -> Result<Self, StructuralBlockError> {
        Self::with_options(model, BlockOptions::default())
    }

    /// Build a block from a source model
    ///
    /// Fails if two declarations share a symbol, if the dose timing variable
    /// is not a declared variable, or if an event targets an unknown state.
    /// Event targets of a block with PK macros are checked once the macro
    /// output is set, and again on [`StructuralBlock::finalize`].
    pub fn with_options(
        model: impl Into<Arc<StructuralModel>>,
        options: BlockOptions,
    ) -> Result<Self, StructuralBlockError> {
        let model: Arc<StructuralModel> = model.into();
        let mut block = Self {
            model: Arc::clone(&model),
            options,
            declarations: Vec::with_capacity(model.declarations.len()),
            ordering: None,
            local_variables: Vec::new(),
            parameters: Vec::new(),
            state_variables: Vec::new(),
            events: Vec::new(),
            dose_timing_variable: None,
            pk_macros: model.pk_macros.clone(),
            pk_macro_output: None,
        };

        let mut seen = HashSet::new();
        for element in &model.declarations {
            if !seen.insert(element.symbol_id()) {
                return Err(StructuralBlockError::duplicate(
                    element.symbol_id(),
                    &model.id,
                ));
            }
            block.push_declaration(element.clone());
        }

        if let Some(name) = &model.dose_timing {
            let variable = block
                .local_variables
                .iter()
                .find(|v| &v.symbol_id == name)
                .cloned()
                .ok_or_else(|| {
                    StructuralBlockError::not_found("dose timing variable", name, &model.id)
                })?;
            block.dose_timing_variable = Some(variable);
        }

        block.events = model.events.clone();
        // macro compartments only exist once the translated output arrives
        if !block.has_pk_macros() {
            if let Some(target) = block.unresolved_event_target(&[]) {
                return Err(StructuralBlockError::not_found(
                    "state variable",
                    target,
                    &model.id,
                ));
            }
        }

        tracing::debug!(
            block = %model.id,
            declarations = block.declarations.len(),
            states = block.state_variables.len(),
            macros = block.pk_macros.len(),
            "structural block loaded"
        );
        Ok(block)
    }

    fn push_declaration(&mut self, element: Element) {
        match &element {
            Element::Variable(v) => self.local_variables.push(v.clone()),
            Element::Derivative(d) => self.state_variables.push(d.clone()),
            Element::Parameter(p) => self.parameters.push(p.clone()),
        }
        self.declarations.push(element);
    }

    /// First event target that is neither a state variable nor in `pending`
    fn unresolved_event_target(&self, pending: &[DerivativeVariable]) -> Option<&str> {
        self.events
            .iter()
            .map(|e| e.target.as_str())
            .find(|&t| !self.is_state_variable(t) && !pending.iter().any(|d| d.symbol_id == t))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Late-bound setters
    // ─────────────────────────────────────────────────────────────────────────

    /// Set the ordered variable list computed by the ordering pass
    ///
    /// The list must name every declaration of the block exactly once, each
    /// equal to its declaration. It can be set only once, after any macro
    /// translation.
    pub fn set_ordered_variable_list(
        &mut self,
        ordered: &[Element],
    ) -> Result<(), StructuralBlockError> {
        if self.ordering.is_some() {
            return Err(StructuralBlockError::invalid_state(
                self.name(),
                "ordered variable list already set",
            ));
        }

        let mut ordering = Vec::with_capacity(ordered.len());
        let mut placed = vec![false; self.declarations.len()];
        for element in ordered {
            let index = self
                .declarations
                .iter()
                .position(|d| d.symbol_id() == element.symbol_id())
                .ok_or_else(|| {
                    StructuralBlockError::inconsistent(
                        self.name(),
                        format!(
                            "unknown {} '{}'",
                            element.kind_name(),
                            element.symbol_id()
                        ),
                    )
                })?;
            if self.declarations[index] != *element {
                return Err(StructuralBlockError::inconsistent(
                    self.name(),
                    format!("'{}' differs from its declaration", element.symbol_id()),
                ));
            }
            if std::mem::replace(&mut placed[index], true) {
                return Err(StructuralBlockError::inconsistent(
                    self.name(),
                    format!("'{}' listed more than once", element.symbol_id()),
                ));
            }
            ordering.push(index);
        }

        if let Some(missing) = placed.iter().position(|p| !p) {
            return Err(StructuralBlockError::inconsistent(
                self.name(),
                format!(
                    "declaration '{}' is missing",
                    self.declarations[missing].symbol_id()
                ),
            ));
        }

        tracing::debug!(block = %self.name(), variables = ordering.len(), "ordered variable list set");
        self.ordering = Some(ordering);
        Ok(())
    }

    /// Replace the source PK macros
    pub fn set_pk_macros(&mut self, macros: Vec<PkMacro>) -> Result<(), StructuralBlockError> {
        if self.pk_macro_output.is_some() {
            return Err(StructuralBlockError::invalid_state(
                self.name(),
                "source macros cannot change after translation",
            ));
        }
        self.pk_macros = macros;
        Ok(())
    }

    /// Store the translated form of the source PK macros
    ///
    /// Translated derivatives are appended after the existing state variables,
    /// so slots already handed out keep their position.
    pub fn set_pk_macro_output(&mut self, output: MacroOutput) -> Result<(), StructuralBlockError> {
        if self.pk_macros.is_empty() {
            return Err(StructuralBlockError::invalid_state(
                self.name(),
                "macro output set without source macros",
            ));
        }
        if self.pk_macro_output.is_some() {
            return Err(StructuralBlockError::invalid_state(
                self.name(),
                "macro output already set",
            ));
        }
        if self.ordering.is_some() {
            return Err(StructuralBlockError::invalid_state(
                self.name(),
                "macro output must be set before the ordered variable list",
            ));
        }

        let translated: Vec<Element> = output.elements().collect();
        let mut known: HashSet<String> =
            self.symbol_ids().into_iter().map(str::to_string).collect();
        for element in &translated {
            if !known.insert(element.symbol_id().to_string()) {
                return Err(StructuralBlockError::duplicate(
                    element.symbol_id(),
                    self.name(),
                ));
            }
        }
        if let Some(target) = self.unresolved_event_target(&output.derivatives) {
            return Err(StructuralBlockError::not_found(
                "state variable",
                target,
                self.name(),
            ));
        }

        tracing::debug!(
            block = %self.name(),
            variables = output.variables.len(),
            derivatives = output.derivatives.len(),
            "PK macro output stored"
        );
        for element in translated {
            self.push_declaration(element);
        }
        self.pk_macro_output = Some(output);
        Ok(())
    }

    /// Translate the source PK macros and store the result
    ///
    /// Does nothing when the block has no macros.
    pub fn translate_pk_macros<T>(&mut self, translator: &T) -> Result<(), StructuralBlockError>
    where
        T: MacroTranslator + ?Sized,
    {
        if !self.has_pk_macros() {
            tracing::debug!(block = %self.name(), "no PK macros to translate");
            return Ok(());
        }
        let output = translator
            .translate(&self.pk_macros)
            .map_err(|e| StructuralBlockError::Translation {
                block: self.name().to_string(),
                message: format!("{:#}", e),
            })?;
        self.set_pk_macro_output(output)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the source structural model
    pub fn model(&self) -> &StructuralModel {
        &self.model
    }

    /// Get the options the block was built with
    pub fn options(&self) -> &BlockOptions {
        &self.options
    }

    /// Symbol of the independent variable
    pub fn independent_variable(&self) -> &str {
        &self.model.independent_variable
    }

    /// Check if the element is declared in this block
    pub fn contains(&self, element: &Element) -> bool {
        self.declarations.iter().any(|d| d == element)
    }

    /// All declarations in insertion order
    pub fn declarations(&self) -> &[Element] {
        &self.declarations
    }

    /// The ordered variable list, once set
    pub fn ordered_variables(&self) -> Option<Vec<&Element>> {
        self.ordering
            .as_ref()
            .map(|ordering| ordering.iter().map(|&i| &self.declarations[i]).collect())
    }

    fn in_order(&self) -> Vec<&Element> {
        self.ordered_variables()
            .unwrap_or_else(|| self.declarations.iter().collect())
    }

    pub fn local_variables(&self) -> &[VariableDefinition] {
        &self.local_variables
    }

    pub fn parameters(&self) -> &[PopulationParameter] {
        &self.parameters
    }

    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub fn events(&self) -> &[DerivativeEvent] {
        &self.events
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn dose_timing_variable(&self) -> Option<&VariableDefinition> {
        self.dose_timing_variable.as_ref()
    }

    pub fn has_dose_timing_variable(&self) -> bool {
        self.dose_timing_variable.is_some()
    }

    pub fn pk_macros(&self) -> &[PkMacro] {
        &self.pk_macros
    }

    pub fn has_pk_macros(&self) -> bool {
        !self.pk_macros.is_empty()
    }

    /// Translated macro output; `None` until translation has happened
    pub fn pk_macro_output(&self) -> Option<&MacroOutput> {
        self.pk_macro_output.as_ref()
    }

    /// Check if the block has source macros without translated output
    pub fn is_using_untranslated_pk_macros(&self) -> bool {
        self.has_pk_macros() && self.pk_macro_output.is_none()
    }

    /// Variables whose defining expression reads the independent variable
    ///
    /// Recomputed on every call, in ordered-variable order once that is set.
    pub fn regressors(&self) -> Vec<&Element> {
        let independent = self.independent_variable();
        self.in_order()
            .into_iter()
            .filter(|e| e.is_variable())
            .filter(|e| e.assignment().is_some_and(|a| a.references(independent)))
            .collect()
    }

    /// Check if the element is a regressor
    pub fn is_regressor(&self, element: &Element) -> bool {
        self.regressors()
            .iter()
            .any(|r| r.symbol_id() == element.symbol_id())
    }

    /// State variables in state-vector order
    pub fn state_variables(&self) -> &[DerivativeVariable] {
        &self.state_variables
    }

    pub fn is_state_variable(&self, name: &str) -> bool {
        self.state_variables.iter().any(|s| s.symbol_id == name)
    }

    /// Zero-based slot of a state variable in the state vector
    pub fn state_variable_index(&self, name: &str) -> Option<usize> {
        self.state_variables.iter().position(|s| s.symbol_id == name)
    }

    /// Mathematical form of the block
    pub fn kind(&self) -> BlockKind {
        if self.state_variables.is_empty() {
            BlockKind::PlainFunction
        } else if self
            .state_variables
            .iter()
            .any(|s| self.reads_delayed_value(&s.assign))
        {
            BlockKind::Dde
        } else {
            BlockKind::Ode
        }
    }

    /// Check if `expr` reads a delayed value, directly or through the
    /// assignments of the variables it reads
    ///
    /// State symbols are leaves: reading a state reads its current value.
    fn reads_delayed_value(&self, expr: &Expression) -> bool {
        let delay_functions = self.options.delay_functions.as_slice();
        let mut visited = HashSet::new();
        let mut pending = vec![expr];
        while let Some(expr) = pending.pop() {
            let deps = expr.dependencies(delay_functions);
            if deps.has_delay() {
                return true;
            }
            for symbol in deps.symbols() {
                if !visited.insert(symbol.clone()) {
                    continue;
                }
                let assign = self
                    .declarations
                    .iter()
                    .find(|d| d.symbol_id() == symbol.as_str())
                    .filter(|d| !matches!(d, Element::Derivative(_)))
                    .and_then(Element::assignment);
                if let Some(assign) = assign {
                    pending.push(assign);
                }
            }
        }
        false
    }

    pub fn is_plain_function(&self) -> bool {
        self.kind() == BlockKind::PlainFunction
    }

    pub fn is_ode(&self) -> bool {
        self.kind() == BlockKind::Ode
    }

    pub fn is_dde(&self) -> bool {
        self.kind() == BlockKind::Dde
    }

    pub fn is_mixed_effect(&self) -> bool {
        self.model.structure == ModelStructure::MixedEffect
    }
}

impl Part for StructuralBlock {
    fn name(&self) -> &str {
        &self.model.id
    }

    fn symbol_ids(&self) -> Vec<&str> {
        self.declarations.iter().map(Element::symbol_id).collect()
    }
}

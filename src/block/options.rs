use serde::{Deserialize, Serialize};

/// Options controlling how a structural block is classified and finalised
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockOptions {
    /// Call names whose first argument is read at a lagged time
    pub delay_functions: Vec<String>,

    /// Whether finalising requires an ordered variable list
    pub require_ordering: bool,
}

impl Default for BlockOptions {
    fn default() -> Self {
        Self {
            delay_functions: vec!["delay".to_string()],
            require_ordering: true,
        }
    }
}

impl BlockOptions {
    /// Options that allow finalising a block without an ordered variable list
    pub fn relaxed() -> Self {
        Self {
            require_ordering: false,
            ..Self::default()
        }
    }

    /// Treat an additional call name as a delay function
    pub fn with_delay_function(mut self, name: impl Into<String>) -> Self {
        self.delay_functions.push(name.into());
        self
    }

    /// Parse options from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Per-statement context handed to the router alongside the logical plan
use std::collections::HashMap;

use crate::algebra::Value;

/// Session/statement state the router may consult while routing
///
/// Created fresh per statement by the caller; the router only reads it.
#[derive(Clone, Debug, Default)]
pub struct StatementContext {
    /// Bound runtime parameters, by parameter index
    parameters: HashMap<usize, Value>,
    /// True when the enclosing transaction collects routing analysis
    analyze: bool,
}

impl StatementContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a runtime parameter value
    pub fn bind_parameter(&mut self, index: usize, value: Value) {
        self.parameters.insert(index, value);
    }

    /// Look up a bound parameter value by index
    pub fn parameter_value(&self, index: usize) -> Option<&Value> {
        self.parameters.get(&index)
    }

    pub fn set_analyze(&mut self, analyze: bool) {
        self.analyze = analyze;
    }

    /// True when routing decisions should be recorded for observability
    pub fn is_analyze(&self) -> bool {
        self.analyze
    }
}

//! Evaluation Context

use crate::Registry;
use keel_core::{KeelError, Value, DEFAULT_PRECISION};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-evaluation state: the lifted variables plus the shared registry.
///
/// Each evaluation gets its own context; only the registry is shared.
pub struct EvalContext {
    pub precision: u32,
    pub variables: HashMap<String, Value>,
    pub registry: Arc<Registry>,
}

impl EvalContext {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            variables: HashMap::new(),
            registry,
        }
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_variables(mut self, vars: HashMap<String, Value>) -> Self {
        self.variables = vars;
        self
    }

    /// Look up `name`, following dots into records: `order.customer.name`
    pub fn get_var(&self, path: &[String]) -> Result<Value, KeelError> {
        let (root, fields) = path
            .split_first()
            .ok_or_else(|| KeelError::parse_error("empty variable name"))?;

        let mut current = self
            .variables
            .get(root)
            .cloned()
            .ok_or_else(|| KeelError::undefined_var(root))?;

        for field in fields {
            current = current
                .get(field)
                .map_err(|e| e.with_note(format!("while reading '{}'", path.join("."))))?;
        }
        Ok(current)
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Call `name`: a function value bound in the context takes precedence
    /// over the registry's providers
    pub fn call_function(&self, name: &str, args: Vec<Value>) -> Result<Value, KeelError> {
        if let Some(Value::Function(f)) = self.variables.get(name) {
            return f.call(args);
        }
        self.registry.call_function(name, args)
    }
}

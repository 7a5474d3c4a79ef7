//! Interpreter-internal callable

use crate::{KeelError, Value};
use std::fmt;
use std::sync::Arc;

/// Invocation entry point of a function value. Receives the raw call
/// arguments; binding and arity checks happen inside.
pub type Invoke = Arc<dyn Fn(Vec<Value>) -> Result<Value, KeelError> + Send + Sync>;

/// A callable the evaluator can apply to arguments.
///
/// Host functions reach the interpreter in this form after passing
/// through the function adapter.
#[derive(Clone)]
pub struct FunctionValue {
    name: String,
    params: Vec<String>,
    has_var_args: bool,
    invoke: Invoke,
}

impl FunctionValue {
    pub fn new(
        name: impl Into<String>,
        params: Vec<String>,
        has_var_args: bool,
        invoke: Invoke,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            has_var_args,
            invoke,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn has_var_args(&self) -> bool {
        self.has_var_args
    }

    pub fn call(&self, args: Vec<Value>) -> Result<Value, KeelError> {
        (self.invoke)(args)
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionValue({}({})", self.name, self.params.join(", "))?;
        if self.has_var_args {
            f.write_str("...")?;
        }
        f.write_str(")")
    }
}

/// Two function values are equal when they share the same callable
impl PartialEq for FunctionValue {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.invoke, &other.invoke)
    }
}

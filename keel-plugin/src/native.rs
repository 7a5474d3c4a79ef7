//! Host-supplied callables

use keel_core::{Number, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure raised by a native function body.
///
/// Bodies do not know the name they are registered under; the adapter
/// attaches it when turning this into a `KeelError`.
#[derive(Debug, Error)]
pub enum CallError {
    /// Argument at `position` has the wrong variant
    #[error("argument {}: expected {expected}, got {got}", .position + 1)]
    ArgType {
        position: usize,
        expected: &'static str,
        got: &'static str,
    },

    /// Any other host-side failure; the original error is preserved
    #[error(transparent)]
    Host(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl CallError {
    pub fn host(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        CallError::Host(err.into())
    }

    pub fn arg_type(position: usize, expected: &'static str, got: &Value) -> Self {
        CallError::ArgType {
            position,
            expected,
            got: got.type_name(),
        }
    }
}

/// Body of a native function: bound arguments in declared order
pub type NativeBody = Arc<dyn Fn(&[Value]) -> Result<Value, CallError> + Send + Sync>;

/// A host callable with its declared parameters.
///
/// Constructed once by the host and shared afterwards; cloning only
/// bumps a reference count. Bodies may run concurrently when the engine
/// is shared across threads, so they must not rely on unsynchronized
/// state.
#[derive(Clone)]
pub struct NativeFunction {
    params: Vec<String>,
    has_var_args: bool,
    body: NativeBody,
}

impl NativeFunction {
    /// Fixed-arity function: calls must supply exactly `params.len()` arguments
    pub fn new<P, F>(params: P, body: F) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        F: Fn(&[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            has_var_args: false,
            body: Arc::new(body),
        }
    }

    /// Variadic function: the last parameter receives the trailing
    /// arguments as a `Value::List`
    pub fn variadic<P, F>(params: P, body: F) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        F: Fn(&[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self {
            has_var_args: true,
            ..Self::new(params, body)
        }
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn has_var_args(&self) -> bool {
        self.has_var_args
    }

    /// Whether a call with `arg_count` arguments satisfies the declared arity
    pub fn accepts(&self, arg_count: usize) -> bool {
        if self.has_var_args {
            arg_count >= self.params.len()
        } else {
            arg_count == self.params.len()
        }
    }

    pub fn invoke(&self, args: &[Value]) -> Result<Value, CallError> {
        (self.body)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("params", &self.params)
            .field("has_var_args", &self.has_var_args)
            .finish_non_exhaustive()
    }
}

// ========== Argument helpers ==========

pub fn arg_number(args: &[Value], position: usize) -> Result<&Number, CallError> {
    match args.get(position) {
        Some(Value::Number(n)) => Ok(n),
        Some(other) => Err(CallError::arg_type(position, "Number", other)),
        None => Err(CallError::arg_type(position, "Number", &Value::Null)),
    }
}

pub fn arg_text(args: &[Value], position: usize) -> Result<&str, CallError> {
    match args.get(position) {
        Some(Value::Text(s)) => Ok(s),
        Some(other) => Err(CallError::arg_type(position, "Text", other)),
        None => Err(CallError::arg_type(position, "Text", &Value::Null)),
    }
}

pub fn arg_bool(args: &[Value], position: usize) -> Result<bool, CallError> {
    match args.get(position) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(CallError::arg_type(position, "Bool", other)),
        None => Err(CallError::arg_type(position, "Bool", &Value::Null)),
    }
}

pub fn arg_list(args: &[Value], position: usize) -> Result<&[Value], CallError> {
    match args.get(position) {
        Some(Value::List(items)) => Ok(items),
        Some(other) => Err(CallError::arg_type(position, "List", other)),
        None => Err(CallError::arg_type(position, "List", &Value::Null)),
    }
}

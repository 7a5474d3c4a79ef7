//! Adapting native functions to the interpreter's calling convention

use crate::{CallError, NativeFunction};
use keel_core::{FunctionValue, KeelError, Value};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Turns a `NativeFunction` into a `FunctionValue`.
///
/// Stateless: every call re-runs the arity check, argument binding and
/// error translation, so one adapter serves every provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionAdapter;

impl FunctionAdapter {
    /// Check the declaration of `native` and wrap it under `name`
    pub fn adapt(&self, name: &str, native: NativeFunction) -> Result<FunctionValue, KeelError> {
        Self::validate(name, &native)?;

        let params = native.params().to_vec();
        let has_var_args = native.has_var_args();
        let fn_name = name.to_string();

        let invoke = Arc::new(move |args: Vec<Value>| Self::call(&fn_name, &native, args));
        Ok(FunctionValue::new(name, params, has_var_args, invoke))
    }

    /// Apply `native` to raw call arguments
    pub fn call(name: &str, native: &NativeFunction, args: Vec<Value>) -> Result<Value, KeelError> {
        let bound = Self::bind(name, native, args)?;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| native.invoke(&bound)));
        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(CallError::ArgType { position, expected, got })) => {
                tracing::debug!(function = name, position, expected, got, "argument type mismatch");
                Err(KeelError::arg_type(name, position, expected, got))
            }
            Ok(Err(CallError::Host(cause))) => {
                tracing::debug!(function = name, error = %cause, "native function failed");
                Err(KeelError::host_failure(name, Arc::from(cause)))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::debug!(function = name, %message, "native function panicked");
                Err(KeelError::host_failure(name, Arc::new(HostPanic(message))))
            }
        }
    }

    /// Arity check, then positional binding. For variadic functions the
    /// trailing arguments are grouped into a list for the last parameter.
    fn bind(name: &str, native: &NativeFunction, mut args: Vec<Value>) -> Result<Vec<Value>, KeelError> {
        let declared = native.params().len();
        if !native.accepts(args.len()) {
            return Err(KeelError::arity_mismatch(
                name,
                declared,
                native.has_var_args(),
                args.len(),
            ));
        }

        if native.has_var_args() {
            let rest = args.split_off(declared.saturating_sub(1));
            args.push(Value::List(rest));
        }
        Ok(args)
    }

    fn validate(name: &str, native: &NativeFunction) -> Result<(), KeelError> {
        if native.has_var_args() && native.params().is_empty() {
            return Err(KeelError::invalid_function(
                name,
                "a variadic function needs a parameter to receive the trailing arguments",
            ));
        }

        let mut seen = HashSet::new();
        for param in native.params() {
            if !seen.insert(param.as_str()) {
                return Err(KeelError::invalid_function(
                    name,
                    format!("duplicate parameter '{}'", param),
                ));
            }
        }
        Ok(())
    }
}

/// A native function panicked instead of returning
#[derive(Debug)]
struct HostPanic(String);

impl std::fmt::Display for HostPanic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "panicked: {}", self.0)
    }
}

impl std::error::Error for HostPanic {}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

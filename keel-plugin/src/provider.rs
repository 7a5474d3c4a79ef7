//! Function providers

use crate::{FunctionAdapter, NativeFunction};
use keel_core::{FunctionValue, KeelError};
use std::collections::HashMap;

/// Resolves function calls to host callables.
///
/// Absence is a normal outcome: `resolve_function` returns `None` rather
/// than an error. Providers live as long as the engine and may be
/// queried from several threads at once.
pub trait FunctionProvider: Send + Sync {
    /// Look up a function by name and the number of arguments at the call site
    fn resolve_function(&self, name: &str, arg_count: usize) -> Option<NativeFunction>;

    /// Names this provider can resolve
    fn function_names(&self) -> Vec<String>;

    /// Resolve and adapt into an interpreter callable
    fn get_function(&self, name: &str, arg_count: usize) -> Option<Result<FunctionValue, KeelError>> {
        self.resolve_function(name, arg_count)
            .map(|native| FunctionAdapter.adapt(name, native))
    }
}

/// Provider backed by a name → overloads map.
///
/// Overloads under one name are told apart by arity: an exact fixed-arity
/// match wins, otherwise the variadic overload with the most fixed
/// parameters that still accepts the call. A known name called with an
/// arity no overload accepts still resolves, to its first overload, so the
/// caller sees an arity mismatch instead of an unknown function.
#[derive(Debug, Clone, Default)]
pub struct MapFunctionProvider {
    functions: HashMap<String, Vec<NativeFunction>>,
}

impl MapFunctionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function(mut self, name: impl Into<String>, function: NativeFunction) -> Self {
        self.functions.entry(name.into()).or_default().push(function);
        self
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl FunctionProvider for MapFunctionProvider {
    fn resolve_function(&self, name: &str, arg_count: usize) -> Option<NativeFunction> {
        let overloads = self.functions.get(name)?;

        overloads
            .iter()
            .find(|f| !f.has_var_args() && f.params().len() == arg_count)
            .or_else(|| {
                overloads
                    .iter()
                    .filter(|f| f.has_var_args() && f.accepts(arg_count))
                    .max_by_key(|f| f.params().len())
            })
            // no overload fits: hand back the first so the adapter reports the arity mismatch
            .or_else(|| overloads.first())
            .cloned()
    }

    fn function_names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }
}

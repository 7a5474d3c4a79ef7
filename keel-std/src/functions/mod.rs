//! Built-in functions

mod aggregate;
mod logic;
mod math;
mod text;

use keel_plugin::{FunctionProvider, MapFunctionProvider, NativeFunction};

/// Provider of the built-in functions, used when the host registers none
#[derive(Debug, Clone)]
pub struct StdFunctionProvider {
    functions: MapFunctionProvider,
}

impl StdFunctionProvider {
    pub fn new() -> Self {
        let functions = MapFunctionProvider::new();
        let functions = math::register(functions);
        let functions = aggregate::register(functions);
        let functions = text::register(functions);
        let functions = logic::register(functions);
        Self { functions }
    }
}

impl Default for StdFunctionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionProvider for StdFunctionProvider {
    fn resolve_function(&self, name: &str, arg_count: usize) -> Option<NativeFunction> {
        self.functions.resolve_function(name, arg_count)
    }

    fn function_names(&self) -> Vec<String> {
        self.functions.function_names()
    }
}

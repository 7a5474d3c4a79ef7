//! Keel Plugin System
//!
//! The extension bridge between host code and the interpreter:
//! - Native functions resolved by name and arity through providers
//! - Value mappers converting host objects to values and back
//! - The registry that orders both

mod adapter;
mod context;
mod fallback;
mod host;
mod mapper;
mod native;
mod provider;
mod registry;

pub use adapter::FunctionAdapter;
pub use context::EvalContext;
pub use fallback::DefaultValueMapper;
pub use host::HostValue;
pub use mapper::{FromValueFn, ToValueFn, ValueMapper};
pub use native::{arg_bool, arg_list, arg_number, arg_text, CallError, NativeBody, NativeFunction};
pub use provider::{FunctionProvider, MapFunctionProvider};
pub use registry::{MapperRegistry, ProviderRegistry, Registry};

/// Re-export core types for plugin authors
pub mod prelude {
    pub use crate::{
        arg_bool, arg_list, arg_number, arg_text, CallError, EvalContext, FromValueFn,
        FunctionProvider, HostValue, MapFunctionProvider, NativeFunction, Registry, ToValueFn,
        ValueMapper,
    };
    pub use keel_core::prelude::*;
}

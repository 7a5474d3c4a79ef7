//! Keel Core - Fundamental types
//!
//! This crate provides the core types shared by the interpreter and the
//! extension bridge:
//! - `Number`: Arbitrary precision decimal numbers
//! - `Value`: The closed set of runtime value variants
//! - `FunctionValue`: The interpreter's internal callable
//! - `KeelError`: Structured, recoverable failures

mod error;
mod function;
mod number;
mod value;

pub use error::{Cause, ErrorKind, KeelError};
pub use function::{FunctionValue, Invoke};
pub use number::{Number, NumberError, DEFAULT_PRECISION};
pub use value::Value;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{ErrorKind, FunctionValue, KeelError, Number, Value};
}

//! Core math functions

use keel_core::{Number, Value};
use keel_plugin::{arg_number, MapFunctionProvider, NativeFunction};

pub(crate) fn register(provider: MapFunctionProvider) -> MapFunctionProvider {
    provider
        .with_function("abs", unary(Number::abs))
        .with_function("floor", unary(Number::floor))
        .with_function("ceil", unary(Number::ceil))
}

fn unary(op: fn(&Number) -> Number) -> NativeFunction {
    NativeFunction::new(["x"], move |args| {
        let x = arg_number(args, 0)?;
        Ok(Value::Number(op(x)))
    })
}

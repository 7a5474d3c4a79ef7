//! String functions

use keel_core::{Number, Value};
use keel_plugin::{arg_list, arg_text, CallError, MapFunctionProvider, NativeFunction};

pub(crate) fn register(provider: MapFunctionProvider) -> MapFunctionProvider {
    provider
        .with_function("concat", NativeFunction::variadic(["parts"], concat))
        .with_function("upper", NativeFunction::new(["s"], |args| {
            Ok(Value::Text(arg_text(args, 0)?.to_uppercase()))
        }))
        .with_function("lower", NativeFunction::new(["s"], |args| {
            Ok(Value::Text(arg_text(args, 0)?.to_lowercase()))
        }))
        .with_function("string_length", NativeFunction::new(["s"], |args| {
            let length = arg_text(args, 0)?.chars().count();
            Ok(Value::Number(Number::from_u64(length as u64)))
        }))
}

/// Joins text parts; null parts are skipped, anything else is a type error.
/// `parts` is the only parameter, so a part's index is its argument position.
fn concat(args: &[Value]) -> Result<Value, CallError> {
    let mut out = String::new();
    for (position, part) in arg_list(args, 0)?.iter().enumerate() {
        match part {
            Value::Text(s) => out.push_str(s),
            Value::Null => {}
            other => return Err(CallError::arg_type(position, "Text", other)),
        }
    }
    Ok(Value::Text(out))
}

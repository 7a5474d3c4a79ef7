//! Aggregate functions over lists

use keel_core::{Number, Value};
use keel_plugin::{arg_list, CallError, MapFunctionProvider, NativeFunction};

pub(crate) fn register(provider: MapFunctionProvider) -> MapFunctionProvider {
    provider
        .with_function("count", NativeFunction::new(["list"], count))
        .with_function("sum", NativeFunction::variadic(["items"], sum))
}

fn count(args: &[Value]) -> Result<Value, CallError> {
    let items = arg_list(args, 0)?;
    Ok(Value::Number(Number::from_u64(items.len() as u64)))
}

/// `sum(1, 2, 3)` and `sum([1, 2, 3])` are the same call.
///
/// `items` is the only parameter, so an element's index in the group is
/// its argument position at the call site. Elements of a single list
/// argument all report that argument's position.
fn sum(args: &[Value]) -> Result<Value, CallError> {
    let group = arg_list(args, 0)?;
    let (items, flattened) = match group {
        [Value::List(inner)] => (inner.as_slice(), true),
        _ => (group, false),
    };

    let mut total = Number::from_i64(0);
    for (index, item) in items.iter().enumerate() {
        match item {
            Value::Number(n) => total = total.add(n),
            other => {
                let position = if flattened { 0 } else { index };
                return Err(CallError::arg_type(position, "Number", other));
            }
        }
    }
    Ok(Value::Number(total))
}

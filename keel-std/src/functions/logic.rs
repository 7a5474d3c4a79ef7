//! Boolean and null checks

use keel_core::Value;
use keel_plugin::{arg_bool, MapFunctionProvider, NativeFunction};

pub(crate) fn register(provider: MapFunctionProvider) -> MapFunctionProvider {
    provider
        .with_function("not", NativeFunction::new(["b"], |args| Ok(Value::Bool(!arg_bool(args, 0)?))))
        .with_function("is_null", NativeFunction::new(["x"], |args| {
            // a missing argument reads as null
            Ok(Value::Bool(args.first().map_or(true, Value::is_null)))
        }))
}

//! Keel Standard Library

pub mod functions;
mod json;

pub use functions::StdFunctionProvider;
pub use json::JsonValueMapper;

use keel_plugin::Registry;

/// Load the standard functions into a registry, after any providers
/// already registered
pub fn load_standard_library(registry: Registry) -> Registry {
    registry.with_provider(StdFunctionProvider::new())
}

/// Create registry with standard library
pub fn standard_registry() -> Registry {
    load_standard_library(Registry::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::{ErrorKind, Number, Value};
    use keel_plugin::{FunctionProvider, HostValue, MapFunctionProvider, NativeFunction};

    fn num(n: i64) -> Value {
        Value::Number(Number::from_i64(n))
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    mod function_tests {
        use super::*;

        #[test]
        fn test_math() {
            let registry = standard_registry();
            let half = Value::Number(Number::from_str("-2.5").unwrap());
            assert_eq!(registry.call_function("abs", vec![num(-5)]).unwrap(), num(5));
            assert_eq!(registry.call_function("floor", vec![half.clone()]).unwrap(), num(-3));
            assert_eq!(registry.call_function("ceil", vec![half]).unwrap(), num(-2));
        }

        #[test]
        fn test_sum_varargs_and_list() {
            let registry = standard_registry();
            assert_eq!(registry.call_function("sum", vec![num(1), num(2), num(3)]).unwrap(), num(6));
            assert_eq!(
                registry.call_function("sum", vec![Value::List(vec![num(4), num(5)])]).unwrap(),
                num(9)
            );
        }

        #[test]
        fn test_sum_rejects_text_at_position() {
            let err = standard_registry()
                .call_function("sum", vec![num(1), text("two")])
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::TypeMismatch);
            assert_eq!(err.function.as_deref(), Some("sum"));
            assert_eq!(err.position, Some(1));
        }

        #[test]
        fn test_sum_of_single_list_reports_list_position() {
            let list = Value::List(vec![num(1), text("x")]);
            let err = standard_registry().call_function("sum", vec![list]).unwrap_err();
            assert_eq!(err.kind, ErrorKind::TypeMismatch);
            assert_eq!(err.position, Some(0));
        }

        #[test]
        fn test_concat_reports_call_site_position() {
            let err = standard_registry()
                .call_function("concat", vec![text("a"), Value::Null, num(3)])
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::TypeMismatch);
            assert_eq!(err.position, Some(2));
        }

        #[test]
        fn test_count() {
            let list = Value::List(vec![num(1), Value::Null, text("x")]);
            assert_eq!(standard_registry().call_function("count", vec![list]).unwrap(), num(3));
        }

        #[test]
        fn test_text_functions() {
            let registry = standard_registry();
            assert_eq!(
                registry.call_function("concat", vec![text("a"), Value::Null, text("b")]).unwrap(),
                text("ab")
            );
            assert_eq!(registry.call_function("upper", vec![text("keel")]).unwrap(), text("KEEL"));
            assert_eq!(registry.call_function("lower", vec![text("KeEl")]).unwrap(), text("keel"));
            assert_eq!(registry.call_function("string_length", vec![text("naïve")]).unwrap(), num(5));
        }

        #[test]
        fn test_logic() {
            let registry = standard_registry();
            assert_eq!(registry.call_function("not", vec![Value::Bool(true)]).unwrap(), Value::Bool(false));
            assert_eq!(registry.call_function("is_null", vec![Value::Null]).unwrap(), Value::Bool(true));
            assert_eq!(registry.call_function("is_null", vec![num(0)]).unwrap(), Value::Bool(false));
        }

        #[test]
        fn test_is_null_invoked_without_arguments() {
            let provider = StdFunctionProvider::new();
            let is_null = provider.resolve_function("is_null", 1).unwrap();
            assert_eq!(is_null.invoke(&[]).unwrap(), Value::Bool(true));
        }

        #[test]
        fn test_wrong_arity_is_mismatch() {
            let err = standard_registry().call_function("abs", vec![num(1), num(2)]).unwrap_err();
            assert_eq!(err.kind, ErrorKind::ArityMismatch);
        }

        #[test]
        fn test_host_provider_shadows_builtin() {
            let host = MapFunctionProvider::new()
                .with_function("abs", NativeFunction::new(["x"], |_| Ok(Value::from("host"))));
            let registry = load_standard_library(Registry::new().with_provider(host));
            assert_eq!(registry.call_function("abs", vec![num(-1)]).unwrap(), Value::from("host"));
            assert!(registry.function_names().contains(&"string_length".to_string()));
        }
    }

    mod json_tests {
        use super::*;
        use serde_json::json;

        #[test]
        fn test_lift_json_document() {
            let registry = Registry::new().with_mapper(JsonValueMapper::new());
            let doc = json!({ "name": "Ada", "tags": ["x", null], "age": 36, "ratio": 0.5 });
            let value = registry.to_value(&HostValue::new(doc)).unwrap();

            assert_eq!(value.get("name").unwrap(), text("Ada"));
            assert_eq!(value.get("age").unwrap(), num(36));
            assert_eq!(value.get("tags").unwrap(), Value::List(vec![text("x"), Value::Null]));
            assert_eq!(
                value.get("ratio").unwrap(),
                Value::Number(Number::from_str("0.5").unwrap())
            );
        }

        #[test]
        fn test_lowering_is_opt_in() {
            let plain = Registry::new().with_mapper(JsonValueMapper::new());
            assert!(plain.from_value(&num(1)).unwrap().is::<Number>());

            let lowering = Registry::new().with_mapper(JsonValueMapper::new().with_priority(1).with_lowering(true));
            let list = Value::List(vec![num(1), Value::Number(Number::from_str("1.5").unwrap()), text("a")]);
            let host = lowering.from_value(&list).unwrap();
            assert_eq!(host.downcast_ref::<serde_json::Value>(), Some(&json!([1, 1.5, "a"])));
        }

        #[test]
        fn test_nested_function_cannot_be_lowered() {
            let f = keel_plugin::FunctionAdapter
                .adapt("f", NativeFunction::new(["x"], |_| Ok(Value::Null)))
                .unwrap();
            let registry = Registry::new().with_mapper(JsonValueMapper::new().with_lowering(true));
            let err = registry.from_value(&Value::List(vec![Value::Function(f)])).unwrap_err();
            assert_eq!(err.kind, ErrorKind::UnsupportedValue);
        }

        #[test]
        fn test_priority_orders_against_other_mappers() {
            let mapper = JsonValueMapper::new().with_priority(7);
            let registry = Registry::new().with_mapper(mapper);
            let names: Vec<&str> = registry.mappers().mappers().map(|m| m.name()).collect();
            assert_eq!(names, vec!["json"]);
            assert_eq!(registry.mappers().mappers().next().map(|m| m.priority()), Some(7));
        }
    }
}

//! Keel - an embeddable expression engine
//!
//! Host code extends the engine two ways: function providers make native
//! functions callable from expressions, and value mappers convert host
//! objects to values and back.

mod ast;
mod config;
mod eval;
mod parser;

pub use ast::{BinOp, Expr, UnaryOp};
pub use config::EngineConfig;
pub use eval::Evaluator;
pub use parser::parse_expr;

pub use keel_core::{ErrorKind, FunctionValue, KeelError, Number, Value};
pub use keel_plugin::{
    CallError, FunctionProvider, HostValue, MapFunctionProvider, NativeFunction, Registry, ValueMapper,
};

use keel_plugin::EvalContext;
use std::collections::HashMap;
use std::sync::Arc;

/// Main Keel engine.
///
/// Immutable once built; one engine may evaluate on many threads at once.
pub struct Engine {
    registry: Arc<Registry>,
    config: EngineConfig,
    evaluator: Evaluator,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Engine with the standard functions and no custom mappers
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Evaluate `expression` against host variables and hand the result
    /// back as a host object
    #[tracing::instrument(level = "debug", skip_all, fields(expression = %expression))]
    pub fn eval_expression(
        &self,
        expression: &str,
        variables: &HashMap<String, HostValue>,
    ) -> Result<HostValue, KeelError> {
        let value = self.eval_to_value(expression, variables)?;
        self.registry.from_value(&value)
    }

    /// Evaluate without lowering the result
    pub fn eval_to_value(
        &self,
        expression: &str,
        variables: &HashMap<String, HostValue>,
    ) -> Result<Value, KeelError> {
        let expr = parse_expr(expression)?;

        let mut lifted = HashMap::with_capacity(variables.len());
        for (name, host) in variables {
            let value = self
                .registry
                .to_value(host)
                .map_err(|e| e.with_note(format!("while reading variable '{}'", name)))?;
            lifted.insert(name.clone(), value);
        }

        let ctx = EvalContext::new(self.registry.clone())
            .with_precision(self.config.precision)
            .with_variables(lifted);

        let result = self.evaluator.eval(&expr, &ctx);
        if let Err(e) = &result {
            tracing::debug!(code = e.kind.code(), error = %e, "evaluation failed");
        }
        result
    }

    pub fn to_value(&self, host: &HostValue) -> Result<Value, KeelError> {
        self.registry.to_value(host)
    }

    pub fn from_value(&self, value: &Value) -> Result<HostValue, KeelError> {
        self.registry.from_value(value)
    }

    /// Every function name the registered providers can resolve
    pub fn function_names(&self) -> Vec<String> {
        self.registry.function_names()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects providers, mappers and settings, then builds an [`Engine`]
#[derive(Default)]
pub struct EngineBuilder {
    providers: Vec<Arc<dyn FunctionProvider>>,
    mappers: Vec<Arc<dyn ValueMapper>>,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Providers are consulted in the order they are added
    pub fn function_provider<P: FunctionProvider + 'static>(self, provider: P) -> Self {
        self.shared_function_provider(Arc::new(provider))
    }

    pub fn shared_function_provider(mut self, provider: Arc<dyn FunctionProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Mappers are consulted by priority, highest first
    pub fn value_mapper<M: ValueMapper + 'static>(self, mapper: M) -> Self {
        self.shared_value_mapper(Arc::new(mapper))
    }

    pub fn shared_value_mapper(mut self, mapper: Arc<dyn ValueMapper>) -> Self {
        self.mappers.push(mapper);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = EngineConfig {
            precision: config.precision.max(1),
            ..config
        };
        self
    }

    /// Digits kept by division; zero is treated as one
    pub fn precision(mut self, precision: u32) -> Self {
        self.config.precision = precision.max(1);
        self
    }

    pub fn suggestions(mut self, enabled: bool) -> Self {
        self.config.suggestions = enabled;
        self
    }

    pub fn std_functions(mut self, enabled: bool) -> Self {
        self.config.std_functions = enabled;
        self
    }

    pub fn build(self) -> Engine {
        let mut registry = Registry::new().with_suggestions(self.config.suggestions);

        if self.providers.is_empty() && self.config.std_functions {
            registry = keel_std::load_standard_library(registry);
        }
        for provider in self.providers {
            registry = registry.with_shared_provider(provider);
        }
        for mapper in self.mappers {
            registry = registry.with_shared_mapper(mapper);
        }

        tracing::debug!(
            providers = registry.providers().len(),
            mappers = ?registry.mappers().mappers().map(|m| m.name()).collect::<Vec<_>>(),
            precision = self.config.precision,
            "engine built"
        );

        Engine {
            registry: Arc::new(registry),
            config: self.config,
            evaluator: Evaluator::new(),
        }
    }
}

/// Build a map of host variables: `vars! { x: 5, name: "Ada" }`
#[macro_export]
macro_rules! vars {
    {} => { std::collections::HashMap::<String, $crate::HostValue>::new() };
    { $($key:ident : $value:expr),* $(,)? } => {{
        let mut map = std::collections::HashMap::new();
        $(
            map.insert(stringify!($key).to_string(), $crate::HostValue::new($value));
        )*
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_plugin::{arg_number, FromValueFn, ToValueFn};
    use std::collections::HashMap;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    }

    fn num(n: i64) -> Value {
        Value::Number(Number::from_i64(n))
    }

    // ========== Providers end to end ==========

    mod provider_tests {
        use super::*;

        fn provider_a() -> MapFunctionProvider {
            MapFunctionProvider::new().with_function(
                "bar",
                NativeFunction::new(["x"], |args| {
                    let x = arg_number(args, 0)?;
                    Ok(Value::Number(x.sub(&Number::from_i64(1))))
                }),
            )
        }

        fn provider_b() -> MapFunctionProvider {
            MapFunctionProvider::new()
                .with_function("foo", NativeFunction::new(Vec::<String>::new(), |_| Ok(Value::List(vec![]))))
        }

        fn engine() -> Engine {
            Engine::builder()
                .function_provider(provider_a())
                .function_provider(provider_b())
                .build()
        }

        #[test]
        fn test_bar_subtracts_one() {
            init_tracing();
            assert_eq!(engine().eval_to_value("bar(3)", &vars! {}).unwrap(), num(2));
        }

        #[test]
        fn test_foo_returns_empty_list() {
            assert_eq!(engine().eval_to_value("foo()", &vars! {}).unwrap(), Value::List(vec![]));
        }

        #[test]
        fn test_unknown_function_names_it() {
            let err = engine().eval_to_value("baz(1)", &vars! {}).unwrap_err();
            assert_eq!(err.kind, ErrorKind::NotFound);
            assert!(err.message.contains("baz"));
            assert!(err.to_string().starts_with("[NOT_FOUND]"));
        }

        #[test]
        fn test_wrong_arity_is_not_unknown() {
            let err = engine().eval_to_value("bar(1, 2)", &vars! {}).unwrap_err();
            assert_eq!(err.kind, ErrorKind::ArityMismatch);
        }

        #[test]
        fn test_host_variables_lifted() {
            let result = engine().eval_expression("bar(x) + 1", &vars! { x: 41_i64 }).unwrap();
            assert_eq!(result.downcast_ref::<Number>(), Some(&Number::from_i64(41)));
        }

        #[test]
        fn test_custom_providers_replace_std_functions() {
            let err = engine().eval_to_value("abs(1)", &vars! {}).unwrap_err();
            assert_eq!(err.kind, ErrorKind::NotFound);

            let with_std = Engine::builder()
                .function_provider(provider_a())
                .function_provider(keel_std::StdFunctionProvider::new())
                .build();
            assert_eq!(with_std.eval_to_value("abs(bar(0))", &vars! {}).unwrap(), num(1));
        }

        #[test]
        fn test_function_names_union() {
            let names = engine().function_names();
            assert_eq!(names, vec!["bar".to_string(), "foo".to_string()]);
        }

        #[test]
        fn test_native_function_as_variable() {
            let triple = NativeFunction::new(["x"], |args| {
                Ok(Value::Number(arg_number(args, 0)?.mul(&Number::from_i64(3))))
            });
            let result = Engine::new().eval_to_value("triple(5)", &vars! { triple: triple }).unwrap();
            assert_eq!(result, num(15));
        }
    }

    // ========== Mappers end to end ==========

    mod mapper_tests {
        use super::*;

        struct Custom {
            name: String,
        }

        /// Custom objects become their name
        struct CustomMapper;

        impl ValueMapper for CustomMapper {
            fn priority(&self) -> i32 {
                1
            }

            fn to_value(&self, host: &HostValue, _inner: ToValueFn<'_>) -> Result<Option<Value>, KeelError> {
                Ok(host.downcast_ref::<Custom>().map(|c| Value::Text(c.name.clone())))
            }
        }

        /// Numbers come back to the host as f64
        struct FloatMapper;

        impl ValueMapper for FloatMapper {
            fn from_value(&self, value: &Value, _inner: FromValueFn<'_>) -> Result<Option<HostValue>, KeelError> {
                match value {
                    Value::Number(n) => n
                        .to_f64()
                        .map(|f| Some(HostValue::new(f)))
                        .ok_or_else(|| KeelError::unsupported_value("number").with_note(n.to_string())),
                    _ => Ok(None),
                }
            }
        }

        fn engine() -> Engine {
            Engine::builder().value_mapper(CustomMapper).value_mapper(FloatMapper).build()
        }

        #[test]
        fn test_custom_and_number_lowered_to_native() {
            init_tracing();
            let engine = engine();
            let variables = vars! {
                custom: Custom { name: "foo".to_string() },
                amount: 2.5_f64,
            };

            let name = engine.eval_expression("custom", &variables).unwrap();
            assert_eq!(name.downcast_ref::<String>().map(String::as_str), Some("foo"));

            let amount = engine.eval_expression("amount * 2", &variables).unwrap();
            assert_eq!(amount.downcast_ref::<f64>(), Some(&5.0));
        }

        #[test]
        fn test_custom_value_usable_in_expressions() {
            let variables = vars! { custom: Custom { name: "foo".to_string() } };
            let result = engine().eval_expression("upper(custom) + '!'", &variables).unwrap();
            assert_eq!(result.take::<String>().unwrap(), "FOO!");
        }

        #[test]
        fn test_unsupported_variable_reports_type() {
            struct Socket;
            let err = Engine::new().eval_to_value("1", &vars! { s: Socket }).unwrap_err();
            assert_eq!(err.kind, ErrorKind::UnsupportedValue);
            assert!(err.message.contains("Socket"));
            assert!(err.notes.iter().any(|n| n.contains("'s'")));
        }

        #[test]
        fn test_json_mapper() {
            let engine = Engine::builder()
                .value_mapper(keel_std::JsonValueMapper::new().with_priority(2).with_lowering(true))
                .build();
            let order = serde_json::json!({ "total": 40, "items": ["a", "b"] });
            let result = engine
                .eval_expression("order.total + count(order.items)", &vars! { order: order })
                .unwrap();
            assert_eq!(result.downcast_ref::<serde_json::Value>(), Some(&serde_json::json!(42)));
        }
    }

    // ========== Engine ==========

    mod engine_tests {
        use super::*;

        #[test]
        fn test_precision_applies_to_division() {
            let engine = Engine::builder().precision(5).build();
            let value = engine.eval_to_value("1 / 3", &vars! {}).unwrap();
            assert_eq!(value, Value::Number(Number::from_str("0.33333").unwrap()));
        }

        #[test]
        fn test_zero_precision_divides_without_panic() {
            let engine = Engine::builder().precision(0).build();
            assert_eq!(engine.config().precision, 1);
            let value = engine.eval_to_value("1 / 3", &vars! {}).unwrap();
            assert_eq!(value, Value::Number(Number::from_str("0.3").unwrap()));

            let config = EngineConfig { precision: 0, ..EngineConfig::default() };
            let engine = Engine::builder().config(config).build();
            assert!(engine.eval_to_value("1 / 3", &vars! {}).is_ok());
        }

        #[test]
        fn test_config_from_json() {
            let config = EngineConfig::from_json(r#"{"suggestions": false}"#).unwrap();
            let engine = Engine::builder().config(config).build();
            let err = engine.eval_to_value("uper('a')", &vars! {}).unwrap_err();
            assert_eq!(err.kind, ErrorKind::NotFound);
            assert!(err.suggestion.is_none());
        }

        #[test]
        fn test_suggestions_on_by_default() {
            let err = Engine::new().eval_to_value("string('a')", &vars! {}).unwrap_err();
            assert!(err.suggestion.unwrap().contains("string_length"));
        }

        #[test]
        fn test_no_functions_when_std_disabled() {
            let engine = Engine::builder().std_functions(false).build();
            assert!(engine.function_names().is_empty());
            assert_eq!(engine.eval_to_value("2 + 2", &vars! {}).unwrap(), num(4));
        }

        #[test]
        fn test_parse_error() {
            let err = Engine::new().eval_to_value("1 +", &vars! {}).unwrap_err();
            assert_eq!(err.kind, ErrorKind::ParseError);
        }

        #[test]
        fn test_error_serializes() {
            let err = Engine::new().eval_to_value("nope", &vars! {}).unwrap_err();
            let json = serde_json::to_value(&err).unwrap();
            assert_eq!(json["kind"], "UNDEFINED_VARIABLE");
        }

        #[test]
        fn test_concurrent_evaluation() {
            let engine = Arc::new(Engine::new());
            let handles: Vec<_> = (0..8_i64)
                .map(|i| {
                    let engine = Arc::clone(&engine);
                    std::thread::spawn(move || {
                        let result = engine.eval_to_value("sum(x, 1) * 2", &vars! { x: i }).unwrap();
                        assert_eq!(result, num((i + 1) * 2));
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        }

        #[test]
        fn test_lowered_record() {
            let mut fields = HashMap::new();
            fields.insert("n".to_string(), HostValue::new(1_u8));
            let host = Engine::new().eval_expression("rec", &vars! { rec: fields }).unwrap();
            let record = host.downcast_ref::<HashMap<String, HostValue>>().unwrap();
            assert_eq!(record["n"].downcast_ref::<Number>(), Some(&Number::from_i64(1)));
        }
    }
}

//! JSON value mapper
//!
//! Lifts `serde_json::Value` host objects. Lowering into JSON is opt-in,
//! since once enabled every evaluation result comes back as JSON.

use keel_core::{KeelError, Number, Value};
use keel_plugin::{FromValueFn, HostValue, ToValueFn, ValueMapper};
use serde_json::Value as Json;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct JsonValueMapper {
    priority: i32,
    lowering: bool,
}

impl JsonValueMapper {
    pub fn new() -> Self {
        Self { priority: 0, lowering: false }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Also convert evaluation results into `serde_json::Value`
    pub fn with_lowering(mut self, enabled: bool) -> Self {
        self.lowering = enabled;
        self
    }
}

impl Default for JsonValueMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueMapper for JsonValueMapper {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn name(&self) -> &str {
        "json"
    }

    fn to_value(&self, host: &HostValue, _inner: ToValueFn<'_>) -> Result<Option<Value>, KeelError> {
        let Some(json) = host.downcast_ref::<Json>() else {
            return Ok(None);
        };
        lift(json).map(Some).map_err(|e| {
            tracing::debug!(error = %e, "json document could not be lifted");
            e
        })
    }

    fn from_value(&self, value: &Value, _inner: FromValueFn<'_>) -> Result<Option<HostValue>, KeelError> {
        // functions have no JSON form; leave them to the built-in conversions
        if !self.lowering || matches!(value, Value::Function(_)) {
            return Ok(None);
        }
        match lower(value) {
            Ok(json) => Ok(Some(HostValue::new(json))),
            Err(e) => {
                tracing::debug!(variant = value.type_name(), error = %e, "value could not be lowered to json");
                Err(e)
            }
        }
    }
}

fn lift(json: &Json) -> Result<Value, KeelError> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            let number = if let Some(i) = n.as_i64() {
                Number::from_i64(i)
            } else if let Some(u) = n.as_u64() {
                Number::from_u64(u)
            } else {
                let f = n
                    .as_f64()
                    .ok_or_else(|| KeelError::unsupported_host_value("serde_json::Number"))?;
                Number::from_f64(f)?
            };
            Value::Number(number)
        }
        Json::String(s) => Value::Text(s.clone()),
        Json::Array(items) => Value::List(items.iter().map(lift).collect::<Result<_, _>>()?),
        Json::Object(fields) => {
            let mut record = HashMap::with_capacity(fields.len());
            for (key, field) in fields {
                record.insert(key.clone(), lift(field)?);
            }
            Value::Record(record)
        }
    })
}

fn lower(value: &Value) -> Result<Json, KeelError> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => match n.to_i64() {
            Some(i) => Json::from(i),
            None => n
                .to_f64()
                .and_then(serde_json::Number::from_f64)
                .map(Json::Number)
                .ok_or_else(|| KeelError::unsupported_value("number").with_note(n.to_string()))?,
        },
        Value::Text(s) => Json::String(s.clone()),
        Value::List(items) => Json::Array(items.iter().map(lower).collect::<Result<_, _>>()?),
        Value::Record(fields) => {
            let mut object = serde_json::Map::with_capacity(fields.len());
            for (key, field) in fields {
                object.insert(key.clone(), lower(field)?);
            }
            Json::Object(object)
        }
        Value::Function(_) => return Err(KeelError::unsupported_value("function")),
    })
}

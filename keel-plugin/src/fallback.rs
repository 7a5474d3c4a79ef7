//! Built-in conversions for well-known host shapes
//!
//! Consulted after every registered mapper has declined. Inbound it
//! recognizes Rust primitives, strings, options, vectors and string-keyed
//! maps; outbound it produces the natural Rust type for each variant,
//! keeping numbers as lossless `Number`s.

use crate::mapper::{FromValueFn, ToValueFn};
use crate::{FunctionAdapter, HostValue, NativeFunction, ValueMapper};
use dashu_float::DBig;
use keel_core::{FunctionValue, KeelError, Number, Value};
use std::collections::{BTreeMap, HashMap};

/// Name given to native functions passed in as variables
const ANONYMOUS_FUNCTION: &str = "<native>";

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValueMapper;

macro_rules! lift_signed {
    ($host:expr, $($t:ty),*) => {
        $(
            if let Some(n) = $host.downcast_ref::<$t>() {
                return Ok(Some(Value::Number(Number::from_i64(*n as i64))));
            }
        )*
    };
}

macro_rules! lift_unsigned {
    ($host:expr, $($t:ty),*) => {
        $(
            if let Some(n) = $host.downcast_ref::<$t>() {
                return Ok(Some(Value::Number(Number::from_u64(*n as u64))));
            }
        )*
    };
}

impl ValueMapper for DefaultValueMapper {
    fn priority(&self) -> i32 {
        i32::MIN
    }

    fn name(&self) -> &str {
        "default"
    }

    fn to_value(&self, host: &HostValue, inner: ToValueFn<'_>) -> Result<Option<Value>, KeelError> {
        if let Some(v) = host.downcast_ref::<Value>() {
            return Ok(Some(v.clone()));
        }

        // numbers
        if let Some(n) = host.downcast_ref::<Number>() {
            return Ok(Some(Value::Number(n.clone())));
        }
        if let Some(d) = host.downcast_ref::<DBig>() {
            return Ok(Some(Value::Number(Number::from_dbig(d.clone()))));
        }
        lift_signed!(host, i8, i16, i32, i64, isize);
        lift_unsigned!(host, u8, u16, u32, u64, usize);
        if let Some(f) = host.downcast_ref::<f64>() {
            return Number::from_f64(*f).map(|n| Some(Value::Number(n))).map_err(Into::into);
        }
        if let Some(f) = host.downcast_ref::<f32>() {
            // via f32's own shortest form, so 0.1f32 stays 0.1
            let n = if f.is_finite() {
                Number::from_str(&f.to_string())
            } else {
                Number::from_f64(f64::from(*f))
            };
            return n.map(|n| Some(Value::Number(n))).map_err(Into::into);
        }

        // text and booleans
        if let Some(s) = host.downcast_ref::<String>() {
            return Ok(Some(Value::Text(s.clone())));
        }
        if let Some(s) = host.downcast_ref::<&'static str>() {
            return Ok(Some(Value::Text(s.to_string())));
        }
        if let Some(c) = host.downcast_ref::<char>() {
            return Ok(Some(Value::Text(c.to_string())));
        }
        if let Some(b) = host.downcast_ref::<bool>() {
            return Ok(Some(Value::Bool(*b)));
        }
        if host.is::<()>() {
            return Ok(Some(Value::Null));
        }

        // containers, members go back through the full mapper chain
        if let Some(opt) = host.downcast_ref::<Option<HostValue>>() {
            return match opt {
                Some(h) => inner(h).map(Some),
                None => Ok(Some(Value::Null)),
            };
        }
        if let Some(items) = host.downcast_ref::<Vec<HostValue>>() {
            let values = items.iter().map(inner).collect::<Result<Vec<_>, _>>()?;
            return Ok(Some(Value::List(values)));
        }
        if let Some(items) = host.downcast_ref::<Vec<Value>>() {
            return Ok(Some(Value::List(items.clone())));
        }
        if let Some(map) = host.downcast_ref::<HashMap<String, HostValue>>() {
            return lift_entries(map.iter(), inner).map(Some);
        }
        if let Some(map) = host.downcast_ref::<BTreeMap<String, HostValue>>() {
            return lift_entries(map.iter(), inner).map(Some);
        }
        if let Some(map) = host.downcast_ref::<HashMap<String, Value>>() {
            return Ok(Some(Value::Record(map.clone())));
        }

        // callables
        if let Some(f) = host.downcast_ref::<FunctionValue>() {
            return Ok(Some(Value::Function(f.clone())));
        }
        if let Some(native) = host.downcast_ref::<NativeFunction>() {
            let function = FunctionAdapter.adapt(ANONYMOUS_FUNCTION, native.clone())?;
            return Ok(Some(Value::Function(function)));
        }

        Ok(None)
    }

    fn from_value(&self, value: &Value, inner: FromValueFn<'_>) -> Result<Option<HostValue>, KeelError> {
        let host = match value {
            Value::Number(n) => HostValue::new(n.clone()),
            Value::Text(s) => HostValue::new(s.clone()),
            Value::Bool(b) => HostValue::new(*b),
            Value::Null => HostValue::new(()),
            Value::List(items) => {
                let lowered = items.iter().map(inner).collect::<Result<Vec<_>, _>>()?;
                HostValue::new(lowered)
            }
            Value::Record(fields) => {
                let mut lowered = HashMap::with_capacity(fields.len());
                for (key, v) in fields {
                    lowered.insert(key.clone(), inner(v)?);
                }
                HostValue::new(lowered)
            }
            Value::Function(f) => HostValue::new(f.clone()),
        };
        Ok(Some(host))
    }
}

fn lift_entries<'a>(
    entries: impl Iterator<Item = (&'a String, &'a HostValue)>,
    inner: ToValueFn<'_>,
) -> Result<Value, KeelError> {
    let mut fields = HashMap::new();
    for (key, host) in entries {
        fields.insert(key.clone(), inner(host)?);
    }
    Ok(Value::Record(fields))
}

//! Value mappers: converting between host objects and values

use crate::HostValue;
use keel_core::{KeelError, Value};

/// The registry's own inbound dispatch, for converting nested members
pub type ToValueFn<'a> = &'a dyn Fn(&HostValue) -> Result<Value, KeelError>;

/// The registry's own outbound dispatch, for converting nested members
pub type FromValueFn<'a> = &'a dyn Fn(&Value) -> Result<HostValue, KeelError>;

/// Bidirectional converter between host objects and values.
///
/// A mapper answers `Ok(None)` for anything it does not recognize so the
/// next mapper can try. `Err` means the input was recognized but could
/// not be converted, which ends the dispatch. Mappers with a higher
/// `priority` are consulted first; equal priorities keep registration
/// order.
///
/// Mappers may be called from several threads at once.
pub trait ValueMapper: Send + Sync {
    fn priority(&self) -> i32 {
        0
    }

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Lift a host object into a value
    fn to_value(&self, host: &HostValue, inner: ToValueFn<'_>) -> Result<Option<Value>, KeelError> {
        let _ = (host, inner);
        Ok(None)
    }

    /// Lower a value into a host object
    fn from_value(&self, value: &Value, inner: FromValueFn<'_>) -> Result<Option<HostValue>, KeelError> {
        let _ = (value, inner);
        Ok(None)
    }
}

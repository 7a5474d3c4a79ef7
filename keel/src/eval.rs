//! Expression evaluator

use crate::ast::{BinOp, Expr, UnaryOp};
use keel_core::{KeelError, Number, Value};
use keel_plugin::EvalContext;
use std::cmp::Ordering;

/// Tree-walking evaluator; stateless, all state lives in the context
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn eval(&self, expr: &Expr, ctx: &EvalContext) -> Result<Value, KeelError> {
        match expr {
            Expr::Number(s) => Ok(Value::Number(Number::from_str(s)?)),
            Expr::Text(s) => Ok(Value::Text(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),

            Expr::Variable(path) => ctx.get_var(path),

            Expr::FieldAccess(inner, fields) => {
                let mut current = self.eval(inner, ctx)?;
                for field in fields {
                    current = current.get(field)?;
                }
                Ok(current)
            }

            Expr::List(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List(values))
            }

            Expr::BinaryOp(left, op, right) => {
                let l = self.eval(left, ctx)?;
                let r = self.eval(right, ctx)?;
                self.eval_binary_op(l, *op, r, ctx.precision)
            }

            Expr::UnaryOp(op, inner) => {
                let v = self.eval(inner, ctx)?;
                self.eval_unary_op(*op, v)
            }

            Expr::FunctionCall(name, args) => {
                let args = args
                    .iter()
                    .map(|a| self.eval(a, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                tracing::trace!(function = %name, arg_count = args.len(), "calling function");
                ctx.call_function(name, args)
            }
        }
    }

    fn eval_binary_op(&self, left: Value, op: BinOp, right: Value, precision: u32) -> Result<Value, KeelError> {
        match op {
            BinOp::Eq => return Ok(Value::Bool(left == right)),
            BinOp::Ne => return Ok(Value::Bool(left != right)),
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let ordering = compare(&left, &right, op)?;
                let result = match op {
                    BinOp::Lt => ordering == Ordering::Less,
                    BinOp::Le => ordering != Ordering::Greater,
                    BinOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                };
                return Ok(Value::Bool(result));
            }
            _ => {}
        }

        // `+` on text concatenates
        if let (BinOp::Add, Value::Text(l), Value::Text(r)) = (op, &left, &right) {
            return Ok(Value::Text(format!("{}{}", l, r)));
        }

        let (l, r) = match (left.as_number(), right.as_number()) {
            (Some(l), Some(r)) => (l, r),
            (None, _) => return Err(operand_error(op, &left)),
            (_, None) => return Err(operand_error(op, &right)),
        };

        let result = match op {
            BinOp::Add => l.add(r),
            BinOp::Sub => l.sub(r),
            BinOp::Mul => l.mul(r),
            BinOp::Div => l.checked_div(r, precision)?,
            _ => return Err(KeelError::internal(format!("unhandled operator '{}'", op.symbol()))),
        };
        Ok(Value::Number(result))
    }

    fn eval_unary_op(&self, op: UnaryOp, value: Value) -> Result<Value, KeelError> {
        match op {
            UnaryOp::Neg => match value.as_number() {
                Some(n) => Ok(Value::Number(n.neg())),
                None => Err(KeelError::type_error("Number", value.type_name()).with_note("in unary '-'")),
            },
        }
    }
}

fn operand_error(op: BinOp, operand: &Value) -> KeelError {
    KeelError::type_error("Number", operand.type_name()).with_note(format!("in '{}'", op.symbol()))
}

/// Numbers order numerically, text lexically; nothing else is ordered
fn compare(left: &Value, right: &Value, op: BinOp) -> Result<Ordering, KeelError> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok(l.cmp(r)),
        (Value::Text(l), Value::Text(r)) => Ok(l.cmp(r)),
        _ => Err(KeelError::type_error(
            "two numbers or two texts",
            &format!("{} and {}", left.type_name(), right.type_name()),
        )
        .with_note(format!("in '{}'", op.symbol()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;
    use keel_core::ErrorKind;
    use keel_plugin::{FunctionAdapter, NativeFunction, Registry};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn ctx() -> EvalContext {
        EvalContext::new(Arc::new(keel_std::standard_registry()))
    }

    fn eval(input: &str, ctx: &EvalContext) -> Result<Value, KeelError> {
        Evaluator::new().eval(&parse_expr(input).unwrap(), ctx)
    }

    fn num(n: i64) -> Value {
        Value::Number(Number::from_i64(n))
    }

    #[test]
    fn test_arithmetic() {
        let ctx = ctx();
        assert_eq!(eval("1 + 2 * 3", &ctx).unwrap(), num(7));
        assert_eq!(eval("(1 + 2) * 3", &ctx).unwrap(), num(9));
        assert_eq!(eval("-4 + 10", &ctx).unwrap(), num(6));
        assert_eq!(eval("0.1 + 0.2", &ctx).unwrap(), Value::Number(Number::from_str("0.3").unwrap()));
    }

    #[test]
    fn test_division() {
        let ctx = ctx();
        assert_eq!(eval("10 / 4", &ctx).unwrap(), Value::Number(Number::from_str("2.5").unwrap()));
        assert_eq!(eval("1 / 0", &ctx).unwrap_err().kind, ErrorKind::DivisionByZero);
    }

    #[test]
    fn test_text_concatenation() {
        assert_eq!(eval("'a' + \"b\"", &ctx()).unwrap(), Value::from("ab"));
    }

    #[test]
    fn test_comparisons() {
        let ctx = ctx();
        assert_eq!(eval("2 < 3", &ctx).unwrap(), Value::Bool(true));
        assert_eq!(eval("3 <= 3", &ctx).unwrap(), Value::Bool(true));
        assert_eq!(eval("'b' > 'a'", &ctx).unwrap(), Value::Bool(true));
        assert_eq!(eval("1.0 = 1", &ctx).unwrap(), Value::Bool(true));
        assert_eq!(eval("null != 1", &ctx).unwrap(), Value::Bool(true));
        assert_eq!(eval("1 < 'a'", &ctx).unwrap_err().kind, ErrorKind::TypeError);
    }

    #[test]
    fn test_type_error() {
        let err = eval("1 + true", &ctx()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
    }

    #[test]
    fn test_variables_and_records() {
        let mut order = HashMap::new();
        order.insert("total".to_string(), num(40));
        let mut ctx = ctx();
        ctx.set_var("order", Value::Record(order));

        assert_eq!(eval("order.total + 2", &ctx).unwrap(), num(42));
        assert_eq!(eval("missing", &ctx).unwrap_err().kind, ErrorKind::UndefinedVariable);
    }

    #[test]
    fn test_builtin_calls() {
        let ctx = ctx();
        assert_eq!(eval("sum(1, 2, 3) + count([1, 2])", &ctx).unwrap(), num(8));
        assert_eq!(eval("upper('a') + lower('B')", &ctx).unwrap(), Value::from("Ab"));
    }

    #[test]
    fn test_function_variable_called_first() {
        let twice = NativeFunction::new(["x"], |args| {
            let x = keel_plugin::arg_number(args, 0)?;
            Ok(Value::Number(x.mul(&Number::from_i64(2))))
        });
        let mut ctx = EvalContext::new(Arc::new(Registry::new()));
        ctx.set_var("twice", Value::Function(FunctionAdapter.adapt("twice", twice).unwrap()));
        assert_eq!(eval("twice(21)", &ctx).unwrap(), num(42));
    }

    #[test]
    fn test_field_access_on_call_result() {
        let lookup = NativeFunction::new(["id"], |_| {
            let mut record = HashMap::new();
            record.insert("name".to_string(), Value::from("Ada"));
            Ok(Value::Record(record))
        });
        let registry = Registry::new()
            .with_provider(keel_plugin::MapFunctionProvider::new().with_function("lookup", lookup));
        let ctx = EvalContext::new(Arc::new(registry));
        assert_eq!(eval("lookup(1).name", &ctx).unwrap(), Value::from("Ada"));
    }

    #[test]
    fn test_argument_error_stops_evaluation() {
        let err = eval("abs('x') + 1", &ctx()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert_eq!(err.function.as_deref(), Some("abs"));
    }
}

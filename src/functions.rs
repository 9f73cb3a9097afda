use thiserror::Error;

use crate::error::EvalError;
use crate::processor::{Capability, Context, FunctionRegistry, Strategy};
use crate::value::Value;

#[derive(Debug, Error, PartialEq)]
pub enum FunctionError {
    #[error("{function} expects {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: &'static str,
        found: usize,
    },
    #[error("{function} expects numbers, got {found}")]
    TypeMismatch { function: String, found: &'static str },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in {function}")]
    Overflow { function: String },
}

impl From<FunctionError> for EvalError {
    fn from(err: FunctionError) -> Self {
        EvalError::failure(err)
    }
}

pub fn register_builtins(registry: &mut FunctionRegistry) {
    registry.register_fn("add", |args, cx| fold(cx.name(), args, i64::checked_add, |a, b| a + b));
    registry.register_fn("mul", |args, cx| fold(cx.name(), args, i64::checked_mul, |a, b| a * b));
    registry.register_fn("sub", |args, cx| {
        let [a, b] = pair(cx.name(), args)?;
        Ok(combine(cx.name(), a, b, i64::checked_sub, |a, b| a - b)?)
    });
    registry.register_fn("div", |args, cx| {
        let [a, b] = pair(cx.name(), args)?;
        Ok(divide(cx.name(), a, b)?)
    });
    registry.register_fn("concat", |args, _| {
        Ok(Value::Text(args.iter().map(Value::to_string).collect()))
    });
    registry.register_fn("eq", |args, cx| {
        let [a, b] = pair(cx.name(), args)?;
        let equal = match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        };
        Ok(Value::Boolean(equal))
    });
    registry.register("if", If);
}

/// `if(condition, then, else)`: only the chosen branch is evaluated
struct If;

impl Capability for If {
    fn strategy(&self) -> Strategy {
        Strategy::Lazy
    }

    fn execute(&self, _: Vec<Value>, cx: &Context<'_>) -> Result<Value, EvalError> {
        let [condition, then, otherwise] = cx.arguments() else {
            return Err(FunctionError::Arity {
                function: cx.name().to_string(),
                expected: "3",
                found: cx.arguments().len(),
            }
            .into());
        };
        let branch = if cx.evaluate(*condition)?.is_truthy() {
            then
        } else {
            otherwise
        };
        cx.evaluate(*branch)
    }
}

fn pair(function: &str, args: Vec<Value>) -> Result<[Value; 2], FunctionError> {
    let found = args.len();
    args.try_into().map_err(|_| FunctionError::Arity {
        function: function.to_string(),
        expected: "2",
        found,
    })
}

fn fold(
    function: &str,
    args: Vec<Value>,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    let mut args = args.into_iter();
    let Some(first) = args.next() else {
        return Err(FunctionError::Arity {
            function: function.to_string(),
            expected: "at least 1",
            found: 0,
        }
        .into());
    };
    number(function, first.clone())?;
    let mut acc = first;
    for arg in args {
        acc = combine(function, acc, arg, int, float)?;
    }
    Ok(acc)
}

/// Numeric view of an argument
#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(x) => x,
        }
    }
}

fn number(function: &str, value: Value) -> Result<Number, FunctionError> {
    match value {
        Value::Integer(i) => Ok(Number::Int(i)),
        Value::Float(x) => Ok(Number::Float(x)),
        other => Err(FunctionError::TypeMismatch {
            function: function.to_string(),
            found: other.type_name(),
        }),
    }
}

fn overflow(function: &str) -> FunctionError {
    FunctionError::Overflow {
        function: function.to_string(),
    }
}

fn combine(
    function: &str,
    a: Value,
    b: Value,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Value, FunctionError> {
    match (number(function, a)?, number(function, b)?) {
        (Number::Int(x), Number::Int(y)) => {
            int(x, y).map(Value::Integer).ok_or_else(|| overflow(function))
        }
        (x, y) => Ok(Value::Float(float(x.as_f64(), y.as_f64()))),
    }
}

/// Integer division stays integral only when exact.
fn divide(function: &str, a: Value, b: Value) -> Result<Value, FunctionError> {
    match (number(function, a)?, number(function, b)?) {
        (Number::Int(_), Number::Int(0)) => Err(FunctionError::DivisionByZero),
        (Number::Int(x), Number::Int(y)) if x.checked_rem(y) == Some(0) => {
            x.checked_div(y).map(Value::Integer).ok_or_else(|| overflow(function))
        }
        (x, y) => Ok(Value::Float(x.as_f64() / y.as_f64())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{Bindings, Evaluator};
    use crate::tokenizer::Tokenizer;
    use pretty_assertions::assert_eq;

    fn eval(source: &str) -> Result<Value, EvalError> {
        let registry = FunctionRegistry::with_builtins();
        let mut bindings = Bindings::new();
        bindings.set("yes", true).set("pi", 3.5);
        let tree = Tokenizer::new().tokenize(source).unwrap();
        Evaluator::new(&registry, &bindings).evaluate(&tree)
    }

    fn function_error(source: &str) -> FunctionError {
        match eval(source) {
            Err(EvalError::Failure(err)) => *err.downcast::<FunctionError>().unwrap(),
            other => panic!("Expected function error, got {other:?}"),
        }
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("add(1, 2)").unwrap(), Value::Integer(3));
        assert_eq!(eval("mul(2, add(3, 4))").unwrap(), Value::Integer(14));
        assert_eq!(eval("add(1, 2, 3, 4)").unwrap(), Value::Integer(10));
        assert_eq!(eval("sub(10, 4)").unwrap(), Value::Integer(6));
        assert_eq!(eval("add(1, pi)").unwrap(), Value::Float(4.5));
        assert_eq!(eval("div(9, 3)").unwrap(), Value::Integer(3));
        assert_eq!(eval("div(7, 2)").unwrap(), Value::Float(3.5));
    }

    #[test]
    fn test_concat() {
        assert_eq!(
            eval("concat('a b', 1, '-', yes)").unwrap(),
            Value::from("a b1-true")
        );
        assert_eq!(eval("concat()").unwrap(), Value::from(""));
    }

    #[test]
    fn test_eq() {
        assert_eq!(eval("eq(1, 1.0)").unwrap(), Value::Boolean(true));
        assert_eq!(eval("eq('a', 'a')").unwrap(), Value::Boolean(true));
        assert_eq!(eval("eq('1', 1)").unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_if_is_lazy() {
        assert_eq!(eval("if(yes, 'then', div(1, 0))").unwrap(), Value::from("then"));
        assert_eq!(eval("if(eq(1, 2), nope(), 'else')").unwrap(), Value::from("else"));
    }

    #[test]
    fn test_errors() {
        assert_eq!(function_error("div(1, 0)"), FunctionError::DivisionByZero);
        assert_eq!(
            function_error("add('a', 1)"),
            FunctionError::TypeMismatch {
                function: "add".to_string(),
                found: "text",
            }
        );
        assert_eq!(
            function_error("sub(1)"),
            FunctionError::Arity {
                function: "sub".to_string(),
                expected: "2",
                found: 1,
            }
        );
        assert_eq!(
            function_error("add()"),
            FunctionError::Arity {
                function: "add".to_string(),
                expected: "at least 1",
                found: 0,
            }
        );
        assert_eq!(
            function_error("mul(9223372036854775807, 2)"),
            FunctionError::Overflow {
                function: "mul".to_string(),
            }
        );
        assert_eq!(
            function_error("if(yes, 1)"),
            FunctionError::Arity {
                function: "if".to_string(),
                expected: "3",
                found: 2,
            }
        );
    }
}

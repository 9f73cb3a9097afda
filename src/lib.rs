pub mod ast;
pub mod error;
pub mod functions;
pub mod parser;
pub mod processor;
pub mod store;
pub mod tokenizer;
pub mod value;

pub use ast::{Call, Entry, TokenId};
pub use error::{Error, EvalError, ParseError};
pub use functions::FunctionError;
pub use processor::{
    Bindings, Capability, Context, Evaluator, FunctionRegistry, Strategy, Variables,
};
pub use store::{ParseTree, TokenStore};
pub use tokenizer::{Tokenizer, TokenizerConfig, normalize_whitespace};
pub use value::Value;

/// Tokenize `input` with the default configuration and evaluate the single
/// expression it holds.
pub fn evaluate(
    input: &str,
    registry: &FunctionRegistry,
    variables: &dyn Variables,
) -> Result<Value, Error> {
    let tree = Tokenizer::new().tokenize(input)?;
    Ok(Evaluator::new(registry, variables).evaluate(&tree)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_entry_point() {
        let registry = FunctionRegistry::with_builtins();
        let value = evaluate("mul(2, add(3, 4))", &registry, &Bindings::new()).unwrap();
        assert_eq!(value, Value::Integer(14));
    }

    #[test]
    fn test_evaluate_surfaces_both_error_kinds() {
        let registry = FunctionRegistry::with_builtins();
        let bindings = Bindings::new();
        assert!(matches!(
            evaluate("'abc", &registry, &bindings),
            Err(Error::Parse(ParseError::MalformedLiteral { offset: 0 }))
        ));
        assert!(matches!(
            evaluate("nope(1)", &registry, &bindings),
            Err(Error::Eval(EvalError::UnknownFunction(_)))
        ));
    }
}

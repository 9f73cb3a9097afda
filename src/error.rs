use thiserror::Error;

use crate::ast::TokenId;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("maximum function nesting level of {limit} exceeded")]
    NestingLimitExceeded { limit: usize },
    #[error("unterminated string literal starting at byte {offset}")]
    MalformedLiteral { offset: usize },
    #[error("malformed expression near `{fragment}`")]
    MalformedExpression { fragment: String },
    #[error("`{0}` cannot be used as an argument delimiter")]
    InvalidDelimiter(char),
}

#[derive(Debug, Error)]
pub enum EvalError {
    /// The parse tree refers to a token its store never issued.
    #[error("token {0} has no entry in the token store")]
    UnresolvedToken(TokenId),
    #[error("no value for variable `{0}`")]
    UnresolvedVariable(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("expected a single expression, found {found}")]
    ExpectedSingleValue { found: usize },
    /// Error reported by a capability itself, kept as the `source`
    #[error("{0}")]
    Failure(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl EvalError {
    pub fn failure(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        EvalError::Failure(err.into())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

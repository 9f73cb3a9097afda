use std::fmt;

/// Identifier issued by a [`TokenStore`](crate::store::TokenStore) for one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub(crate) usize);

impl TokenId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structured data stored under a token
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// Content of a quoted region, quotes stripped
    Literal(String),
    /// Bare identifier or number, resolved at evaluation time
    Variable(String),
    /// Function call
    Call(Call),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<TokenId>,
}

impl Entry {
    /// Tokens this entry refers to.
    pub fn children(&self) -> &[TokenId] {
        match self {
            Entry::Call(call) => &call.args,
            Entry::Literal(_) | Entry::Variable(_) => &[],
        }
    }
}

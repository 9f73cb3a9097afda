use std::fmt;

use crate::ast::{Call, Entry, TokenId};

/// Append-only mapping from tokens to entries.
///
/// Tokens are indices into the store, so a token is never reissued and an
/// entry is never replaced once inserted.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TokenStore(Vec<Entry>);

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: Entry) -> TokenId {
        let id = TokenId(self.0.len());
        self.0.push(entry);
        id
    }

    pub fn literal(&mut self, text: impl Into<String>) -> TokenId {
        self.insert(Entry::Literal(text.into()))
    }

    pub fn variable(&mut self, name: impl Into<String>) -> TokenId {
        self.insert(Entry::Variable(name.into()))
    }

    pub fn call(&mut self, name: impl Into<String>, args: Vec<TokenId>) -> TokenId {
        self.insert(Entry::Call(Call {
            name: name.into(),
            args,
        }))
    }

    pub fn get(&self, id: TokenId) -> Option<&Entry> {
        self.0.get(id.0)
    }

    pub fn contains(&self, id: TokenId) -> bool {
        id.0 < self.0.len()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in issue order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &Entry)> {
        self.0.iter().enumerate().map(|(i, e)| (TokenId(i), e))
    }
}

/// Fully tokenized expression: the store plus its top-level tokens
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTree {
    store: TokenStore,
    roots: Vec<TokenId>,
}

impl ParseTree {
    pub fn new(store: TokenStore, roots: Vec<TokenId>) -> Self {
        Self { store, roots }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn roots(&self) -> &[TokenId] {
        &self.roots
    }

    pub fn into_parts(self) -> (TokenStore, Vec<TokenId>) {
        (self.store, self.roots)
    }

    /// Returns the first token referenced by the tree but missing from its store.
    pub fn validate(&self) -> Result<(), TokenId> {
        let dangling = self
            .roots
            .iter()
            .chain(self.store.iter().flat_map(|(_, entry)| entry.children()))
            .find(|id| !self.store.contains(**id));

        match dangling {
            Some(id) => Err(*id),
            None => Ok(()),
        }
    }

    fn render(&self, id: TokenId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.store.get(id) {
            Some(Entry::Literal(text)) => write!(f, "'{text}'"),
            Some(Entry::Variable(name)) => f.write_str(name),
            Some(Entry::Call(call)) => {
                write!(f, "{}(", call.name)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    self.render(*arg, f)?;
                }
                f.write_str(")")
            }
            None => write!(f, "{id}"),
        }
    }
}

/// Renders canonical source: single spaces, `, ` between arguments.
impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, root) in self.roots.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            self.render(*root, f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_issued_in_order() {
        let mut store = TokenStore::new();
        let a = store.literal("a");
        let b = store.variable("b");
        assert_ne!(a, b);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(store.get(a), Some(&Entry::Literal("a".to_string())));
        assert_eq!(store.get(b), Some(&Entry::Variable("b".to_string())));
    }

    #[test]
    fn test_validate_finds_dangling_argument() {
        let mut other = TokenStore::new();
        other.literal("x");
        let foreign = other.literal("y");

        let mut store = TokenStore::new();
        let call = store.call("f", vec![foreign]);
        let tree = ParseTree::new(store, vec![call]);
        assert_eq!(tree.validate(), Err(foreign));
    }

    #[test]
    fn test_display_renders_canonical_source() {
        let mut store = TokenStore::new();
        let text = store.literal("a b");
        let two = store.variable("2");
        let inner = store.call("mul", vec![two, text]);
        let one = store.variable("1");
        let outer = store.call("add", vec![one, inner]);
        let tree = ParseTree::new(store, vec![outer]);

        assert_eq!(tree.validate(), Ok(()));
        assert_eq!(tree.to_string(), "add(1, mul(2, 'a b'))");
    }
}

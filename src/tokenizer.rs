use log::{debug, trace};

use crate::ast::TokenId;
use crate::error::ParseError;
use crate::parser::{Lexeme, SourceParser};
use crate::store::{ParseTree, TokenStore};

pub const DEFAULT_MAX_DEPTH: usize = 20;
pub const DEFAULT_DELIMITER: char = ',';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Maximum number of nested call levels
    pub max_depth: usize,
    /// Separator between call arguments
    pub delimiter: char,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl TokenizerConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn validate(&self) -> Result<(), ParseError> {
        let d = self.delimiter;
        if d.is_whitespace() || matches!(d, '(' | ')' | '\'') {
            return Err(ParseError::InvalidDelimiter(d));
        }
        Ok(())
    }
}

/// Collapse every run of whitespace into a single space.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Unit of the working buffer.
///
/// Resolved constructs are held as tokens rather than spliced back in as
/// text, so generated tokens can never be re-matched as syntax.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Item {
    Char(char),
    Token(TokenId),
}

/// Innermost call found in one pass; indices into the working buffer
#[derive(Debug)]
struct Match {
    name_start: usize,
    open: usize,
    close: usize,
}

/// Turns expression source into a [`ParseTree`].
///
/// Holds configuration only; every [`tokenize`](Tokenizer::tokenize) call
/// builds its own store and nesting counter.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TokenizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    pub fn tokenize(&self, input: &str) -> Result<ParseTree, ParseError> {
        self.config.validate()?;

        let mut run = Run {
            config: &self.config,
            store: TokenStore::new(),
            depth: 0,
        };
        let items = run.mask_literals(input)?;
        let items = run.resolve_calls(items)?;
        let roots = run.split_top_level(&items)?;

        let tree = ParseTree::new(run.store, roots);
        debug_assert_eq!(tree.validate(), Ok(()));
        debug!(
            "tokenized {} bytes into {} tokens: {}",
            input.len(),
            tree.store().len(),
            tree
        );
        Ok(tree)
    }
}

/// State of a single tokenize call
struct Run<'c> {
    config: &'c TokenizerConfig,
    store: TokenStore,
    depth: usize,
}

impl Run<'_> {
    /// Register quoted regions as literals and normalize whitespace in the
    /// text between them.
    fn mask_literals(&mut self, input: &str) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::with_capacity(input.len());
        for lexeme in SourceParser::scan(input)? {
            match lexeme {
                Lexeme::Text(text) => {
                    items.extend(normalize_whitespace(text).chars().map(Item::Char))
                }
                Lexeme::Literal(content) => items.push(Item::Token(self.store.literal(content))),
            }
        }
        Ok(items)
    }

    /// Resolve calls innermost first, one nesting level per pass.
    ///
    /// Every pass counts against the limit, including the last one that
    /// finds nothing, so `max_depth` levels of nesting already fail.
    fn resolve_calls(&mut self, mut items: Vec<Item>) -> Result<Vec<Item>, ParseError> {
        loop {
            if self.depth >= self.config.max_depth {
                return Err(ParseError::NestingLimitExceeded {
                    limit: self.config.max_depth,
                });
            }
            self.depth += 1;

            let matches = find_innermost_calls(&items);
            if matches.is_empty() {
                return Ok(items);
            }
            trace!("pass {}: {} call(s)", self.depth, matches.len());

            let mut next = Vec::with_capacity(items.len());
            let mut cursor = 0;
            for m in matches {
                next.extend_from_slice(&items[cursor..m.name_start]);
                let name: String = items[m.name_start..m.open]
                    .iter()
                    .filter_map(|item| match item {
                        Item::Char(c) => Some(*c),
                        Item::Token(_) => None,
                    })
                    .collect();
                let args = self.split_arguments(&items[m.open + 1..m.close])?;
                trace!("call {name} with {} argument(s)", args.len());
                next.push(Item::Token(self.store.call(name, args)));
                cursor = m.close + 1;
            }
            next.extend_from_slice(&items[cursor..]);
            items = next;
        }
    }

    /// Split one call's argument items at the delimiter.
    fn split_arguments(&mut self, items: &[Item]) -> Result<Vec<TokenId>, ParseError> {
        if items.iter().all(|item| is_space(*item)) {
            return Ok(Vec::new());
        }
        let delimiter = self.config.delimiter;
        items
            .split(|item| *item == Item::Char(delimiter))
            .map(|piece| self.resolve_piece(trim(piece)))
            .collect()
    }

    /// Split what remains after call resolution into top-level tokens.
    fn split_top_level(&mut self, items: &[Item]) -> Result<Vec<TokenId>, ParseError> {
        items
            .split(|item| is_space(*item))
            .filter(|piece| !piece.is_empty())
            .map(|piece| self.resolve_piece(piece))
            .collect()
    }

    /// A lone token is kept; plain text, even empty, becomes a variable.
    fn resolve_piece(&mut self, piece: &[Item]) -> Result<TokenId, ParseError> {
        if let [Item::Token(id)] = piece {
            return Ok(*id);
        }

        let mut name = String::with_capacity(piece.len());
        for item in piece {
            match item {
                Item::Char(c) if !self.is_reserved(*c) => name.push(*c),
                _ => {
                    return Err(ParseError::MalformedExpression {
                        fragment: render(piece),
                    });
                }
            }
        }
        Ok(self.store.variable(name))
    }

    fn is_reserved(&self, c: char) -> bool {
        matches!(c, '(' | ')') || c == self.config.delimiter
    }
}

/// Find every identifier directly followed by a parenthesized group that
/// holds no other parentheses.
fn find_innermost_calls(items: &[Item]) -> Vec<Match> {
    let mut matches = Vec::new();
    let mut open = None;
    for (i, item) in items.iter().enumerate() {
        match item {
            Item::Char('(') => open = Some(i),
            Item::Char(')') => {
                if let Some(start) = open.take() {
                    if let Some(name_start) = identifier_before(items, start) {
                        matches.push(Match {
                            name_start,
                            open: start,
                            close: i,
                        });
                    }
                }
            }
            _ => {}
        }
    }
    matches
}

/// Start of the identifier ending right before `end`, if there is one.
fn identifier_before(items: &[Item], end: usize) -> Option<usize> {
    let mut start = end;
    while start > 0 {
        match items[start - 1] {
            Item::Char(c) if c.is_ascii_alphanumeric() || c == '_' => start -= 1,
            _ => break,
        }
    }
    // `[A-Za-z_][A-Za-z0-9_]*`: skip leading digits
    while start < end && matches!(items[start], Item::Char(c) if c.is_ascii_digit()) {
        start += 1;
    }
    (start < end).then_some(start)
}

fn is_space(item: Item) -> bool {
    item == Item::Char(' ')
}

fn trim(mut piece: &[Item]) -> &[Item] {
    while let [first, rest @ ..] = piece {
        if !is_space(*first) {
            break;
        }
        piece = rest;
    }
    while let [rest @ .., last] = piece {
        if !is_space(*last) {
            break;
        }
        piece = rest;
    }
    piece
}

fn render(piece: &[Item]) -> String {
    piece
        .iter()
        .map(|item| match item {
            Item::Char(c) => c.to_string(),
            Item::Token(id) => id.to_string(),
        })
        .collect()
}

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::error::ParseError;

#[derive(Parser)]
#[grammar = "source.pest"]
pub struct SourceParser;

/// Piece of raw source, before any structural parsing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lexeme<'a> {
    /// Text outside quotes
    Text(&'a str),
    /// Quoted content, quotes stripped
    Literal(&'a str),
}

impl SourceParser {
    /// Split source into plain text and quoted literals.
    ///
    /// A quote without a closing partner fails with
    /// [`ParseError::MalformedLiteral`] at the offset of the opening quote.
    pub fn scan(input: &str) -> Result<Vec<Lexeme<'_>>, ParseError> {
        let mut pairs = SourceParser::parse(Rule::source, input).map_err(|e| {
            ParseError::MalformedExpression {
                fragment: e.to_string(),
            }
        })?;
        let Some(source) = pairs.next() else {
            return Ok(Vec::new());
        };

        source
            .into_inner()
            .filter_map(|pair| Self::lexeme(pair).transpose())
            .collect()
    }

    fn lexeme(pair: Pair<'_, Rule>) -> Result<Option<Lexeme<'_>>, ParseError> {
        match pair.as_rule() {
            Rule::text => Ok(Some(Lexeme::Text(pair.as_str()))),
            Rule::literal => {
                let content = pair.into_inner().next().map_or("", |p| p.as_str());
                Ok(Some(Lexeme::Literal(content)))
            }
            Rule::unterminated => Err(ParseError::MalformedLiteral {
                offset: pair.as_span().start(),
            }),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scan_plain_text() {
        let lexemes = SourceParser::scan("add(1, 2)").unwrap();
        assert_eq!(lexemes, vec![Lexeme::Text("add(1, 2)")]);
    }

    #[test]
    fn test_scan_literal() {
        let lexemes = SourceParser::scan("greet('hello world')").unwrap();
        assert_eq!(
            lexemes,
            vec![
                Lexeme::Text("greet("),
                Lexeme::Literal("hello world"),
                Lexeme::Text(")"),
            ]
        );
    }

    #[test]
    fn test_scan_literal_spans_lines() {
        let lexemes = SourceParser::scan("f('a\nb', 'c')").unwrap();
        assert_eq!(
            lexemes,
            vec![
                Lexeme::Text("f("),
                Lexeme::Literal("a\nb"),
                Lexeme::Text(", "),
                Lexeme::Literal("c"),
                Lexeme::Text(")"),
            ]
        );
    }

    #[test]
    fn test_scan_empty_literal() {
        let lexemes = SourceParser::scan("''").unwrap();
        assert_eq!(lexemes, vec![Lexeme::Literal("")]);
    }

    #[test]
    fn test_scan_call_syntax_inside_literal() {
        let lexemes = SourceParser::scan("'add(1, 2)'").unwrap();
        assert_eq!(lexemes, vec![Lexeme::Literal("add(1, 2)")]);
    }

    #[test]
    fn test_scan_unterminated_literal() {
        assert_eq!(
            SourceParser::scan("'abc"),
            Err(ParseError::MalformedLiteral { offset: 0 })
        );
        assert_eq!(
            SourceParser::scan("f('a', 'b)"),
            Err(ParseError::MalformedLiteral { offset: 7 })
        );
    }

    #[test]
    fn test_scan_empty_input() {
        assert_eq!(SourceParser::scan("").unwrap(), Vec::new());
    }
}

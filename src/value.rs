use std::fmt;

/// Result of evaluating a token
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            Value::Text(_) | Value::Boolean(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(i) => *i != 0,
            Value::Float(x) => *x != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
        }
    }

    /// Reads a bare numeric word, integers first.
    pub fn parse_number(word: &str) -> Option<Value> {
        if let Ok(i) = word.parse::<i64>() {
            return Some(Value::Integer(i));
        }
        word.parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(Value::Float)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(Value::parse_number("42"), Some(Value::Integer(42)));
        assert_eq!(Value::parse_number("-3"), Some(Value::Integer(-3)));
        assert_eq!(Value::parse_number("2.5"), Some(Value::Float(2.5)));
        assert_eq!(Value::parse_number("inf"), None);
        assert_eq!(Value::parse_number("x1"), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::from(1).is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("no").is_truthy());
        assert!(!Value::from(false).is_truthy());
    }
}

use crate::canonical::{PrintOptions, Printer};
use crate::node::Node;
use std::fmt::Display;

/// One element of a node's value list.
///
/// Nested arrays and objects only occur as elements of an array; a named
/// object is a child node, never a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    /// A sub-array written inside an array, e.g. the `[1, 2]` in `a = [[1, 2], 3]`.
    Array(Node),
    /// An object written inside an array, e.g. `servers = [{ host = "a" }]`.
    Object(Node),
}

impl Value {
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// Integers only; floats are not truncated.
    pub fn to_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn to_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Booleans, plus the strings `1 t T TRUE true True` and `0 f F FALSE false False`.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::String(s) => parse_bool(s),
            _ => None,
        }
    }

    /// The text form of any scalar. Nested elements render canonically.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Array(node) | Value::Object(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut Node> {
        match self {
            Value::Array(node) | Value::Object(node) => Some(node),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Bool(_) => "Bool",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Object(_) => "Object",
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Strings display unquoted; everything else displays as it would be printed.
impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(_) | Value::Object(_) => {
                Printer::new(f, &PrintOptions::default()).value(self, 0)
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_does_not_come_from_float() {
        assert_eq!(Value::Int(7).to_int(), Some(7));
        assert_eq!(Value::Float(7.5).to_int(), None);
        assert_eq!(Value::from("7").to_int(), None);
    }

    #[test]
    fn test_float_widens_int() {
        assert_eq!(Value::Int(3).to_float(), Some(3.0));
        assert_eq!(Value::Float(0.25).to_float(), Some(0.25));
        assert_eq!(Value::Bool(true).to_float(), None);
    }

    #[test]
    fn test_bool_coercion_from_strings() {
        for yes in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(Value::from(yes).to_bool(), Some(true), "{yes}");
        }
        for no in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(Value::from(no).to_bool(), Some(false), "{no}");
        }
        assert_eq!(Value::from("yes").to_bool(), None);
        assert_eq!(Value::Int(1).to_bool(), None);
    }

    #[test]
    fn test_text_form() {
        assert_eq!(Value::Int(-12).to_text(), "-12");
        assert_eq!(Value::Float(2.5).to_text(), "2.5");
        assert_eq!(Value::Bool(false).to_text(), "false");
        assert_eq!(Value::from("plain").to_text(), "plain");
        let nested = Value::Array(Node::with_value(1));
        assert_eq!(nested.to_text(), "[ 1 ]");
    }
}

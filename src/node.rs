use crate::error::AclError;
use crate::value::Value;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use indexmap::IndexMap;

/// A point in the configuration tree.
///
/// A node either holds an ordered list of values or an ordered map of named
/// children, never both. A fresh node holds neither and can become either.
/// Nodes carry no name of their own; the key in the parent's map is the name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub values: Vec<Value>,
    pub children: IndexMap<String, Node>,
    /// Set when the source for this node spanned several lines. Only the
    /// canonical printer reads it.
    pub multiline: bool,
    /// Whether `=` (rather than `:`) introduced this node in the source.
    pub uses_equals: bool,
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    /// A leaf holding a single value.
    pub fn with_value(value: impl Into<Value>) -> Self {
        Self {
            values: vec![value.into()],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.children.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        !self.values.is_empty()
    }

    /// Number of values held by this node.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the node holds more than one value.
    pub fn is_array(&self) -> bool {
        self.values.len() > 1
    }

    /// Walks `names` through named children. Returns `None` when a step is
    /// missing or runs through a node that holds values.
    pub fn child(&self, names: &[&str]) -> Option<&Node> {
        let mut node = self;
        for name in names {
            if node.is_leaf() {
                return None;
            }
            node = node.children.get(*name)?;
        }
        Some(node)
    }

    pub fn child_mut(&mut self, names: &[&str]) -> Option<&mut Node> {
        let mut node = self;
        for name in names {
            if node.is_leaf() {
                return None;
            }
            node = node.children.get_mut(*name)?;
        }
        Some(node)
    }

    /// Named children in the order their keys were first introduced.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// The value at `ix`; negative indexes count back from the end.
    pub fn value_at(&self, ix: isize) -> Option<&Value> {
        let len = self.values.len() as isize;
        let ix = if ix < 0 { len + ix } else { ix };
        if ix < 0 || ix >= len {
            return None;
        }
        self.values.get(ix as usize)
    }

    // Positional projections. The plain `as_*` forms read the last value so that
    // a later `key = x` overrides an earlier one.

    pub fn as_int_n(&self, ix: isize) -> i64 {
        self.value_at(ix).and_then(Value::to_int).unwrap_or(0)
    }

    pub fn as_float_n(&self, ix: isize) -> f64 {
        self.value_at(ix).and_then(Value::to_float).unwrap_or(0.0)
    }

    pub fn as_string_n(&self, ix: isize) -> String {
        self.value_at(ix).map(Value::to_text).unwrap_or_default()
    }

    pub fn as_bool_n(&self, ix: isize) -> bool {
        self.value_at(ix).and_then(Value::to_bool).unwrap_or(false)
    }

    pub fn as_int(&self) -> i64 {
        self.as_int_n(-1)
    }

    pub fn as_float(&self) -> f64 {
        self.as_float_n(-1)
    }

    pub fn as_string(&self) -> String {
        self.as_string_n(-1)
    }

    pub fn as_bool(&self) -> bool {
        self.as_bool_n(-1)
    }

    pub fn first_as_int(&self) -> i64 {
        self.as_int_n(0)
    }

    pub fn first_as_float(&self) -> f64 {
        self.as_float_n(0)
    }

    pub fn first_as_string(&self) -> String {
        self.as_string_n(0)
    }

    pub fn first_as_bool(&self) -> bool {
        self.as_bool_n(0)
    }

    // Child projections. An absent child reads as the zero value.

    pub fn child_as_int(&self, names: &[&str]) -> i64 {
        self.child(names).map_or(0, Node::as_int)
    }

    pub fn child_as_float(&self, names: &[&str]) -> f64 {
        self.child(names).map_or(0.0, Node::as_float)
    }

    pub fn child_as_string(&self, names: &[&str]) -> String {
        self.child(names).map(Node::as_string).unwrap_or_default()
    }

    pub fn child_as_bool(&self, names: &[&str]) -> bool {
        self.child(names).is_some_and(Node::as_bool)
    }

    pub fn child_as_int_list(&self, names: &[&str]) -> Vec<i64> {
        self.project_list(names, |v| v.to_int().unwrap_or(0))
    }

    pub fn child_as_float_list(&self, names: &[&str]) -> Vec<f64> {
        self.project_list(names, |v| v.to_float().unwrap_or(0.0))
    }

    pub fn child_as_string_list(&self, names: &[&str]) -> Vec<String> {
        self.project_list(names, Value::to_text)
    }

    pub fn child_as_bool_list(&self, names: &[&str]) -> Vec<bool> {
        self.project_list(names, |v| v.to_bool().unwrap_or(false))
    }

    /// Each integer value truncated to its low byte.
    pub fn child_as_byte_list(&self, names: &[&str]) -> Vec<u8> {
        self.project_list(names, |v| v.to_int().unwrap_or(0) as u8)
    }

    /// Decodes the first value as URL-safe, padded base64. Anything that does
    /// not decode reads as no bytes.
    pub fn child_as_bytes(&self, names: &[&str]) -> Vec<u8> {
        let Some(text) = self.child(names).map(Node::first_as_string) else {
            return Vec::new();
        };
        URL_SAFE.decode(text.as_bytes()).unwrap_or_default()
    }

    fn project_list<T>(&self, names: &[&str], project: impl Fn(&Value) -> T) -> Vec<T> {
        self.child(names)
            .map(|node| node.values.iter().map(project).collect())
            .unwrap_or_default()
    }

    fn last_child_value(&self, names: &[&str]) -> Option<&Value> {
        self.child(names).and_then(|node| node.value_at(-1))
    }

    // Default variants. The default applies when the child is absent or its last
    // value does not project to the requested type; an explicit zero is kept.

    pub fn def_child_as_int(&self, default: i64, names: &[&str]) -> i64 {
        self.last_child_value(names)
            .and_then(Value::to_int)
            .unwrap_or(default)
    }

    pub fn def_child_as_float(&self, default: f64, names: &[&str]) -> f64 {
        self.last_child_value(names)
            .and_then(Value::to_float)
            .unwrap_or(default)
    }

    pub fn def_child_as_string(&self, default: &str, names: &[&str]) -> String {
        self.last_child_value(names)
            .filter(|v| v.is_scalar())
            .map(Value::to_text)
            .unwrap_or_else(|| default.to_string())
    }

    pub fn def_child_as_bool(&self, default: bool, names: &[&str]) -> bool {
        self.last_child_value(names)
            .and_then(Value::to_bool)
            .unwrap_or(default)
    }

    /// Returns the node at `names`, creating empty intermediate nodes as needed.
    pub fn create_child(&mut self, names: &[&str]) -> Result<&mut Node, AclError> {
        let mut node = self;
        for (ix, name) in names.iter().enumerate() {
            if node.is_leaf() {
                return Err(AclError::NodeHasValues {
                    path: names[..ix].join("."),
                });
            }
            node = node.children.entry((*name).to_string()).or_default();
        }
        Ok(node)
    }

    /// Replaces whatever the node at `names` holds with the single `value`.
    pub fn set_val_at(&mut self, value: impl Into<Value>, names: &[&str]) -> Result<(), AclError> {
        let target = self.create_child(names)?;
        target.children.clear();
        target.values.clear();
        target.values.push(value.into());
        Ok(())
    }
}

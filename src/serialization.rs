use crate::node::Node;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// The plain data shape of a tree, without layout hints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Array(Vec<ExportValue>),
    Object(IndexMap<String, ExportValue>),
}

/// Branches become maps in insertion order. A single scalar stays a scalar;
/// several values, or a single nested element, become a sequence.
pub(crate) fn to_export(node: &Node) -> ExportValue {
    match node.values.as_slice() {
        [] => ExportValue::Object(
            node.children
                .iter()
                .map(|(name, child)| (name.clone(), to_export(child)))
                .collect(),
        ),
        [single] if single.is_scalar() => value_to_export(single),
        values => ExportValue::Array(values.iter().map(value_to_export).collect()),
    }
}

fn value_to_export(value: &Value) -> ExportValue {
    match value {
        Value::Int(num) => ExportValue::Int(*num),
        Value::Float(num) => ExportValue::Float(*num),
        Value::Bool(flag) => ExportValue::Bool(*flag),
        Value::String(text) => ExportValue::String(text.clone()),
        Value::Array(node) => ExportValue::Array(node.values.iter().map(value_to_export).collect()),
        Value::Object(node) => to_export(node),
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        to_export(self).serialize(serializer)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value_to_export(self).serialize(serializer)
    }
}

impl Node {
    #[must_use]
    pub fn to_export(&self) -> ExportValue {
        to_export(self)
    }

    /// Serializes the tree into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes the tree into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

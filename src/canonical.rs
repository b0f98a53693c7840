use crate::node::Node;
use crate::utils::quote;
use crate::value::Value;
use std::fmt::{self, Display, Write};

/// ANSI escape sequences used by the colored output.
pub mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
}

/// Layout settings for the canonical printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOptions {
    /// Written once per nesting level on each broken line.
    pub indent: String,
    /// Wrap tokens in ANSI color codes. Whitespace is never colored, so removing
    /// the escape sequences gives back the plain output.
    pub color: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            indent: "\t".to_string(),
            color: false,
        }
    }
}

impl PrintOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

/// Renders nodes in the canonical text form, which parses back to the same
/// tree and prints identically the second time round.
pub(crate) struct Printer<'o, W: Write> {
    out: W,
    options: &'o PrintOptions,
}

impl<'o, W: Write> Printer<'o, W> {
    pub(crate) fn new(out: W, options: &'o PrintOptions) -> Self {
        Self { out, options }
    }

    pub(crate) fn node(&mut self, node: &Node, level: usize) -> fmt::Result {
        match node.values.as_slice() {
            [] => self.branch(node, level),
            [single] if single.is_scalar() => self.value(single, level),
            values => self.list(values, node.multiline, level),
        }
    }

    pub(crate) fn value(&mut self, value: &Value, level: usize) -> fmt::Result {
        match value {
            Value::Int(num) => self.paint(ansi::RED, &num.to_string()),
            // Debug keeps a `.0` or an exponent so the text reads back as a float
            Value::Float(num) => self.paint(ansi::RED, &format!("{num:?}")),
            Value::Bool(flag) => self.paint(ansi::RED, if *flag { "true" } else { "false" }),
            Value::String(text) => self.paint(ansi::GREEN, &quote(text)),
            Value::Array(node) => self.list(&node.values, node.multiline, level),
            Value::Object(node) => self.branch(node, level),
        }
    }

    fn list(&mut self, values: &[Value], multiline: bool, level: usize) -> fmt::Result {
        if values.is_empty() {
            return self.paint(ansi::CYAN, "[]");
        }
        self.paint(ansi::CYAN, "[")?;
        self.line_break(multiline, level + 1)?;
        let last = values.len() - 1;
        for (ix, value) in values.iter().enumerate() {
            self.value(value, level + 1)?;
            if ix == last {
                self.line_break(multiline, level)?;
            } else {
                self.paint(ansi::CYAN, ",")?;
                self.line_break(multiline, level + 1)?;
            }
        }
        self.paint(ansi::CYAN, "]")
    }

    fn branch(&mut self, node: &Node, level: usize) -> fmt::Result {
        if node.children.is_empty() {
            return self.paint(ansi::MAGENTA, "{}");
        }
        self.paint(ansi::MAGENTA, "{")?;
        self.line_break(node.multiline, level + 1)?;
        let last = node.children.len() - 1;
        for (ix, (name, child)) in node.children.iter().enumerate() {
            self.paint(ansi::BLUE, &quote(name))?;
            if child.uses_equals {
                self.out.write_char(' ')?;
                self.paint(ansi::MAGENTA, "=")?;
            } else {
                self.paint(ansi::MAGENTA, ":")?;
            }
            self.out.write_char(' ')?;
            self.node(child, level + 1)?;
            if ix == last {
                self.line_break(node.multiline, level)?;
            } else {
                self.paint(ansi::MAGENTA, ",")?;
                self.line_break(node.multiline, level + 1)?;
            }
        }
        self.paint(ansi::MAGENTA, "}")
    }

    /// A newline plus indentation when the enclosing node spans several lines,
    /// a single space otherwise.
    fn line_break(&mut self, multiline: bool, level: usize) -> fmt::Result {
        if !multiline {
            return self.out.write_char(' ');
        }
        self.out.write_char('\n')?;
        for _ in 0..level {
            self.out.write_str(&self.options.indent)?;
        }
        Ok(())
    }

    fn paint(&mut self, color: &str, token: &str) -> fmt::Result {
        if self.options.color {
            write!(self.out, "{color}{token}{}", ansi::RESET)
        } else {
            self.out.write_str(token)
        }
    }
}

/// Canonical text with the default options.
impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer::new(f, &PrintOptions::default()).node(self, 0)
    }
}

impl Node {
    pub fn to_canonical_string(&self) -> String {
        self.to_string()
    }

    pub fn to_colored_string(&self) -> String {
        self.write_with(&PrintOptions::default().with_color(true))
    }

    pub fn write_with(&self, options: &PrintOptions) -> String {
        let mut out = String::new();
        // writing into a String can not fail
        let _ = self.write_to(&mut out, options);
        out
    }

    pub fn write_to(&self, out: &mut impl Write, options: &PrintOptions) -> fmt::Result {
        Printer::new(out, options).node(self, 0)
    }
}

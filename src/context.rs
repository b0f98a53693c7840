use crate::node::Node;
use crate::value::Value;
use indexmap::map::Entry;
use log::trace;
use std::fmt::Write;
use thiserror::Error;

/// Deepest a node may sit below the root, counting both named children and
/// nested array or object elements. Printing, export and drop all recurse
/// once per level.
pub const MAX_DEPTH: usize = 128;

/// One step from a scope's parent base node down to the scope's own base.
///
/// Frames address their base node by steps instead of holding a reference
/// into the tree, so the tree stays freely mutable while scopes are open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A named child.
    Child(String),
    /// A nested array or object element in the parent's values.
    Element(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySegment {
    pub name: String,
    /// Replace the child instead of reusing it. Cleared once applied.
    pub overwrite: bool,
    /// Byte offset of the segment in the source, for diagnostics.
    pub offset: usize,
}

/// A parse-time frame: where new keys and values currently land.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    /// Steps from the enclosing frame's base to this frame's base.
    pub base: Vec<Step>,
    /// Number of steps from the root to this frame's base.
    pub base_depth: usize,
    pub key_path: Vec<KeySegment>,
    pub in_array: bool,
    pub uses_equal: bool,
    /// Byte offset of the `{` or `[` that opened this scope.
    pub opened_at: usize,
}

/// Violations of the scope or tree invariants. The parser reports these as
/// state errors at the offending token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("Key '{0}' found inside an array scope")]
    KeyInArray(String),

    #[error("Key path runs through '{path}', which already holds values")]
    ThroughValues { path: String },

    #[error("'{path}' has named children and can not hold values")]
    ValuesOnBranch { path: String },

    #[error("'{path}' holds values and can not start an object")]
    ObjectOnLeaf { path: String },

    #[error("Values need a key; the root can not hold values")]
    ValuesOnRoot,

    #[error("Object scope ended while in an array scope")]
    ObjectEndInArray,

    #[error("Array scope ended while in an object scope")]
    ArrayEndInObject,

    #[error("Closing delimiter without a matching opening one")]
    PopRoot,

    #[error("Nesting goes deeper than {} levels", MAX_DEPTH)]
    TooDeep,

    #[error("Scope refers to a node that no longer exists")]
    Detached,
}

/// The pushdown stack of parse contexts. The root context lives in `current`
/// when nothing else is open, so the stack can never be empty.
#[derive(Debug, Default)]
pub struct ContextStack {
    current: ParseContext,
    parents: Vec<ParseContext>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &ParseContext {
        &self.current
    }

    /// Number of open scopes above the root context.
    pub fn depth(&self) -> usize {
        self.parents.len()
    }

    pub fn in_array(&self) -> bool {
        self.current.in_array
    }

    pub fn has_pending_keys(&self) -> bool {
        !self.current.key_path.is_empty()
    }

    pub fn first_pending_key(&self) -> Option<&KeySegment> {
        self.current.key_path.first()
    }

    /// The innermost scope that is still open, if any.
    pub fn innermost_open(&self) -> Option<&ParseContext> {
        if self.parents.is_empty() {
            None
        } else {
            Some(&self.current)
        }
    }

    pub fn set_uses_equal(&mut self, uses_equal: bool) {
        self.current.uses_equal = uses_equal;
    }

    pub fn append_key(
        &mut self,
        name: String,
        overwrite: bool,
        offset: usize,
    ) -> Result<(), ScopeError> {
        if self.current.in_array {
            return Err(ScopeError::KeyInArray(name));
        }
        if self.current.base_depth + self.current.key_path.len() >= MAX_DEPTH {
            return Err(ScopeError::TooDeep);
        }
        trace!("key segment '{name}' (overwrite: {overwrite})");
        self.current.key_path.push(KeySegment {
            name,
            overwrite,
            offset,
        });
        Ok(())
    }

    pub fn reset_key(&mut self) {
        self.current.key_path.clear();
        self.current.uses_equal = false;
    }

    /// Walks the active context's base through its pending key path, creating
    /// missing nodes. Overwrite segments replace the child in place.
    ///
    /// The returned steps lead from the active base to the target.
    pub fn find_current_target<'n>(
        &mut self,
        root: &'n mut Node,
    ) -> Result<(Vec<Step>, &'n mut Node), ScopeError> {
        let mut node = self.base_node(root).ok_or(ScopeError::Detached)?;
        let mut path = Vec::with_capacity(self.current.key_path.len());

        for ix in 0..self.current.key_path.len() {
            if node.is_leaf() {
                return Err(ScopeError::ThroughValues {
                    path: self.describe(&path),
                });
            }
            let segment = &mut self.current.key_path[ix];
            node = if segment.overwrite {
                segment.overwrite = false;
                trace!("replacing '{}'", segment.name);
                match node.children.entry(segment.name.clone()) {
                    Entry::Occupied(mut entry) => {
                        entry.insert(Node::new());
                        entry.into_mut()
                    }
                    Entry::Vacant(entry) => entry.insert(Node::new()),
                }
            } else {
                node.children.entry(segment.name.clone()).or_default()
            };
            path.push(Step::Child(segment.name.clone()));
        }
        Ok((path, node))
    }

    pub fn attach_value(&mut self, root: &mut Node, value: Value) -> Result<(), ScopeError> {
        let uses_equal = self.current.uses_equal;
        let (path, target) = self.find_current_target(root)?;
        if self.is_root(&path) {
            return Err(ScopeError::ValuesOnRoot);
        }
        if !target.children.is_empty() {
            return Err(ScopeError::ValuesOnBranch {
                path: self.describe(&path),
            });
        }
        trace!("{} value attached to '{}'", value.type_name(), self.describe(&path));
        target.values.push(value);
        target.uses_equals = uses_equal;
        Ok(())
    }

    /// Opens an object scope. Inside an array the object becomes a new element;
    /// otherwise the resolved key path itself becomes the scope.
    pub fn start_object(&mut self, root: &mut Node, offset: usize) -> Result<(), ScopeError> {
        let uses_equal = self.current.uses_equal;
        let in_array = self.current.in_array;
        let (mut base, target) = self.find_current_target(root)?;
        if in_array {
            self.check_room(&base)?;
            target.values.push(Value::Object(Node::new()));
            base.push(Step::Element(target.values.len() - 1));
        } else {
            if target.is_leaf() {
                return Err(ScopeError::ObjectOnLeaf {
                    path: self.describe(&base),
                });
            }
            target.uses_equals = uses_equal;
        }
        self.push(ParseContext {
            base_depth: self.current.base_depth + base.len(),
            base,
            key_path: Vec::new(),
            in_array: false,
            uses_equal,
            opened_at: offset,
        });
        Ok(())
    }

    pub fn end_object(&mut self) -> Result<(), ScopeError> {
        if self.current.in_array {
            return Err(ScopeError::ObjectEndInArray);
        }
        self.pop()
    }

    /// Opens an array scope. Inside an array this is a nested sub-array
    /// element; otherwise the resolved key path collects the values directly.
    pub fn start_array(&mut self, root: &mut Node, offset: usize) -> Result<(), ScopeError> {
        let uses_equal = self.current.uses_equal;
        let in_array = self.current.in_array;
        let (mut base, target) = self.find_current_target(root)?;
        if in_array {
            self.check_room(&base)?;
            target.values.push(Value::Array(Node::new()));
            base.push(Step::Element(target.values.len() - 1));
        } else {
            if self.is_root(&base) {
                return Err(ScopeError::ValuesOnRoot);
            }
            if !target.children.is_empty() {
                return Err(ScopeError::ValuesOnBranch {
                    path: self.describe(&base),
                });
            }
            target.uses_equals = uses_equal;
        }
        self.push(ParseContext {
            base_depth: self.current.base_depth + base.len(),
            base,
            key_path: Vec::new(),
            in_array: true,
            uses_equal,
            opened_at: offset,
        });
        Ok(())
    }

    pub fn end_array(&mut self) -> Result<(), ScopeError> {
        if !self.current.in_array {
            return Err(ScopeError::ArrayEndInObject);
        }
        self.pop()
    }

    /// Flags every open scope's base node, and the nodes already materialized
    /// along its pending key path, as spanning several lines. The final target
    /// of a key path is left alone.
    pub fn mark_multiline(&self, root: &mut Node) {
        let mut node = root;
        for frame in self.frames() {
            let Some(base) = node_at(node, &frame.base) else {
                return;
            };
            base.multiline = true;
            mark_key_path(base, &frame.key_path);
            node = base;
        }
    }

    /// Renders the full path from the root through the active base and
    /// `suffix` as `a.b[2].c`, for diagnostics.
    pub fn describe(&self, suffix: &[Step]) -> String {
        let steps: Vec<&Step> = self
            .frames()
            .flat_map(|frame| frame.base.iter())
            .chain(suffix)
            .collect();
        describe(steps)
    }

    fn frames(&self) -> impl Iterator<Item = &ParseContext> {
        self.parents.iter().chain(std::iter::once(&self.current))
    }

    /// The active frame's base node, reached in one walk down the frames.
    fn base_node<'n>(&self, root: &'n mut Node) -> Option<&'n mut Node> {
        let mut node = root;
        for frame in self.frames() {
            node = node_at(node, &frame.base)?;
        }
        Some(node)
    }

    fn is_root(&self, suffix: &[Step]) -> bool {
        self.current.base_depth == 0 && suffix.is_empty()
    }

    /// Fails when a new element below `suffix` would sit deeper than
    /// [`MAX_DEPTH`].
    fn check_room(&self, suffix: &[Step]) -> Result<(), ScopeError> {
        if self.current.base_depth + suffix.len() >= MAX_DEPTH {
            return Err(ScopeError::TooDeep);
        }
        Ok(())
    }

    fn push(&mut self, frame: ParseContext) {
        trace!(
            "push {} scope at '{}'",
            if frame.in_array { "array" } else { "object" },
            self.describe(&frame.base)
        );
        let parent = std::mem::replace(&mut self.current, frame);
        self.parents.push(parent);
    }

    fn pop(&mut self) -> Result<(), ScopeError> {
        if self.parents.is_empty() {
            return Err(ScopeError::PopRoot);
        }
        trace!("pop scope at '{}'", self.describe(&[]));
        self.current = self.parents.pop().ok_or(ScopeError::PopRoot)?;
        Ok(())
    }
}

fn mark_key_path(base: &mut Node, key_path: &[KeySegment]) {
    let mut node = base;
    for segment in key_path {
        if segment.overwrite {
            break;
        }
        node.multiline = true;
        let Some(child) = node.children.get_mut(&segment.name) else {
            break;
        };
        node = child;
    }
}

fn node_at<'n>(root: &'n mut Node, path: &[Step]) -> Option<&'n mut Node> {
    let mut node = root;
    for step in path {
        node = match step {
            Step::Child(name) => node.children.get_mut(name)?,
            Step::Element(ix) => node.values.get_mut(*ix)?.as_node_mut()?,
        };
    }
    Some(node)
}

/// Renders a path as `a.b[2].c` for diagnostics.
pub fn describe<'s>(path: impl IntoIterator<Item = &'s Step>) -> String {
    let mut out = String::new();
    for step in path {
        match step {
            Step::Child(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            Step::Element(ix) => {
                let _ = write!(out, "[{ix}]");
            }
        }
    }
    if out.is_empty() {
        out.push_str("<root>");
    }
    out
}

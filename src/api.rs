use crate::error::{AclError, ParseLocation};
use crate::node::Node;
use crate::parser::Parser;
use std::path::Path;
use std::str::FromStr;

/// Parses ACL text into a fresh tree.
///
/// # Arguments
///
/// * `source` - The ACL text.
/// * `file_name` - The name reported in diagnostics.
///
/// # Errors
///
/// Returns an `AclError::Parser` carrying the file, line and column of the
/// first syntax or state violation.
pub fn parse(source: &str, file_name: &str) -> Result<Node, AclError> {
    let mut root = Node::new();
    Parser::new_with_name(source, file_name.to_string()).parse_into(&mut root)?;
    Ok(root)
}

/// Layers ACL text onto an existing tree.
///
/// Values under key paths the tree already has are appended, unless the text
/// uses the overwrite marker. When `location` is given its filename is used for
/// diagnostics, and on failure it receives the line, column and message.
///
/// # Errors
///
/// Returns an `AclError::Parser` on the first violation. The tree keeps any
/// changes made before it.
pub fn parse_into(
    root: &mut Node,
    source: &str,
    location: Option<&mut ParseLocation>,
) -> Result<(), AclError> {
    let file_name = location
        .as_ref()
        .map(|location| location.filename.clone())
        .unwrap_or_default();
    let result = Parser::new_with_name(source, file_name).parse_into(root);
    match (result, location) {
        (Ok(()), _) => Ok(()),
        (Err(err), Some(location)) => {
            *location = err.location();
            Err(err.into())
        }
        (Err(err), None) => Err(err.into()),
    }
}

/// Reads a UTF-8 file and layers it onto `root`, reporting errors against the
/// file's path.
///
/// # Errors
///
/// Returns `AclError::Io` when the file can not be read and
/// `AclError::Parser` when it does not parse.
pub fn parse_file(root: &mut Node, path: impl AsRef<Path>) -> Result<(), AclError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| AclError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut location = ParseLocation::new(path.display().to_string());
    parse_into(root, &source, Some(&mut location))
}

impl Node {
    /// Layers `source` onto this tree. See [`parse_into`].
    ///
    /// # Errors
    ///
    /// Returns an `AclError::Parser` on the first violation.
    pub fn parse_str(&mut self, source: &str) -> Result<(), AclError> {
        parse_into(self, source, None)
    }
}

impl FromStr for Node {
    type Err = AclError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        parse(source, "")
    }
}

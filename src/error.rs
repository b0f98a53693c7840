use miette::{Diagnostic, NamedSource, SourceSpan};
use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum AclError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parser(#[from] ParserError),

    #[error("Could not read {}", .path.display())]
    #[diagnostic(code(acl::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Node at '{path}' already holds values")]
    #[diagnostic(
        code(acl::node_has_values),
        help("A node holds either values or named children. Use set_val_at to replace it.")
    )]
    NodeHasValues { path: String },
}

impl AclError {
    /// The diagnostic location of a parse failure, if this is one.
    pub fn location(&self) -> Option<ParseLocation> {
        match self {
            AclError::Parser(err) => Some(err.location()),
            _ => None,
        }
    }
}

/// Errors raised while parsing ACL text. Both classes halt the parse at the
/// first violation.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParserError {
    /// A lexical or grammatical violation.
    #[error("{filename}:{line}:{column}: {message}")]
    #[diagnostic(
        code(parser::syntax),
        help("The text does not follow the ACL grammar at this position.")
    )]
    Syntax {
        filename: String,
        line: usize,
        column: usize,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
    },

    /// The text is well formed but violates a scope or tree invariant, such as
    /// a mismatched delimiter or a key path running through a node with values.
    #[error("{filename}:{line}:{column}: {message}")]
    #[diagnostic(
        code(parser::state),
        help("Check that braces and brackets are balanced and that a key does not hold both values and children.")
    )]
    State {
        filename: String,
        line: usize,
        column: usize,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
    },
}

impl ParserError {
    pub fn location(&self) -> ParseLocation {
        match self {
            ParserError::Syntax {
                filename,
                line,
                column,
                message,
                ..
            }
            | ParserError::State {
                filename,
                line,
                column,
                message,
                ..
            } => ParseLocation {
                filename: filename.clone(),
                line: *line,
                column: *column,
                message: message.clone(),
            },
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParserError::Syntax { message, .. } | ParserError::State { message, .. } => message,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, ParserError::Syntax { .. })
    }
}

/// Where a parse failed. Callers may hand one in with only `filename` set and
/// read the rest back after a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseLocation {
    pub filename: String,
    /// 1-based.
    pub line: usize,
    /// 1-based, counted in characters.
    pub column: usize,
    pub message: String,
}

impl ParseLocation {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }
}

impl Display for ParseLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.filename, self.line, self.column, self.message
        )
    }
}

use crate::context::{ContextStack, ScopeError};
use crate::error::ParserError;
use crate::lexer::{CommentKind, Lexer, Mode, Token, TokenType};
use crate::node::Node;
use crate::utils::get_line_and_column;
use crate::value::Value;
use log::{debug, trace};
use miette::NamedSource;
use std::sync::Arc;

/// Byte offset and length of the token an error points at.
type Span = (usize, usize);

/// A single-pass parser for ACL text.
///
/// The parser scans under one of the lexer's modes at a time. Entering a value
/// or a comment *calls* a mode and leaving it *returns* to whichever mode was
/// active before, so comments and nested scopes can appear anywhere and
/// unwind correctly. Semantic actions go straight to the [`ContextStack`],
/// which materializes nodes in the target tree as the text is read.
#[derive(Debug)]
pub struct Parser<'a> {
    source: Arc<NamedSource<String>>,
    source_text: &'a str,
    file_name: String,
    lexer_position: usize,
    modes: Vec<Mode>,
    context: ContextStack,
    line: usize,
    comment_opened_at: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self::new_with_name(source_text, "(string)".to_string())
    }

    pub fn new_with_name(source_text: &'a str, name: String) -> Self {
        let source = Arc::new(NamedSource::new(&name, source_text.to_string()));
        Self {
            source,
            source_text,
            file_name: name,
            lexer_position: 0,
            modes: vec![Mode::Key],
            context: ContextStack::new(),
            line: 1,
            comment_opened_at: 0,
        }
    }

    /// Parses the whole text into `root`. Values land on top of whatever the
    /// tree already holds. On failure the tree keeps any partial changes.
    pub fn parse_into(&mut self, root: &mut Node) -> Result<(), ParserError> {
        debug!(
            "parsing {} ({} bytes)",
            self.file_name,
            self.source_text.len()
        );
        let result = self.run(root);
        match &result {
            Ok(()) => debug!("parsed {} lines from {}", self.line, self.file_name),
            Err(err) => debug!("parse of {} failed: {}", self.file_name, err.message()),
        }
        result
    }

    fn run(&mut self, root: &mut Node) -> Result<(), ParserError> {
        let mut lexer = Lexer::new(self.source_text);
        loop {
            let mode = self.mode();
            let token = lexer.next_token(mode);
            self.lexer_position = lexer.position();
            let finished = match mode {
                Mode::Key => self.key_token(root, token)?,
                Mode::Value => self.value_token(root, token)?,
                Mode::LineComment => {
                    self.return_mode();
                    false
                }
                Mode::BlockComment => self.block_comment_token(root, token)?,
            };
            if finished {
                return Ok(());
            }
        }
    }

    // === Modes ===

    fn key_token(&mut self, root: &mut Node, token: Token) -> Result<bool, ParserError> {
        let span = (token.pos_start, token.len());
        match token.ttype {
            TokenType::Eof => return self.finish(span),
            TokenType::Whitespace | TokenType::Comma | TokenType::Dot => {}
            TokenType::Newline => self.newline(root),
            TokenType::CommentStart(kind) => self.open_comment(kind, span),
            TokenType::Identifier(word) => {
                let overwrite = word.starts_with('!');
                let name = if overwrite { word[1..].to_string() } else { word };
                if name.is_empty() {
                    return Err(self.syntax_error("Key names may not be empty", span));
                }
                self.scope(span, |ctx| ctx.append_key(name, overwrite, span.0))?;
            }
            TokenType::Quoted(name) => {
                // the two quote characters alone make an empty key
                if span.1 < 3 {
                    return Err(self.syntax_error("Key names may not be empty", span));
                }
                self.scope(span, |ctx| ctx.append_key(name, false, span.0))?;
            }
            TokenType::Colon => {
                self.context.set_uses_equal(false);
                self.call(Mode::Value);
            }
            TokenType::Equals => {
                self.context.set_uses_equal(true);
                self.call(Mode::Value);
            }
            TokenType::LBrace => {
                self.scope(span, |ctx| ctx.start_object(root, span.0))?;
            }
            TokenType::RBrace => {
                if self.context.has_pending_keys() {
                    return Err(self.syntax_error("Key names found without a value.", span));
                }
                self.scope(span, ContextStack::end_object)?;
                if self.context.in_array() {
                    self.call(Mode::Value);
                } else {
                    self.context.reset_key();
                }
            }
            TokenType::LBracket => {
                self.scope(span, |ctx| ctx.start_array(root, span.0))?;
                self.call(Mode::Value);
            }
            TokenType::RBracket => {
                return Err(self.state_error("Array scope ended while in key mode", span));
            }
            TokenType::Semicolon => {
                if self.context.has_pending_keys() {
                    return Err(self.syntax_error("Key names found without a value.", span));
                }
            }
            TokenType::Malformed(message) => return Err(self.syntax_error(message, span)),
            TokenType::Unknown(c) => {
                return Err(self.syntax_error(
                    format!("Invalid character '{c}' in a key name"),
                    span,
                ));
            }
            other => {
                return Err(self.syntax_error(
                    format!("Unexpected {other:?} while reading a key"),
                    span,
                ));
            }
        }
        Ok(false)
    }

    fn value_token(&mut self, root: &mut Node, token: Token) -> Result<bool, ParserError> {
        let span = (token.pos_start, token.len());
        match token.ttype {
            TokenType::Eof => return self.finish(span),
            TokenType::Whitespace => {}
            TokenType::Newline => {
                self.newline(root);
                self.end_statement();
            }
            TokenType::CommentStart(kind) => self.open_comment(kind, span),
            TokenType::Identifier(word) => {
                let value = match word.as_str() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    _ => Value::String(word),
                };
                self.attach(root, value, span)?;
            }
            TokenType::Quoted(text) => self.attach(root, Value::String(text), span)?,
            TokenType::Integer(num) => self.attach(root, Value::Int(num), span)?,
            TokenType::Float(num) => self.attach(root, Value::Float(num), span)?,
            TokenType::Comma => self.end_statement(),
            TokenType::Semicolon => {
                if self.context.in_array() {
                    return Err(self.syntax_error("';' is not allowed inside an array", span));
                }
                self.end_statement();
            }
            TokenType::LBrace => {
                self.scope(span, |ctx| ctx.start_object(root, span.0))?;
                self.return_mode();
            }
            TokenType::RBrace => {
                self.scope(span, ContextStack::end_object)?;
                self.end_statement();
            }
            TokenType::LBracket => {
                self.scope(span, |ctx| ctx.start_array(root, span.0))?;
            }
            TokenType::RBracket => {
                self.scope(span, ContextStack::end_array)?;
                self.end_statement();
            }
            TokenType::Malformed(message) => return Err(self.syntax_error(message, span)),
            TokenType::Unknown(c) => {
                return Err(self.syntax_error(
                    format!("Invalid character '{c}' while looking for a value"),
                    span,
                ));
            }
            other => {
                return Err(self.syntax_error(
                    format!("Unexpected {other:?} while looking for a value"),
                    span,
                ));
            }
        }
        Ok(false)
    }

    fn block_comment_token(&mut self, root: &mut Node, token: Token) -> Result<bool, ParserError> {
        match token.ttype {
            TokenType::Newline => self.newline(root),
            TokenType::CommentEnd => self.return_mode(),
            TokenType::Eof => {
                return Err(self.syntax_error(
                    "Comment was opened but never closed",
                    (self.comment_opened_at, 2),
                ));
            }
            _ => {}
        }
        Ok(false)
    }

    // === Semantic actions ===

    fn attach(&mut self, root: &mut Node, value: Value, span: Span) -> Result<(), ParserError> {
        self.scope(span, |ctx| ctx.attach_value(root, value))
    }

    /// Ends the current value statement outside of arrays; inside an array the
    /// separators and newlines are only sugar.
    fn end_statement(&mut self) {
        if !self.context.in_array() {
            self.context.reset_key();
            self.return_mode();
        }
    }

    fn newline(&mut self, root: &mut Node) {
        self.line += 1;
        self.context.mark_multiline(root);
    }

    fn open_comment(&mut self, kind: CommentKind, span: Span) {
        match kind {
            CommentKind::Line => self.call(Mode::LineComment),
            CommentKind::Block => {
                self.comment_opened_at = span.0;
                self.call(Mode::BlockComment);
            }
        }
    }

    /// End of input in key or value mode.
    fn finish(&self, span: Span) -> Result<bool, ParserError> {
        if self.mode() == Mode::Key {
            if let Some(segment) = self.context.first_pending_key() {
                return Err(self.syntax_error(
                    "Key names found without a value.",
                    (segment.offset, segment.name.len()),
                ));
            }
        }
        if let Some(scope) = self.context.innermost_open() {
            let delimiter = if scope.in_array { '[' } else { '{' };
            return Err(self.state_error(
                format!("'{delimiter}' was opened but never closed"),
                (scope.opened_at, 1),
            ));
        }
        trace!("end of input at byte {}", span.0);
        Ok(true)
    }

    /// Runs a context stack operation, turning its failure into a state error
    /// at `span`.
    fn scope<T>(
        &mut self,
        span: Span,
        op: impl FnOnce(&mut ContextStack) -> Result<T, ScopeError>,
    ) -> Result<T, ParserError> {
        op(&mut self.context).map_err(|err| self.state_error(err.to_string(), span))
    }

    // === Mode stack ===

    fn mode(&self) -> Mode {
        self.modes.last().copied().unwrap_or(Mode::Key)
    }

    fn call(&mut self, mode: Mode) {
        trace!("call {mode:?} at byte {}", self.lexer_position);
        self.modes.push(mode);
    }

    fn return_mode(&mut self) {
        if self.modes.len() > 1 {
            let left = self.modes.pop();
            trace!("return from {left:?} to {:?}", self.mode());
        }
    }

    // === Errors ===

    fn syntax_error(&self, message: impl Into<String>, (offset, len): Span) -> ParserError {
        let (line, column) = get_line_and_column(self.source_text, offset);
        ParserError::Syntax {
            filename: self.file_name.clone(),
            line,
            column,
            message: message.into(),
            src: (*self.source).clone(),
            span: (offset, len).into(),
        }
    }

    fn state_error(&self, message: impl Into<String>, (offset, len): Span) -> ParserError {
        let (line, column) = get_line_and_column(self.source_text, offset);
        ParserError::State {
            filename: self.file_name.clone(),
            line,
            column,
            message: message.into(),
            src: (*self.source).clone(),
            span: (offset, len).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;

    fn parse_ok(source: &str) -> Node {
        let mut root = Node::new();
        let mut parser = Parser::new_with_name(source, "test.acl".to_string());
        match parser.parse_into(&mut root) {
            Ok(()) => root,
            Err(err) => {
                let report = Report::from(err);
                panic!("{:?}", report);
            }
        }
    }

    fn parse_err(source: &str) -> ParserError {
        let mut root = Node::new();
        Parser::new_with_name(source, "test.acl".to_string())
            .parse_into(&mut root)
            .unwrap_err()
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_ok("").is_empty());
        assert!(parse_ok("\n\n  ;;\n").is_empty());
    }

    #[test]
    fn test_scenario() {
        let root = parse_ok("a: 1\nb { c: 2 }");
        assert_eq!(root.child(&["a"]).unwrap().values, vec![Value::Int(1)]);
        let b = root.child(&["b"]).unwrap();
        assert!(b.values.is_empty());
        assert_eq!(b.child(&["c"]).unwrap().values, vec![Value::Int(2)]);
    }

    #[test]
    fn test_literal_kinds() {
        let root = parse_ok(
            "i = -12\nh = 0x1f\nf = 2.5\ne = 1e3\nt = true\nw = word\nq = 'it\\'s'\n",
        );
        assert_eq!(root.child(&["i"]).unwrap().values, vec![Value::Int(-12)]);
        assert_eq!(root.child(&["h"]).unwrap().values, vec![Value::Int(31)]);
        assert_eq!(root.child(&["f"]).unwrap().values, vec![Value::Float(2.5)]);
        assert_eq!(root.child(&["e"]).unwrap().values, vec![Value::Float(1000.0)]);
        assert_eq!(root.child(&["t"]).unwrap().values, vec![Value::Bool(true)]);
        assert_eq!(root.child(&["w"]).unwrap().values, vec![Value::from("word")]);
        assert_eq!(root.child(&["q"]).unwrap().values, vec![Value::from("it's")]);
    }

    #[test]
    fn test_separator_is_remembered() {
        let root = parse_ok("a = 1\nb: 2\nc = { d: 3 }\n");
        assert!(root.child(&["a"]).unwrap().uses_equals);
        assert!(!root.child(&["b"]).unwrap().uses_equals);
        assert!(root.child(&["c"]).unwrap().uses_equals);
        assert!(!root.child(&["c", "d"]).unwrap().uses_equals);
    }

    #[test]
    fn test_key_path_sugar() {
        let flat = parse_ok("server cyril port = 9772");
        let nested = parse_ok("server { cyril { port = 9772 } }");
        assert_eq!(flat.child_as_int(&["server", "cyril", "port"]), 9772);
        assert_eq!(
            flat.child(&["server", "cyril", "port"]),
            nested.child(&["server", "cyril", "port"])
        );
    }

    #[test]
    fn test_newline_does_not_end_a_key_path() {
        let root = parse_ok("server\n{\n  port = 1\n}\n");
        assert_eq!(root.child_as_int(&["server", "port"]), 1);
    }

    #[test]
    fn test_json_style_input() {
        let root = parse_ok(r#"{"a": 1, "b": [true, "x"], "c": {"d": 2.5}}"#);
        assert_eq!(root.child_as_int(&["a"]), 1);
        assert_eq!(
            root.child(&["b"]).unwrap().values,
            vec![Value::Bool(true), Value::from("x")]
        );
        assert_eq!(root.child_as_float(&["c", "d"]), 2.5);
    }

    #[test]
    fn test_arrays_span_lines() {
        let root = parse_ok("ports = [\n  80,\n  90\n  100\n]\nnext = 1\n");
        assert_eq!(root.child_as_int_list(&["ports"]), vec![80, 90, 100]);
        assert!(root.child(&["ports"]).unwrap().multiline);
        assert_eq!(root.child_as_int(&["next"]), 1);
    }

    #[test]
    fn test_nested_elements() {
        let root = parse_ok("a = [[1, 2], { b = 3 }, 4]\nz = 0");
        let a = root.child(&["a"]).unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(a.values[0].as_node().unwrap().values, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(a.values[1].as_node().unwrap().child_as_int(&["b"]), 3);
        assert_eq!(a.values[2], Value::Int(4));
        assert_eq!(root.child_as_int(&["z"]), 0);
        assert!(root.child(&["z"]).is_some());
    }

    #[test]
    fn test_object_element_with_key_mode_close() {
        let root = parse_ok("a = [{ x { y = 1 } }, { x { y = 2 } }]");
        let a = root.child(&["a"]).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a.values[1].as_node().unwrap().child_as_int(&["x", "y"]), 2);
    }

    #[test]
    fn test_comments_anywhere() {
        let root = parse_ok(
            "# head\na = 1 // trailing\n/* block\n spanning */ b = [1, /* inline */ 2]\n-- dashes\nc = 3 # end",
        );
        assert_eq!(root.child_as_int(&["a"]), 1);
        assert_eq!(root.child_as_int_list(&["b"]), vec![1, 2]);
        assert_eq!(root.child_as_int(&["c"]), 3);
        assert_eq!(root.children.len(), 3);
    }

    #[test]
    fn test_overwrite_marker() {
        let root = parse_ok("key = a\nkey = b\n");
        assert_eq!(root.child_as_string_list(&["key"]), vec!["a", "b"]);
        let root = parse_ok("key = a\n!key = b c\n");
        assert_eq!(root.child_as_string_list(&["key"]), vec!["b", "c"]);
    }

    #[test]
    fn test_overwrite_replaces_subtree() {
        let root = parse_ok("a { b = 1 }\nz = 2\n!a = 5\n");
        let a = root.child(&["a"]).unwrap();
        assert!(a.children.is_empty());
        assert_eq!(a.as_int(), 5);
        let names: Vec<&str> = root.children().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "z"]);
    }

    #[test]
    fn test_unclosed_object_reports_opener() {
        let err = parse_err("a = 1\nb {\n c = 2\n");
        assert!(!err.is_syntax());
        let location = err.location();
        assert_eq!((location.line, location.column), (2, 3));
        assert_eq!(location.filename, "test.acl");
    }

    #[test]
    fn test_stray_closers() {
        let err = parse_err("a = 1\n]");
        assert!(!err.is_syntax());
        assert_eq!((err.location().line, err.location().column), (2, 1));

        let err = parse_err("}");
        assert!(!err.is_syntax());

        let err = parse_err("a = 1 ]");
        assert!(!err.is_syntax());
    }

    #[test]
    fn test_key_errors() {
        let err = parse_err("a {\n  \"\" = 3\n}");
        assert!(err.is_syntax());
        assert_eq!(err.message(), "Key names may not be empty");
        assert_eq!((err.location().line, err.location().column), (2, 3));

        assert_eq!(parse_err("! = 1").message(), "Key names may not be empty");
        assert_eq!(parse_err("a b").message(), "Key names found without a value.");
        assert_eq!(parse_err("a;").message(), "Key names found without a value.");
        assert_eq!(parse_err("x { a }").message(), "Key names found without a value.");
        assert!(parse_err("9 = 1").message().contains("Invalid character '9'"));
    }

    #[test]
    fn test_value_errors() {
        assert!(parse_err("a = b = c").message().contains("while looking for a value"));
        assert!(parse_err("a = [1; 2]").is_syntax());
        assert!(parse_err("a = 99999999999999999999").is_syntax());
        assert!(parse_err("a = \"open").is_syntax());
        assert!(parse_err("a = \"bad \\q\"").is_syntax());
    }

    #[test]
    fn test_tree_invariants_are_state_errors() {
        let err = parse_err("a = 1\na b = 2");
        assert!(!err.is_syntax());
        assert_eq!(err.location().line, 2);

        assert!(!parse_err("a { b = 1 }\na = 2").is_syntax());
        assert!(!parse_err("a = 1\na { b = 1 }").is_syntax());
        assert!(!parse_err("= 1").is_syntax());
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = parse_err("a = 1\n/* never\nclosed");
        assert!(err.is_syntax());
        assert_eq!((err.location().line, err.location().column), (2, 1));
    }
}

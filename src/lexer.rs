use crate::utils::unquote;

/// The grammar the lexer scans with. The parser owns the mode and switches it
/// through a return stack; the lexer only reads the mode it is handed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mode {
    /// Key segments, separators and scope delimiters. The initial mode.
    Key,
    /// Literals and scope delimiters after a separator or inside an array.
    Value,
    /// The body of a `//`, `#` or `--` comment, up to the end of the line.
    LineComment,
    /// The body of a `/* */` comment.
    BlockComment,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CommentKind {
    Line,
    Block,
}

/// Represents the different kinds of tokens that the lexer can produce.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    // == Special Tokens ==
    /// Represents the end of the input.
    Eof,
    /// A single `\n`. Kept apart from whitespace because it ends statements and
    /// drives line counting.
    Newline,
    /// A run of whitespace other than newlines.
    Whitespace,
    /// `//`, `#`, `--` or `/*`.
    CommentStart(CommentKind),
    /// Text inside a comment. Never contains a newline.
    CommentText,
    /// The closing `*/` of a block comment.
    CommentEnd,
    /// A character that is not allowed in the current mode.
    Unknown(char),
    /// A literal that was recognized but could not be converted. The message
    /// says why.
    Malformed(String),

    // == Literals ==
    /// A bare word: a key segment in key mode (may start with `!`), a string
    /// value in value mode.
    Identifier(String),
    /// A single- or double-quoted literal, already unescaped.
    Quoted(String),
    /// A decimal or `0x` hexadecimal integer.
    Integer(i64),
    Float(f64),

    // == Punctuation ==
    /// `:`
    Colon,
    /// `=`
    Equals,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `.`
    Dot,
}

/// A token with its type and byte position
#[derive(Debug, Clone)]
pub struct Token {
    pub ttype: TokenType,
    pub pos_start: usize,
    pub pos_end: usize,
}

impl Token {
    pub fn new(ttype: TokenType, pos_start: usize, pos_end: usize) -> Token {
        Token {
            ttype,
            pos_start,
            pos_end,
        }
    }

    pub fn len(&self) -> usize {
        self.pos_end - self.pos_start
    }

    pub fn is_empty(&self) -> bool {
        self.pos_end == self.pos_start
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Scans the next token under the grammar of `mode`.
    pub fn next_token(&mut self, mode: Mode) -> Token {
        let start_pos = self.position;
        let ttype = match mode {
            Mode::Key => self.scan_key(),
            Mode::Value => self.scan_value(),
            Mode::LineComment => self.scan_line_comment(),
            Mode::BlockComment => self.scan_block_comment(),
        };
        Token::new(ttype, start_pos, self.position)
    }

    fn scan_key(&mut self) -> TokenType {
        let Some(char) = self.advance() else {
            return TokenType::Eof;
        };
        match char {
            ':' => TokenType::Colon,
            '=' => TokenType::Equals,
            '.' => TokenType::Dot,
            '!' => self.read_identifier(char),
            c if is_word_start(c) => self.read_identifier(c),
            c => self.scan_common(c),
        }
    }

    fn scan_value(&mut self) -> TokenType {
        let Some(char) = self.advance() else {
            return TokenType::Eof;
        };
        match char {
            c if is_word_start(c) => self.read_identifier(c),
            c if c.is_ascii_digit() => self.read_number(c),
            '+' | '-' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number(char),
            c => self.scan_common(c),
        }
    }

    /// Tokens that mean the same thing in key and value mode.
    fn scan_common(&mut self, char: char) -> TokenType {
        match char {
            '\n' => TokenType::Newline,
            '{' => TokenType::LBrace,
            '}' => TokenType::RBrace,
            '[' => TokenType::LBracket,
            ']' => TokenType::RBracket,
            ',' => TokenType::Comma,
            ';' => TokenType::Semicolon,
            '"' | '\'' => self.read_quoted(char),
            '#' => TokenType::CommentStart(CommentKind::Line),
            '/' => match self.peek() {
                Some('/') => {
                    self.advance();
                    TokenType::CommentStart(CommentKind::Line)
                }
                Some('*') => {
                    self.advance();
                    TokenType::CommentStart(CommentKind::Block)
                }
                _ => TokenType::Unknown('/'),
            },
            '-' if self.peek() == Some('-') => {
                self.advance();
                TokenType::CommentStart(CommentKind::Line)
            }
            c if c.is_whitespace() => self.read_whitespace(),
            c => TokenType::Unknown(c),
        }
    }

    fn scan_line_comment(&mut self) -> TokenType {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        TokenType::CommentText
    }

    fn scan_block_comment(&mut self) -> TokenType {
        match self.peek() {
            None => return TokenType::Eof,
            Some('\n') => {
                self.advance();
                return TokenType::Newline;
            }
            Some('*') if self.input[self.position..].starts_with("*/") => {
                self.advance();
                self.advance();
                return TokenType::CommentEnd;
            }
            _ => {}
        }
        while let Some(c) = self.peek() {
            if c == '\n' || (c == '*' && self.input[self.position..].starts_with("*/")) {
                break;
            }
            self.advance();
        }
        TokenType::CommentText
    }

    fn advance(&mut self) -> Option<char> {
        let char = self.chars.next();
        if let Some(c) = char {
            self.position += c.len_utf8();
        }
        char
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn read_whitespace(&mut self) -> TokenType {
        while let Some(c) = self.peek() {
            if c.is_whitespace() && c != '\n' {
                self.advance();
            } else {
                break;
            }
        }
        TokenType::Whitespace
    }

    fn read_identifier(&mut self, first_char: char) -> TokenType {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
                ident.push(c);
            } else {
                break;
            }
        }
        TokenType::Identifier(ident)
    }

    /// Reads up to and including the closing quote, then unescapes. A backslash
    /// always takes the following character with it.
    fn read_quoted(&mut self, quote: char) -> TokenType {
        let start = self.position - quote.len_utf8();
        loop {
            match self.advance() {
                None => return TokenType::Malformed("Unterminated quoted literal".to_string()),
                Some('\n') => {
                    return TokenType::Malformed("Newline inside a quoted literal".to_string())
                }
                Some('\\') => {
                    if self.advance().is_none() {
                        return TokenType::Malformed("Unterminated quoted literal".to_string());
                    }
                }
                Some(c) if c == quote => break,
                Some(_) => {}
            }
        }
        match unquote(&self.input[start..self.position]) {
            Ok(text) => TokenType::Quoted(text),
            Err(err) => TokenType::Malformed(format!("Can not parse quoted literal: {err}")),
        }
    }

    fn read_number(&mut self, first_char: char) -> TokenType {
        let start = self.position - first_char.len_utf8();

        if first_char == '0' && self.peek() == Some('x') {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.advance();
            }
            let digits = &self.input[start + 2..self.position];
            return match i64::from_str_radix(digits, 16) {
                Ok(num) => TokenType::Integer(num),
                Err(err) => TokenType::Malformed(format!(
                    "Error parsing hex value '{}': {err}",
                    &self.input[start..self.position]
                )),
            };
        }

        self.skip_digits();
        let mut is_float = false;
        if self.peek() == Some('.') && self.next_is_digit_after(1) {
            is_float = true;
            self.advance();
            self.skip_digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let rest = &self.input[self.position + 1..];
            let exponent_follows = rest.starts_with(|c: char| c.is_ascii_digit())
                || ((rest.starts_with('+') || rest.starts_with('-'))
                    && rest[1..].starts_with(|c: char| c.is_ascii_digit()));
            if exponent_follows {
                is_float = true;
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                self.skip_digits();
            }
        }

        let text = &self.input[start..self.position];
        if is_float {
            match text.parse::<f64>() {
                Ok(num) if num.is_finite() => TokenType::Float(num),
                Ok(_) => TokenType::Malformed(format!("Float value '{text}' is out of range")),
                Err(err) => {
                    TokenType::Malformed(format!("Error parsing float value '{text}': {err}"))
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(num) => TokenType::Integer(num),
                Err(err) => {
                    TokenType::Malformed(format!("Error parsing integer value '{text}': {err}"))
                }
            }
        }
    }

    fn skip_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn next_is_digit_after(&self, offset: usize) -> bool {
        self.input[self.position..]
            .chars()
            .nth(offset)
            .is_some_and(|c| c.is_ascii_digit())
    }
}

fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

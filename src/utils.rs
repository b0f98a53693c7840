use std::fmt::Write;

/// Calculates the 1-based line and column number for a given byte position in the source text.
/// Columns count characters, not bytes. This function is designed to be called only when an
/// error occurs, as it iterates through the source text to determine the position.
pub fn get_line_and_column(source: &str, position: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (i, c) in source.char_indices() {
        if i >= position {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Quotes `text` as a double-quoted ACL literal that `unquote` reads back unchanged.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\u{0b}' => out.push_str("\\v"),
            c if (c as u32) < 0x80 && c.is_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if c.is_control() && (c as u32) <= 0xffff => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\U{:08x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Unescapes a quoted literal, including its surrounding quotes. Either quote
/// character may delimit the literal; the other one may appear unescaped inside.
pub fn unquote(literal: &str) -> Result<String, String> {
    let mut chars = literal.chars();
    let open = match chars.next() {
        Some(c @ ('"' | '\'')) => c,
        _ => return Err(format!("{literal} is not a quoted literal")),
    };
    if literal.len() < 2 || !literal.ends_with(open) {
        return Err(format!("{literal} is not terminated"));
    }
    let body = &literal[1..literal.len() - 1];

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == open {
            return Err(format!("unescaped {c} inside {literal}"));
        }
        if c == '\n' {
            return Err("newline inside a quoted literal".to_string());
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars
            .next()
            .ok_or_else(|| format!("dangling backslash in {literal}"))?;
        match escaped {
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            '\\' | '"' | '\'' => out.push(escaped),
            'x' => out.push(read_code_point(&mut chars, 2, 16)?),
            'u' => out.push(read_code_point(&mut chars, 4, 16)?),
            'U' => out.push(read_code_point(&mut chars, 8, 16)?),
            '0'..='7' => {
                let mut digits = String::from(escaped);
                for _ in 0..2 {
                    match chars.next() {
                        Some(d @ '0'..='7') => digits.push(d),
                        _ => return Err(format!("invalid octal escape in {literal}")),
                    }
                }
                let value = u32::from_str_radix(&digits, 8)
                    .map_err(|e| format!("invalid octal escape in {literal}: {e}"))?;
                if value > 0xff {
                    return Err(format!("octal escape \\{digits} is out of range"));
                }
                out.push(char::from(value as u8));
            }
            other => return Err(format!("unknown escape sequence \\{other}")),
        }
    }
    Ok(out)
}

fn read_code_point(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    len: usize,
    radix: u32,
) -> Result<char, String> {
    let digits: String = chars.by_ref().take(len).collect();
    if digits.chars().count() != len || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(format!("expected {len} hex digits in escape, found '{digits}'"));
    }
    let value = u32::from_str_radix(&digits, radix).map_err(|e| e.to_string())?;
    char::from_u32(value).ok_or_else(|| format!("\\{digits} is not a valid character"))
}

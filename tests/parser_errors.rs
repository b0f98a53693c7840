// Parser error path tests
// Each malformed input must fail with a usable line and column

use acl_core::context::MAX_DEPTH;
use acl_core::{parse, ParseLocation};

fn fail(source: &str) -> (ParseLocation, bool) {
    match parse(source, "test.acl") {
        Ok(root) => panic!("Should fail, parsed to {root}"),
        Err(err) => {
            let syntax = matches!(
                err,
                acl_core::AclError::Parser(acl_core::ParserError::Syntax { .. })
            );
            (err.location().expect("parse errors carry a location"), syntax)
        }
    }
}

#[test]
fn test_parser_error_unmatched_brace() {
    let (location, syntax) = fail("a = 1\nouter {\n  inner {\n    x = 1\n  }\n");
    assert!(!syntax);
    assert_eq!((location.line, location.column), (2, 7));
}

#[test]
fn test_parser_error_unmatched_bracket() {
    let (location, syntax) = fail("list = [1, 2,\n3");
    assert!(!syntax);
    assert_eq!((location.line, location.column), (1, 8));
}

#[test]
fn test_parser_error_stray_bracket() {
    let (location, syntax) = fail("a = 1\n\n   ]");
    assert!(!syntax);
    assert_eq!((location.line, location.column), (3, 4));
}

#[test]
fn test_parser_error_stray_brace() {
    let (location, _) = fail("a = 1 }");
    assert_eq!((location.line, location.column), (1, 7));
}

#[test]
fn test_parser_error_mismatched_closers() {
    fail("a = [1, 2 }");
    fail("a { b = 1 ]");
}

#[test]
fn test_parser_error_empty_quoted_key() {
    let (location, syntax) = fail("ok = 1\n'' = 2");
    assert!(syntax);
    assert_eq!((location.line, location.column), (2, 1));
    assert_eq!(location.message, "Key names may not be empty");

    fail("\"\" = 2");
}

#[test]
fn test_parser_error_dangling_keys() {
    let (location, _) = fail("a = 1\nserver cyril");
    assert_eq!(location.message, "Key names found without a value.");
    assert_eq!((location.line, location.column), (2, 1));
    fail("a b;");
}

#[test]
fn test_parser_error_invalid_key_characters() {
    fail("1abc = 2");
    fail("a-b = 2");
    fail("a+ = 2");
    fail("ключ = 1");
}

#[test]
fn test_parser_error_invalid_value_characters() {
    let (location, syntax) = fail("a = b = c");
    assert!(syntax);
    assert_eq!(location.column, 7);
    fail("a = @home");
    fail("a = 1.");
    fail("a = .5");
}

#[test]
fn test_parser_error_bad_numbers() {
    fail("a = 9223372036854775808");
    fail("a = 0x");
    fail("a = 1e400");
}

#[test]
fn test_parser_error_bad_strings() {
    let (location, syntax) = fail("a = \"line one\nline two\"");
    assert!(syntax);
    assert_eq!((location.line, location.column), (1, 5));
    fail("a = 'unknown \\q escape'");
    fail("a = \"\\u12\"");
    fail("a = 'never closed");
}

#[test]
fn test_parser_error_semicolon_in_array() {
    let (location, syntax) = fail("a = [1;\n2]");
    assert!(syntax);
    assert_eq!(location.column, 7);
}

#[test]
fn test_parser_error_unterminated_comment() {
    let (location, syntax) = fail("a = 1\nb = 2 /* open\n\n");
    assert!(syntax);
    assert_eq!((location.line, location.column), (2, 7));
}

#[test]
fn test_parser_error_values_and_children() {
    let (location, syntax) = fail("a = 1\na { b = 2 }");
    assert!(!syntax);
    assert_eq!(location.line, 2);
    fail("a { b = 2 }\na = 1");
    fail("a { b = 2 }\na = [1]");
    fail("a = 1\na b = 2");
}

#[test]
fn test_parser_error_values_on_root() {
    fail("= 1");
    fail("[1, 2]");
}

#[test]
fn test_trailing_statements_are_tolerated() {
    assert!(parse(";;\n;\n", "test.acl").is_ok());
    assert!(parse("a = 1;\nb = 2;", "test.acl").is_ok());
    assert!(parse("a = 1,\nb = 2,", "test.acl").is_ok());
    assert!(parse("a =\nb = 2", "test.acl").is_ok());
}

#[test]
fn test_parser_error_nesting_too_deep() {
    let depth = 20_000;
    let source = format!("a = {}{}", "[".repeat(depth), "]".repeat(depth));
    let (location, syntax) = fail(&source);
    assert!(!syntax);
    // the first bracket past the limit is reported
    assert_eq!((location.line, location.column), (1, 5 + MAX_DEPTH));
    assert!(location.message.contains("deeper than"), "{}", location.message);

    fail(&"a { ".repeat(depth));
    fail(&format!("{}= 1", "k ".repeat(MAX_DEPTH + 1)));
}

#[test]
fn test_nesting_up_to_the_limit_is_accepted() {
    let source = format!("a = {}1{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
    let root = parse(&source, "test.acl").unwrap();
    let text = root.to_canonical_string();
    let reparsed = parse(&text, "canonical.acl").unwrap();
    assert_eq!(reparsed.to_canonical_string(), text);
    assert!(root.to_json().is_ok());
}

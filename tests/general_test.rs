use acl_core::parser::Parser;
use acl_core::Node;
use miette::Report;
use std::fs;

fn fixture_sources() -> Vec<(String, String)> {
    let tests_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/ok");
    let entries = fs::read_dir(tests_dir).expect("Failed to read fixtures directory");

    let mut sources = Vec::new();
    for entry in entries {
        let path = entry.expect("Failed to read directory entry").path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "acl") {
            let source = fs::read_to_string(&path)
                .unwrap_or_else(|_| panic!("Failed to read file: {:?}", path));
            sources.push((path.display().to_string(), source));
        }
    }
    assert!(!sources.is_empty(), "no .acl fixtures found");
    sources
}

#[test]
fn test_all_acl_files() {
    for (name, source) in fixture_sources() {
        println!("Parsing file: {name}");
        let mut root = Node::new();
        let mut parser = Parser::new_with_name(&source, name.clone());
        if let Err(err) = parser.parse_into(&mut root) {
            panic!("Failed to parse {name}. Error: {:?}", Report::new(err));
        }
        assert!(!root.is_empty(), "{name} produced an empty tree");
    }
}

#[test]
fn test_all_acl_files_reach_a_fixed_point() {
    for (name, source) in fixture_sources() {
        let first = acl_core::parse(&source, &name).unwrap().to_canonical_string();
        let reparsed = acl_core::parse(&first, "canonical.acl").unwrap_or_else(|err| {
            panic!("canonical form of {name} does not parse: {err}\n{first}")
        });
        assert_eq!(first, reparsed.to_canonical_string(), "{name}");
    }
}

#[test]
fn test_all_acl_files_export_to_json() {
    for (name, source) in fixture_sources() {
        let root = acl_core::parse(&source, &name).unwrap();
        let json = root.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.is_object(), "{name}");
    }
}

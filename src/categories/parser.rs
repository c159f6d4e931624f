use serde_json::Value;
use thiserror::Error;

use crate::domain::CategoryTree;

use super::validator::TreeError;

#[derive(Debug, Error)]
pub enum TreeParseError {
    #[error("Invalid YAML/JSON format: {0}")]
    Syntax(#[from] serde_yaml::Error),
    #[error(
        "Invalid category tree structure. Must be a nested object with string arrays as leaf nodes."
    )]
    Structure(#[source] TreeError),
}

/// Accepts a tree either as an already-structured JSON value or as YAML/JSON
/// text carried in a JSON string.
pub fn parse_tree_input(input: Value) -> Result<CategoryTree, TreeParseError> {
    match input {
        Value::String(text) => parse_tree_text(&text),
        other => CategoryTree::try_from(&other).map_err(TreeParseError::Structure),
    }
}

/// YAML is a superset of JSON, so JSON text parses the same way here.
pub fn parse_tree_text(text: &str) -> Result<CategoryTree, TreeParseError> {
    let value: Value = serde_yaml::from_str(text)?;
    CategoryTree::try_from(&value).map_err(TreeParseError::Structure)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::categories::flatten;

    #[test]
    fn parses_yaml_keeping_document_order() {
        let text = "Work:\n  Docs: []\n  Specs:\n    - rfc\nArchive: []\n";
        let tree = parse_tree_text(text).unwrap();
        assert_eq!(flatten(&tree), vec!["Work", "Work/Docs", "Work/Specs", "Archive"]);
    }

    #[test]
    fn json_text_parses_like_yaml() {
        let from_json = parse_tree_text(r#"{"Work": {"Docs": []}, "Archive": []}"#).unwrap();
        let from_yaml = parse_tree_text("Work:\n  Docs: []\nArchive: []").unwrap();
        assert_eq!(from_json, from_yaml);
    }

    #[test]
    fn structured_input_skips_text_parsing() {
        let tree = parse_tree_input(json!({ "A": { "B": [] } })).unwrap();
        assert_eq!(flatten(&tree), vec!["A", "A/B"]);
    }

    #[test]
    fn syntax_errors_carry_the_parser_message() {
        let err = parse_tree_text("Work: [unclosed").unwrap_err();
        assert!(matches!(err, TreeParseError::Syntax(_)));
        assert!(err.to_string().starts_with("Invalid YAML/JSON format: "));
    }

    #[test]
    fn structural_errors_use_the_fixed_message() {
        let err = parse_tree_text("Work: plain text").unwrap_err();
        assert!(matches!(err, TreeParseError::Structure(TreeError::InvalidNode { .. })));
        assert_eq!(
            err.to_string(),
            "Invalid category tree structure. Must be a nested object with string arrays as leaf nodes."
        );

        let err = parse_tree_input(json!({ "Archive": [1, 2] })).unwrap_err();
        assert!(matches!(err, TreeParseError::Structure(TreeError::NonStringItem { .. })));
    }

    #[test]
    fn yaml_null_leaf_is_rejected() {
        assert!(matches!(
            parse_tree_text("Archive:\n"),
            Err(TreeParseError::Structure(_))
        ));
    }

    #[test]
    fn scalar_document_is_not_a_tree() {
        assert!(matches!(
            parse_tree_text("just a sentence"),
            Err(TreeParseError::Structure(TreeError::RootNotObject))
        ));
    }
}

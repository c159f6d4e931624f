//! Turns raw reasoning-engine output into a [`ClassificationResult`].
//!
//! The engine is asked for JSON but routinely wraps it in prose or code
//! fences, so the payload is taken from the widest `{ ... }` span in the first
//! text block. Every way this can fail is a [`DecodeError`].

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::domain::ClassificationResult;

use super::engine::EngineResponse;

static JSON_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid json span regex"));

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("No text content in reasoning engine response")]
    NoText,
    #[error("Could not find JSON in reasoning engine response")]
    NoJson,
    #[error("Failed to parse reasoning engine response: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Greedy: from the first `{` to the last `}` in `text`.
pub fn extract_json_span(text: &str) -> Option<&str> {
    JSON_SPAN.find(text).map(|m| m.as_str())
}

pub fn decode_result(response: &EngineResponse) -> Result<ClassificationResult, DecodeError> {
    let Some(text) = response.first_text() else {
        tracing::error!(target: "ai", blocks = response.content.len(), "no text block in engine response");
        return Err(DecodeError::NoText);
    };

    let Some(span) = extract_json_span(text) else {
        tracing::error!(target: "ai", text = %text, "no JSON object in engine response");
        return Err(DecodeError::NoJson);
    };

    serde_json::from_str(span).map_err(|err| {
        tracing::error!(target: "ai", error = %err, json = %span, "engine JSON did not parse");
        DecodeError::InvalidJson(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::engine::ContentBlock;

    #[test]
    fn span_covers_outermost_braces() {
        let text = "Sure! ```json\n{\"a\": {\"b\": 1}}\n``` hope that helps";
        assert_eq!(extract_json_span(text), Some("{\"a\": {\"b\": 1}}"));
        assert_eq!(extract_json_span("no braces here"), None);
        assert_eq!(extract_json_span("only } then {"), None);
    }

    #[test]
    fn decodes_payload_wrapped_in_prose() {
        let response = EngineResponse::text(
            "Here is the analysis:\n{\"isArticle\": false, \"contentType\": \"tool\", \
             \"title\": \"Regex101\", \"summary\": \"Regex tester.\", \
             \"categories\": [\"regex\", \"dev\"], \"matchedCategory\": \"Personal/Tools\"}\nThanks",
        );
        let result = decode_result(&response).unwrap();
        assert!(!result.is_article);
        assert_eq!(result.content_type, "tool");
        assert_eq!(result.categories, vec!["regex", "dev"]);
        assert_eq!(result.matched_category.as_deref(), Some("Personal/Tools"));
    }

    #[test]
    fn comma_separated_categories_still_decode() {
        let response = EngineResponse::text(
            "{\"isArticle\": false, \"categories\": \"dev, tools\", \"matchedCategory\": \"Other\"}",
        );
        let result = decode_result(&response).unwrap();
        assert_eq!(result.categories, vec!["dev", "tools"]);
        assert_eq!(result.matched_category.as_deref(), Some("Other"));
    }

    #[test]
    fn missing_text_block_is_an_error() {
        let response = EngineResponse {
            content: vec![ContentBlock::Other],
        };
        assert!(matches!(decode_result(&response), Err(DecodeError::NoText)));
        let empty = EngineResponse { content: vec![] };
        assert!(matches!(decode_result(&empty), Err(DecodeError::NoText)));
    }

    #[test]
    fn text_without_braces_is_an_error() {
        let response = EngineResponse::text("I could not analyze this page.");
        assert!(matches!(decode_result(&response), Err(DecodeError::NoJson)));
    }

    #[test]
    fn malformed_span_is_an_error() {
        let response = EngineResponse::text("{\"isArticle\": tru}");
        assert!(matches!(decode_result(&response), Err(DecodeError::InvalidJson(_))));
    }

    #[test]
    fn greedy_span_across_two_objects_fails_to_parse() {
        let response = EngineResponse::text("{\"isArticle\": true} and also {\"x\": 1}");
        assert!(matches!(decode_result(&response), Err(DecodeError::InvalidJson(_))));
    }
}

use std::future::Future;

use anyhow::Result;
use serde::Deserialize;

/// An external language model that turns a prompt into content blocks.
pub trait ReasoningEngine: Send + Sync {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<EngineResponse>> + Send;
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineResponse {
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl EngineResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// The first text block, if the engine returned any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Other => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_text_skips_non_text_blocks() {
        let response: EngineResponse = serde_json::from_str(
            r#"{"content": [
                {"type": "tool_use", "id": "x", "name": "n", "input": {}},
                {"type": "text", "text": "first"},
                {"type": "text", "text": "second"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(response.first_text(), Some("first"));
    }

    #[test]
    fn no_text_blocks_means_none() {
        let response = EngineResponse {
            content: vec![ContentBlock::Other],
        };
        assert_eq!(response.first_text(), None);
    }
}

use anyhow::{Context, Result};
use reqwest::Response;
use serde::Serialize;

use super::engine::EngineResponse;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

pub fn build_request(model: String, prompt: &str) -> MessagesRequest {
    MessagesRequest {
        model,
        max_tokens: MAX_TOKENS,
        messages: vec![ChatMessage {
            role: "user".into(),
            content: prompt.to_string(),
        }],
    }
}

pub async fn parse_response(response: Response) -> Result<EngineResponse> {
    let body = response
        .text()
        .await
        .context("failed to read Anthropic response body")?;
    let parsed: EngineResponse =
        serde_json::from_str(&body).context("Anthropic response was not a messages payload")?;
    Ok(parsed)
}

#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

use anyhow::{bail, Context, Result};
use reqwest::Client;

use crate::config::AnthropicConfig;

use super::{
    engine::{EngineResponse, ReasoningEngine},
    inference::{build_request, parse_response, ANTHROPIC_VERSION},
};

#[derive(Clone)]
pub struct AnthropicClient {
    http: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(http: Client, config: AnthropicConfig) -> Self {
        Self { http, config }
    }
}

impl ReasoningEngine for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<EngineResponse> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .context("ANTHROPIC_API_KEY must be configured for bookmark analysis")?;

        let request = build_request(self.config.model.clone(), prompt);
        let response = self
            .http
            .post(&self.config.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(target: "ai", %status, body = %body, "Anthropic API returned an error");
            bail!("Anthropic API error {status}: {body}");
        }

        parse_response(response).await
    }
}

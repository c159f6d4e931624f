use std::future::Future;

use reqwest::{header::USER_AGENT, Client, Response};
use tracing::warn;
use url::Url;

use crate::config::WebContentConfig;

pub const FETCH_USER_AGENT: &str = "Mozilla/5.0 (compatible; Bookmark-AI/1.0)";
pub const TRUNCATION_MARKER: &str = "\n... [content truncated]";

/// Where page content comes from. Any failure yields `None`; content is
/// optional context for classification, never a hard dependency.
pub trait ContentSource: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Option<String>> + Send;
}

pub struct WebContentFetcher {
    client: Client,
    config: WebContentConfig,
}

impl WebContentFetcher {
    pub fn new(client: Client, config: WebContentConfig) -> Self {
        Self { client, config }
    }
}

impl ContentSource for WebContentFetcher {
    async fn fetch(&self, raw_url: &str) -> Option<String> {
        let url = match Url::parse(raw_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            _ => return None,
        };

        tracing::debug!(target: "web", url = %url, "fetching page content");
        let response = match self
            .client
            .get(url.clone())
            .header(USER_AGENT, FETCH_USER_AGENT)
            .timeout(self.config.fetch_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(target: "web", error = %err, url = %url, "page fetch failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(target: "web", %status, url = %url, "page fetch returned non-success status");
            return None;
        }

        match read_capped(response, self.config.content_max_length.saturating_mul(4)).await {
            Ok(body) => Some(body),
            Err(err) => {
                warn!(target: "web", error = %err, url = %url, "failed to read page body");
                None
            }
        }
    }
}

/// Reads the body until it is exhausted or longer than `cap` bytes. A UTF-8
/// character is at most four bytes, so a cap of four times the character
/// ceiling always leaves enough for the later truncation to notice the cut.
async fn read_capped(mut response: Response, cap: usize) -> reqwest::Result<String> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        body.extend_from_slice(&chunk);
        if body.len() > cap {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Cuts `content` to at most `max_chars` characters and marks the cut.
pub fn truncate_content(content: String, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut truncated = content;
            truncated.truncate(byte_idx);
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => content,
    }
}

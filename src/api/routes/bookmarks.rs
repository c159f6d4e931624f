use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    ai::ClassifyError,
    api::{
        error::{ApiError, ApiResult},
        extract::{ApiJson, AuthUser},
        response::{ok, Envelope},
        state::AppState,
    },
    domain::{
        user::{InstapaperCredentials, TodoistCredentials},
        ClassificationResult, InstapaperOutcome, TodoistOutcome, User,
    },
    infrastructure::rate_limit::BOOKMARK_LIMIT,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub create_todoist_task: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub url: String,
    pub is_article: bool,
    pub content_type: String,
    pub title: String,
    pub summary: String,
    pub categories: Vec<String>,
    pub matched_category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instapaper: Option<InstapaperOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todoist: Option<TodoistOutcome>,
    pub analyzed_at: String,
}

/// POST /api/bookmarks/analyze
///
/// Pure compute: classifies the URL against the caller's tree and fans out to
/// the configured integrations. Nothing about the bookmark is stored.
pub async fn analyze_bookmark(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<AnalyzeRequest>,
) -> ApiResult<Json<Envelope<AnalyzeResponse>>> {
    if !state
        .rate_limiter
        .check(&format!("bookmark:{}", user.id), BOOKMARK_LIMIT)
    {
        return Err(ApiError::TooManyRequests);
    }

    let url = validate_url(&body.url)?;

    let category = state
        .categories
        .find_by_user(&user.id)
        .await
        .map_err(|err| ClassifyError::Setup(format!("{err:#}")))?
        .ok_or_else(|| ApiError::NotFound("User category tree not found".to_string()))?;

    let analysis = state
        .classifier
        .classify(&url, body.title.as_deref(), &category.tree)
        .await?;

    let (instapaper, todoist) =
        run_integrations(&state, &user, &url, &analysis, body.create_todoist_task).await;

    tracing::info!(
        target: "api",
        user_id = %user.id,
        url = %url,
        is_article = analysis.is_article,
        matched = analysis.matched_category.as_deref().unwrap_or(""),
        "bookmark analyzed"
    );

    Ok(ok(AnalyzeResponse {
        url,
        is_article: analysis.is_article,
        content_type: analysis.content_type,
        title: analysis.title,
        summary: analysis.summary,
        categories: analysis.categories,
        matched_category: analysis.matched_category.unwrap_or_default(),
        instapaper,
        todoist,
        analyzed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

fn validate_url(raw: &str) -> ApiResult<String> {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(trimmed.to_string())
        }
        _ => Err(ApiError::BadRequest("Validation failed: Invalid URL".to_string())),
    }
}

/// The two integrations are independent; each failure stays inside its own
/// outcome value, including a stored secret that no longer decrypts.
async fn run_integrations(
    state: &AppState,
    user: &User,
    url: &str,
    analysis: &ClassificationResult,
    create_todoist_task: bool,
) -> (Option<InstapaperOutcome>, Option<TodoistOutcome>) {
    let instapaper = async {
        let stored = match (&user.settings.instapaper, analysis.is_article) {
            (Some(stored), true) => stored,
            _ => return None,
        };
        let outcome = match state.cipher.decrypt(&stored.password) {
            Ok(password) => {
                let creds = InstapaperCredentials {
                    username: stored.username.clone(),
                    password,
                };
                state
                    .integrations
                    .save_to_instapaper(url, &analysis.title, &creds)
                    .await
            }
            Err(err) => {
                tracing::warn!(
                    target: "integrations",
                    user_id = %user.id,
                    %err,
                    "instapaper credentials unusable"
                );
                InstapaperOutcome::failed(err.to_string())
            }
        };
        Some(outcome)
    };

    let todoist = async {
        let stored = match (&user.settings.todoist, create_todoist_task) {
            (Some(stored), true) => stored,
            _ => return None,
        };
        let outcome = match state.cipher.decrypt(&stored.api_token) {
            Ok(api_token) => {
                let creds = TodoistCredentials { api_token };
                state
                    .integrations
                    .create_todoist_task(&analysis.title, url, &analysis.summary, &creds)
                    .await
            }
            Err(err) => {
                tracing::warn!(
                    target: "integrations",
                    user_id = %user.id,
                    %err,
                    "todoist credentials unusable"
                );
                TodoistOutcome::failed(err.to_string())
            }
        };
        Some(outcome)
    };

    tokio::join!(instapaper, todoist)
}

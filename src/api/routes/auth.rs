use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::{
        error::{ApiError, ApiResult},
        extract::{client_ip, ApiJson},
        response::{created, Envelope},
        state::AppState,
    },
    categories::default_tree,
    domain::{PublicApiKey, PublicUser},
    infrastructure::rate_limit::REGISTER_LIMIT,
};

const DEFAULT_KEY_NAME: &str = "Default";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user: PublicUser,
    /// Shown exactly once.
    pub api_key: String,
    pub key_info: PublicApiKey,
}

/// POST /api/auth/register
///
/// Creates the account, seeds the default category tree and issues the first
/// API key.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<RegisterResponse>>)> {
    if state.config.server.registration_disabled {
        return Err(ApiError::Forbidden(
            "Registration is currently disabled".to_string(),
        ));
    }

    let ip = client_ip(&headers);
    if !state
        .rate_limiter
        .check(&format!("register:{ip}"), REGISTER_LIMIT)
    {
        return Err(ApiError::TooManyRequests);
    }

    let email = normalize_email(&body.email)
        .ok_or_else(|| ApiError::BadRequest("Validation failed: Invalid email".to_string()))?;
    let full_name = body
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let registration = state
        .users
        .register(&email, full_name, &default_tree(), DEFAULT_KEY_NAME)
        .await?;
    let user = registration.user;
    let issued = registration.key;

    tracing::info!(target: "api", user_id = %user.id, "user registered");

    Ok(created(RegisterResponse {
        user: PublicUser::from(&user),
        api_key: issued.secret,
        key_info: PublicApiKey::from(&issued.key),
    }))
}

/// Lowercased and trimmed; `None` unless it looks like `local@domain.tld`.
fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    let valid = !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'));
    valid.then_some(email)
}

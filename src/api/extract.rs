use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    Json,
};

use crate::{domain::User, infrastructure::rate_limit::API_LIMIT};

use super::{error::ApiError, state::AppState};

pub const API_KEY_HEADER: &str = "x-api-key";

/// `Json` whose rejections come back in the error envelope.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// The caller behind a valid API key.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let secret = presented_key(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Missing API key".to_string()))?;

        let key = state
            .api_keys
            .authenticate(secret)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired API key".to_string()))?;

        let user = state
            .users
            .find_by_id(&key.user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

        if !state.rate_limiter.check(&format!("api:{}", user.id), API_LIMIT) {
            return Err(ApiError::TooManyRequests);
        }

        Ok(Self(user))
    }
}

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    bearer
        .or_else(|| {
            headers
                .get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
        })
        .filter(|key| !key.is_empty())
}

/// Best-effort client address from proxy headers.
pub fn client_ip(headers: &HeaderMap) -> String {
    ["cf-connecting-ip", "x-forwarded-for"]
        .iter()
        .filter_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
        .filter_map(|v| v.split(',').next())
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_header_wins_over_api_key_header() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("bk_header"));
        assert_eq!(presented_key(&headers), Some("bk_header"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer bk_bearer"));
        assert_eq!(presented_key(&headers), Some("bk_bearer"));
    }

    #[test]
    fn blank_or_non_bearer_authorization_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(presented_key(&headers), None);
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("  "));
        assert_eq!(presented_key(&headers), None);
    }

    #[test]
    fn client_ip_prefers_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "unknown");
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        assert_eq!(client_ip(&headers), "10.0.0.1");
        headers.insert("cf-connecting-ip", HeaderValue::from_static("203.0.113.9"));
        assert_eq!(client_ip(&headers), "203.0.113.9");
    }
}

use reqwest::{Client, StatusCode};

use crate::domain::{user::InstapaperCredentials, InstapaperOutcome};

pub async fn save(
    http: &Client,
    endpoint: &str,
    url: &str,
    title: &str,
    creds: &InstapaperCredentials,
) -> InstapaperOutcome {
    tracing::info!(target: "integrations", url, "saving to Instapaper");
    let response = http
        .post(endpoint)
        .basic_auth(&creds.username, Some(&creds.password))
        .form(&[("url", url), ("title", title)])
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(target: "integrations", error = %err, "Instapaper request failed");
            return InstapaperOutcome::failed(err.to_string());
        }
    };

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    outcome_for(status, &body)
}

fn outcome_for(status: StatusCode, body: &str) -> InstapaperOutcome {
    match status.as_u16() {
        201 => InstapaperOutcome {
            saved: true,
            bookmark_id: body.trim().parse().ok(),
            error: None,
        },
        200 => InstapaperOutcome {
            saved: true,
            ..Default::default()
        },
        403 => InstapaperOutcome::failed("Invalid Instapaper credentials"),
        400 => InstapaperOutcome::failed("Invalid request parameters"),
        500 => InstapaperOutcome::failed("Instapaper service error"),
        other => InstapaperOutcome::failed(format!("Unexpected status: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_carries_bookmark_id() {
        let outcome = outcome_for(StatusCode::CREATED, "12345\n");
        assert!(outcome.saved);
        assert_eq!(outcome.bookmark_id, Some(12345));
    }

    #[test]
    fn existing_bookmark_counts_as_saved() {
        assert_eq!(
            outcome_for(StatusCode::OK, ""),
            InstapaperOutcome {
                saved: true,
                bookmark_id: None,
                error: None
            }
        );
    }

    #[test]
    fn error_statuses_are_mapped() {
        let cases = [
            (StatusCode::FORBIDDEN, "Invalid Instapaper credentials"),
            (StatusCode::BAD_REQUEST, "Invalid request parameters"),
            (StatusCode::INTERNAL_SERVER_ERROR, "Instapaper service error"),
            (StatusCode::SERVICE_UNAVAILABLE, "Unexpected status: 503"),
        ];
        for (status, message) in cases {
            let outcome = outcome_for(status, "");
            assert!(!outcome.saved);
            assert_eq!(outcome.error.as_deref(), Some(message));
        }
    }
}

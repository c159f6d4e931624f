use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::domain::{user::TodoistCredentials, TodoistOutcome};

#[derive(Debug, Serialize)]
struct NewTask {
    content: String,
}

#[derive(Debug, Deserialize)]
struct CreatedTask {
    id: String,
}

pub fn task_content(title: &str, url: &str, summary: &str) -> String {
    format!("{title}\n{url}\n\n{summary}")
}

pub async fn create_task(
    http: &Client,
    endpoint: &str,
    title: &str,
    url: &str,
    summary: &str,
    creds: &TodoistCredentials,
) -> TodoistOutcome {
    tracing::info!(target: "integrations", title, "creating Todoist task");
    let response = http
        .post(endpoint)
        .bearer_auth(&creds.api_token)
        .json(&NewTask {
            content: task_content(title, url, summary),
        })
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(target: "integrations", error = %err, "Todoist request failed");
            return TodoistOutcome::failed(err.to_string());
        }
    };

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    outcome_for(status, &body)
}

fn outcome_for(status: StatusCode, body: &str) -> TodoistOutcome {
    match status.as_u16() {
        200 => match serde_json::from_str::<CreatedTask>(body) {
            Ok(task) => TodoistOutcome {
                created: true,
                task_id: Some(task.id),
                error: None,
            },
            Err(err) => TodoistOutcome::failed(format!("Unreadable Todoist response: {err}")),
        },
        403 => TodoistOutcome::failed("Invalid Todoist API token"),
        400 => TodoistOutcome::failed("Invalid request parameters"),
        other => TodoistOutcome::failed(format!("Unexpected status: {other} - {body}")),
    }
}

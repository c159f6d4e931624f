//! Best-effort forwarding of analysis results to third-party services.
//! Failures come back as values and never abort the analysis.

mod instapaper;
mod todoist;

use reqwest::Client;

use crate::{
    config::IntegrationsConfig,
    domain::{
        user::{InstapaperCredentials, TodoistCredentials},
        InstapaperOutcome, TodoistOutcome,
    },
};

#[derive(Clone)]
pub struct Integrations {
    http: Client,
    config: IntegrationsConfig,
}

impl Integrations {
    pub fn new(http: Client, config: IntegrationsConfig) -> Self {
        Self { http, config }
    }

    pub async fn save_to_instapaper(
        &self,
        url: &str,
        title: &str,
        creds: &InstapaperCredentials,
    ) -> InstapaperOutcome {
        instapaper::save(&self.http, &self.config.instapaper_url, url, title, creds).await
    }

    pub async fn create_todoist_task(
        &self,
        title: &str,
        url: &str,
        summary: &str,
        creds: &TodoistCredentials,
    ) -> TodoistOutcome {
        todoist::create_task(
            &self.http,
            &self.config.todoist_url,
            title,
            url,
            summary,
            creds,
        )
        .await
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub settings: UserSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user integration settings, stored as a JSON column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instapaper: Option<InstapaperCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todoist: Option<TodoistCredentials>,
    #[serde(default)]
    pub auto_bookmark: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_folder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstapaperCredentials {
    pub username: String,
    /// Sealed by the credential cipher while stored.
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoistCredentials {
    /// Sealed by the credential cipher while stored.
    pub api_token: String,
}

/// What callers get to see about a user; never carries credentials.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub settings: PublicSettings,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    pub has_instapaper: bool,
    pub instapaper_username: Option<String>,
    pub has_todoist: bool,
    pub auto_bookmark: bool,
    pub default_folder: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            settings: PublicSettings {
                has_instapaper: user.settings.instapaper.is_some(),
                instapaper_username: user
                    .settings
                    .instapaper
                    .as_ref()
                    .map(|creds| creds.username.clone()),
                has_todoist: user.settings.todoist.is_some(),
                auto_bookmark: user.settings.auto_bookmark,
                default_folder: user.settings.default_folder.clone(),
            },
            created_at: user.created_at.timestamp(),
            updated_at: user.updated_at.timestamp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiKey {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub key_prefix: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicApiKey {
    pub id: String,
    pub name: String,
    pub key_prefix: String,
    pub created_at: i64,
    pub last_used_at: Option<i64>,
    pub expires_at: Option<i64>,
}

impl From<&ApiKey> for PublicApiKey {
    fn from(key: &ApiKey) -> Self {
        Self {
            id: key.id.clone(),
            name: key.name.clone(),
            key_prefix: key.key_prefix.clone(),
            created_at: key.created_at.timestamp(),
            last_used_at: key.last_used_at.map(|ts| ts.timestamp()),
            expires_at: key.expires_at.map(|ts| ts.timestamp()),
        }
    }
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::{
    api::{
        error::{ApiError, ApiResult},
        extract::{ApiJson, AuthUser},
        response::{created, ok, Envelope},
        state::AppState,
    },
    domain::{
        user::{InstapaperCredentials, TodoistCredentials},
        PublicApiKey, PublicUser, UserSettings,
    },
    infrastructure::cipher::{CipherError, CredentialCipher},
};

const MAX_KEY_NAME_LEN: usize = 100;
const MAX_KEY_LIFETIME_DAYS: u32 = 3650;

/// Partial profile update. For the nullable fields an explicit `null` clears
/// the stored value and an absent field leaves it alone.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "present")]
    pub full_name: Option<Option<String>>,
    #[serde(default)]
    pub settings: Option<SettingsPatch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, deserialize_with = "present")]
    pub instapaper: Option<Option<InstapaperCredentials>>,
    #[serde(default, deserialize_with = "present")]
    pub todoist: Option<Option<TodoistCredentials>>,
    #[serde(default)]
    pub auto_bookmark: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub default_folder: Option<Option<String>>,
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl SettingsPatch {
    /// Merges the patch into `settings`. Newly supplied secrets are sealed
    /// with `cipher`; stored ones are carried over as they are.
    pub fn apply(
        self,
        mut settings: UserSettings,
        cipher: &dyn CredentialCipher,
    ) -> Result<UserSettings, CipherError> {
        if let Some(instapaper) = self.instapaper {
            settings.instapaper = instapaper
                .map(|creds| {
                    Ok::<_, CipherError>(InstapaperCredentials {
                        password: cipher.encrypt(&creds.password)?,
                        username: creds.username,
                    })
                })
                .transpose()?;
        }
        if let Some(todoist) = self.todoist {
            settings.todoist = todoist
                .map(|creds| {
                    Ok::<_, CipherError>(TodoistCredentials {
                        api_token: cipher.encrypt(&creds.api_token)?,
                    })
                })
                .transpose()?;
        }
        if let Some(auto_bookmark) = self.auto_bookmark {
            settings.auto_bookmark = auto_bookmark;
        }
        if let Some(folder) = self.default_folder {
            settings.default_folder = folder.filter(|f| !f.trim().is_empty());
        }
        Ok(settings)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeyRequest {
    pub name: String,
    #[serde(default)]
    pub expires_in_days: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeyResponse {
    pub api_key: String,
    pub key_info: PublicApiKey,
}

/// GET /api/users/me
pub async fn get_profile(AuthUser(user): AuthUser) -> Json<Envelope<PublicUser>> {
    ok(PublicUser::from(&user))
}

/// PUT /api/users/me
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<Envelope<PublicUser>>> {
    let full_name = match body.full_name {
        Some(name) => name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        None => user.full_name.clone(),
    };
    let settings = match body.settings {
        Some(patch) => patch
            .apply(user.settings.clone(), state.cipher.as_ref())
            .map_err(anyhow::Error::from)?,
        None => user.settings.clone(),
    };

    let updated = state
        .users
        .update_profile(&user.id, full_name.as_deref(), &settings)
        .await?;
    tracing::info!(target: "api", user_id = %user.id, "profile updated");
    Ok(ok(PublicUser::from(&updated)))
}

/// DELETE /api/users/me
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Envelope<Value>>> {
    if !state.users.delete(&user.id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    tracing::info!(target: "api", user_id = %user.id, "account deleted");
    Ok(ok(json!({ "message": "Account deleted" })))
}

/// GET /api/users/me/api-keys
pub async fn list_api_keys(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Envelope<Vec<PublicApiKey>>>> {
    let keys = state.api_keys.list_for_user(&user.id).await?;
    Ok(ok(keys.iter().map(PublicApiKey::from).collect()))
}

/// POST /api/users/me/api-keys
pub async fn create_api_key(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<CreateKeyRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<CreateKeyResponse>>)> {
    let name = body.name.trim();
    if name.is_empty() || name.chars().count() > MAX_KEY_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "Validation failed: name must be 1-{MAX_KEY_NAME_LEN} characters"
        )));
    }
    let expires_at = match body.expires_in_days {
        Some(days) if days == 0 || days > MAX_KEY_LIFETIME_DAYS => {
            return Err(ApiError::BadRequest(format!(
                "Validation failed: expiresInDays must be 1-{MAX_KEY_LIFETIME_DAYS}"
            )));
        }
        Some(days) => Some(Utc::now() + Duration::days(i64::from(days))),
        None => None,
    };

    let issued = state.api_keys.issue(&user.id, name, expires_at).await?;
    tracing::info!(target: "api", user_id = %user.id, key_id = %issued.key.id, "api key issued");

    Ok(created(CreateKeyResponse {
        api_key: issued.secret,
        key_info: PublicApiKey::from(&issued.key),
    }))
}

/// DELETE /api/users/me/api-keys/:id
pub async fn revoke_api_key(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(key_id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.api_keys.delete(&user.id, &key_id).await? {
        return Err(ApiError::NotFound("API key not found".to_string()));
    }
    tracing::info!(target: "api", user_id = %user.id, key_id = %key_id, "api key revoked");
    Ok(StatusCode::NO_CONTENT)
}

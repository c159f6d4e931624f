use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::{query, query_as, sqlite::SqliteRow, FromRow, Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::domain::ApiKey;

use super::{from_unix, new_id};

pub const KEY_PREFIX: &str = "bk_";
const DISPLAY_PREFIX_LEN: usize = 8;

/// A freshly minted key. `secret` is only ever available here.
#[derive(Debug, Clone)]
pub struct IssuedKey {
    pub key: ApiKey,
    pub secret: String,
}

#[derive(Clone)]
pub struct ApiKeyRepository {
    pool: SqlitePool,
}

impl ApiKeyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn issue(
        &self,
        user_id: &str,
        name: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<IssuedKey> {
        let mut conn = self.pool.acquire().await?;
        let (id, secret) = insert_key(&mut conn, user_id, name, expires_at).await?;
        drop(conn);

        let key = self
            .find(user_id, &id)
            .await?
            .context("api key vanished right after insert")?;
        Ok(IssuedKey { key, secret })
    }

    pub async fn find(&self, user_id: &str, id: &str) -> Result<Option<ApiKey>> {
        let row = query_as::<_, ApiKeyRow>(
            r#"SELECT id, user_id, name, key_prefix, created_at, last_used_at, expires_at
                FROM api_keys WHERE id = ?1 AND user_id = ?2"#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.0))
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<ApiKey>> {
        let rows = query_as::<_, ApiKeyRow>(
            r#"SELECT id, user_id, name, key_prefix, created_at, last_used_at, expires_at
                FROM api_keys WHERE user_id = ?1 ORDER BY created_at DESC, id"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<bool> {
        let affected = query(r#"DELETE FROM api_keys WHERE id = ?1 AND user_id = ?2"#)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    /// Resolves a presented secret to its key, rejecting unknown and expired
    /// keys. Successful lookups refresh `last_used_at`.
    pub async fn authenticate(&self, secret: &str) -> Result<Option<ApiKey>> {
        if !secret.starts_with(KEY_PREFIX) {
            return Ok(None);
        }

        let row = query_as::<_, ApiKeyRow>(
            r#"SELECT id, user_id, name, key_prefix, created_at, last_used_at, expires_at
                FROM api_keys WHERE key_hash = ?1"#,
        )
        .bind(hash_key(secret))
        .fetch_optional(&self.pool)
        .await?;

        let Some(ApiKeyRow(mut key)) = row else {
            return Ok(None);
        };

        let now = Utc::now();
        if key.is_expired(now) {
            tracing::debug!(target: "db", key_id = %key.id, "rejected expired api key");
            return Ok(None);
        }

        query(r#"UPDATE api_keys SET last_used_at = ?1 WHERE id = ?2"#)
            .bind(now.timestamp())
            .bind(&key.id)
            .execute(&self.pool)
            .await?;
        key.last_used_at = Some(from_unix(now.timestamp()));
        Ok(Some(key))
    }
}

/// Mints a key for `user_id` on `conn` and returns `(id, secret)`.
pub(crate) async fn insert_key(
    conn: &mut SqliteConnection,
    user_id: &str,
    name: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<(String, String)> {
    let secret = format!("{KEY_PREFIX}{}", Uuid::new_v4().simple());
    let id = new_id();
    query(
        r#"INSERT INTO api_keys (id, user_id, name, key_hash, key_prefix, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(name)
    .bind(hash_key(&secret))
    .bind(display_prefix(&secret))
    .bind(Utc::now().timestamp())
    .bind(expires_at.map(|ts| ts.timestamp()))
    .execute(&mut *conn)
    .await?;
    Ok((id, secret))
}

pub fn hash_key(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.as_bytes()))
}

fn display_prefix(secret: &str) -> String {
    secret.chars().take(DISPLAY_PREFIX_LEN).collect()
}

struct ApiKeyRow(ApiKey);

impl<'r> FromRow<'r, SqliteRow> for ApiKeyRow {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let last_used_at: Option<i64> = row.try_get("last_used_at")?;
        let expires_at: Option<i64> = row.try_get("expires_at")?;
        Ok(Self(ApiKey {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            key_prefix: row.try_get("key_prefix")?,
            created_at: from_unix(row.try_get("created_at")?),
            last_used_at: last_used_at.map(from_unix),
            expires_at: expires_at.map(from_unix),
        }))
    }
}

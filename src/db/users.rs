use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{query, query_as, sqlite::SqliteRow, FromRow, Row, SqliteConnection, SqlitePool};
use thiserror::Error;

use crate::domain::{CategoryTree, User, UserSettings};

use super::{
    api_keys::{insert_key, ApiKeyRepository, IssuedKey},
    categories::upsert_tree,
    from_unix, new_id,
};

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("User with this email already exists")]
    EmailTaken,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<sqlx::Error> for RegistrationError {
    fn from(err: sqlx::Error) -> Self {
        RegistrationError::Storage(err.into())
    }
}

/// A new account together with its first key.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub key: IssuedKey,
}

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Bare account with no tree or key, for repository fixtures.
    #[cfg(test)]
    pub async fn create(&self, email: &str, full_name: Option<&str>) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        let id = insert_user(&mut conn, email, full_name).await?;
        drop(conn);

        self.find_by_id(&id)
            .await?
            .context("user vanished right after insert")
    }

    /// Creates the user, seeds `tree` and mints the first key in one
    /// transaction. Either all three rows exist afterwards or none do.
    pub async fn register(
        &self,
        email: &str,
        full_name: Option<&str>,
        tree: &CategoryTree,
        key_name: &str,
    ) -> Result<Registration, RegistrationError> {
        let mut tx = self.pool.begin().await?;
        let user_id = match insert_user(&mut tx, email, full_name).await {
            Ok(id) => id,
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Err(RegistrationError::EmailTaken);
            }
            Err(err) => return Err(err.into()),
        };
        upsert_tree(&mut tx, &user_id, tree).await?;
        let (key_id, secret) = insert_key(&mut tx, &user_id, key_name, None).await?;
        tx.commit().await?;

        let user = self
            .find_by_id(&user_id)
            .await?
            .context("user vanished right after registration")?;
        let key = ApiKeyRepository::new(self.pool.clone())
            .find(&user_id, &key_id)
            .await?
            .context("api key vanished right after registration")?;
        Ok(Registration {
            user,
            key: IssuedKey { key, secret },
        })
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let row = query_as::<_, UserRow>(
            r#"SELECT id, email, full_name, settings, created_at, updated_at FROM users WHERE id = ?1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.0))
    }

    pub async fn update_profile(
        &self,
        id: &str,
        full_name: Option<&str>,
        settings: &UserSettings,
    ) -> Result<User> {
        let settings_json = serde_json::to_string(settings)?;
        query(
            r#"UPDATE users SET full_name = ?1, settings = ?2, updated_at = ?3 WHERE id = ?4"#,
        )
        .bind(full_name)
        .bind(settings_json)
        .bind(Utc::now().timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .with_context(|| format!("user {id} not found after update"))
    }

    /// Removes the user together with their keys and category tree.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let affected = query(r#"DELETE FROM users WHERE id = ?1"#)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

async fn insert_user(
    conn: &mut SqliteConnection,
    email: &str,
    full_name: Option<&str>,
) -> std::result::Result<String, sqlx::Error> {
    let id = new_id();
    let now = Utc::now().timestamp();
    query(
        r#"INSERT INTO users (id, email, full_name, settings, created_at, updated_at)
            VALUES (?1, ?2, ?3, '{}', ?4, ?4)"#,
    )
    .bind(&id)
    .bind(email)
    .bind(full_name)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(id)
}

struct UserRow(User);

impl<'r> FromRow<'r, SqliteRow> for UserRow {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let settings: String = row.try_get("settings")?;
        let settings: UserSettings =
            serde_json::from_str(&settings).map_err(|err| sqlx::Error::ColumnDecode {
                index: "settings".to_string(),
                source: Box::new(err),
            })?;
        Ok(Self(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            full_name: row.try_get("full_name")?,
            settings,
            created_at: from_unix(row.try_get("created_at")?),
            updated_at: from_unix(row.try_get("updated_at")?),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{categories::CategoryRepository, init_memory_pool},
        domain::user::TodoistCredentials,
    };

    #[tokio::test]
    async fn create_and_find_user() {
        let repo = UserRepository::new(init_memory_pool().await.unwrap());
        let user = repo.create("a@example.com", Some("Ada")).await.unwrap();
        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.full_name.as_deref(), Some("Ada"));
        assert_eq!(user.settings, UserSettings::default());

        let by_id = repo.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id, user);
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let repo = UserRepository::new(init_memory_pool().await.unwrap());
        repo.create("dup@example.com", None).await.unwrap();
        assert!(repo.create("dup@example.com", None).await.is_err());
    }

    #[tokio::test]
    async fn registration_writes_user_tree_and_key_together() {
        let pool = init_memory_pool().await.unwrap();
        let repo = UserRepository::new(pool.clone());
        let registration = repo
            .register("r@example.com", None, &crate::categories::default_tree(), "Default")
            .await
            .unwrap();

        let tree = CategoryRepository::new(pool.clone())
            .find_by_user(&registration.user.id)
            .await
            .unwrap();
        assert!(tree.is_some());
        let key = ApiKeyRepository::new(pool)
            .authenticate(&registration.key.secret)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(key.user_id, registration.user.id);

        let again = repo
            .register("r@example.com", None, &CategoryTree::new(), "Default")
            .await;
        assert!(matches!(again, Err(RegistrationError::EmailTaken)));
    }

    #[tokio::test]
    async fn failed_registration_leaves_no_user_behind() {
        let pool = init_memory_pool().await.unwrap();
        query("DROP TABLE categories").execute(&pool).await.unwrap();
        let repo = UserRepository::new(pool);

        let result = repo
            .register("half@example.com", None, &CategoryTree::new(), "Default")
            .await;
        assert!(matches!(result, Err(RegistrationError::Storage(_))));
        let (users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(users, 0);
    }

    #[tokio::test]
    async fn settings_round_trip() {
        let repo = UserRepository::new(init_memory_pool().await.unwrap());
        let user = repo.create("s@example.com", None).await.unwrap();
        let settings = UserSettings {
            todoist: Some(TodoistCredentials {
                api_token: "tok".to_string(),
            }),
            auto_bookmark: true,
            ..Default::default()
        };
        let updated = repo
            .update_profile(&user.id, Some("Sam"), &settings)
            .await
            .unwrap();
        assert_eq!(updated.settings, settings);
        assert_eq!(updated.full_name.as_deref(), Some("Sam"));
    }

    #[tokio::test]
    async fn deleting_a_user_drops_their_tree() {
        let pool = init_memory_pool().await.unwrap();
        let users = UserRepository::new(pool.clone());
        let categories = CategoryRepository::new(pool);
        let user = users.create("d@example.com", None).await.unwrap();
        categories
            .save(&user.id, &crate::categories::default_tree())
            .await
            .unwrap();

        assert!(users.delete(&user.id).await.unwrap());
        assert!(categories.find_by_user(&user.id).await.unwrap().is_none());
    }
}

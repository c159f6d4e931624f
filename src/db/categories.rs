use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{query, query_as, sqlite::SqliteRow, FromRow, Row, SqliteConnection, SqlitePool};

use crate::domain::{Category, CategoryTree};

use super::{from_unix, new_id};

#[derive(Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_user(&self, user_id: &str) -> Result<Option<Category>> {
        let row = query_as::<_, CategoryRow>(
            r#"SELECT id, user_id, category_tree, created_at, updated_at
                FROM categories WHERE user_id = ?1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load category tree for user {user_id}"))?;
        Ok(row.map(|r| r.0))
    }

    /// Replaces the user's whole tree, creating the record on first save.
    pub async fn save(&self, user_id: &str, tree: &CategoryTree) -> Result<Category> {
        let mut conn = self.pool.acquire().await?;
        upsert_tree(&mut conn, user_id, tree).await?;
        drop(conn);

        tracing::debug!(target: "db", user_id, "category tree saved");
        self.find_by_user(user_id)
            .await?
            .with_context(|| format!("category tree for user {user_id} missing after save"))
    }
}

pub(crate) async fn upsert_tree(
    conn: &mut SqliteConnection,
    user_id: &str,
    tree: &CategoryTree,
) -> Result<()> {
    let tree_json = serde_json::to_string(tree)?;
    query(
        r#"INSERT INTO categories (id, user_id, category_tree, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(user_id) DO UPDATE SET
                category_tree = excluded.category_tree,
                updated_at = excluded.updated_at"#,
    )
    .bind(new_id())
    .bind(user_id)
    .bind(tree_json)
    .bind(Utc::now().timestamp())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

struct CategoryRow(Category);

impl<'r> FromRow<'r, SqliteRow> for CategoryRow {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let raw: String = row.try_get("category_tree")?;
        let tree: CategoryTree =
            serde_json::from_str(&raw).map_err(|err| sqlx::Error::ColumnDecode {
                index: "category_tree".to_string(),
                source: Box::new(err),
            })?;
        Ok(Self(Category {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            tree,
            created_at: from_unix(row.try_get("created_at")?),
            updated_at: from_unix(row.try_get("updated_at")?),
        }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        categories::{flatten, parse_tree_text},
        db::{init_memory_pool, users::UserRepository},
    };

    async fn setup() -> (CategoryRepository, String, SqlitePool) {
        let pool = init_memory_pool().await.unwrap();
        let user = UserRepository::new(pool.clone())
            .create("c@example.com", None)
            .await
            .unwrap();
        (CategoryRepository::new(pool.clone()), user.id, pool)
    }

    #[tokio::test]
    async fn missing_tree_is_none() {
        let (repo, user_id, _) = setup().await;
        assert!(repo.find_by_user(&user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saved_tree_flattens_like_the_original() {
        let (repo, user_id, _) = setup().await;
        let tree = parse_tree_text(
            "Zeta_Things:\n  Inner: [a, b]\nAlpha: []\nX_Bookmarks:\n  Hidden_Root: {}\n",
        )
        .unwrap();

        repo.save(&user_id, &tree).await.unwrap();
        let loaded = repo.find_by_user(&user_id).await.unwrap().unwrap();

        assert_eq!(loaded.tree, tree);
        assert_eq!(flatten(&loaded.tree), flatten(&tree));
    }

    #[tokio::test]
    async fn save_replaces_the_whole_tree() {
        let (repo, user_id, _) = setup().await;
        let first = repo
            .save(
                &user_id,
                &CategoryTree::try_from(&json!({ "Old": { "Stuff": [] } })).unwrap(),
            )
            .await
            .unwrap();
        let second = repo
            .save(&user_id, &CategoryTree::try_from(&json!({ "New": [] })).unwrap())
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(flatten(&second.tree), vec!["New"]);
    }

    #[tokio::test]
    async fn corrupt_stored_tree_is_an_error() {
        let (repo, user_id, pool) = setup().await;
        query(
            r#"INSERT INTO categories (id, user_id, category_tree, created_at, updated_at)
                VALUES ('x', ?1, '{"Work": 5}', 0, 0)"#,
        )
        .bind(&user_id)
        .execute(&pool)
        .await
        .unwrap();

        assert!(repo.find_by_user(&user_id).await.is_err());
    }
}

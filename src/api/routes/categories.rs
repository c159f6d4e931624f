use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    api::{
        error::{ApiError, ApiResult},
        extract::{ApiJson, AuthUser},
        response::{ok, Envelope},
        state::AppState,
    },
    categories::parse_tree_input,
    domain::{Category, CategoryTree},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoriesRequest {
    /// Either a JSON object or YAML/JSON text.
    pub category_tree: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub category_tree: CategoryTree,
    pub updated_at: i64,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            category_tree: category.tree,
            updated_at: category.updated_at.timestamp(),
        }
    }
}

/// GET /api/categories
pub async fn get_categories(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Envelope<CategoryResponse>>> {
    let category = state
        .categories
        .find_by_user(&user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category tree not found".to_string()))?;
    Ok(ok(category.into()))
}

/// PUT /api/categories
pub async fn update_categories(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<UpdateCategoriesRequest>,
) -> ApiResult<Json<Envelope<CategoryResponse>>> {
    if !matches!(body.category_tree, Value::Object(_) | Value::String(_)) {
        return Err(ApiError::BadRequest(
            "Validation failed: categoryTree must be an object or a string".to_string(),
        ));
    }

    let tree = parse_tree_input(body.category_tree)?;
    let category = state.categories.save(&user.id, &tree).await?;
    tracing::info!(target: "api", user_id = %user.id, top_level = tree.len(), "category tree replaced");
    Ok(ok(category.into()))
}

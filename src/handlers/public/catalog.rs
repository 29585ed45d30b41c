// handlers/public/catalog.rs - Read-only tags and ingredients (unpaginated)

use axum::extract::State;

use crate::api::origin::RequestUrl;
use crate::app::AppState;
use crate::database::models::{Ingredient, Tag};
use crate::database::Repository;
use crate::filter::IngredientFilter;
use crate::middleware::{ApiPath, ApiResponse, ApiResult};

/// GET /api/tags/
pub async fn tags_list(State(state): State<AppState>) -> ApiResult<Vec<Tag>> {
    let tags = Repository::<Tag>::new(state.pool).select_all().await?;
    Ok(ApiResponse::success(tags))
}

/// GET /api/tags/{id}/
pub async fn tag_get(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Tag> {
    let tag = Repository::<Tag>::new(state.pool).select_404(id).await?;
    Ok(ApiResponse::success(tag))
}

/// GET /api/ingredients/?name=<prefix>
pub async fn ingredients_list(State(state): State<AppState>, url: RequestUrl) -> ApiResult<Vec<Ingredient>> {
    let filter = IngredientFilter::from_query(&url.query);
    let ingredients = Repository::<Ingredient>::new(state.pool)
        .select_any(&filter.to_where())
        .await?;
    Ok(ApiResponse::success(ingredients))
}

/// GET /api/ingredients/{id}/
pub async fn ingredient_get(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Ingredient> {
    let ingredient = Repository::<Ingredient>::new(state.pool).select_404(id).await?;
    Ok(ApiResponse::success(ingredient))
}

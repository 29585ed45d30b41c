// handlers/protected/recipes.rs - Recipe writes (author only)

use axum::extract::State;

use crate::api::format::RecipeView;
use crate::api::origin::RequestOrigin;
use crate::app::AppState;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::recipe_service::RecipeInput;
use crate::services::RecipeService;

/// POST /api/recipes/
pub async fn create(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    origin: RequestOrigin,
    ApiJson(input): ApiJson<RecipeInput>,
) -> ApiResult<RecipeView> {
    let recipe = RecipeService::new(state.pool, state.media)
        .create(current.id(), input, &origin)
        .await?;
    Ok(ApiResponse::created(recipe))
}

/// PATCH /api/recipes/{id}/
pub async fn update(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    origin: RequestOrigin,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<RecipeInput>,
) -> ApiResult<RecipeView> {
    let recipe = RecipeService::new(state.pool, state.media)
        .update(current.id(), id, input, &origin)
        .await?;
    Ok(ApiResponse::success(recipe))
}

/// DELETE /api/recipes/{id}/
pub async fn delete(State(state): State<AppState>, AuthUser(current): AuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<()> {
    RecipeService::new(state.pool, state.media)
        .delete(current.id(), id)
        .await?;
    Ok(ApiResponse::no_content())
}

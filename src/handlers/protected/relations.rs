// handlers/protected/relations.rs - Favorites and shopping cart membership

use axum::extract::State;

use crate::api::format::RecipeMiniView;
use crate::api::origin::RequestOrigin;
use crate::app::AppState;
use crate::middleware::{ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::{RecipeList, RelationService};

async fn add(state: AppState, list: RecipeList, user_id: i64, recipe_id: i64, origin: &RequestOrigin) -> ApiResult<RecipeMiniView> {
    let recipe = RelationService::new(state.pool, state.media)
        .add(list, user_id, recipe_id, origin)
        .await?;
    Ok(ApiResponse::created(recipe))
}

async fn remove(state: AppState, list: RecipeList, user_id: i64, recipe_id: i64) -> ApiResult<()> {
    RelationService::new(state.pool, state.media)
        .remove(list, user_id, recipe_id)
        .await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/recipes/{id}/favorite/
pub async fn favorite_post(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    origin: RequestOrigin,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<RecipeMiniView> {
    add(state, RecipeList::Favorites, current.id(), id, &origin).await
}

/// DELETE /api/recipes/{id}/favorite/
pub async fn favorite_delete(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<()> {
    remove(state, RecipeList::Favorites, current.id(), id).await
}

/// POST /api/recipes/{id}/shopping_cart/
pub async fn shopping_cart_post(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    origin: RequestOrigin,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<RecipeMiniView> {
    add(state, RecipeList::ShoppingCart, current.id(), id, &origin).await
}

/// DELETE /api/recipes/{id}/shopping_cart/
pub async fn shopping_cart_delete(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<()> {
    remove(state, RecipeList::ShoppingCart, current.id(), id).await
}

// handlers/public/recipes.rs - Recipe reads

use axum::extract::State;

use crate::api::format::RecipeView;
use crate::api::origin::{RequestOrigin, RequestUrl};
use crate::app::AppState;
use crate::filter::{PageRequest, Paginated, RecipeFilter};
use crate::middleware::{ApiPath, ApiResponse, ApiResult, MaybeAuthUser};
use crate::services::RecipeService;

/// GET /api/recipes/?page&limit&author&tags&is_favorited&is_in_shopping_cart
pub async fn list(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    url: RequestUrl,
) -> ApiResult<Paginated<RecipeView>> {
    let page = PageRequest::from_query(&url.query)?;
    let filter = RecipeFilter::from_query(&url.query)?;
    let (recipes, count) = RecipeService::new(state.pool, state.media)
        .list(viewer.id(), &filter, &page, &url.origin)
        .await?;
    Ok(ApiResponse::success(Paginated::new(recipes, count, &page, &url)))
}

/// GET /api/recipes/{id}/
pub async fn get(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    origin: RequestOrigin,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<RecipeView> {
    let recipe = RecipeService::new(state.pool, state.media)
        .get(viewer.id(), id, &origin)
        .await?;
    Ok(ApiResponse::success(recipe))
}

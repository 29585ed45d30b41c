// handlers/protected/subscriptions.rs - Following authors

use axum::extract::State;

use crate::api::format::SubscriptionView;
use crate::api::origin::RequestUrl;
use crate::app::AppState;
use crate::filter::{PageRequest, Paginated};
use crate::middleware::{ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::subscription_service::recipes_limit;
use crate::services::SubscriptionService;

/// GET /api/users/subscriptions/?page&limit&recipes_limit
pub async fn list(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    url: RequestUrl,
) -> ApiResult<Paginated<SubscriptionView>> {
    let page = PageRequest::from_query(&url.query)?;
    let (authors, count) = SubscriptionService::new(state.pool, state.media)
        .list(current.id(), &page, recipes_limit(&url.query), &url.origin)
        .await?;
    Ok(ApiResponse::success(Paginated::new(authors, count, &page, &url)))
}

/// POST /api/users/{id}/subscribe/
pub async fn subscribe(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    ApiPath(author_id): ApiPath<i64>,
    url: RequestUrl,
) -> ApiResult<SubscriptionView> {
    let view = SubscriptionService::new(state.pool, state.media)
        .subscribe(current.id(), author_id, recipes_limit(&url.query), &url.origin)
        .await?;
    Ok(ApiResponse::created(view))
}

/// DELETE /api/users/{id}/subscribe/
pub async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    ApiPath(author_id): ApiPath<i64>,
) -> ApiResult<()> {
    SubscriptionService::new(state.pool, state.media)
        .unsubscribe(current.id(), author_id)
        .await?;
    Ok(ApiResponse::no_content())
}

// handlers/public/users.rs - /api/users/ registration and profiles

use axum::extract::State;

use crate::api::format::{UserCreatedView, UserView};
use crate::api::origin::RequestUrl;
use crate::app::AppState;
use crate::filter::{PageRequest, Paginated, UserFilter};
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, MaybeAuthUser};
use crate::services::user_service::RegisterRequest;
use crate::services::UserService;

/// GET /api/users/ - paginated user list, optionally `?is_subscribed=1`
pub async fn list(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    url: RequestUrl,
) -> ApiResult<Paginated<UserView>> {
    let page = PageRequest::from_query(&url.query)?;
    let filter = UserFilter::from_query(&url.query);
    let (users, count) = UserService::new(state.pool).list(viewer.id(), &filter, &page).await?;
    Ok(ApiResponse::success(Paginated::new(users, count, &page, &url)))
}

/// POST /api/users/ - register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<UserCreatedView> {
    let user = UserService::new(state.pool).register(request).await?;
    Ok(ApiResponse::created(UserCreatedView::from(&user)))
}

/// GET /api/users/{id}/
pub async fn get(State(state): State<AppState>, viewer: MaybeAuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<UserView> {
    let user = UserService::new(state.pool).get(viewer.id(), id).await?;
    Ok(ApiResponse::success(user))
}

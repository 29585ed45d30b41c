// handlers/protected/users.rs - The caller's own account

use axum::extract::State;

use crate::api::format::UserView;
use crate::app::AppState;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::SetPasswordRequest;
use crate::services::UserService;

/// GET /api/users/me/
pub async fn me(AuthUser(current): AuthUser) -> ApiResult<UserView> {
    Ok(ApiResponse::success(UserView::new(&current.user, false)))
}

/// POST /api/users/set_password/
pub async fn set_password(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    ApiJson(request): ApiJson<SetPasswordRequest>,
) -> ApiResult<()> {
    UserService::new(state.pool)
        .set_password(&current.user, request)
        .await?;
    Ok(ApiResponse::no_content())
}

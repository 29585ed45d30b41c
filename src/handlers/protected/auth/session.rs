// handlers/protected/auth/session.rs - POST /api/auth/token/logout/ handler

use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::UserService;

/// Revoke the token used for this request; later requests with it get 401
pub async fn logout_post(State(state): State<AppState>, AuthUser(current): AuthUser) -> ApiResult<()> {
    UserService::new(state.pool)
        .logout(&current.token, &current.claims)
        .await?;
    Ok(ApiResponse::no_content())
}

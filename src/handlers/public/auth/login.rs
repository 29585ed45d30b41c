// handlers/public/auth/login.rs - POST /api/auth/token/login/ handler

use axum::extract::State;

use crate::api::format::TokenView;
use crate::app::AppState;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::user_service::LoginRequest;
use crate::services::UserService;

/// Exchange `{email, password}` for `{"auth_token": "<jwt>"}`.
///
/// Bad credentials and inactive accounts both answer 400 with a
/// `non_field_errors` message, so the response does not reveal which one failed.
pub async fn login_post(State(state): State<AppState>, ApiJson(request): ApiJson<LoginRequest>) -> ApiResult<TokenView> {
    let auth_token = UserService::new(state.pool).login(request).await?;
    Ok(ApiResponse::success(TokenView { auth_token }))
}

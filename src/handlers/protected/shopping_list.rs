// handlers/protected/shopping_list.rs - GET /api/recipes/download_shopping_cart/

use axum::extract::State;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{Attachment, AuthUser};
use crate::services::shopping_list::file_name;
use crate::services::ShoppingListService;

/// Aggregated ingredient list for everything in the caller's cart, as a text attachment
pub async fn download(State(state): State<AppState>, AuthUser(current): AuthUser) -> Result<Attachment, ApiError> {
    let today = chrono::Local::now().date_naive();
    let body = ShoppingListService::new(state.pool)
        .export(&current.user, today)
        .await?;
    Ok(Attachment {
        file_name: file_name(&current.user.username),
        body,
    })
}

use std::fmt::Write;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::database::models::User;
use crate::error::ApiError;

/// One aggregated line of the shopping list
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

pub struct ShoppingListService {
    pool: PgPool,
}

impl ShoppingListService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ingredient totals across every recipe in the user's cart
    pub async fn items(&self, user_id: i64) -> Result<Vec<ShoppingListItem>, ApiError> {
        Ok(sqlx::query_as::<_, ShoppingListItem>(
            "SELECT i.name, i.measurement_unit, SUM(ri.amount)::BIGINT AS total \
             FROM shopping_carts c \
             JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id \
             JOIN ingredients i ON i.id = ri.ingredient_id \
             WHERE c.user_id = $1 \
             GROUP BY i.name, i.measurement_unit \
             ORDER BY i.name, i.measurement_unit",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Plain-text list for download; 400 when the cart is empty
    pub async fn export(&self, user: &User, today: NaiveDate) -> Result<String, ApiError> {
        let items = self.items(user.id).await?;
        if items.is_empty() {
            return Err(ApiError::bad_request("Shopping cart is empty."));
        }
        tracing::debug!("Exporting {} shopping list lines for user {}", items.len(), user.id);
        Ok(render(&user.full_name(), today, &items))
    }
}

pub fn file_name(username: &str) -> String {
    format!("{}_shopping_list.txt", username)
}

pub fn render(full_name: &str, today: NaiveDate, items: &[ShoppingListItem]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Shopping list for: {}\n", full_name);
    let _ = writeln!(out, "Date: {}\n", today.format("%Y-%m-%d"));
    for item in items {
        let _ = writeln!(out, "- {} ({}) - {}", item.name, item.measurement_unit, item.total);
    }
    let _ = write!(out, "\nCounted by Foodgram - {}", today.year());
    out
}

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Bare `recipes` row
#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
}

/// Recipe joined with its author and the viewer-relative flags
#[derive(Debug, Clone, FromRow)]
pub struct RecipeListRow {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub author_id: i64,
    pub author_email: String,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub author_is_subscribed: bool,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeListRow {
    /// Column list for `recipes r JOIN users u`; `$1` is the viewer id (NULL when anonymous)
    pub const COLUMNS: &'static str = "r.id, r.name, r.image, r.text, r.cooking_time, \
        u.id AS author_id, u.email AS author_email, u.username AS author_username, \
        u.first_name AS author_first_name, u.last_name AS author_last_name, \
        EXISTS (SELECT 1 FROM subscriptions s WHERE s.author_id = u.id AND s.user_id = $1) AS author_is_subscribed, \
        EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = $1) AS is_favorited, \
        EXISTS (SELECT 1 FROM shopping_carts c WHERE c.recipe_id = r.id AND c.user_id = $1) AS is_in_shopping_cart";

    pub const SOURCE: &'static str = "recipes r JOIN users u ON u.id = r.author_id";

    pub const ORDER_BY: &'static str = "r.pub_date DESC, r.id DESC";
}

/// Short form used by favorites, carts and subscription listings
#[derive(Debug, Clone, FromRow)]
pub struct RecipeMiniRow {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct RecipeTagRow {
    pub recipe_id: i64,
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct RecipeIngredientRow {
    pub recipe_id: i64,
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

// handlers/public/mod.rs - Endpoints open to anonymous callers
//
// Reads personalise `is_subscribed`, `is_favorited` and `is_in_shopping_cart`
// when a caller is known.
pub mod auth;
pub mod catalog;
pub mod recipes;
pub mod users;

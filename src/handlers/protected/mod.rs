// handlers/protected/mod.rs - Endpoints that require a token
//
// Every handler here takes `AuthUser`, which answers 401 for anonymous callers.
pub mod auth;
pub mod recipes;
pub mod relations;
pub mod shopping_list;
pub mod subscriptions;
pub mod users;

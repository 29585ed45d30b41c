use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::Table;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

impl Table for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str =
        "id, email, username, first_name, last_name, password_hash, is_superuser, is_active, date_joined";
    const ORDER_BY: &'static str = "id";
    const LABEL: &'static str = "User";
}

/// User joined with the viewer-relative subscription flag
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    #[sqlx(flatten)]
    pub user: User,
    pub is_subscribed: bool,
}

impl UserRow {
    /// Column list over `users u`; `$1` is the viewer id (NULL when anonymous)
    pub const COLUMNS: &'static str = "u.id, u.email, u.username, u.first_name, u.last_name, u.password_hash, \
        u.is_superuser, u.is_active, u.date_joined, \
        EXISTS (SELECT 1 FROM subscriptions s WHERE s.author_id = u.id AND s.user_id = $1) AS is_subscribed";

    pub const SOURCE: &'static str = "users u";

    pub const ORDER_BY: &'static str = "u.id";
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::Table;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl Table for Tag {
    const TABLE: &'static str = "tags";
    const COLUMNS: &'static str = "id, name, color, slug";
    const ORDER_BY: &'static str = "name";
    const LABEL: &'static str = "Tag";
}

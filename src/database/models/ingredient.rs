use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::Table;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

impl Table for Ingredient {
    const TABLE: &'static str = "ingredients";
    const COLUMNS: &'static str = "id, name, measurement_unit";
    const ORDER_BY: &'static str = "name, id";
    const LABEL: &'static str = "Ingredient";
}

use super::filter_where::{escape_like, FilterWhere};
use super::query::QueryParams;
use super::types::SqlParam;

/// `GET /api/ingredients/?name=<prefix>`: case-insensitive prefix search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientFilter {
    pub name: Option<String>,
}

impl IngredientFilter {
    pub fn from_query(query: &QueryParams) -> Self {
        Self {
            name: query
                .get("name")
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        }
    }

    pub fn to_where(&self) -> FilterWhere {
        let mut filter = FilterWhere::new(0);
        if let Some(name) = &self.name {
            // Fold case on both sides in SQL so the database collation decides
            let pattern = format!("{}%", escape_like(name));
            filter.push_with(SqlParam::Text(pattern), |p| format!("UPPER(name) LIKE UPPER({})", p));
        }
        filter
    }
}

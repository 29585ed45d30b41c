use super::error::FilterError;
use super::filter_where::FilterWhere;
use super::query::QueryParams;
use super::types::SqlParam;

/// Listing filters for `GET /api/recipes/`, applied to `recipes r`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeFilter {
    pub author: Option<i64>,
    /// Tag slugs; a recipe matches when it carries any of them
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeFilter {
    pub fn from_query(query: &QueryParams) -> Result<Self, FilterError> {
        Ok(Self {
            author: query.get_i64("author")?,
            tags: query.get_all("tags").into_iter().map(str::to_string).collect(),
            is_favorited: query.flag("is_favorited"),
            is_in_shopping_cart: query.flag("is_in_shopping_cart"),
        })
    }

    /// Build the WHERE conditions. Favorite/cart flags only apply for a known viewer.
    pub fn to_where(&self, viewer: Option<i64>, starting_param_index: usize) -> FilterWhere {
        let mut filter = FilterWhere::new(starting_param_index);

        if let Some(author) = self.author {
            filter.eq("r.author_id", SqlParam::Int(author));
        }

        if !self.tags.is_empty() {
            filter.push_with(SqlParam::TextArray(self.tags.clone()), |p| {
                format!(
                    "EXISTS (SELECT 1 FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id \
                     WHERE rt.recipe_id = r.id AND t.slug = ANY({}))",
                    p
                )
            });
        }

        if let Some(user_id) = viewer {
            if self.is_favorited {
                filter.push_with(SqlParam::Int(user_id), |p| {
                    format!("EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = {})", p)
                });
            }
            if self.is_in_shopping_cart {
                filter.push_with(SqlParam::Int(user_id), |p| {
                    format!("EXISTS (SELECT 1 FROM shopping_carts c WHERE c.recipe_id = r.id AND c.user_id = {})", p)
                });
            }
        }

        filter
    }
}

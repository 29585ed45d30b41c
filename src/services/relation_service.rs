use sqlx::PgPool;
use tracing::info;

use crate::api::format::RecipeMiniView;
use crate::api::origin::RequestOrigin;
use crate::database::models::RecipeMiniRow;
use crate::error::ApiError;
use crate::services::media::MediaStorage;

/// Per-user recipe collections sharing the `(user_id, recipe_id)` shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    fn table(self) -> &'static str {
        match self {
            RecipeList::Favorites => "favorites",
            RecipeList::ShoppingCart => "shopping_carts",
        }
    }

    fn already_added(self) -> &'static str {
        match self {
            RecipeList::Favorites => "Recipe is already in favorites.",
            RecipeList::ShoppingCart => "Recipe is already in the shopping cart.",
        }
    }

    fn not_present(self) -> &'static str {
        match self {
            RecipeList::Favorites => "Recipe is not in favorites.",
            RecipeList::ShoppingCart => "Recipe is not in the shopping cart.",
        }
    }
}

pub struct RelationService {
    pool: PgPool,
    media: MediaStorage,
}

impl RelationService {
    pub fn new(pool: PgPool, media: MediaStorage) -> Self {
        Self { pool, media }
    }

    /// Add a recipe to the user's list; a missing recipe is a validation failure here, not a 404
    pub async fn add(
        &self,
        list: RecipeList,
        user_id: i64,
        recipe_id: i64,
        origin: &RequestOrigin,
    ) -> Result<RecipeMiniView, ApiError> {
        let recipe = self.find_recipe(recipe_id).await?.ok_or_else(|| {
            ApiError::field("recipe", format!("Invalid pk \"{}\" - object does not exist.", recipe_id))
        })?;

        let sql = format!(
            "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT (user_id, recipe_id) DO NOTHING",
            list.table()
        );
        let inserted = sqlx::query(&sql)
            .bind(user_id)
            .bind(recipe_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if inserted == 0 {
            return Err(ApiError::non_field(list.already_added()));
        }

        info!("User {} added recipe {} to {}", user_id, recipe_id, list.table());
        Ok(RecipeMiniView::new(recipe, &self.media, origin))
    }

    pub async fn remove(&self, list: RecipeList, user_id: i64, recipe_id: i64) -> Result<(), ApiError> {
        if self.find_recipe(recipe_id).await?.is_none() {
            return Err(ApiError::not_found("Recipe not found."));
        }

        let sql = format!("DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2", list.table());
        let deleted = sqlx::query(&sql)
            .bind(user_id)
            .bind(recipe_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(ApiError::bad_request(list.not_present()));
        }

        info!("User {} removed recipe {} from {}", user_id, recipe_id, list.table());
        Ok(())
    }

    async fn find_recipe(&self, recipe_id: i64) -> Result<Option<RecipeMiniRow>, ApiError> {
        Ok(sqlx::query_as::<_, RecipeMiniRow>(
            "SELECT id, author_id, name, image, cooking_time FROM recipes WHERE id = $1",
        )
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_map_to_their_tables() {
        assert_eq!(RecipeList::Favorites.table(), "favorites");
        assert_eq!(RecipeList::ShoppingCart.table(), "shopping_carts");
        assert_ne!(
            RecipeList::Favorites.already_added(),
            RecipeList::ShoppingCart.already_added()
        );
    }
}

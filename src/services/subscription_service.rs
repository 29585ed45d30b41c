use std::collections::HashMap;

use sqlx::PgPool;
use tracing::info;

use crate::api::format::{RecipeMiniView, SubscriptionView, UserView};
use crate::api::origin::RequestOrigin;
use crate::database::models::{RecipeMiniRow, User};
use crate::database::{Repository, Table};
use crate::error::ApiError;
use crate::filter::{PageRequest, QueryParams};
use crate::services::media::MediaStorage;

/// `?recipes_limit=<n>`: how many recipes to preview per author; garbage means no limit
pub fn recipes_limit(query: &QueryParams) -> Option<usize> {
    query
        .get_i64_lenient("recipes_limit")
        .filter(|n| *n >= 0)
        .map(|n| n as usize)
}

pub struct SubscriptionService {
    pool: PgPool,
    media: MediaStorage,
}

impl SubscriptionService {
    pub fn new(pool: PgPool, media: MediaStorage) -> Self {
        Self { pool, media }
    }

    /// Authors `user_id` follows, most recently followed first
    pub async fn list(
        &self,
        user_id: i64,
        page: &PageRequest,
        limit: Option<usize>,
        origin: &RequestOrigin,
    ) -> Result<(Vec<SubscriptionView>, i64), ApiError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        page.ensure_in_range(count)?;

        let columns: Vec<String> = User::COLUMNS.split(", ").map(|c| format!("u.{}", c)).collect();
        let sql = format!(
            "SELECT {} FROM users u JOIN subscriptions s ON s.author_id = u.id \
             WHERE s.user_id = $1 ORDER BY s.id DESC LIMIT $2 OFFSET $3",
            columns.join(", ")
        );
        let authors = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let views = self.with_recipes(authors, limit, origin).await?;
        Ok((views, count))
    }

    pub async fn subscribe(
        &self,
        user_id: i64,
        author_id: i64,
        limit: Option<usize>,
        origin: &RequestOrigin,
    ) -> Result<SubscriptionView, ApiError> {
        let author = Repository::<User>::new(self.pool.clone()).select_404(author_id).await?;
        if author.id == user_id {
            return Err(ApiError::non_field("You cannot subscribe to yourself."));
        }

        let inserted = sqlx::query(
            "INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, author_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if inserted == 0 {
            return Err(ApiError::non_field("You are already subscribed to this author."));
        }

        info!("User {} subscribed to {}", user_id, author_id);
        self.with_recipes(vec![author], limit, origin)
            .await?
            .pop()
            .ok_or_else(|| ApiError::internal_server_error("Subscription vanished"))
    }

    pub async fn unsubscribe(&self, user_id: i64, author_id: i64) -> Result<(), ApiError> {
        if !Repository::<User>::new(self.pool.clone()).exists(author_id).await? {
            return Err(ApiError::not_found("User not found."));
        }

        let deleted = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(ApiError::bad_request("You are not subscribed to this author."));
        }

        info!("User {} unsubscribed from {}", user_id, author_id);
        Ok(())
    }

    /// Render followed authors with their newest recipes, one query for all of them
    async fn with_recipes(
        &self,
        authors: Vec<User>,
        limit: Option<usize>,
        origin: &RequestOrigin,
    ) -> Result<Vec<SubscriptionView>, ApiError> {
        if authors.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<i64> = authors.iter().map(|a| a.id).collect();
        let rows: Vec<RecipeMiniRow> = sqlx::query_as(
            "SELECT id, author_id, name, image, cooking_time FROM recipes \
             WHERE author_id = ANY($1) ORDER BY pub_date DESC, id DESC",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_author: HashMap<i64, Vec<RecipeMiniRow>> = HashMap::new();
        for row in rows {
            by_author.entry(row.author_id).or_default().push(row);
        }

        Ok(authors
            .iter()
            .map(|author| {
                let recipes = by_author.remove(&author.id).unwrap_or_default();
                let recipes_count = recipes.len() as i64;
                let recipes = recipes
                    .into_iter()
                    .take(limit.unwrap_or(usize::MAX))
                    .map(|row| RecipeMiniView::new(row, &self.media, origin))
                    .collect();
                SubscriptionView {
                    author: UserView::new(author, true),
                    recipes,
                    recipes_count,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipes_limit_parsing() {
        assert_eq!(recipes_limit(&QueryParams::parse(Some("recipes_limit=3"))), Some(3));
        assert_eq!(recipes_limit(&QueryParams::parse(Some("recipes_limit=0"))), Some(0));
        assert_eq!(recipes_limit(&QueryParams::parse(Some("recipes_limit=-1"))), None);
        assert_eq!(recipes_limit(&QueryParams::parse(Some("recipes_limit=many"))), None);
        assert_eq!(recipes_limit(&QueryParams::parse(None)), None);
    }
}

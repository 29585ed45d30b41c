use sqlx::{postgres::PgRow, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::filter::FilterWhere;

/// A table with a `BIGSERIAL id` primary key that maps onto a row struct
pub trait Table {
    const TABLE: &'static str;
    const COLUMNS: &'static str;
    const ORDER_BY: &'static str;
    /// Human name used in "not found" messages
    const LABEL: &'static str;
}

/// Read access to simple catalog tables (tags, ingredients, users)
pub struct Repository<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: Table + for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, filter: &FilterWhere) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::new(T::COLUMNS, T::TABLE)
            .filter(filter)
            .order(T::ORDER_BY)
            .select_all(&self.pool)
            .await
    }

    pub async fn select_all(&self) -> Result<Vec<T>, DatabaseError> {
        self.select_any(&FilterWhere::new(0)).await
    }

    pub async fn select_optional(&self, id: i64) -> Result<Option<T>, DatabaseError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", T::COLUMNS, T::TABLE);
        Ok(sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    pub async fn select_404(&self, id: i64) -> Result<T, DatabaseError> {
        self.select_optional(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found.", T::LABEL)))
    }

    pub async fn exists(&self, id: i64) -> Result<bool, DatabaseError> {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", T::TABLE);
        let (exists,): (bool,) = sqlx::query_as(&sql).bind(id).fetch_one(&self.pool).await?;
        Ok(exists)
    }

    /// Ids from `ids` with no matching row, in input order
    pub async fn missing_ids(&self, ids: &[i64]) -> Result<Vec<i64>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT id FROM {} WHERE id = ANY($1)", T::TABLE);
        let found: Vec<(i64,)> = sqlx::query_as(&sql).bind(ids.to_vec()).fetch_all(&self.pool).await?;
        let found: std::collections::HashSet<i64> = found.into_iter().map(|(id,)| id).collect();
        Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
    }
}

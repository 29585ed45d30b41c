use sqlx::{postgres::PgArguments, query::QueryAs, FromRow, PgPool, Postgres};

use crate::database::manager::DatabaseError;
use crate::filter::{FilterWhere, SqlParam};

/// Builds `SELECT <columns> FROM <source> WHERE <filter> ORDER BY <order> LIMIT/OFFSET`
/// over a [`FilterWhere`], binding its parameters after any leading ones.
pub struct QueryBuilder<'a> {
    columns: &'a str,
    source: &'a str,
    filter: Option<&'a FilterWhere>,
    order: Option<&'a str>,
    limit: Option<i64>,
    offset: Option<i64>,
    leading: Vec<SqlParam>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(columns: &'a str, source: &'a str) -> Self {
        Self {
            columns,
            source,
            filter: None,
            order: None,
            limit: None,
            offset: None,
            leading: vec![],
        }
    }

    /// Parameters bound before the filter's own (`$1..$n` reserved by the filter's starting index)
    pub fn leading(mut self, params: Vec<SqlParam>) -> Self {
        self.leading = params;
        self
    }

    pub fn filter(mut self, filter: &'a FilterWhere) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order(mut self, order: &'a str) -> Self {
        self.order = Some(order);
        self
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    pub fn to_sql(&self) -> String {
        let where_clause = self.filter.map(|f| f.where_sql()).unwrap_or_else(|| "1=1".to_string());
        let mut parts = vec![
            format!("SELECT {}", self.columns),
            format!("FROM {}", self.source),
            format!("WHERE {}", where_clause),
        ];
        if let Some(order) = self.order {
            parts.push(format!("ORDER BY {}", order));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            parts.push(format!("OFFSET {}", offset));
        }
        parts.join(" ")
    }

    fn count_sql(&self) -> String {
        let where_clause = self.filter.map(|f| f.where_sql()).unwrap_or_else(|| "1=1".to_string());
        format!("SELECT COUNT(*) FROM {} WHERE {}", self.source, where_clause)
    }

    fn params(&self) -> Vec<SqlParam> {
        let mut params = self.leading.clone();
        if let Some(filter) = self.filter {
            params.extend(filter.params().iter().cloned());
        }
        params
    }

    pub async fn select_all<T>(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let sql = self.to_sql();
        let q = bind_params(sqlx::query_as::<_, T>(&sql), self.params());
        Ok(q.fetch_all(pool).await?)
    }

    pub async fn select_optional<T>(self, pool: &PgPool) -> Result<Option<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let sql = self.to_sql();
        let q = bind_params(sqlx::query_as::<_, T>(&sql), self.params());
        Ok(q.fetch_optional(pool).await?)
    }

    pub async fn count(self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let sql = self.count_sql();
        let q = bind_params(sqlx::query_as::<_, (i64,)>(&sql), self.params());
        let (count,) = q.fetch_one(pool).await?;
        Ok(count)
    }
}

pub fn bind_params<'q, O>(
    mut q: QueryAs<'q, Postgres, O, PgArguments>,
    params: Vec<SqlParam>,
) -> QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    for p in params {
        q = match p {
            SqlParam::Int(i) => q.bind(i),
            SqlParam::OptionalInt(i) => q.bind(i),
            SqlParam::Text(s) => q.bind(s),
            SqlParam::TextArray(values) => q.bind(values),
        };
    }
    q
}

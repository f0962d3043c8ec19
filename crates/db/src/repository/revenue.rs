//! `revenue` table, keyed by month.

use crate::{models::Revenue, query::SqlQuery, sql, DbError, PgExecutor};

pub const TABLE: &str = "revenue";

pub fn create_table() -> SqlQuery {
    SqlQuery::raw(
        r#"
        CREATE TABLE IF NOT EXISTS revenue (
            month VARCHAR(4) NOT NULL UNIQUE,
            revenue INT NOT NULL
        )
        "#,
    )
}

/// A no-op when the month already exists; existing figures are never
/// overwritten.
pub fn insert(revenue: &Revenue) -> Result<SqlQuery, DbError> {
    sql!(
        r#"
        INSERT INTO revenue (month, revenue)
        VALUES ({}, {})
        ON CONFLICT (month) DO NOTHING
        "#,
        &revenue.month,
        revenue.revenue,
    )
}

pub fn drop_table() -> SqlQuery {
    SqlQuery::raw("DROP TABLE IF EXISTS revenue")
}

pub async fn count(db: &PgExecutor) -> Result<i64, DbError> {
    let count = db
        .fetch_scalar::<i64>(&SqlQuery::raw("SELECT COUNT(*) FROM revenue"))
        .await?;
    Ok(count.unwrap_or_default())
}

pub async fn find(db: &PgExecutor, month: &str) -> Result<Option<Revenue>, DbError> {
    let query = sql!("SELECT month, revenue FROM revenue WHERE month = {}", month)?;
    Ok(db.fetch::<Revenue>(&query).await?.rows.into_iter().next())
}

pub async fn list(db: &PgExecutor) -> Result<Vec<Revenue>, DbError> {
    Ok(db
        .fetch::<Revenue>(&SqlQuery::raw("SELECT month, revenue FROM revenue"))
        .await?
        .rows)
}

//! `customers` table.

use crate::{models::Customer, query::SqlQuery, sql, DbError, PgExecutor};

pub const TABLE: &str = "customers";

pub fn create_table() -> SqlQuery {
    SqlQuery::raw(
        r#"
        CREATE TABLE IF NOT EXISTS customers (
            id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL,
            image_url VARCHAR(255) NOT NULL
        )
        "#,
    )
}

pub fn insert(customer: &Customer) -> Result<SqlQuery, DbError> {
    sql!(
        r#"
        INSERT INTO customers (id, name, email, image_url)
        VALUES ({}, {}, {}, {})
        ON CONFLICT (id) DO NOTHING
        "#,
        customer.id,
        &customer.name,
        &customer.email,
        &customer.image_url,
    )
}

pub fn drop_table() -> SqlQuery {
    SqlQuery::raw("DROP TABLE IF EXISTS customers")
}

pub async fn count(db: &PgExecutor) -> Result<i64, DbError> {
    let count = db
        .fetch_scalar::<i64>(&SqlQuery::raw("SELECT COUNT(*) FROM customers"))
        .await?;
    Ok(count.unwrap_or_default())
}

/// All customers ordered by name.
pub async fn list(db: &PgExecutor) -> Result<Vec<Customer>, DbError> {
    let output = db
        .fetch::<Customer>(&SqlQuery::raw(
            "SELECT id, name, email, image_url FROM customers ORDER BY name ASC",
        ))
        .await?;
    Ok(output.rows)
}

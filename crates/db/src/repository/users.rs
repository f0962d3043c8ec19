//! `users` table.

use crate::{models::User, query::SqlQuery, sql, DbError, PgExecutor};

pub const TABLE: &str = "users";

pub fn create_table() -> SqlQuery {
    SqlQuery::raw(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL
        )
        "#,
    )
}

/// Insert `user` with an already hashed password; a no-op if the id exists.
pub fn insert(user: &User, password_hash: &str) -> Result<SqlQuery, DbError> {
    sql!(
        r#"
        INSERT INTO users (id, name, email, password)
        VALUES ({}, {}, {}, {})
        ON CONFLICT (id) DO NOTHING
        "#,
        user.id,
        &user.name,
        &user.email,
        password_hash,
    )
}

pub fn drop_table() -> SqlQuery {
    SqlQuery::raw("DROP TABLE IF EXISTS users")
}

pub async fn count(db: &PgExecutor) -> Result<i64, DbError> {
    let count = db
        .fetch_scalar::<i64>(&SqlQuery::raw("SELECT COUNT(*) FROM users"))
        .await?;
    Ok(count.unwrap_or_default())
}

/// Look a user up by email, as the login flow does.
pub async fn find_by_email(db: &PgExecutor, email: &str) -> Result<Option<User>, DbError> {
    let query = sql!(
        "SELECT id, name, email, password FROM users WHERE email = {}",
        email
    )?;
    let output = db.fetch::<User>(&query).await?;
    Ok(output.rows.into_iter().next())
}

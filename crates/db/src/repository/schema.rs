//! Database-wide statements that are not tied to one table.

use crate::{executor::SqlExecutor, query::SqlQuery, DbError, PgExecutor};

use super::{customers, invoices, revenue, users};

/// Enable `uuid_generate_v4()` for UUID column defaults.
pub fn ensure_uuid_extension() -> SqlQuery {
    SqlQuery::raw(r#"CREATE EXTENSION IF NOT EXISTS "uuid-ossp""#)
}

/// Number of tables in the `public` schema.
pub async fn count_public_tables(db: &PgExecutor) -> Result<i64, DbError> {
    let count = db
        .fetch_scalar::<i64>(&SqlQuery::raw(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'public'",
        ))
        .await?;
    Ok(count.unwrap_or_default())
}

/// Drop every seeded table.
///
/// `invoices` goes before `customers` so its foreign key never blocks the drop.
pub async fn drop_all(db: &dyn SqlExecutor) -> Result<(), DbError> {
    for statement in [
        users::drop_table(),
        invoices::drop_table(),
        customers::drop_table(),
        revenue::drop_table(),
    ] {
        db.execute(statement).await?;
    }
    Ok(())
}

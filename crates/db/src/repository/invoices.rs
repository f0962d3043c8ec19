//! `invoices` table.
//!
//! Every invoice references a customer, so this table must be created and
//! seeded after `customers`.

use crate::{
    models::{Invoice, LatestInvoice},
    query::SqlQuery,
    sql, DbError, PgExecutor,
};

pub const TABLE: &str = "invoices";

pub fn create_table() -> SqlQuery {
    SqlQuery::raw(
        r#"
        CREATE TABLE IF NOT EXISTS invoices (
            id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
            customer_id UUID NOT NULL REFERENCES customers (id),
            amount INT NOT NULL,
            status VARCHAR(255) NOT NULL,
            date DATE NOT NULL
        )
        "#,
    )
}

pub fn insert(invoice: &Invoice) -> Result<SqlQuery, DbError> {
    sql!(
        r#"
        INSERT INTO invoices (id, customer_id, amount, status, date)
        VALUES ({}, {}, {}, {}, {})
        ON CONFLICT (id) DO NOTHING
        "#,
        invoice.id,
        invoice.customer_id,
        invoice.amount,
        invoice.status.to_string(),
        invoice.date,
    )
}

pub fn drop_table() -> SqlQuery {
    SqlQuery::raw("DROP TABLE IF EXISTS invoices")
}

pub async fn count(db: &PgExecutor) -> Result<i64, DbError> {
    let count = db
        .fetch_scalar::<i64>(&SqlQuery::raw("SELECT COUNT(*) FROM invoices"))
        .await?;
    Ok(count.unwrap_or_default())
}

/// The `limit` most recent invoices with their customer details.
pub async fn latest(db: &PgExecutor, limit: i64) -> Result<Vec<LatestInvoice>, DbError> {
    let query = sql!(
        r#"
        SELECT invoices.id, invoices.amount, customers.name, customers.email, customers.image_url
        FROM invoices
        JOIN customers ON invoices.customer_id = customers.id
        ORDER BY invoices.date DESC
        LIMIT {}
        "#,
        limit
    )?;
    Ok(db.fetch::<LatestInvoice>(&query).await?.rows)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::{models::InvoiceStatus, query::SqlValue};

    #[test]
    fn status_is_bound_as_lowercase_text() {
        let invoice = Invoice {
            id: Uuid::nil(),
            customer_id: Uuid::from_u128(7),
            amount: 15795,
            status: InvoiceStatus::Pending,
            date: NaiveDate::from_ymd_opt(2022, 12, 6).unwrap(),
        };
        let q = insert(&invoice).unwrap();

        assert_eq!(q.values().len(), 5);
        assert_eq!(q.values()[3], SqlValue::Text("pending".into()));
        assert!(q.text().contains("$5"));
    }

    #[test]
    fn table_references_customers() {
        assert!(create_table().text().contains("REFERENCES customers (id)"));
    }
}

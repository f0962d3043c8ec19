//! Database seeding pipeline.
//!
//! `Seeder` is the orchestrator:
//! 1. Seeds the four tables strictly in order: users → customers →
//!    invoices → revenue. Invoices reference customers, so the order is load
//!    bearing.
//! 2. For each table, ensures the schema exists (idempotent DDL), then
//!    issues one `INSERT … ON CONFLICT DO NOTHING` per record, all
//!    concurrently, and joins them.
//! 3. Collects every failed record of a table and aborts the pipeline with
//!    a `SeedError` naming the table. Tables seeded earlier stay seeded.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, instrument};

use db::models::{Customer, Invoice, Revenue, User};
use db::repository::{customers, invoices, revenue, schema, users};
use db::{SqlExecutor, SqlQuery};

use crate::error::RecordFailure;
use crate::{PasswordHasher, SeedData, SeedError};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What seeding one table did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table: &'static str,
    /// Records in the seed list.
    pub attempted: usize,
    /// Rows actually written; conflicting records count zero.
    pub inserted: u64,
}

/// Per-table results of a full run, in seeding order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub tables: Vec<TableReport>,
}

impl SeedReport {
    pub fn table(&self, table: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == table)
    }

    pub fn inserted(&self) -> u64 {
        self.tables.iter().map(|t| t.inserted).sum()
    }
}

// ---------------------------------------------------------------------------
// Seeder
// ---------------------------------------------------------------------------

/// Seeds the dashboard tables through a [`SqlExecutor`].
pub struct Seeder {
    db: Arc<dyn SqlExecutor>,
    hasher: Arc<dyn PasswordHasher>,
}

impl Seeder {
    pub fn new(db: Arc<dyn SqlExecutor>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { db, hasher }
    }

    /// Seed every table in order.
    ///
    /// # Errors
    /// Returns the first table's `SeedError`; later tables are not touched.
    #[instrument(skip_all)]
    pub async fn run(&self, data: &SeedData) -> Result<SeedReport, SeedError> {
        let tables = vec![
            self.seed_users(&data.users).await?,
            self.seed_customers(&data.customers).await?,
            self.seed_invoices(&data.invoices).await?,
            self.seed_revenue(&data.revenue).await?,
        ];
        let report = SeedReport { tables };

        info!("Seeding complete ({} rows inserted)", report.inserted());
        Ok(report)
    }

    /// Create `users` and insert every user with a hashed password.
    ///
    /// Each record hashes on the blocking pool before its insert is issued.
    #[instrument(skip_all, fields(table = users::TABLE))]
    pub async fn seed_users(&self, records: &[User]) -> Result<TableReport, SeedError> {
        self.ensure_schema(
            users::TABLE,
            vec![schema::ensure_uuid_extension(), users::create_table()],
        )
        .await?;

        let hasher = Arc::clone(&self.hasher);
        self.insert_all(
            users::TABLE,
            records,
            |user| user.id.to_string(),
            move |user| {
                let hasher = Arc::clone(&hasher);
                async move {
                    let plaintext = user.password.clone();
                    let hash = tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
                        .await
                        .map_err(|e| e.to_string())?
                        .map_err(|e| e.to_string())?;
                    users::insert(&user, &hash).map_err(|e| e.to_string())
                }
            },
        )
        .await
    }

    #[instrument(skip_all, fields(table = customers::TABLE))]
    pub async fn seed_customers(&self, records: &[Customer]) -> Result<TableReport, SeedError> {
        self.ensure_schema(
            customers::TABLE,
            vec![schema::ensure_uuid_extension(), customers::create_table()],
        )
        .await?;

        self.insert_all(
            customers::TABLE,
            records,
            |customer| customer.id.to_string(),
            |customer| async move { customers::insert(&customer).map_err(|e| e.to_string()) },
        )
        .await
    }

    #[instrument(skip_all, fields(table = invoices::TABLE))]
    pub async fn seed_invoices(&self, records: &[Invoice]) -> Result<TableReport, SeedError> {
        self.ensure_schema(
            invoices::TABLE,
            vec![schema::ensure_uuid_extension(), invoices::create_table()],
        )
        .await?;

        self.insert_all(
            invoices::TABLE,
            records,
            |invoice| invoice.id.to_string(),
            |invoice| async move { invoices::insert(&invoice).map_err(|e| e.to_string()) },
        )
        .await
    }

    #[instrument(skip_all, fields(table = revenue::TABLE))]
    pub async fn seed_revenue(&self, records: &[Revenue]) -> Result<TableReport, SeedError> {
        self.ensure_schema(revenue::TABLE, vec![revenue::create_table()])
            .await?;

        self.insert_all(
            revenue::TABLE,
            records,
            |rev| rev.month.clone(),
            |rev| async move { revenue::insert(&rev).map_err(|e| e.to_string()) },
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Internal: schema and bulk insert shared by every table.
    // -----------------------------------------------------------------------

    async fn ensure_schema(
        &self,
        table: &'static str,
        statements: Vec<SqlQuery>,
    ) -> Result<(), SeedError> {
        for statement in statements {
            if let Err(source) = self.db.execute(statement).await {
                let err = SeedError::Schema { table, source };
                error!("Error seeding {table}: {err}");
                return Err(err);
            }
        }

        info!("Created \"{table}\" table");
        Ok(())
    }

    /// Spawn one task per record, join them all, and fail with every
    /// record error if any occurred.
    ///
    /// `prepare` turns a record into its insert statement (and may do work
    /// such as hashing first); `key` names the record in failure reports.
    async fn insert_all<R, K, P, F>(
        &self,
        table: &'static str,
        records: &[R],
        key: K,
        prepare: P,
    ) -> Result<TableReport, SeedError>
    where
        R: Clone,
        K: Fn(&R) -> String,
        P: Fn(R) -> F,
        F: Future<Output = Result<SqlQuery, String>> + Send + 'static,
    {
        let mut tasks = JoinSet::new();
        let mut keys = HashMap::new();

        for record in records {
            let db = Arc::clone(&self.db);
            let statement = prepare(record.clone());

            let handle = tasks.spawn(async move {
                match statement.await {
                    Ok(query) => db.execute(query).await.map_err(|e| e.to_string()),
                    Err(message) => Err(message),
                }
            });
            keys.insert(handle.id(), key(record));
        }

        let mut inserted = 0u64;
        let mut failures = Vec::new();

        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, outcome)) => (id, outcome),
                // Panicked or cancelled; the task id still names the record.
                Err(e) => (e.id(), Err(e.to_string())),
            };
            match outcome {
                Ok(done) => inserted += done.row_count,
                Err(message) => failures.push(RecordFailure {
                    key: keys.remove(&id).unwrap_or_default(),
                    message,
                }),
            }
        }

        if !failures.is_empty() {
            failures.sort_by(|a, b| a.key.cmp(&b.key));
            let err = SeedError::Records {
                table,
                attempted: records.len(),
                failures,
            };
            error!("Error seeding {table}: {err}");
            return Err(err);
        }

        info!("Seeded {} {table}", records.len());
        Ok(TableReport {
            table,
            attempted: records.len(),
            inserted,
        })
    }
}

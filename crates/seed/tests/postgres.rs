//! Integration tests for the seeding pipeline against a real PostgreSQL.
//!
//! # Requirements
//!
//! - Docker must be running (testcontainers launches a PostgreSQL container)
//! - Feature flag `integration` must be enabled
//!
//! # Running
//!
//! ```sh
//! cargo test -p seed --features integration --test postgres
//! ```
//!
//! Each test starts its own container, so tests never see each other's rows.

#![cfg(feature = "integration")]

use std::sync::Arc;

use db::models::{Revenue, User};
use db::repository::{customers, invoices, revenue, schema, users};
use db::{sql, DbConfig, DbError, Mode, PgExecutor, SqlExecutor, SqlQuery};
use seed::{Argon2Hasher, PasswordHasher, SeedData, SeedError, Seeder};
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Test environment
// ---------------------------------------------------------------------------

struct PgTestEnv {
    /// Dropping this stops the container.
    _container: ContainerAsync<Postgres>,
    executor: PgExecutor,
}

async fn start_pg() -> PgTestEnv {
    let container = Postgres::default()
        .start()
        .await
        .expect("Failed to start PostgreSQL container (is Docker running?)");

    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let url = format!("postgres://postgres:postgres@{host}:{port}/postgres");

    PgTestEnv {
        _container: container,
        executor: PgExecutor::new(DbConfig::new(url, Mode::Development)),
    }
}

fn hasher() -> Arc<Argon2Hasher> {
    Arc::new(Argon2Hasher::with_params(64, 1, 1).unwrap())
}

fn seeder(env: &PgTestEnv) -> Seeder {
    Seeder::new(Arc::new(env.executor.clone()), hasher())
}

async fn counts(db: &PgExecutor) -> [i64; 4] {
    [
        users::count(db).await.unwrap(),
        customers::count(db).await.unwrap(),
        invoices::count(db).await.unwrap(),
        revenue::count(db).await.unwrap(),
    ]
}

fn ann() -> User {
    User {
        id: Uuid::from_u128(1),
        name: "Ann".into(),
        email: "ann@example.com".into(),
        password: "secret".into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn seeding_twice_yields_the_same_row_counts() {
    let env = start_pg().await;
    let data = SeedData::placeholder().unwrap();

    seeder(&env).run(&data).await.unwrap();
    let once = counts(&env.executor).await;

    let second = seeder(&env).run(&data).await.unwrap();
    let twice = counts(&env.executor).await;

    assert_eq!(once, [1, 6, 13, 12]);
    assert_eq!(once, twice);
    assert_eq!(second.inserted(), 0);
}

#[tokio::test]
async fn stored_password_is_hashed_and_user_is_not_duplicated() {
    let env = start_pg().await;
    let data = SeedData {
        users: vec![ann()],
        ..SeedData::default()
    };

    seeder(&env).run(&data).await.unwrap();
    seeder(&env).run(&data).await.unwrap();

    let query = sql!("SELECT password FROM users WHERE id = {}", Uuid::from_u128(1)).unwrap();
    let stored = env
        .executor
        .fetch_scalar::<String>(&query)
        .await
        .unwrap()
        .expect("user row exists");

    assert_ne!(stored, "secret");
    assert!(hasher().verify("secret", &stored).unwrap());
    assert_eq!(users::count(&env.executor).await.unwrap(), 1);

    let found = users::find_by_email(&env.executor, "ann@example.com")
        .await
        .unwrap()
        .expect("lookup by email");
    assert_eq!(found.name, "Ann");
}

#[tokio::test]
async fn existing_revenue_is_never_overwritten() {
    let env = start_pg().await;
    let s = seeder(&env);

    s.seed_revenue(&[Revenue { month: "Jan".into(), revenue: 1000 }])
        .await
        .unwrap();
    s.seed_revenue(&[Revenue { month: "Jan".into(), revenue: 2000 }])
        .await
        .unwrap();

    let jan = revenue::find(&env.executor, "Jan").await.unwrap().unwrap();
    assert_eq!(jan.revenue, 1000);
}

#[tokio::test]
async fn invoices_cannot_be_seeded_before_customers() {
    let env = start_pg().await;
    let data = SeedData::placeholder().unwrap();

    let err = seeder(&env).seed_invoices(&data.invoices).await.unwrap_err();
    assert_eq!(err.table(), Some("invoices"));

    // With the customers table present but empty, every invoice is rejected.
    let env = start_pg().await;
    let s = seeder(&env);
    s.seed_customers(&[]).await.unwrap();
    let err = s.seed_invoices(&data.invoices).await.unwrap_err();
    let SeedError::Records { failures, .. } = &err else {
        panic!("expected a records error, got {err:?}");
    };
    assert_eq!(failures.len(), data.invoices.len());

    // In the documented order everything succeeds.
    let env = start_pg().await;
    seeder(&env).run(&data).await.unwrap();
}

#[tokio::test]
async fn malformed_statement_surfaces_as_database_error() {
    let env = start_pg().await;

    let err = env
        .executor
        .execute(SqlQuery::raw("SELEC * FORM nowhere"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Database));

    let err = env
        .executor
        .fetch::<(i64,)>(&SqlQuery::raw("SELECT COUNT(*) FROM missing_table"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Database));
}

#[tokio::test]
async fn query_output_reports_rows_count_and_command() {
    let env = start_pg().await;
    seeder(&env).run(&SeedData::placeholder().unwrap()).await.unwrap();

    let output = env
        .executor
        .fetch::<Revenue>(&SqlQuery::raw("SELECT month, revenue FROM revenue"))
        .await
        .unwrap();
    assert_eq!(output.command, "SELECT");
    assert_eq!(output.row_count, 12);
    assert_eq!(output.rows.len(), 12);

    let latest = invoices::latest(&env.executor, 5).await.unwrap();
    assert_eq!(latest.len(), 5);
    assert_eq!(customers::list(&env.executor).await.unwrap().len(), 6);
}

#[tokio::test]
async fn commented_and_cte_statements_report_rows_and_command() {
    let env = start_pg().await;
    seeder(&env).seed_revenue(&[]).await.unwrap();

    let inserted = env
        .executor
        .fetch::<(String,)>(&SqlQuery::raw(
            "WITH src (month, revenue) AS (VALUES ('Jan', 1), ('Feb', 2)) \
             INSERT INTO revenue (month, revenue) SELECT month, revenue FROM src",
        ))
        .await
        .unwrap();
    assert_eq!(inserted.command, "INSERT");
    assert_eq!(inserted.row_count, 2);
    assert!(inserted.rows.is_empty());

    let selected = env
        .executor
        .fetch::<Revenue>(&SqlQuery::raw(
            "-- every month\nSELECT month, revenue FROM revenue ORDER BY revenue",
        ))
        .await
        .unwrap();
    assert_eq!(selected.command, "SELECT");
    assert_eq!(selected.row_count, 2);
    assert_eq!(selected.rows[0].month, "Jan");
}

#[tokio::test]
async fn drop_all_removes_every_table() {
    let env = start_pg().await;
    seeder(&env).run(&SeedData::placeholder().unwrap()).await.unwrap();
    assert_eq!(schema::count_public_tables(&env.executor).await.unwrap(), 4);

    schema::drop_all(&env.executor).await.unwrap();
    assert_eq!(schema::count_public_tables(&env.executor).await.unwrap(), 0);
}

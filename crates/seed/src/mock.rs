//! Test double for `SqlExecutor`.
//!
//! Records every statement it receives and imitates just enough of Postgres
//! for the seeding pipeline: tables come into existence with
//! `CREATE TABLE`, inserts into missing tables fail, the first bound value of
//! an insert is its conflict key (a repeat insert affects zero rows), and
//! optional foreign keys reject inserts whose parent row is missing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use db::{CommandOutcome, DbError, SqlExecutor, SqlQuery, SqlValue};

/// Failure injected into `MockExecutor` at construction time.
#[derive(Debug, Clone)]
pub enum MockFailure {
    /// Fail every statement whose text contains this fragment.
    OnText(String),
    /// Fail every statement that binds this value.
    OnValue(SqlValue),
    /// Panic on every statement that binds this value.
    PanicOnValue(SqlValue),
}

impl MockFailure {
    fn matches(&self, query: &SqlQuery) -> bool {
        match self {
            Self::OnText(fragment) => query.text().contains(fragment.as_str()),
            Self::OnValue(value) | Self::PanicOnValue(value) => query.values().contains(value),
        }
    }
}

#[derive(Debug, Clone)]
struct ForeignKey {
    table: String,
    column: usize,
    parent: String,
}

#[derive(Debug, Default)]
struct MockState {
    statements: Vec<SqlQuery>,
    /// table → conflict keys inserted so far
    tables: HashMap<String, HashSet<String>>,
}

/// An in-memory executor that records statements and imitates key conflicts.
#[derive(Debug, Clone, Default)]
pub struct MockExecutor {
    failures: Vec<MockFailure>,
    foreign_keys: Vec<ForeignKey>,
    state: Arc<Mutex<MockState>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail statements whose text contains `fragment`.
    pub fn failing_on_text(mut self, fragment: impl Into<String>) -> Self {
        self.failures.push(MockFailure::OnText(fragment.into()));
        self
    }

    /// Fail statements that bind `value`.
    pub fn failing_on_value(mut self, value: impl Into<SqlValue>) -> Self {
        self.failures.push(MockFailure::OnValue(value.into()));
        self
    }

    /// Panic inside `execute` for statements that bind `value`.
    pub fn panicking_on_value(mut self, value: impl Into<SqlValue>) -> Self {
        self.failures.push(MockFailure::PanicOnValue(value.into()));
        self
    }

    /// Require bound value `column` of inserts into `table` to be a key
    /// already present in `parent`.
    pub fn with_foreign_key(mut self, table: &str, column: usize, parent: &str) -> Self {
        self.foreign_keys.push(ForeignKey {
            table: table.to_owned(),
            column,
            parent: parent.to_owned(),
        });
        self
    }

    /// The foreign key the dashboard schema declares.
    pub fn with_dashboard_schema(self) -> Self {
        self.with_foreign_key("invoices", 1, "customers")
    }

    /// Every statement received, in arrival order (failed ones included).
    pub fn statements(&self) -> Vec<SqlQuery> {
        self.state.lock().unwrap().statements.clone()
    }

    /// Number of distinct keys stored in `table`, or `None` if it was never
    /// created.
    pub fn row_count(&self, table: &str) -> Option<usize> {
        self.state.lock().unwrap().tables.get(table).map(HashSet::len)
    }

    /// Tables in the order their first insert arrived.
    pub fn insert_order(&self) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();
        for statement in self.statements() {
            if statement.command() != "INSERT" {
                continue;
            }
            if let Some(table) = table_after(statement.text(), "INTO") {
                if !order.contains(&table) {
                    order.push(table);
                }
            }
        }
        order
    }
}

#[async_trait]
impl SqlExecutor for MockExecutor {
    async fn execute(&self, query: SqlQuery) -> Result<CommandOutcome, DbError> {
        // Panic before taking the lock.
        let panics = self
            .failures
            .iter()
            .any(|f| matches!(f, MockFailure::PanicOnValue(_)) && f.matches(&query));
        if panics {
            panic!("mock executor panicked on {}", query.command());
        }

        let mut state = self.state.lock().unwrap();
        state.statements.push(query.clone());

        if self.failures.iter().any(|f| f.matches(&query)) {
            return Err(DbError::Database);
        }

        let command = query.command();
        let text = query.text();
        let row_count = match command.as_str() {
            "CREATE" if text.to_ascii_uppercase().contains("TABLE") => {
                let table = table_after(text, "EXISTS").ok_or(DbError::Database)?;
                state.tables.entry(table).or_default();
                0
            }
            "DROP" => {
                if let Some(table) = table_after(text, "EXISTS") {
                    state.tables.remove(&table);
                }
                0
            }
            "INSERT" => {
                let table = table_after(text, "INTO").ok_or(DbError::Database)?;

                for fk in self.foreign_keys.iter().filter(|fk| fk.table == table) {
                    let value = query.values().get(fk.column).ok_or(DbError::Database)?;
                    let parent_has_key = state
                        .tables
                        .get(&fk.parent)
                        .is_some_and(|keys| keys.contains(&key_of(value)));
                    if !parent_has_key {
                        return Err(DbError::Database);
                    }
                }

                let key = query.values().first().map(key_of).unwrap_or_default();
                let keys = state.tables.get_mut(&table).ok_or(DbError::Database)?;
                u64::from(keys.insert(key))
            }
            _ => 0,
        };

        Ok(CommandOutcome { row_count, command })
    }
}

/// The identifier following `keyword` (case-insensitive), without quotes or
/// a trailing column list.
fn table_after(text: &str, keyword: &str) -> Option<String> {
    let mut words = text.split_whitespace();
    words.find(|w| w.eq_ignore_ascii_case(keyword))?;
    let name = words.next()?;
    let name = name.split('(').next()?.trim_matches('"');
    (!name.is_empty()).then(|| name.to_owned())
}

fn key_of(value: &SqlValue) -> String {
    match value {
        SqlValue::Text(v) => v.clone(),
        SqlValue::Int(v) => v.to_string(),
        SqlValue::BigInt(v) => v.to_string(),
        SqlValue::Bool(v) => v.to_string(),
        SqlValue::Uuid(v) => v.to_string(),
        SqlValue::Date(v) => v.to_string(),
        SqlValue::Null => "NULL".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_are_extracted() {
        assert_eq!(
            table_after("CREATE TABLE IF NOT EXISTS users (id UUID)", "EXISTS").as_deref(),
            Some("users")
        );
        assert_eq!(
            table_after("\n INSERT INTO revenue (month) VALUES ($1)", "INTO").as_deref(),
            Some("revenue")
        );
        assert_eq!(table_after("SELECT 1", "INTO"), None);
    }

    #[tokio::test]
    async fn repeated_key_affects_no_rows() {
        let db = MockExecutor::new();
        db.execute(SqlQuery::raw("CREATE TABLE IF NOT EXISTS revenue (month TEXT)"))
            .await
            .unwrap();

        let insert = db::sql!("INSERT INTO revenue (month, revenue) VALUES ({}, {})", "Jan", 1000)
            .unwrap();
        assert_eq!(db.execute(insert.clone()).await.unwrap().row_count, 1);
        assert_eq!(db.execute(insert).await.unwrap().row_count, 0);
        assert_eq!(db.row_count("revenue"), Some(1));
    }

    #[tokio::test]
    async fn insert_into_missing_table_fails() {
        let db = MockExecutor::new();
        let insert = db::sql!("INSERT INTO users (id) VALUES ({})", "u1").unwrap();
        assert!(matches!(db.execute(insert).await, Err(DbError::Database)));
        assert_eq!(db.statements().len(), 1);
    }

    #[tokio::test]
    async fn injected_failure_is_reported() {
        let db = MockExecutor::new().failing_on_text("DROP");
        let result = db.execute(SqlQuery::raw("DROP TABLE IF EXISTS users")).await;
        assert!(matches!(result, Err(DbError::Database)));
    }
}

//! Template fragments → positional statement.
//!
//! A query is written as literal text interleaved with values. Values never
//! reach the statement text; each boundary gets the next Postgres placeholder
//! (`$1`, `$2`, …) and the value is bound separately.

use std::iter::Peekable;
use std::str::Chars;

use chrono::NaiveDate;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use uuid::Uuid;

use crate::DbError;

/// Marker splitting a [`sql!`](crate::sql) template into fragments.
pub const SLOT: &str = "{}";

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A typed statement parameter.
///
/// `Null` is bound as a text-typed NULL, so it only fits text columns.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i32),
    BigInt(i64),
    Bool(bool),
    Uuid(Uuid),
    Date(NaiveDate),
    Null,
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        Self::Text(v.clone())
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::BigInt(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// SqlQuery
// ---------------------------------------------------------------------------

/// Statement text with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    text: String,
    values: Vec<SqlValue>,
}

impl SqlQuery {
    /// Interleave `fragments` with `$n` placeholders, one per value, in order.
    ///
    /// # Errors
    /// `DbError::Template` unless `fragments.len() == values.len() + 1`.
    pub fn build<S: AsRef<str>>(fragments: &[S], values: Vec<SqlValue>) -> Result<Self, DbError> {
        if fragments.len() != values.len() + 1 {
            return Err(DbError::Template {
                fragments: fragments.len(),
                values: values.len(),
            });
        }

        let mut text = String::from(fragments[0].as_ref());
        for (i, fragment) in fragments[1..].iter().enumerate() {
            text.push('$');
            text.push_str(&(i + 1).to_string());
            text.push_str(fragment.as_ref());
        }

        Ok(Self { text, values })
    }

    /// Split `template` on [`SLOT`] and build from the pieces.
    pub fn from_template(template: &str, values: Vec<SqlValue>) -> Result<Self, DbError> {
        let fragments: Vec<&str> = template.split(SLOT).collect();
        Self::build(&fragments, values)
    }

    /// A statement without parameters.
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            values: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Command tag of the statement, upper-cased (`SELECT`, `INSERT`, …).
    ///
    /// Leading comments are skipped. For a `WITH` statement this is the
    /// keyword of the main statement that follows the CTEs.
    pub fn command(&self) -> String {
        let mut words = top_level_words(&self.text).into_iter();
        match words.next() {
            Some(first) if first == "WITH" => words
                .find(|w| MAIN_STATEMENTS.contains(&w.as_str()))
                .unwrap_or(first),
            Some(first) => first,
            None => String::new(),
        }
    }

    /// Prepare the statement for sqlx with every value bound in order.
    pub(crate) fn to_sqlx(&self) -> Query<'_, Postgres, PgArguments> {
        self.values
            .iter()
            .fold(sqlx::query(&self.text), |q, value| match value {
                SqlValue::Text(v) => q.bind(v.as_str()),
                SqlValue::Int(v) => q.bind(*v),
                SqlValue::BigInt(v) => q.bind(*v),
                SqlValue::Bool(v) => q.bind(*v),
                SqlValue::Uuid(v) => q.bind(*v),
                SqlValue::Date(v) => q.bind(*v),
                SqlValue::Null => q.bind(None::<String>),
            })
    }
}

// Keywords that can follow the CTE list of a `WITH` statement.
const MAIN_STATEMENTS: [&str; 7] =
    ["SELECT", "INSERT", "UPDATE", "DELETE", "MERGE", "VALUES", "TABLE"];

/// Upper-cased words outside comments, quotes and parentheses, in order.
fn top_level_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut depth = 0usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if depth == 0 {
                word.push(c.to_ascii_uppercase());
            }
            continue;
        }
        if !word.is_empty() {
            words.push(std::mem::take(&mut word));
        }
        match c {
            '-' if chars.peek() == Some(&'-') => {
                chars.by_ref().find(|&c| c == '\n');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                skip_block_comment(&mut chars);
            }
            '\'' | '"' => {
                chars.by_ref().find(|&q| q == c);
            }
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    if !word.is_empty() {
        words.push(word);
    }
    words
}

// Block comments nest in Postgres.
fn skip_block_comment(chars: &mut Peekable<Chars<'_>>) {
    let mut depth = 1;
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'/') => {
                chars.next();
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                depth += 1;
            }
            _ => {}
        }
    }
}

/// Build a [`SqlQuery`] from a `{}`-slotted template.
///
/// ```
/// let q = db::sql!("SELECT * FROM revenue WHERE month = {} AND revenue > {}", "Jan", 1000)?;
/// assert_eq!(q.text(), "SELECT * FROM revenue WHERE month = $1 AND revenue > $2");
/// # Ok::<(), db::DbError>(())
/// ```
#[macro_export]
macro_rules! sql {
    ($template:expr $(, $value:expr)* $(,)?) => {
        $crate::query::SqlQuery::from_template(
            $template,
            vec![$($crate::query::SqlValue::from($value)),*],
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_follow_value_order() {
        let q = SqlQuery::build(
            &["INSERT INTO revenue (month, revenue) VALUES (", ", ", ")"],
            vec!["Jan".into(), 1000.into()],
        )
        .unwrap();

        assert_eq!(q.text(), "INSERT INTO revenue (month, revenue) VALUES ($1, $2)");
        assert_eq!(q.values(), &[SqlValue::Text("Jan".into()), SqlValue::Int(1000)]);
    }

    #[test]
    fn zero_values_returns_fragment_verbatim() {
        let q = SqlQuery::build(&["SELECT COUNT(*) FROM users"], vec![]).unwrap();
        assert_eq!(q.text(), "SELECT COUNT(*) FROM users");
        assert!(q.values().is_empty());
        assert_eq!(q, SqlQuery::raw("SELECT COUNT(*) FROM users"));
    }

    #[test]
    fn mismatched_shape_is_rejected() {
        let err = SqlQuery::build(&["a", "b"], vec![]).unwrap_err();
        assert!(matches!(err, DbError::Template { fragments: 2, values: 0 }));

        let err = SqlQuery::build::<&str>(&[], vec![]).unwrap_err();
        assert!(matches!(err, DbError::Template { fragments: 0, values: 0 }));
    }

    #[test]
    fn values_never_reach_the_text() {
        let q = crate::sql!("SELECT * FROM users WHERE email = {}", "x'; DROP TABLE users; --")
            .unwrap();
        assert_eq!(q.text(), "SELECT * FROM users WHERE email = $1");
        assert!(!q.text().contains("DROP"));
    }

    #[test]
    fn macro_converts_each_value() {
        let id = Uuid::nil();
        let date = NaiveDate::from_ymd_opt(2022, 12, 6).unwrap();
        let q = crate::sql!(
            "INSERT INTO invoices VALUES ({}, {}, {}, {}, {})",
            id,
            15795,
            "pending",
            date,
            None::<String>,
        )
        .unwrap();

        assert_eq!(q.text(), "INSERT INTO invoices VALUES ($1, $2, $3, $4, $5)");
        assert_eq!(
            q.values(),
            &[
                SqlValue::Uuid(id),
                SqlValue::Int(15795),
                SqlValue::Text("pending".into()),
                SqlValue::Date(date),
                SqlValue::Null,
            ]
        );
    }

    #[test]
    fn macro_checks_slot_count() {
        assert!(crate::sql!("SELECT {}, {}", 1).is_err());
        assert!(crate::sql!("SELECT 1", 1).is_err());
    }

    #[test]
    fn command_is_leading_keyword() {
        assert_eq!(SqlQuery::raw("\n  insert into users values (1)").command(), "INSERT");
        assert_eq!(SqlQuery::raw("CREATE TABLE IF NOT EXISTS x ()").command(), "CREATE");
        assert_eq!(SqlQuery::raw("").command(), "");
    }

    #[test]
    fn leading_comments_are_skipped() {
        let q = SqlQuery::raw("-- latest revenue\nSELECT month, revenue FROM revenue");
        assert_eq!(q.command(), "SELECT");

        let q = SqlQuery::raw("/* outer /* inner */ still comment */ DELETE FROM revenue");
        assert_eq!(q.command(), "DELETE");

        assert_eq!(SqlQuery::raw("-- nothing but a comment").command(), "");
    }

    #[test]
    fn with_statement_reports_its_main_command() {
        let q = SqlQuery::raw(
            "WITH c AS (SELECT 1) INSERT INTO revenue (month, revenue) SELECT 'Jan', 1 FROM c",
        );
        assert_eq!(q.command(), "INSERT");

        let q = SqlQuery::raw("with recursive t(n) as (values (1)) select * from t");
        assert_eq!(q.command(), "SELECT");

        let q = SqlQuery::raw(
            "WITH insert_log AS (SELECT 1), x AS NOT MATERIALIZED (SELECT 2) \
             UPDATE revenue SET revenue = 0",
        );
        assert_eq!(q.command(), "UPDATE");
    }

    #[test]
    fn quoted_text_and_column_names_do_not_change_the_command() {
        let q = SqlQuery::raw("SELECT returning_customer, '-- not a comment' FROM \"insert\"");
        assert_eq!(q.command(), "SELECT");
    }
}

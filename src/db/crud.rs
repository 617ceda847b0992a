//! Generic CRUD accessor.
//!
//! Statements are built per call from a table name, an ordered column/value
//! mapping and optional equality conditions. Values are always bound through
//! numbered placeholders; table and column names are validated identifiers.
//! `ORDER BY` and `LIMIT` fragments are inserted verbatim and must come from
//! trusted callers.

use crate::db::schema::SQLITE_INIT;
use crate::error::CrudError;
use base64::Engine as _;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::{Column, Row, Sqlite, SqlitePool, TypeInfo, ValueRef};
use std::{str::FromStr, time::Duration};
use tracing::{debug, error};

/// One fetched row, column name to JSON value, in column order.
pub type Record = serde_json::Map<String, Value>;

/// Ordered column/value pairs. Setting a column twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<(String, Value)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.0.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.0.push((column, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(c, v)| (c.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (column, value) in iter {
            fields.set(column, value);
        }
        fields
    }
}

/// Optional parts of a `SELECT`.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    pub conditions: Fields,
    /// Empty selects `*`.
    pub columns: Vec<String>,
    pub order_by: String,
    pub limit: String,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.set(column, value);
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self
    }

    pub fn limit(mut self, limit: impl Into<String>) -> Self {
        self.limit = limit.into();
        self
    }
}

/// Outcome of an `UPDATE` or `DELETE` that reached the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Applied(u64),
    /// The statement ran but no row matched the conditions.
    Unmatched,
}

impl Mutation {
    fn from_rows(rows: u64) -> Self {
        if rows == 0 {
            Mutation::Unmatched
        } else {
            Mutation::Applied(rows)
        }
    }

    pub fn rows(self) -> u64 {
        match self {
            Mutation::Applied(n) => n,
            Mutation::Unmatched => 0,
        }
    }
}

/// SQL text plus the values for `?1..?n`, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    fn new(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    /// Binds `value` to the next numbered placeholder and returns it.
    fn bind(&mut self, value: &Value) -> String {
        self.params.push(value.clone());
        format!("?{}", self.params.len())
    }

    fn equality_clause(&mut self, fields: &Fields, separator: &str) -> Result<String, CrudError> {
        let mut parts = Vec::with_capacity(fields.len());
        for (column, value) in fields.iter() {
            let column = identifier(column)?;
            let placeholder = self.bind(value);
            parts.push(format!("{column} = {placeholder}"));
        }
        Ok(parts.join(separator))
    }
}

pub fn build_insert(table: &str, data: &Fields) -> Result<Statement, CrudError> {
    if data.is_empty() {
        return Err(CrudError::EmptyData {
            table: table.to_string(),
        });
    }
    let table = identifier(table)?;

    let mut stmt = Statement::new(String::new());
    let mut columns = Vec::with_capacity(data.len());
    let mut placeholders = Vec::with_capacity(data.len());
    for (column, value) in data.iter() {
        columns.push(identifier(column)?);
        placeholders.push(stmt.bind(value));
    }

    stmt.sql = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    );
    Ok(stmt)
}

pub fn build_select(table: &str, query: &SelectQuery) -> Result<Statement, CrudError> {
    let table = identifier(table)?;
    let columns = if query.columns.is_empty() {
        "*".to_string()
    } else {
        query
            .columns
            .iter()
            .map(|c| if c == "*" { Ok("*") } else { identifier(c) })
            .collect::<Result<Vec<_>, _>>()?
            .join(", ")
    };

    let mut stmt = Statement::new(String::new());
    let mut sql = format!("SELECT {columns} FROM {table}");

    if !query.conditions.is_empty() {
        let clause = stmt.equality_clause(&query.conditions, " AND ")?;
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }
    if !query.order_by.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&query.order_by);
    }
    if !query.limit.is_empty() {
        sql.push_str(" LIMIT ");
        sql.push_str(&query.limit);
    }

    stmt.sql = sql;
    Ok(stmt)
}

/// SET placeholders come first and WHERE placeholders continue the
/// numbering, so a column used on both sides binds two distinct values.
pub fn build_update(table: &str, data: &Fields, conditions: &Fields) -> Result<Statement, CrudError> {
    if data.is_empty() {
        return Err(CrudError::EmptyData {
            table: table.to_string(),
        });
    }
    if conditions.is_empty() {
        return Err(CrudError::MissingConditions {
            operation: "update",
            table: table.to_string(),
        });
    }
    let table = identifier(table)?;

    let mut stmt = Statement::new(String::new());
    let set = stmt.equality_clause(data, ", ")?;
    let filter = stmt.equality_clause(conditions, " AND ")?;
    stmt.sql = format!("UPDATE {table} SET {set} WHERE {filter}");
    Ok(stmt)
}

pub fn build_delete(table: &str, conditions: &Fields) -> Result<Statement, CrudError> {
    if conditions.is_empty() {
        return Err(CrudError::MissingConditions {
            operation: "delete",
            table: table.to_string(),
        });
    }
    let table = identifier(table)?;

    let mut stmt = Statement::new(String::new());
    let filter = stmt.equality_clause(conditions, " AND ")?;
    stmt.sql = format!("DELETE FROM {table} WHERE {filter}");
    Ok(stmt)
}

/// `name` or `schema.name`, each part `[A-Za-z_][A-Za-z0-9_]*`.
fn identifier(name: &str) -> Result<&str, CrudError> {
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    if !name.is_empty() && name.split('.').all(valid_part) {
        Ok(name)
    } else {
        Err(CrudError::InvalidIdentifier(name.to_string()))
    }
}

/// CRUD accessor over one SQLite pool.
#[derive(Debug, Clone)]
pub struct Crud {
    pool: SqlitePool,
}

impl Crud {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens the database (creating it if missing) and applies the schema.
    pub async fn connect(database_url: &str) -> Result<Self, CrudError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        apply_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the generated row id.
    pub async fn insert(&self, table: &str, data: &Fields) -> Result<i64, CrudError> {
        let stmt = build_insert(table, data)?;
        let res = bind_all(sqlx::query(&stmt.sql), &stmt.params)
            .execute(&self.pool)
            .await
            .map_err(|e| log_failure("insert", table, e))?;

        let id = res.last_insert_rowid();
        debug!(table, id, "crud insert");
        Ok(id)
    }

    /// At most one record, or `None` when nothing matched.
    pub async fn select_one(
        &self,
        table: &str,
        query: &SelectQuery,
    ) -> Result<Option<Record>, CrudError> {
        let stmt = build_select(table, query)?;
        let row = bind_all(sqlx::query(&stmt.sql), &stmt.params)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_failure("select", table, e))?;

        row.as_ref()
            .map(record_from_row)
            .transpose()
            .map_err(|e| log_failure("select", table, e))
    }

    /// Every matching record in result order; possibly empty.
    pub async fn select_all(
        &self,
        table: &str,
        query: &SelectQuery,
    ) -> Result<Vec<Record>, CrudError> {
        let stmt = build_select(table, query)?;
        let rows = bind_all(sqlx::query(&stmt.sql), &stmt.params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| log_failure("select", table, e))?;

        rows.iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| log_failure("select", table, e))
    }

    pub async fn update(
        &self,
        table: &str,
        data: &Fields,
        conditions: &Fields,
    ) -> Result<Mutation, CrudError> {
        let stmt = build_update(table, data, conditions)?;
        let res = bind_all(sqlx::query(&stmt.sql), &stmt.params)
            .execute(&self.pool)
            .await
            .map_err(|e| log_failure("update", table, e))?;

        let affected = res.rows_affected();
        debug!(table, affected, "crud update");
        Ok(Mutation::from_rows(affected))
    }

    pub async fn delete(&self, table: &str, conditions: &Fields) -> Result<Mutation, CrudError> {
        let stmt = build_delete(table, conditions)?;
        let res = bind_all(sqlx::query(&stmt.sql), &stmt.params)
            .execute(&self.pool)
            .await
            .map_err(|e| log_failure("delete", table, e))?;

        let affected = res.rows_affected();
        debug!(table, affected, "crud delete");
        Ok(Mutation::from_rows(affected))
    }

    /// Raw statement returning rows. Placeholders are `?` or `?N`.
    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, CrudError> {
        let rows = bind_all(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| log_failure("query", "<raw>", e))?;

        rows.iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| log_failure("query", "<raw>", e))
    }

    /// Raw statement returning the affected-row count.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, CrudError> {
        let res = bind_all(sqlx::query(sql), params)
            .execute(&self.pool)
            .await
            .map_err(|e| log_failure("execute", "<raw>", e))?;
        Ok(res.rows_affected())
    }
}

fn log_failure(operation: &'static str, table: &str, e: sqlx::Error) -> CrudError {
    error!(operation, table, error = %e, "CRUD statement failed");
    CrudError::Database(e)
}

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_all<'q>(query: SqliteQuery<'q>, params: &[Value]) -> SqliteQuery<'q> {
    params.iter().fold(query, bind_value)
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s.clone()),
        // Arrays and objects are stored as JSON text.
        other => query.bind(other.to_string()),
    }
}

fn record_from_row(row: &SqliteRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let storage = {
            let raw = row.try_get_raw(idx)?;
            if raw.is_null() {
                None
            } else {
                Some(raw.type_info().name().to_string())
            }
        };

        let value = match storage.as_deref() {
            None => Value::Null,
            Some("INTEGER" | "BOOLEAN") => Value::from(row.try_get::<i64, _>(idx)?),
            Some("REAL") => Value::from(row.try_get::<f64, _>(idx)?),
            Some("BLOB") => Value::String(
                base64::engine::general_purpose::STANDARD.encode(row.try_get::<Vec<u8>, _>(idx)?),
            ),
            Some(_) => Value::String(row.try_get::<String, _>(idx)?),
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

pub(crate) async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_binds_every_field() {
        let data = Fields::new()
            .with("username", "a")
            .with("email", "b@x.com")
            .with("password", "hash");
        let stmt = build_insert("users", &data).expect("insert statement");

        assert_eq!(
            stmt.sql,
            "INSERT INTO users (username, email, password) VALUES (?1, ?2, ?3)"
        );
        assert_eq!(stmt.params, vec![json!("a"), json!("b@x.com"), json!("hash")]);
    }

    #[test]
    fn insert_without_data_is_rejected() {
        let err = build_insert("users", &Fields::new()).unwrap_err();
        assert!(matches!(err, CrudError::EmptyData { .. }));
        assert!(err.is_rejected());
    }

    #[test]
    fn select_with_conditions_order_and_limit() {
        let query = SelectQuery::new()
            .filter("role", "admin")
            .filter("active", true)
            .columns(["id", "username"])
            .order_by("id DESC")
            .limit("5");
        let stmt = build_select("users", &query).expect("select statement");

        assert_eq!(
            stmt.sql,
            "SELECT id, username FROM users WHERE role = ?1 AND active = ?2 ORDER BY id DESC LIMIT 5"
        );
        assert_eq!(stmt.params, vec![json!("admin"), json!(true)]);
    }

    #[test]
    fn select_defaults_to_star() {
        let stmt = build_select("users", &SelectQuery::new()).expect("select statement");
        assert_eq!(stmt.sql, "SELECT * FROM users");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn update_numbers_where_after_set() {
        let data = Fields::new().with("email", "new@x.com");
        let conditions = Fields::new().with("email", "old@x.com");
        let stmt = build_update("users", &data, &conditions).expect("update statement");

        assert_eq!(stmt.sql, "UPDATE users SET email = ?1 WHERE email = ?2");
        assert_eq!(stmt.params, vec![json!("new@x.com"), json!("old@x.com")]);
    }

    #[test]
    fn unconditional_mutations_are_rejected() {
        let data = Fields::new().with("role", "admin");
        assert!(matches!(
            build_update("users", &data, &Fields::new()),
            Err(CrudError::MissingConditions { operation: "update", .. })
        ));
        assert!(matches!(
            build_update("users", &Fields::new(), &data),
            Err(CrudError::EmptyData { .. })
        ));
        assert!(matches!(
            build_delete("users", &Fields::new()),
            Err(CrudError::MissingConditions { operation: "delete", .. })
        ));
    }

    #[test]
    fn identifiers_are_validated() {
        let data = Fields::new().with("name; DROP TABLE users", 1);
        assert!(matches!(
            build_insert("users", &data),
            Err(CrudError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            build_delete("users--", &Fields::new().with("id", 1)),
            Err(CrudError::InvalidIdentifier(_))
        ));
        assert!(build_select("main.users", &SelectQuery::new()).is_ok());
    }

    #[test]
    fn setting_a_column_twice_keeps_last_value() {
        let fields: Fields = [("id", 1), ("id", 2)].into_iter().collect();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.iter().next(), Some(("id", &json!(2))));
    }
}

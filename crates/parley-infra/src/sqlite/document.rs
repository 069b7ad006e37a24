//! SQLite document store implementation.
//!
//! Implements `DocumentStore` from `parley-core` on a single `sessions` table
//! holding one JSON document per row. Filters and sorts are translated into
//! `json_extract` expressions with bound parameters; updates are applied in
//! Rust inside a writer transaction so `$push` and `$set` semantics match the
//! in-memory store exactly.
//!
//! SQLite's cross-type ordering (NULL, then numbers, then text) and rowid
//! order for ties are what `MemoryDocumentStore` reproduces.

use parley_core::store::DocumentStore;
use parley_types::document::{
    document_key, Document, Filter, FindQuery, Predicate, SortDirection, Update, KEY_FIELD,
};
use parley_types::error::StoreError;
use serde_json::Value;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::Row;

use super::pool::DatabasePool;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// SQLite-backed implementation of `DocumentStore`.
pub struct SqliteDocumentStore {
    pool: DatabasePool,
}

impl SqliteDocumentStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Filter translation
// ---------------------------------------------------------------------------

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
enum SqlParam {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlParam {
    /// Parameter comparing equal (under `IS`) to `json_extract` of `value`.
    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => SqlParam::Null,
            Value::Bool(b) => SqlParam::Integer(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlParam::Integer(i),
                None => SqlParam::Real(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) => SqlParam::Text(s.clone()),
            // json_extract returns arrays and objects as minified JSON text.
            other => SqlParam::Text(other.to_string()),
        }
    }
}

fn bind_params<'q>(mut query: SqliteQuery<'q>, params: Vec<SqlParam>) -> SqliteQuery<'q> {
    for param in params {
        query = match param {
            SqlParam::Null => query.bind(None::<String>),
            SqlParam::Integer(i) => query.bind(i),
            SqlParam::Real(f) => query.bind(f),
            SqlParam::Text(s) => query.bind(s),
        };
    }
    query
}

/// JSON path for a top-level field.
fn json_path(field: &str) -> Result<String, StoreError> {
    if field.is_empty() || field.contains('"') {
        return Err(StoreError::Query(format!("unsupported field name: {field:?}")));
    }
    Ok(format!("$.\"{field}\""))
}

/// `WHERE ...` clause (empty for a match-all filter) plus its parameters.
fn where_clause(filter: &Filter) -> Result<(String, Vec<SqlParam>), StoreError> {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    for predicate in filter.predicates() {
        let (field, value, op) = match predicate {
            Predicate::Eq { field, value } => (field, value, "IS"),
            Predicate::Ne { field, value } => (field, value, "IS NOT"),
        };

        // The key column mirrors the document's key and is indexed.
        if field == KEY_FIELD && value.is_string() {
            conditions.push(format!("session_id {op} ?"));
        } else {
            conditions.push(format!("json_extract(document, ?) {op} ?"));
            params.push(SqlParam::Text(json_path(field)?));
        }
        params.push(SqlParam::from_json(value));
    }

    if conditions.is_empty() {
        Ok((String::new(), params))
    } else {
        Ok((format!("WHERE {}", conditions.join(" AND ")), params))
    }
}

fn parse_document(text: &str) -> Result<Document, StoreError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(document) => Ok(document),
        other => Err(StoreError::Serialization(format!(
            "stored document is not an object: {other}"
        ))),
    }
}

fn document_from_row(row: &SqliteRow) -> Result<Document, StoreError> {
    let text: String = row.try_get("document").map_err(map_sqlx_error)?;
    parse_document(&text)
}

/// Map a sqlx error to a `StoreError`.
///
/// Connection-level failures become `Unavailable`; the caller maps unique
/// violations itself since only it knows the offending key.
fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable,
        other => StoreError::Query(other.to_string()),
    }
}

fn map_write_error(err: sqlx::Error, key: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::DuplicateKey(key.to_string())
        }
        _ => map_sqlx_error(err),
    }
}

// ---------------------------------------------------------------------------
// DocumentStore implementation
// ---------------------------------------------------------------------------

impl DocumentStore for SqliteDocumentStore {
    fn backend(&self) -> &str {
        "sqlite"
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let (clause, params) = where_clause(filter)?;
        let sql = format!("SELECT document FROM sessions {clause} ORDER BY rowid LIMIT 1");

        let row = bind_params(sqlx::query(&sql), params)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(document_from_row).transpose()
    }

    async fn insert_one(&self, document: Document) -> Result<(), StoreError> {
        let key = document_key(&document)?.to_string();
        let text = serde_json::to_string(&document)?;

        sqlx::query("INSERT INTO sessions (session_id, document) VALUES (?, ?)")
            .bind(&key)
            .bind(&text)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| map_write_error(e, &key))?;

        Ok(())
    }

    async fn update_one(&self, filter: &Filter, update: &Update) -> Result<bool, StoreError> {
        let (clause, params) = where_clause(filter)?;
        let sql =
            format!("SELECT rowid AS row_id, document FROM sessions {clause} ORDER BY rowid LIMIT 1");

        let mut tx = self.pool.writer.begin().await.map_err(map_sqlx_error)?;

        let Some(row) = bind_params(sqlx::query(&sql), params)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
        else {
            return Ok(false);
        };

        let row_id: i64 = row.try_get("row_id").map_err(map_sqlx_error)?;
        let mut document = document_from_row(&row)?;
        update.apply(&mut document)?;

        let key = document_key(&document)?.to_string();
        let text = serde_json::to_string(&document)?;

        sqlx::query("UPDATE sessions SET session_id = ?, document = ? WHERE rowid = ?")
            .bind(&key)
            .bind(&text)
            .bind(row_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, &key))?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(true)
    }

    async fn delete_one(&self, filter: &Filter) -> Result<bool, StoreError> {
        let (clause, params) = where_clause(filter)?;
        let sql = format!(
            "DELETE FROM sessions WHERE rowid = (SELECT rowid FROM sessions {clause} ORDER BY rowid LIMIT 1)"
        );

        let result = bind_params(sqlx::query(&sql), params)
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn fetch(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        let (clause, mut params) = where_clause(&query.filter)?;
        let mut sql = format!("SELECT document FROM sessions {clause} ORDER BY ");

        if let Some(sort) = &query.sort {
            let direction = match sort.direction {
                SortDirection::Ascending => "ASC",
                SortDirection::Descending => "DESC",
            };
            sql.push_str(&format!("json_extract(document, ?) {direction}, "));
            params.push(SqlParam::Text(json_path(&sort.field)?));
        }
        sql.push_str("rowid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(SqlParam::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        }

        let rows = bind_params(sqlx::query(&sql), params)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(document_from_row).collect()
    }
}

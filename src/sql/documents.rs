//! Document operations for PostgreSQL.
//!
//! Every collection shares one `documents` table. A document's fields live in a JSONB
//! `body` column and its identifier in a 12-byte `id` column, so `ORDER BY id` follows
//! creation order.

use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::{
    Collection, Condition, Direction, Document, Fields, Filter, ObjectId, Order, SortKey,
    StoreError,
};

/// Result type for database operations.
pub type SqlResult<T> = Result<T, StoreError>;

const CREATE_DOCUMENTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id BYTEA NOT NULL,
        body JSONB NOT NULL,
        PRIMARY KEY (collection, id)
    )
"#;

/// Creates the `documents` table if it does not exist yet.
pub async fn create_schema(pool: &PgPool) -> SqlResult<()> {
    sqlx::query(CREATE_DOCUMENTS_TABLE)
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| log_error("creating documents table", e))
}

fn log_error(context: &str, e: sqlx::Error) -> StoreError {
    tracing::error!(error = %e, "database error {context}");
    StoreError::from(e)
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, collection: Collection, filter: &Filter) {
    query.push(" WHERE collection = ");
    query.push_bind(collection.as_str());
    for condition in filter.conditions() {
        match condition {
            Condition::FieldEquals(field, value) => {
                query.push(" AND body -> ");
                query.push_bind(field.clone());
                query.push(" = ");
                query.push_bind(Json(value.clone()));
            }
            Condition::IdEquals(id) => {
                query.push(" AND id = ");
                query.push_bind(id.as_bytes().to_vec());
            }
            Condition::IdNotEquals(id) => {
                query.push(" AND id <> ");
                query.push_bind(id.as_bytes().to_vec());
            }
        }
    }
}

fn push_order(query: &mut QueryBuilder<'_, Postgres>, order: &Order) {
    let (direction, nulls) = match order.direction {
        Direction::Ascending => ("ASC", "NULLS FIRST"),
        Direction::Descending => ("DESC", "NULLS LAST"),
    };
    match &order.key {
        SortKey::Id => {
            query.push(format!(" ORDER BY id {direction}"));
        }
        SortKey::Field(field) => {
            query.push(" ORDER BY body -> ");
            query.push_bind(field.clone());
            query.push(format!(" {direction} {nulls}, id {direction}"));
        }
    }
}

fn document_from_row(row: &PgRow) -> SqlResult<Document> {
    let id: Vec<u8> = row.try_get("id")?;
    let id = ObjectId::try_from(id.as_slice())
        .map_err(|_| StoreError::Corrupt("invalid id length".to_string()))?;
    let Json(body): Json<Value> = row.try_get("body")?;
    match body {
        Value::Object(fields) => Ok(Document::new(id, fields)),
        _ => Err(StoreError::Corrupt(format!("document {id} body is not an object"))),
    }
}

/// Lists documents in a collection.
///
/// # Returns
/// * `Ok(Vec<Document>)` - Matching documents in the requested order
/// * `Err(StoreError)` - Database error
pub async fn list(
    pool: &PgPool,
    collection: Collection,
    filter: &Filter,
    order: &Order,
) -> SqlResult<Vec<Document>> {
    let mut query = QueryBuilder::new("SELECT id, body FROM documents");
    push_filter(&mut query, collection, filter);
    push_order(&mut query, order);

    let rows = query
        .build()
        .fetch_all(pool)
        .await
        .map_err(|e| log_error("listing documents", e))?;
    rows.iter().map(document_from_row).collect()
}

/// Retrieves the first document matching a filter.
///
/// # Returns
/// * `Ok(Some(Document))` - A matching document
/// * `Ok(None)` - Nothing matched
/// * `Err(StoreError)` - Database error
pub async fn find_one(
    pool: &PgPool,
    collection: Collection,
    filter: &Filter,
) -> SqlResult<Option<Document>> {
    let mut query = QueryBuilder::new("SELECT id, body FROM documents");
    push_filter(&mut query, collection, filter);
    query.push(" LIMIT 1");

    let row = query
        .build()
        .fetch_optional(pool)
        .await
        .map_err(|e| log_error("finding document", e))?;
    row.as_ref().map(document_from_row).transpose()
}

/// Inserts a document under a freshly generated identifier.
pub async fn insert(pool: &PgPool, collection: Collection, fields: Fields) -> SqlResult<ObjectId> {
    let id = ObjectId::generate();
    sqlx::query(
        r#"
        INSERT INTO documents (collection, id, body)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(collection.as_str())
    .bind(id.as_bytes().to_vec())
    .bind(Json(fields))
    .execute(pool)
    .await
    .map_err(|e| log_error("inserting document", e))?;
    Ok(id)
}

/// Merges `fields` into the top level of an existing document.
///
/// # Returns
/// * `Ok(true)` - Document existed and was updated
/// * `Ok(false)` - Document did not exist
/// * `Err(StoreError)` - Database error
pub async fn update_fields(
    pool: &PgPool,
    collection: Collection,
    id: &ObjectId,
    fields: Fields,
) -> SqlResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE documents
        SET body = body || $3
        WHERE collection = $1 AND id = $2
        "#,
    )
    .bind(collection.as_str())
    .bind(id.as_bytes().to_vec())
    .bind(Json(fields))
    .execute(pool)
    .await
    .map_err(|e| log_error("updating document", e))?;
    Ok(result.rows_affected() > 0)
}

/// Deletes a document.
///
/// # Returns
/// * `Ok(true)` - Document existed and was deleted
/// * `Ok(false)` - Document did not exist
/// * `Err(StoreError)` - Database error
pub async fn delete(pool: &PgPool, collection: Collection, id: &ObjectId) -> SqlResult<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM documents
        WHERE collection = $1 AND id = $2
        "#,
    )
    .bind(collection.as_str())
    .bind(id.as_bytes().to_vec())
    .execute(pool)
    .await
    .map_err(|e| log_error("deleting document", e))?;
    Ok(result.rows_affected() > 0)
}

/// Deletes every document in a collection and returns how many were removed.
pub async fn delete_all(pool: &PgPool, collection: Collection) -> SqlResult<u64> {
    let result = sqlx::query("DELETE FROM documents WHERE collection = $1")
        .bind(collection.as_str())
        .execute(pool)
        .await
        .map_err(|e| log_error("deleting all documents", e))?;
    Ok(result.rows_affected())
}

/// Round-trips a trivial query.
pub async fn ping(pool: &PgPool) -> SqlResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(StoreError::from)
}

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{pool::PoolConnection, PgPool, Postgres, Row};

use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::types::RawRow;

/// A scoped database connection. One is acquired per resource fetch and
/// returns to its pool when dropped, on every exit path.
#[async_trait]
pub trait Connection: Send {
    /// Execute a parameterized query and return its rows as untyped
    /// column-name -> scalar mappings, in result order.
    async fn execute(
        &mut self,
        sql: &str,
        binds: &[(String, String)],
    ) -> Result<Vec<RawRow>, DatabaseError>;
}

/// Source of scoped connections. The production implementation wraps a
/// sqlx pool; tests substitute a stub.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    type Conn: Connection;

    async fn acquire(&self) -> Result<Self::Conn, DatabaseError>;
}

pub struct PgConnectionProvider {
    pool: PgPool,
}

impl PgConnectionProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Provider backed by the process-wide pool
    pub async fn from_manager() -> Result<Self, DatabaseError> {
        Ok(Self::new(DatabaseManager::pool().await?))
    }
}

#[async_trait]
impl ConnectionProvider for PgConnectionProvider {
    type Conn = PgConnection;

    async fn acquire(&self) -> Result<PgConnection, DatabaseError> {
        Ok(PgConnection {
            conn: self.pool.acquire().await?,
        })
    }
}

pub struct PgConnection {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl Connection for PgConnection {
    async fn execute(
        &mut self,
        sql: &str,
        binds: &[(String, String)],
    ) -> Result<Vec<RawRow>, DatabaseError> {
        let (text, values) = rewrite_named_binds(sql, binds);

        if config::config().database.enable_query_logging {
            tracing::debug!(query = %text, binds = values.len(), "executing query");
        }

        // Collapse each row to a single JSON column so column aliases
        // (camelCase, quoted) survive the driver untouched.
        let wrapped = format!("SELECT row_to_json(t) AS row FROM ({text}) t");

        let mut query = sqlx::query(&wrapped);
        for value in &values {
            query = query.bind(value);
        }

        let rows = query.fetch_all(&mut *self.conn).await?;

        rows.into_iter()
            .map(|row| {
                let value: Value = row
                    .try_get("row")
                    .map_err(|e| DatabaseError::MalformedRow(e.to_string()))?;
                match value {
                    Value::Object(map) => Ok(map),
                    other => Err(DatabaseError::MalformedRow(format!(
                        "expected a JSON object row, got {other}"
                    ))),
                }
            })
            .collect()
    }
}

/// Rewrite `:name` placeholders to positional `$n` parameters, returning the
/// rewritten text and the bind values in placeholder order. Binds whose name
/// never appears in the SQL are skipped, mirroring how the query descriptors
/// only emit clauses for the filters that are present.
pub fn rewrite_named_binds(sql: &str, binds: &[(String, String)]) -> (String, Vec<String>) {
    let mut text = sql.to_string();
    let mut values: Vec<String> = Vec::new();

    for (name, value) in binds {
        let position = values.len() + 1;
        let (rewritten, replaced) = replace_placeholder(&text, name, position);
        if replaced {
            text = rewritten;
            values.push(value.clone());
        }
    }

    (text, values)
}

/// Replace every `:name` occurrence that ends at an identifier boundary,
/// so `:term` never clobbers the front of `:termDescription`.
fn replace_placeholder(sql: &str, name: &str, position: usize) -> (String, bool) {
    let needle = format!(":{name}");
    let replacement = format!("${position}");
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;
    let mut replaced = false;

    while let Some(idx) = rest.find(&needle) {
        let tail = &rest[idx + needle.len()..];
        let at_boundary = !matches!(
            tail.chars().next(),
            Some(c) if c.is_ascii_alphanumeric() || c == '_'
        );

        out.push_str(&rest[..idx]);
        if at_boundary {
            out.push_str(&replacement);
            replaced = true;
        } else {
            out.push_str(&needle);
        }
        rest = tail;
    }

    out.push_str(rest);
    (out, replaced)
}

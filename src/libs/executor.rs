use async_trait::async_trait;
use sqlx::PgPool;

use crate::libs::value::Value;

/// Something that can run a SQL statement against the server.
///
/// Cancellation and timeouts are the implementation's concern.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute `sql`, returning the number of rows affected.
    async fn execute(&self, sql: &str) -> sqlx::Result<u64>;

    /// Execute `sql` with `params` bound to `$1..$n`.
    async fn execute_with(&self, sql: &str, params: &[Value]) -> sqlx::Result<u64>;
}

#[async_trait]
impl Executor for PgPool {
    async fn execute(&self, sql: &str) -> sqlx::Result<u64> {
        let result = sqlx::query(sql).execute(self).await?;
        Ok(result.rows_affected())
    }

    async fn execute_with(&self, sql: &str, params: &[Value]) -> sqlx::Result<u64> {
        let mut query = sqlx::query(sql);
        for v in params {
            query = match v {
                Value::String(s) => query.bind(s.clone()),
                // SMALLINT columns; Postgres has no one-byte integer
                Value::Int8(n) => query.bind(i16::from(*n)),
                Value::Int16(n) => query.bind(*n),
                Value::Int32(n) => query.bind(*n),
                Value::Int64(n) => query.bind(*n),
                Value::Float32(n) => query.bind(*n),
                Value::Float64(n) => query.bind(*n),
                Value::Bool(b) => query.bind(*b),
            };
        }
        let result = query.execute(self).await?;
        Ok(result.rows_affected())
    }
}

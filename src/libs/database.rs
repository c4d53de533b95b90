use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::libs::config::ConnectOptions;
use crate::libs::error::{Error, Result};
use crate::libs::executor::Executor;
use crate::libs::query_builder;
use crate::libs::schema::Table;
use crate::libs::value::{EncodedRow, Row, encode_row};

/// A database session: connection settings, the active connection and the
/// tables registered through it.
///
/// Tables enter the model only after their `CREATE TABLE` succeeded. Inserts
/// and drops never change it.
pub struct Database<C = PgPool> {
    options: ConnectOptions,
    connection: Option<C>,
    tables: RwLock<BTreeMap<String, Table>>,
}

impl<C> Database<C> {
    // -------- Session lifecycle --------

    /// A disconnected session with no tables.
    pub fn new(options: ConnectOptions) -> Self {
        Self {
            options,
            connection: None,
            tables: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Use `connection` for all further statements, replacing any previous one.
    pub fn attach(&mut self, connection: C) {
        self.connection = Some(connection);
    }

    pub async fn table(&self, name: &str) -> Option<Table> {
        self.tables.read().await.get(name).cloned()
    }

    pub async fn table_names(&self) -> Vec<String> {
        self.tables.read().await.keys().cloned().collect()
    }
}

impl Database<PgPool> {
    /// Open a pool to the configured server.
    pub async fn connect(&mut self) -> Result<()> {
        let pool = PgPoolOptions::new()
            .max_connections(self.options.max_connections)
            .acquire_timeout(Duration::from_secs(self.options.connect_timeout_secs))
            .connect(&self.options.connection_url())
            .await
            .map_err(Error::Connect)?;
        info!(
            address = %self.options.address,
            database = %self.options.database,
            "connected"
        );
        self.attach(pool);
        Ok(())
    }
}

impl<C: Executor> Database<C> {
    fn connection(&self) -> Result<&C> {
        self.connection.as_ref().ok_or(Error::NotConnected)
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let conn = self.connection()?;
        debug!(sql = %sql, "executing statement");
        Ok(conn.execute(sql).await?)
    }

    // -------- Create tables --------

    /// Create `table` on the server and record it under `name`, replacing any
    /// earlier definition. On failure the model is left unchanged.
    pub async fn register_table(&self, name: &str, table: Table) -> Result<()> {
        let sql = query_builder::create_table(name, &table);
        self.execute(&sql).await?;
        self.tables.write().await.insert(name.to_string(), table);
        info!(table = %name, "registered table");
        Ok(())
    }

    /// Re-run `CREATE TABLE` for every table in the model.
    ///
    /// Each table is attempted independently; the result lists one outcome
    /// per table in name order.
    pub async fn register_all_tables(&self) -> Vec<(String, Result<()>)> {
        let tables: Vec<(String, Table)> = self
            .tables
            .read()
            .await
            .iter()
            .map(|(name, table)| (name.clone(), table.clone()))
            .collect();

        let mut results = Vec::with_capacity(tables.len());
        for (name, table) in tables {
            let result = self.register_table(&name, table).await;
            if let Err(e) = &result {
                warn!(table = %name, error = %e, "failed to register table");
            }
            results.push((name, result));
        }
        results
    }

    // -------- Drop table --------

    /// Issue `DROP TABLE`. The table stays in the model.
    pub async fn drop_table(&self, name: &str) -> Result<()> {
        self.execute(&query_builder::drop_table(name)).await?;
        Ok(())
    }

    // -------- Insert a record --------

    async fn encode(&self, table: &str, row: &Row) -> Result<EncodedRow> {
        let tables = self.tables.read().await;
        encode_row(&tables, table, row)
    }

    async fn insert_on(&self, conn: &C, table: &str, row: &Row) -> Result<()> {
        let encoded = self.encode(table, row).await?;
        let sql = query_builder::insert(table, &encoded)?;
        debug!(sql = %sql, "executing statement");
        conn.execute(&sql).await?;
        Ok(())
    }

    /// Type-check `row` against `table` and insert it with inlined literals.
    pub async fn insert_row(&self, table: &str, row: Row) -> Result<()> {
        let conn = self.connection()?;
        self.insert_on(conn, table, &row).await
    }

    /// Like [`insert_row`](Self::insert_row), but sends the values as bound
    /// parameters instead of literals.
    pub async fn insert_row_bound(&self, table: &str, row: Row) -> Result<()> {
        let conn = self.connection()?;
        let encoded = self.encode(table, &row).await?;
        let sql = query_builder::insert_bound(table, &encoded)?;
        debug!(sql = %sql, params = encoded.values.len(), "executing statement");
        conn.execute_with(&sql, &encoded.values).await?;
        Ok(())
    }

    /// Insert a serializable record. Each field is converted to the kind of
    /// the column it names.
    ///
    /// # Example
    /// ```no_run
    /// # use pgtable::*;
    /// #[derive(serde::Serialize)]
    /// struct User { id: String, username: String }
    ///
    /// # async fn run(db: &Database) -> pgtable::Result<()> {
    /// db.insert_record("users", &User { id: "1".into(), username: "Ada".into() }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn insert_record<T>(&self, table: &str, item: &T) -> Result<()>
    where
        T: Serialize,
    {
        let conn = self.connection()?;
        let json = serde_json::to_value(item)?;
        let row = {
            let tables = self.tables.read().await;
            let schema = tables
                .get(table)
                .ok_or_else(|| Error::UnknownTable(table.to_string()))?;
            Row::from_json(table, schema, &json)?
        };
        self.insert_on(conn, table, &row).await
    }
}

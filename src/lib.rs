//! # pgtable
//!
//! Describe Postgres tables declaratively, materialize them with
//! `CREATE TABLE IF NOT EXISTS`, and insert rows whose values are
//! type-checked against the declared columns before anything reaches the
//! server.
//!
//! ```rust,no_run
//! use pgtable::*;
//!
//! #[tokio::main]
//! async fn main() -> pgtable::Result<()> {
//!     let mut db: Database = Database::new(ConnectOptions::new("localhost:5432", "test", "admin", "1234"));
//!     db.connect().await?;
//!
//!     let users = Table::new()
//!         .column("id", Column::new(ColumnType::string(255)).primary_key())
//!         .column("username", Column::new(ColumnType::string(255)).not_null().unique());
//!     db.register_table("users", users).await?;
//!
//!     db.insert_row("users", Row::new().with("id", "2n1kj").with("username", "John"))
//!         .await?;
//!     Ok(())
//! }
//! ```

mod libs;

pub use libs::*;

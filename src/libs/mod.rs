pub mod config;
pub mod database;
pub mod error;
pub mod executor;
pub mod query_builder;
pub mod schema;
pub mod value;

// Re-export them for easier access from the crate root
pub use config::*;
pub use database::*;
pub use error::{Error, Result};
pub use executor::*;
pub use schema::*;
pub use value::*;

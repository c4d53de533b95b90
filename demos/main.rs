use pgtable::*;

use serde::Serialize;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
}

fn users_table() -> Table {
    Table::new()
        .column("id", Column::new(ColumnType::string(255)).primary_key())
        .column(
            "username",
            Column::new(ColumnType::string(255)).not_null().unique(),
        )
        .column("password", Column::new(ColumnType::string(255)).not_null())
}

#[tokio::main]
async fn main() -> pgtable::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let options = ConnectOptions::from_env()
        .unwrap_or_else(|_| ConnectOptions::new("localhost:5432", "test", "test_admin", "1234"));
    let mut db: Database = Database::new(options);

    db.connect().await?;
    db.register_table("users", users_table()).await?;

    db.insert_row(
        "users",
        Row::new()
            .with("id", "2n1kj")
            .with("username", "John")
            .with("password", "1234"),
    )
    .await?;

    let ada = User {
        id: Uuid::new_v4().to_string(),
        username: "Ada".into(),
        password: "lovelace".into(),
    };
    db.insert_record("users", &ada).await?;

    if let Some(table) = db.table("users").await {
        for (name, column) in table.columns() {
            println!("{}: {}", name, column);
        }
    }

    for (table, result) in db.register_all_tables().await {
        println!("{} -> {:?}", table, result.map_err(|e| e.to_string()));
    }

    Ok(())
}

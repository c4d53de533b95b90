use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pgtable::*;
use serde::Serialize;

/// Records every statement; fails those containing any registered fragment.
#[derive(Clone, Default)]
struct MockConn {
    statements: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
    fail_on: Arc<Mutex<Vec<String>>>,
}

impl MockConn {
    fn fail_on(&self, fragment: &str) {
        self.fail_on.lock().unwrap().push(fragment.to_string());
    }

    fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .unwrap()
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    fn params(&self) -> Vec<Vec<Value>> {
        self.statements
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn run(&self, sql: &str, params: &[Value]) -> sqlx::Result<u64> {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        if self.fail_on.lock().unwrap().iter().any(|f| sql.contains(f)) {
            return Err(sqlx::Error::Protocol(format!("statement rejected: {sql}")));
        }
        Ok(1)
    }
}

#[async_trait]
impl Executor for MockConn {
    async fn execute(&self, sql: &str) -> sqlx::Result<u64> {
        self.run(sql, &[])
    }

    async fn execute_with(&self, sql: &str, params: &[Value]) -> sqlx::Result<u64> {
        self.run(sql, params)
    }
}

fn options() -> ConnectOptions {
    ConnectOptions::new("localhost:5432", "test", "test_admin", "1234")
}

fn connected() -> (Database<MockConn>, MockConn) {
    let conn = MockConn::default();
    let mut db = Database::new(options());
    db.attach(conn.clone());
    (db, conn)
}

fn users() -> Table {
    Table::new()
        .column("id", Column::new(ColumnType::string(255)).primary_key())
        .column(
            "username",
            Column::new(ColumnType::string(255)).not_null().unique(),
        )
        .column("password", Column::new(ColumnType::string(255)).not_null())
}

fn john() -> Row {
    Row::new()
        .with("id", "2n1kj")
        .with("username", "John")
        .with("password", "1234")
}

#[tokio::test]
async fn test_not_connected() {
    let db: Database<MockConn> = Database::new(options());
    assert!(!db.is_connected());

    let err = db.register_table("users", users()).await.unwrap_err();
    assert!(matches!(err, Error::NotConnected));
    assert!(matches!(db.drop_table("users").await, Err(Error::NotConnected)));
    assert!(matches!(
        db.insert_row("users", john()).await,
        Err(Error::NotConnected)
    ));
    assert!(matches!(
        db.insert_row_bound("users", john()).await,
        Err(Error::NotConnected)
    ));
    assert!(matches!(
        db.insert_record("users", &"not a record").await,
        Err(Error::NotConnected)
    ));
    assert!(db.table_names().await.is_empty());
}

#[tokio::test]
async fn test_insert_record_not_an_object() {
    let (db, conn) = connected();
    db.register_table("users", users()).await.unwrap();

    let err = db.insert_record("users", &vec!["2n1kj", "John"]).await.unwrap_err();

    assert!(matches!(
        &err,
        Error::InvalidRecord { table, found } if table == "users" && found == "array"
    ));
    assert_eq!(
        err.to_string(),
        "record for table users must be an object, got array"
    );
    assert_eq!(conn.statements().len(), 1);
}

#[tokio::test]
async fn test_register_users_table() {
    let (db, conn) = connected();
    assert!(db.is_connected());

    db.register_table("users", users()).await.unwrap();

    assert_eq!(
        conn.statements(),
        ["CREATE TABLE IF NOT EXISTS users (id VARCHAR(255) PRIMARY KEY, \
          username VARCHAR(255) NOT NULL UNIQUE, password VARCHAR(255) NOT NULL);"]
    );
    assert_eq!(db.table("users").await, Some(users()));
}

#[tokio::test]
async fn test_insert_users_row() {
    let (db, conn) = connected();
    db.register_table("users", users()).await.unwrap();

    db.insert_row("users", john()).await.unwrap();

    assert_eq!(
        conn.statements().last().unwrap(),
        "INSERT INTO users (id,username,password) VALUES ('2n1kj','John','1234');"
    );
}

#[tokio::test]
async fn test_insert_escapes_quotes() {
    let (db, conn) = connected();
    db.register_table("users", users()).await.unwrap();

    db.insert_row("users", Row::new().with("username", "O'Brien"))
        .await
        .unwrap();

    assert_eq!(
        conn.statements().last().unwrap(),
        "INSERT INTO users (username) VALUES ('O''Brien');"
    );
}

#[tokio::test]
async fn test_insert_unknown_table_executes_nothing() {
    let (db, conn) = connected();

    let err = db.insert_row("users", john()).await.unwrap_err();

    assert!(matches!(err, Error::UnknownTable(t) if t == "users"));
    assert!(conn.statements().is_empty());
}

#[tokio::test]
async fn test_insert_validation_errors_execute_nothing() {
    let (db, conn) = connected();
    db.register_table("users", users()).await.unwrap();

    let err = db
        .insert_row("users", Row::new().with("email", "a@b.c"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { .. }));

    let err = db
        .insert_row("users", Row::new().with("id", 7i64))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { expected: ColumnKind::String, .. }));

    let err = db.insert_row("users", Row::new()).await.unwrap_err();
    assert!(matches!(err, Error::EmptyInsert(t) if t == "users"));

    assert_eq!(conn.statements().len(), 1);
}

#[tokio::test]
async fn test_insert_execution_error() {
    let (db, conn) = connected();
    db.register_table("users", users()).await.unwrap();
    conn.fail_on("INSERT");

    let err = db.insert_row("users", john()).await.unwrap_err();
    assert!(matches!(err, Error::Execution(_)));
}

#[tokio::test]
async fn test_failed_registration_leaves_model_unchanged() {
    let (db, conn) = connected();
    conn.fail_on("CREATE TABLE IF NOT EXISTS users");

    let err = db.register_table("users", users()).await.unwrap_err();

    assert!(matches!(err, Error::Execution(_)));
    assert_eq!(db.table("users").await, None);
}

#[tokio::test]
async fn test_register_replaces_definition() {
    let (db, _conn) = connected();
    db.register_table("users", users()).await.unwrap();

    let slim = Table::new().column("id", Column::new(ColumnType::string(36)));
    db.register_table("users", slim.clone()).await.unwrap();

    assert_eq!(db.table("users").await, Some(slim));
    assert_eq!(db.table_names().await, ["users"]);
}

#[tokio::test]
async fn test_drop_table_keeps_model() {
    let (db, conn) = connected();
    db.register_table("users", users()).await.unwrap();

    db.drop_table("users").await.unwrap();
    assert_eq!(conn.statements().last().unwrap(), "DROP TABLE users;");
    assert!(db.table("users").await.is_some());

    conn.fail_on("DROP TABLE ghosts");
    let err = db.drop_table("ghosts").await.unwrap_err();
    assert!(matches!(err, Error::Execution(_)));
    assert_eq!(db.table_names().await, ["users"]);
}

#[tokio::test]
async fn test_register_all_tables_reports_each() {
    let (db, conn) = connected();
    let posts = Table::new()
        .column("id", Column::new(ColumnType::new(ColumnKind::Int64, 0)).primary_key())
        .column("body", Column::new(ColumnType::string(1024)));
    db.register_table("users", users()).await.unwrap();
    db.register_table("posts", posts).await.unwrap();

    conn.fail_on("CREATE TABLE IF NOT EXISTS posts");
    let results = db.register_all_tables().await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "posts");
    assert!(matches!(results[0].1, Err(Error::Execution(_))));
    assert_eq!(results[1].0, "users");
    assert!(results[1].1.is_ok());
    assert_eq!(conn.statements().len(), 4);
    assert_eq!(db.table_names().await, ["posts", "users"]);
}

#[tokio::test]
async fn test_insert_row_bound() {
    let (db, conn) = connected();
    db.register_table("users", users()).await.unwrap();

    db.insert_row_bound("users", Row::new().with("id", "x").with("username", "O'Brien"))
        .await
        .unwrap();

    assert_eq!(
        conn.statements().last().unwrap(),
        "INSERT INTO users (id,username) VALUES ($1,$2);"
    );
    assert_eq!(
        conn.params().last().unwrap(),
        &vec![Value::from("x"), Value::from("O'Brien")]
    );
}

#[derive(Serialize)]
struct Reading {
    sensor: String,
    value: f64,
    count: i32,
    ok: bool,
}

#[tokio::test]
async fn test_insert_record() {
    let (db, conn) = connected();
    let readings = Table::new()
        .column("sensor", Column::new(ColumnType::string(32)).not_null())
        .column("value", Column::new(ColumnType::new(ColumnKind::Float64, 0)))
        .column("count", Column::new(ColumnType::new(ColumnKind::Int32, 0)))
        .column("ok", Column::new(ColumnType::new(ColumnKind::Bool, 0)));
    db.register_table("readings", readings).await.unwrap();

    let reading = Reading {
        sensor: "t1".into(),
        value: 0.5,
        count: 3,
        ok: true,
    };
    db.insert_record("readings", &reading).await.unwrap();

    let sql = conn.statements().pop().unwrap();
    let body = sql
        .strip_prefix("INSERT INTO readings (")
        .and_then(|s| s.strip_suffix(");"))
        .unwrap();
    let (cols, vals) = body.split_once(") VALUES (").unwrap();
    let mut pairs: Vec<(&str, &str)> = cols.split(',').zip(vals.split(',')).collect();
    pairs.sort();
    assert_eq!(
        pairs,
        [
            ("count", "3"),
            ("ok", "true"),
            ("sensor", "'t1'"),
            ("value", "5.00000000000000000000e-1"),
        ]
    );
}

#[tokio::test]
async fn test_insert_record_unknown_table() {
    let (db, conn) = connected();
    let reading = Reading {
        sensor: "t1".into(),
        value: 0.5,
        count: 3,
        ok: true,
    };
    let err = db.insert_record("readings", &reading).await.unwrap_err();
    assert!(matches!(err, Error::UnknownTable(_)));
    assert!(conn.statements().is_empty());
}

#[tokio::test]
async fn test_attach_replaces_connection() {
    let (mut db, first) = connected();
    db.register_table("users", users()).await.unwrap();

    let second = MockConn::default();
    db.attach(second.clone());
    db.insert_row("users", john()).await.unwrap();

    assert_eq!(first.statements().len(), 1);
    assert_eq!(second.statements().len(), 1);
}

#[tokio::test]
async fn test_table_from_json_registers() {
    let (db, conn) = connected();
    let table = Table::from_json(
        r#"{"columns": [
            {"name": "id", "type": "string", "size": 255, "primary_key": true},
            {"name": "username", "type": "string", "size": 255, "not_null": true, "unique": true},
            {"name": "password", "type": "string", "size": 255, "not_null": true}
        ]}"#,
    )
    .unwrap();

    db.register_table("users", table).await.unwrap();

    assert_eq!(
        conn.statements(),
        ["CREATE TABLE IF NOT EXISTS users (id VARCHAR(255) PRIMARY KEY, \
          username VARCHAR(255) NOT NULL UNIQUE, password VARCHAR(255) NOT NULL);"]
    );
}

use crate::libs::error::{Error, Result};
use crate::libs::schema::{Column, Table};
use crate::libs::value::EncodedRow;

fn column_definition(name: &str, column: &Column) -> String {
    let mut col_def = format!("{} {}", name, column.column_type.sql());
    let constraints = column.constraints.render();
    if !constraints.is_empty() {
        col_def.push(' ');
        col_def.push_str(&constraints);
    }
    col_def
}

/// `CREATE TABLE IF NOT EXISTS` for `table`, columns in declaration order.
pub fn create_table(name: &str, table: &Table) -> String {
    let cols: Vec<String> = table
        .columns()
        .map(|(col, column)| column_definition(col, column))
        .collect();
    format!("CREATE TABLE IF NOT EXISTS {} ({});", name, cols.join(", "))
}

pub fn drop_table(name: &str) -> String {
    format!("DROP TABLE {};", name)
}

/// `INSERT` with the values inlined as literals.
pub fn insert(table: &str, row: &EncodedRow) -> Result<String> {
    if row.is_empty() {
        return Err(Error::EmptyInsert(table.to_string()));
    }
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table,
        row.columns.join(","),
        row.literals().join(",")
    ))
}

fn placeholders(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("${}", i)).collect()
}

/// `INSERT` with `$1..$n` placeholders; values are bound at execution.
pub fn insert_bound(table: &str, row: &EncodedRow) -> Result<String> {
    if row.is_empty() {
        return Err(Error::EmptyInsert(table.to_string()));
    }
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table,
        row.columns.join(","),
        placeholders(row.columns.len()).join(",")
    ))
}

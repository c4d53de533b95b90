use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::libs::error::{Error, Result};

/// The kind of value a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    String,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
}

impl ColumnKind {
    /// Postgres type keyword for this kind.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::String => "VARCHAR",
            ColumnKind::Int8 | ColumnKind::Int16 => "SMALLINT",
            ColumnKind::Int32 => "INTEGER",
            ColumnKind::Int64 => "BIGINT",
            ColumnKind::Float32 => "FLOAT4",
            ColumnKind::Float64 => "FLOAT8",
            ColumnKind::Bool => "BOOLEAN",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ColumnKind::String => "string",
            ColumnKind::Int8 => "int8",
            ColumnKind::Int16 => "int16",
            ColumnKind::Int32 => "int32",
            ColumnKind::Int64 => "int64",
            ColumnKind::Float32 => "float32",
            ColumnKind::Float64 => "float64",
            ColumnKind::Bool => "bool",
        }
    }
}

impl FromStr for ColumnKind {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "string" => Ok(ColumnKind::String),
            "int8" => Ok(ColumnKind::Int8),
            "int16" => Ok(ColumnKind::Int16),
            "int32" => Ok(ColumnKind::Int32),
            "int64" | "int" => Ok(ColumnKind::Int64),
            "float32" => Ok(ColumnKind::Float32),
            "float64" => Ok(ColumnKind::Float64),
            "bool" => Ok(ColumnKind::Bool),
            other => Err(Error::UnsupportedType(other.to_string())),
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Map a textual type tag straight to its Postgres keyword.
pub fn map_type(tag: &str) -> Result<&'static str> {
    tag.parse::<ColumnKind>().map(ColumnKind::sql_type)
}

/// Column kind plus declared size. A size of 0 renders no `(size)` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnType {
    pub kind: ColumnKind,
    pub size: u32,
}

impl ColumnType {
    pub fn new(kind: ColumnKind, size: u32) -> Self {
        Self { kind, size }
    }

    pub fn string(size: u32) -> Self {
        Self::new(ColumnKind::String, size)
    }

    /// Rendered type, e.g. `VARCHAR(255)` or `BIGINT`.
    pub fn sql(&self) -> String {
        if self.size > 0 {
            format!("{}({})", self.kind.sql_type(), self.size)
        } else {
            self.kind.sql_type().to_string()
        }
    }
}

/// A single column-level constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    NotNull,
    Check,
    ForeignKey,
    Unique,
    PrimaryKey,
}

impl Constraint {
    /// Rendering order of the constraint clause.
    pub const ORDER: [Constraint; 5] = [
        Constraint::NotNull,
        Constraint::Check,
        Constraint::ForeignKey,
        Constraint::Unique,
        Constraint::PrimaryKey,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Constraint::NotNull => "NOT NULL",
            Constraint::Check => "CHECK",
            Constraint::ForeignKey => "FOREIGN KEY",
            Constraint::Unique => "UNIQUE",
            Constraint::PrimaryKey => "PRIMARY KEY",
        }
    }
}

/// Independent constraint flags. Any combination is accepted here; the server
/// decides what it rejects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnConstraints {
    pub not_null: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub check: bool,
    pub foreign_key: bool,
}

impl ColumnConstraints {
    pub fn has(&self, constraint: Constraint) -> bool {
        match constraint {
            Constraint::NotNull => self.not_null,
            Constraint::Check => self.check,
            Constraint::ForeignKey => self.foreign_key,
            Constraint::Unique => self.unique,
            Constraint::PrimaryKey => self.primary_key,
        }
    }

    /// Space-joined keywords of the active flags, empty when none are set.
    pub fn render(&self) -> String {
        Constraint::ORDER
            .iter()
            .filter(|c| self.has(**c))
            .map(|c| c.keyword())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub column_type: ColumnType,
    pub constraints: ColumnConstraints,
}

impl Column {
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            constraints: ColumnConstraints::default(),
        }
    }

    pub fn with_constraints(column_type: ColumnType, constraints: ColumnConstraints) -> Self {
        Self {
            column_type,
            constraints,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.column_type.kind
    }

    pub fn not_null(mut self) -> Self {
        self.constraints.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.constraints.unique = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.constraints.primary_key = true;
        self
    }

    pub fn check(mut self) -> Self {
        self.constraints.check = true;
        self
    }

    pub fn foreign_key(mut self) -> Self {
        self.constraints.foreign_key = true;
        self
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Column of type {} and size {}",
            self.column_type.kind, self.column_type.size
        )
    }
}

/// Columns of a table, unique by name, kept in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<(String, Column)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.insert_column(name, column);
        self
    }

    /// Add a column. Redefining an existing name replaces it in place.
    pub fn insert_column(&mut self, name: impl Into<String>, column: Column) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = column,
            None => self.columns.push((name, column)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Parse a table definition such as
    /// `{"columns": [{"name": "id", "type": "string", "size": 255, "primary_key": true}]}`.
    ///
    /// Unknown type tags fail with [`Error::UnsupportedType`].
    pub fn from_json(json: &str) -> Result<Self> {
        let def: TableDef = serde_json::from_str(json)?;
        let mut table = Table::new();
        for col in def.columns {
            let kind = col.r#type.parse::<ColumnKind>()?;
            table.insert_column(
                col.name,
                Column::with_constraints(ColumnType::new(kind, col.size), col.constraints),
            );
        }
        Ok(table)
    }
}

#[derive(Deserialize)]
struct TableDef {
    columns: Vec<ColumnDef>,
}

#[derive(Deserialize)]
struct ColumnDef {
    name: String,
    r#type: String,
    #[serde(default)]
    size: u32,
    #[serde(flatten)]
    constraints: ColumnConstraints,
}

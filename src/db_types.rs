// =====================================================
// COMMON TYPES AND STRUCTURES
// =====================================================

use crate::error::CopyError;
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// --- Generation Mode ---
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationMode {
    Insert,
    Update,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Insert => "INSERT",
            GenerationMode::Update => "UPDATE",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = CopyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INSERT" => Ok(GenerationMode::Insert),
            "UPDATE" => Ok(GenerationMode::Update),
            other => Err(CopyError::InvalidArguments(format!(
                "Invalid generation type: {}. Requires either INSERT or UPDATE",
                other
            ))),
        }
    }
}

// --- Scanned Values ---

/// A single column value as read from the cursor, before literal formatting.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Bytes(Vec<u8>),
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<FixedOffset>),
    /// A driver type with no dedicated mapping; `rendered` is its raw text form.
    Other { type_name: String, rendered: String },
}

/// Raised while formatting a value whose type has no literal rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueWarning {
    pub column: String,
    pub type_name: String,
}

// --- Rows ---

/// Column name to literal text. Column order lives in the column name list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    pub literals: HashMap<String, String>,
    pub warnings: Vec<ValueWarning>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.literals.get(column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

// --- Copy Request ---
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyRequest {
    pub mode: GenerationMode,
    pub table: String,
    pub where_clause: Option<String>,
    /// Required for `GenerationMode::Update`, ignored otherwise.
    pub id_column: Option<String>,
}

// --- Connection Configuration ---

/// Explicit overrides; anything left `None` falls back to the PG* environment.
#[derive(Clone, Debug, Default)]
pub struct ConnectionConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub ssl_mode: Option<String>,
}

//! Stream event types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::categories;
use crate::error::{InvalidatorError, InvalidatorResult};

/// A single column value from a primary-key tuple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Int(_) => "int",
            SqlValue::UInt(_) => "uint",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Bytes(_) => "bytes",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Int(v) => write!(f, "{v}"),
            SqlValue::UInt(v) => write!(f, "{v}"),
            SqlValue::Float(v) => write!(f, "{v}"),
            SqlValue::Text(v) => write!(f, "'{v}'"),
            SqlValue::Bytes(v) => write!(f, "x'{}'", v.iter().map(|b| format!("{b:02x}")).collect::<String>()),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<u64> for SqlValue {
    fn from(value: u64) -> Self {
        SqlValue::UInt(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

/// Primary-key column values of one affected row, in key-column order
pub type PkTuple = Vec<SqlValue>;

/// One unit of change as produced by the stream transport.
///
/// Which fields are meaningful depends on `category`: `sql` for DDL and ERR,
/// `table_name` and `primary_key_values` for DML, `transaction_id` for POS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamEvent {
    pub category: String,
    pub table_name: String,
    pub primary_key_values: Vec<PkTuple>,
    pub sql: String,
    pub transaction_id: String,
    /// Producer-side wall time, unix seconds
    pub timestamp: i64,
}

impl StreamEvent {
    pub fn ddl(sql: impl Into<String>, timestamp: i64) -> Self {
        Self {
            category: categories::DDL.to_string(),
            sql: sql.into(),
            timestamp,
            ..Self::default()
        }
    }

    pub fn dml(table_name: impl Into<String>, primary_key_values: Vec<PkTuple>, timestamp: i64) -> Self {
        Self {
            category: categories::DML.to_string(),
            table_name: table_name.into(),
            primary_key_values,
            timestamp,
            ..Self::default()
        }
    }

    pub fn unrecognized(sql: impl Into<String>, timestamp: i64) -> Self {
        Self {
            category: categories::ERR.to_string(),
            sql: sql.into(),
            timestamp,
            ..Self::default()
        }
    }

    pub fn position(transaction_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            category: categories::POS.to_string(),
            transaction_id: transaction_id.into(),
            timestamp,
            ..Self::default()
        }
    }

    /// Decode a JSON-encoded event as produced by JSON-speaking transports
    pub fn from_json(payload: &str) -> InvalidatorResult<Self> {
        serde_json::from_str(payload)
            .map_err(|e| InvalidatorError::bad_input(format!("malformed stream event: {e}")))
    }

    /// Decode the category into the closed variant the dispatcher matches on
    pub fn change(&self) -> ChangeEvent<'_> {
        match self.category.as_str() {
            categories::DDL => ChangeEvent::Ddl { sql: &self.sql },
            categories::DML => ChangeEvent::Dml {
                table_name: &self.table_name,
                primary_keys: &self.primary_key_values,
            },
            categories::ERR => ChangeEvent::Unrecognized { sql: &self.sql },
            categories::POS => ChangeEvent::Position {
                transaction_id: &self.transaction_id,
            },
            other => ChangeEvent::Unknown { category: other },
        }
    }
}

/// Borrowed view of a [`StreamEvent`] by category
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChangeEvent<'a> {
    Ddl {
        sql: &'a str,
    },
    Dml {
        table_name: &'a str,
        primary_keys: &'a [PkTuple],
    },
    /// Statement the transport flagged as one it could not decode
    Unrecognized {
        sql: &'a str,
    },
    Position {
        transaction_id: &'a str,
    },
    Unknown {
        category: &'a str,
    },
}

impl ChangeEvent<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            ChangeEvent::Ddl { .. } => "ddl",
            ChangeEvent::Dml { .. } => "dml",
            ChangeEvent::Unrecognized { .. } => "unrecognized",
            ChangeEvent::Position { .. } => "position",
            ChangeEvent::Unknown { .. } => "unknown",
        }
    }
}

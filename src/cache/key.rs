//! Canonical row cache keys.
//!
//! A key is the table's primary-key values, each encoded by its column kind and
//! joined with `.`. Integers are written in decimal. Floats are written in
//! decimal and then percent-escaped along with text and bytes, so a component
//! can never contain a separator. The same
//! tuple always yields the same key, which is what makes delete-by-key correct.

use std::fmt;
use thiserror::Error;

use crate::events::SqlValue;
use crate::schema::{ColumnKind, PkColumn};

const SEPARATOR: char = '.';

/// Why a primary-key tuple could not be turned into a key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("expected {expected} primary key values, got {actual}")]
    Arity { expected: usize, actual: usize },

    #[error("column {column} expects {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: ColumnKind,
        actual: &'static str,
    },

    /// Rows with a NULL key component are never cached
    #[error("column {column} is NULL")]
    NullValue { column: String },
}

impl KeyError {
    /// Mismatches indicate a schema/stream disagreement; NULLs do not
    pub fn is_mismatch(&self) -> bool {
        !matches!(self, KeyError::NullValue { .. })
    }
}

/// Key of one cached row within its table's partition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Validate `tuple` against the table's key columns and encode it
    pub fn build(columns: &[PkColumn], tuple: &[SqlValue]) -> Result<Self, KeyError> {
        if columns.len() != tuple.len() {
            return Err(KeyError::Arity {
                expected: columns.len(),
                actual: tuple.len(),
            });
        }

        let mut key = String::new();
        for (i, (column, value)) in columns.iter().zip(tuple).enumerate() {
            if i > 0 {
                key.push(SEPARATOR);
            }
            encode_component(&mut key, column, value)?;
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn encode_component(out: &mut String, column: &PkColumn, value: &SqlValue) -> Result<(), KeyError> {
    let mismatch = || KeyError::TypeMismatch {
        column: column.name.clone(),
        expected: column.kind,
        actual: value.type_name(),
    };

    match (column.kind, value) {
        (_, SqlValue::Null) => {
            return Err(KeyError::NullValue {
                column: column.name.clone(),
            })
        }
        (ColumnKind::Integer, SqlValue::Int(v)) => out.push_str(&v.to_string()),
        (ColumnKind::Integer, SqlValue::UInt(v)) => {
            let v = i64::try_from(*v).map_err(|_| mismatch())?;
            out.push_str(&v.to_string());
        }
        (ColumnKind::Unsigned, SqlValue::UInt(v)) => out.push_str(&v.to_string()),
        (ColumnKind::Unsigned, SqlValue::Int(v)) => {
            let v = u64::try_from(*v).map_err(|_| mismatch())?;
            out.push_str(&v.to_string());
        }
        (ColumnKind::Float, SqlValue::Float(v)) => escape_float(out, *v),
        (ColumnKind::Float, SqlValue::Int(v)) => escape_float(out, *v as f64),
        (ColumnKind::Float, SqlValue::UInt(v)) => escape_float(out, *v as f64),
        (ColumnKind::Text | ColumnKind::Binary, SqlValue::Text(v)) => escape_into(out, v.as_bytes()),
        (ColumnKind::Text | ColumnKind::Binary, SqlValue::Bytes(v)) => escape_into(out, v),
        _ => return Err(mismatch()),
    }
    Ok(())
}

fn escape_float(out: &mut String, v: f64) {
    // -0.0 == 0.0 in SQL, so both must hit the same row
    let v = if v == 0.0 { 0.0 } else { v };
    escape_into(out, v.to_string().as_bytes());
}

fn escape_into(out: &mut String, bytes: &[u8]) {
    for &b in bytes {
        if b == b'%' || b == SEPARATOR as u8 || !(0x21..=0x7e).contains(&b) {
            out.push_str(&format!("%{b:02X}"));
        } else {
            out.push(char::from(b));
        }
    }
}

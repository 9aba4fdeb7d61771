//! # SQL Table Extraction
//!
//! Keyword-based parsers that pull the affected table out of replicated
//! statements. They do not validate SQL; they only need to find which table a
//! DDL statement or an unclassified DML statement touches.

use thiserror::Error;

pub mod ddl;
pub(crate) mod lexer;
pub mod statement;

pub use ddl::{DdlAction, DdlPlan, KeywordDdlParser};
pub use statement::{KeywordStatementParser, Statement, TableRef};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty statement")]
    Empty,

    #[error("unterminated quote starting at {position}")]
    UnterminatedQuote { position: usize },

    #[error("unterminated comment starting at {position}")]
    UnterminatedComment { position: usize },

    #[error("{statement} statement has no table name")]
    MissingTable { statement: &'static str },

    #[error("unexpected token: {found}")]
    UnexpectedToken { found: String },
}

/// Turns a DDL statement into a drop/create plan
pub trait DdlParser: Send + Sync + std::fmt::Debug {
    fn parse(&self, sql: &str) -> DdlPlan;
}

/// Classifies a statement the transport could not classify itself
pub trait StatementParser: Send + Sync + std::fmt::Debug {
    fn parse(&self, sql: &str) -> Result<Statement, ParseError>;
}

//! Collaborators shared by the dispatcher, the handlers and the supervisor.

use std::sync::Arc;

use crate::cache::RowCacheStore;
use crate::config::InvalidatorConfig;
use crate::metrics::InvalidatorMetrics;
use crate::parser::{DdlParser, KeywordDdlParser, KeywordStatementParser, StatementParser};
use crate::position::PositionTracker;
use crate::schema::SchemaStore;

/// Everything the invalidator needs from its host
#[derive(Debug, Clone)]
pub struct InvalidatorContext {
    pub config: Arc<InvalidatorConfig>,
    pub schema: Arc<dyn SchemaStore>,
    pub cache_store: Arc<dyn RowCacheStore>,
    pub ddl_parser: Arc<dyn DdlParser>,
    pub statement_parser: Arc<dyn StatementParser>,
    pub metrics: Arc<InvalidatorMetrics>,
    pub position: Arc<PositionTracker>,
}

impl InvalidatorContext {
    /// Context with the keyword parsers, fresh metrics and an empty position
    pub fn new(
        config: InvalidatorConfig,
        schema: Arc<dyn SchemaStore>,
        cache_store: Arc<dyn RowCacheStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            schema,
            cache_store,
            ddl_parser: Arc::new(KeywordDdlParser::new()),
            statement_parser: Arc::new(KeywordStatementParser::new()),
            metrics: Arc::new(InvalidatorMetrics::new()),
            position: Arc::new(PositionTracker::default()),
        }
    }

    pub fn with_ddl_parser(mut self, parser: Arc<dyn DdlParser>) -> Self {
        self.ddl_parser = parser;
        self
    }

    pub fn with_statement_parser(mut self, parser: Arc<dyn StatementParser>) -> Self {
        self.statement_parser = parser;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<InvalidatorMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn db_name(&self) -> &str {
        &self.config.db_name
    }
}

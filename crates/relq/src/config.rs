//! Serializable builder configuration.

use crate::builder::QueryBuilder;
use crate::clause::TableRef;
use crate::dialect::{Dialect, MySqlDialect, PostgresDialect};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which SQL dialect compiles the statements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Postgres,
    Mysql,
}

/// Settings shared by every builder created from it.
///
/// ```ignore
/// let config: RelqConfig = serde_json::from_str(r#"{"dialect":"mysql","table_prefix":"wp_"}"#)?;
/// let mut posts = config.table("posts");
/// posts.where_eq("status", "publish");
/// assert_eq!(posts.to_sql(), "SELECT * FROM wp_posts WHERE status = ?");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelqConfig {
    pub dialect: DialectKind,
    /// Prepended to every table name.
    pub table_prefix: String,
    /// Column `last()` orders by when none is given.
    pub primary_key: String,
}

impl Default for RelqConfig {
    fn default() -> Self {
        Self {
            dialect: DialectKind::Postgres,
            table_prefix: String::new(),
            primary_key: "id".to_string(),
        }
    }
}

impl RelqConfig {
    pub fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Build the configured dialect.
    pub fn dialect(&self) -> Arc<dyn Dialect> {
        match self.dialect {
            DialectKind::Postgres => Arc::new(PostgresDialect::with_prefix(&self.table_prefix)),
            DialectKind::Mysql => Arc::new(MySqlDialect::with_prefix(&self.table_prefix)),
        }
    }

    /// A SELECT builder on `table` using this configuration.
    pub fn table(&self, table: impl Into<TableRef>) -> QueryBuilder {
        let mut qb = QueryBuilder::new(self.dialect(), table);
        qb.primary_key(&self.primary_key);
        qb
    }
}

use super::Dialect;

/// PostgreSQL: numbered `$n` placeholders and `"double quoted"` identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostgresDialect {
    prefix: String,
}

impl PostgresDialect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `prefix` to every table name.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn quote_char(&self) -> char {
        '"'
    }

    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    fn random_order(&self) -> &'static str {
        "RANDOM()"
    }
}

use super::Dialect;
use crate::clause::Lock;

/// MySQL: positional `?` placeholders and `` `backtick` `` identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MySqlDialect {
    prefix: String,
}

impl MySqlDialect {
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

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    fn random_order(&self) -> &'static str {
        "RAND()"
    }

    fn lock(&self, lock: &Lock) -> String {
        match lock {
            Lock::ForUpdate => "FOR UPDATE".to_string(),
            Lock::ForShare => "LOCK IN SHARE MODE".to_string(),
            Lock::Raw(text) => text.clone(),
        }
    }

    fn date_date(&self, field: &str) -> String {
        format!("DATE({field})")
    }

    fn date_day(&self, field: &str) -> String {
        format!("DAY({field})")
    }

    fn date_month(&self, field: &str) -> String {
        format!("MONTH({field})")
    }

    fn date_year(&self, field: &str) -> String {
        format!("YEAR({field})")
    }
}

//! Fluent query builder.
//!
//! A [`QueryBuilder`] owns one [`ClauseTree`] and the [`Dialect`] that will
//! compile it. Every fluent method mutates the tree in place and returns
//! `&mut Self`; methods that validate their input return
//! `RelqResult<&mut Self>` and leave the tree untouched when they fail.
//!
//! # Usage
//!
//! ```ignore
//! use relq::QueryBuilder;
//!
//! let mut qb = QueryBuilder::postgres("users");
//! qb.select(["id", "name"])
//!     .where_eq("status", "active")
//!     .or_where_op("age", ">", 65)
//!     .order_by_desc("created_at")
//!     .limit(20);
//!
//! let compiled = qb.compile();
//! assert_eq!(
//!     compiled.query,
//!     "SELECT id, name FROM users WHERE status = $1 OR age > $2 ORDER BY created_at DESC LIMIT $3"
//! );
//! ```

mod filter;
mod select;
mod write;


use crate::bound::Bound;
use crate::clause::{ClauseTree, Source, TableRef};
use crate::dialect::{Dialect, MySqlDialect, PostgresDialect};
use crate::value::Value;
use std::sync::Arc;

/// An ordered field → value list, as accepted by `insert` and `update`.
pub type Fields = Vec<(String, Value)>;

/// Output of [`QueryBuilder::compile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub query: String,
    /// Values in placeholder order; `bound[i]` fills placeholder `i + 1`.
    pub bound: Vec<Value>,
}

/// Builder for a single SQL statement.
#[derive(Clone, Debug)]
pub struct QueryBuilder {
    dialect: Arc<dyn Dialect>,
    tree: ClauseTree,
    primary_key: String,
    tag: Option<String>,
}

impl QueryBuilder {
    /// Create a SELECT builder on `table` compiled by `dialect`.
    pub fn new(dialect: Arc<dyn Dialect>, table: impl Into<TableRef>) -> Self {
        Self {
            dialect,
            tree: ClauseTree::new(Source::Table(table.into())),
            primary_key: "id".to_string(),
            tag: None,
        }
    }

    /// Builder on `table` using [`PostgresDialect`].
    pub fn postgres(table: impl Into<TableRef>) -> Self {
        Self::new(Arc::new(PostgresDialect::new()), table)
    }

    /// Builder on `table` using [`MySqlDialect`].
    pub fn mysql(table: impl Into<TableRef>) -> Self {
        Self::new(Arc::new(MySqlDialect::new()), table)
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// The clause tree accumulated so far.
    pub fn tree(&self) -> &ClauseTree {
        &self.tree
    }

    /// Replace the statement's table.
    pub fn from(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.tree.source = Source::Table(table.into());
        self
    }

    /// Use `text` verbatim as the FROM target.
    pub fn from_raw(&mut self, text: impl Into<String>) -> &mut Self {
        self.tree.source = Source::Raw(text.into());
        self
    }

    /// Column used by [`last`](Self::last) when no field is given. Defaults to `id`.
    pub fn primary_key(&mut self, column: impl Into<String>) -> &mut Self {
        self.primary_key = column.into();
        self
    }

    pub fn primary_key_name(&self) -> &str {
        &self.primary_key
    }

    /// Attach a tag forwarded to the connection with every statement.
    pub fn tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn tag_name(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Apply `f` only when `condition` holds.
    pub fn when<F>(&mut self, condition: bool, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        if condition {
            f(self);
        }
        self
    }

    /// Apply exactly one of `on_true` / `on_false`.
    pub fn when_else<T, F>(&mut self, condition: bool, on_true: T, on_false: F) -> &mut Self
    where
        T: FnOnce(&mut Self),
        F: FnOnce(&mut Self),
    {
        if condition {
            on_true(self);
        } else {
            on_false(self);
        }
        self
    }

    // ==================== Compile ====================

    /// Compile the statement. Never mutates the builder.
    pub fn compile(&self) -> Compiled {
        let mut bound = Bound::new();
        let query = self.dialect.compile(&self.tree, &mut bound);
        Compiled {
            query,
            bound: bound.into_values(),
        }
    }

    /// The values `compile().bound` would produce.
    pub fn bound_arguments(&self) -> Vec<Value> {
        self.compile().bound
    }

    /// Render the SQL text only.
    pub fn to_sql(&self) -> String {
        self.compile().query
    }

    pub(crate) fn tree_mut(&mut self) -> &mut ClauseTree {
        &mut self.tree
    }
}

/// Collect `(field, value)` pairs, rejecting repeated fields.
fn collect_fields<I, K, V>(pairs: I) -> crate::RelqResult<Fields>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    let mut fields: Fields = Vec::new();
    for (key, value) in pairs {
        let key = key.into();
        if fields.iter().any(|(existing, _)| *existing == key) {
            return Err(crate::RelqError::validation(format!(
                "field '{key}' given more than once"
            )));
        }
        fields.push((key, value.into()));
    }
    Ok(fields)
}

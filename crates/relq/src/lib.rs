//! # relq
//!
//! A relational query builder that compiles to parameterized SQL for more than
//! one dialect, with a lazy execution layer on top.
//!
//! ## Features
//!
//! - **One clause tree, many dialects**: the same builder compiles to `$n`
//!   placeholders for Postgres or `?` for MySQL
//! - **Deterministic numbering**: clauses are always rendered in the same
//!   order, so placeholder numbers never depend on call order
//! - **Raw escape hatches**: `{0}`-style markers in raw fragments are filled
//!   with properly numbered placeholders
//! - **Lazy paging**: `chunk` and `iterate` fetch one round trip at a time
//! - **Query monitoring**: timing, hooks and timeouts through `monitor`
//!
//! ## Query Builder
//!
//! ```ignore
//! use relq::{JoinOn, QueryBuilder, fields};
//!
//! // SELECT
//! let mut qb = QueryBuilder::postgres("users");
//! qb.left_join("posts", JoinOn::columns("id", "user_id"))
//!     .where_eq("users.status", "active")
//!     .where_in("users.role", ["admin", "editor"])
//!     .order_by_desc("users.created_at")
//!     .limit(10);
//! let users = qb.get(&client).await?;
//!
//! // INSERT
//! QueryBuilder::postgres("users")
//!     .insert([fields! { "name" => "alice", "email" => "alice@example.com" }])?
//!     .execute(&client)
//!     .await?;
//!
//! // UPDATE
//! QueryBuilder::postgres("users")
//!     .where_eq("id", user_id)
//!     .update(fields! { "status" => "inactive" })?
//!     .execute(&client)
//!     .await?;
//! ```

pub mod bound;
pub mod builder;
pub mod clause;
pub mod collection;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod monitor;
pub mod prelude;
pub mod record;
pub mod signature;
pub mod value;

mod exec;
mod stream;

#[cfg(feature = "postgres")]
pub mod pg;

pub use bound::Bound;
pub use builder::{Compiled, Fields, QueryBuilder};
pub use clause::{ClauseTree, JoinOn, TableRef};
pub use collection::Collection;
pub use config::{DialectKind, RelqConfig};
pub use connection::{Connection, RawRow};
pub use dialect::{Dialect, MySqlDialect, PostgresDialect};
pub use error::{RelqError, RelqResult};
pub use monitor::{
    CompositeHook, CompositeMonitor, HookAction, InstrumentedConnection, MonitorConfig,
    NoopMonitor, QueryContext, QueryHook, QueryMonitor, QueryResult, QueryStats, QueryType,
    StatsMonitor,
};
pub use record::Record;
pub use value::{FromValue, Value};

#[cfg(feature = "tracing")]
pub use monitor::TracingSqlHook;

/// Build an ordered [`Fields`] list for `insert` and `update`.
///
/// ```ignore
/// let row = relq::fields! { "name" => "alice", "age" => 30, "email" => None::<String> };
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        vec![$((::std::string::String::from($key), $crate::Value::from($value))),+]
    };
}

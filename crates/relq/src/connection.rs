//! The connection seam.
//!
//! relq never talks to a database directly. Compiled statements are handed to
//! a [`Connection`], which returns raw rows. The `postgres` feature provides
//! implementations for `tokio_postgres::Client` and `Transaction`; tests use
//! in-memory doubles.

use crate::error::RelqResult;
use crate::value::Value;
use std::future::Future;

/// One result row as returned by a connection: ordered `(column, value)` pairs.
pub type RawRow = Vec<(String, Value)>;

/// Anything that can run compiled SQL.
pub trait Connection: Send + Sync {
    /// Run `sql` with `bound` and return every row.
    ///
    /// Zero rows is `Ok(vec![])`; failures of any kind are `Err`.
    fn send(
        &self,
        sql: &str,
        bound: &[Value],
    ) -> impl Future<Output = RelqResult<Vec<RawRow>>> + Send;

    /// Run `sql`, associating a tag for monitoring/observability.
    ///
    /// The default implementation ignores `tag` and calls [`Connection::send`].
    fn send_tagged(
        &self,
        tag: &str,
        sql: &str,
        bound: &[Value],
    ) -> impl Future<Output = RelqResult<Vec<RawRow>>> + Send {
        let _ = tag;
        self.send(sql, bound)
    }

    /// Run a statement and return the number of affected rows.
    ///
    /// The default implementation reports the number of returned rows.
    fn execute(&self, sql: &str, bound: &[Value]) -> impl Future<Output = RelqResult<u64>> + Send {
        async move {
            let rows = self.send(sql, bound).await?;
            Ok(rows.len() as u64)
        }
    }

    /// [`Connection::execute`] with a tag. The default ignores `tag`.
    fn execute_tagged(
        &self,
        tag: &str,
        sql: &str,
        bound: &[Value],
    ) -> impl Future<Output = RelqResult<u64>> + Send {
        let _ = tag;
        self.execute(sql, bound)
    }
}

impl<C: Connection> Connection for &C {
    fn send(
        &self,
        sql: &str,
        bound: &[Value],
    ) -> impl Future<Output = RelqResult<Vec<RawRow>>> + Send {
        (**self).send(sql, bound)
    }

    fn send_tagged(
        &self,
        tag: &str,
        sql: &str,
        bound: &[Value],
    ) -> impl Future<Output = RelqResult<Vec<RawRow>>> + Send {
        (**self).send_tagged(tag, sql, bound)
    }

    fn execute(&self, sql: &str, bound: &[Value]) -> impl Future<Output = RelqResult<u64>> + Send {
        (**self).execute(sql, bound)
    }

    fn execute_tagged(
        &self,
        tag: &str,
        sql: &str,
        bound: &[Value],
    ) -> impl Future<Output = RelqResult<u64>> + Send {
        (**self).execute_tagged(tag, sql, bound)
    }
}

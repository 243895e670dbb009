//! One-shot execution of compiled statements.
//!
//! Every fetch method works on a copy of the builder forced into a SELECT, so
//! the caller's builder is never changed by executing it.

use crate::builder::{Compiled, QueryBuilder};
use crate::clause::{Column, Order, Statement};
use crate::collection::Collection;
use crate::connection::{Connection, RawRow};
use crate::error::{RelqError, RelqResult};
use crate::record::Record;
use crate::value::Value;

impl QueryBuilder {
    /// A copy of this builder compiled as a SELECT.
    pub(crate) fn select_copy(&self) -> QueryBuilder {
        let mut qb = self.clone();
        qb.tree_mut().statement = Statement::Select;
        qb
    }

    pub(crate) async fn send_compiled<C: Connection>(
        &self,
        conn: &C,
        compiled: &Compiled,
    ) -> RelqResult<Vec<RawRow>> {
        match self.tag_name() {
            Some(tag) => conn.send_tagged(tag, &compiled.query, &compiled.bound).await,
            None => conn.send(&compiled.query, &compiled.bound).await,
        }
    }

    pub(crate) async fn fetch_records<C: Connection>(
        &self,
        conn: &C,
    ) -> RelqResult<Collection<Record>> {
        let compiled = self.compile();
        let rows = self.send_compiled(conn, &compiled).await?;
        Ok(rows.into_iter().map(Record::new).collect())
    }

    // ==================== Fetch ====================

    /// Run the SELECT and return every row.
    pub async fn get<C: Connection>(&self, conn: &C) -> RelqResult<Collection<Record>> {
        self.select_copy().fetch_records(conn).await
    }

    /// First row, with `LIMIT 1` applied.
    pub async fn first<C: Connection>(&self, conn: &C) -> RelqResult<Option<Record>> {
        let mut qb = self.select_copy();
        qb.limit(1);
        let rows = qb.fetch_records(conn).await?;
        Ok(rows.into_iter().next())
    }

    /// Like [`first`](Self::first), but a missing row is [`RelqError::NotFound`].
    pub async fn first_or_fail<C: Connection>(&self, conn: &C) -> RelqResult<Record> {
        self.first(conn)
            .await?
            .ok_or_else(|| RelqError::not_found("Expected one row, got none"))
    }

    /// Last row by `field` (or the primary key), descending with `LIMIT 1`.
    ///
    /// Existing ORDER BY entries are replaced.
    pub async fn last<C: Connection>(
        &self,
        conn: &C,
        field: Option<&str>,
    ) -> RelqResult<Option<Record>> {
        let mut qb = self.select_copy();
        let field = field.unwrap_or(self.primary_key_name()).to_string();
        qb.tree_mut().orders = vec![Order::Field {
            field,
            ascending: false,
        }];
        qb.limit(1);
        let rows = qb.fetch_records(conn).await?;
        Ok(rows.into_iter().next())
    }

    /// Values of a single column, in row order.
    pub async fn pluck<C: Connection>(
        &self,
        conn: &C,
        field: &str,
    ) -> RelqResult<Collection<Value>> {
        let mut qb = self.select_copy();
        qb.tree_mut().columns = vec![Column::Simple {
            name: field.to_string(),
            alias: None,
        }];
        let rows = qb.fetch_records(conn).await?;
        Ok(rows
            .into_iter()
            .map(|record| record.into_inner().into_iter().next().map_or(Value::Null, |(_, v)| v))
            .collect())
    }

    /// Single-attribute records keyed by `alias`, selected as `field AS alias`.
    pub async fn pluck_as<C: Connection>(
        &self,
        conn: &C,
        field: &str,
        alias: &str,
    ) -> RelqResult<Collection<Record>> {
        let mut qb = self.select_copy();
        qb.tree_mut().columns = vec![Column::Simple {
            name: field.to_string(),
            alias: Some(alias.to_string()),
        }];
        let rows = qb.fetch_records(conn).await?;
        Ok(rows
            .into_iter()
            .map(|record| {
                let value = record.into_inner().into_iter().next().map_or(Value::Null, |(_, v)| v);
                Record::new(vec![(alias.to_string(), value)])
            })
            .collect())
    }

    /// `field` of the first row, or `None` if there is no row.
    pub async fn value<C: Connection>(&self, conn: &C, field: &str) -> RelqResult<Option<Value>> {
        let Some(record) = self.first(conn).await? else {
            return Ok(None);
        };
        let name = field.rsplit('.').next().unwrap_or(field);
        record.get_attribute(name).cloned().map(Some)
    }

    // ==================== Aggregates ====================

    /// `SELECT COUNT(*)` over the current filters.
    ///
    /// ORDER BY, LIMIT, OFFSET and locks are dropped. Grouped, distinct or
    /// unioned queries are counted through a derived table.
    pub async fn count<C: Connection>(&self, conn: &C) -> RelqResult<i64> {
        let mut qb = self.select_copy();
        let aggregate = qb.dialect().alias("aggregate");
        let compiled = {
            let tree = qb.tree_mut();
            tree.orders.clear();
            tree.limit = None;
            tree.offset = None;
            tree.lock = None;
            if tree.is_grouped() || tree.distinct || !tree.unions.is_empty() {
                let inner = qb.compile();
                Compiled {
                    query: format!(
                        "SELECT COUNT(*) AS {aggregate} FROM ({}) AS relq_count",
                        inner.query
                    ),
                    bound: inner.bound,
                }
            } else {
                tree.columns = vec![Column::Raw(format!("COUNT(*) AS {aggregate}"))];
                qb.compile()
            }
        };
        let rows = qb.send_compiled(conn, &compiled).await?;
        let record = rows
            .into_iter()
            .next()
            .map(Record::new)
            .ok_or_else(|| RelqError::not_found("COUNT returned no row"))?;
        record.try_get("aggregate")
    }

    /// `SELECT EXISTS(<query>)`
    pub async fn exists<C: Connection>(&self, conn: &C) -> RelqResult<bool> {
        let qb = self.select_copy();
        let inner = qb.compile();
        let compiled = Compiled {
            query: format!(
                "SELECT EXISTS({}) AS {}",
                inner.query,
                qb.dialect().alias("exists")
            ),
            bound: inner.bound,
        };
        let rows = qb.send_compiled(conn, &compiled).await?;
        let record = rows
            .into_iter()
            .next()
            .map(Record::new)
            .ok_or_else(|| RelqError::not_found("EXISTS returned no row"))?;
        record.try_get("exists")
    }

    // ==================== Write ====================

    /// Compile the statement as built and return the affected row count.
    pub async fn execute<C: Connection>(&self, conn: &C) -> RelqResult<u64> {
        let compiled = self.compile();
        match self.tag_name() {
            Some(tag) => {
                conn.execute_tagged(tag, &compiled.query, &compiled.bound)
                    .await
            }
            None => conn.execute(&compiled.query, &compiled.bound).await,
        }
    }
}

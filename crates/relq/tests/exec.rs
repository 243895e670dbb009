//! Execution layer against an in-memory connection.

use futures_util::{StreamExt, TryStreamExt};
use relq::{
    Connection, InstrumentedConnection, MonitorConfig, QueryBuilder, RawRow, RelqError,
    RelqResult, StatsMonitor, Value,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
struct Sent {
    tag: Option<String>,
    sql: String,
    bound: Vec<Value>,
}

/// Serves a fixed table, honouring the projection, `ORDER BY id DESC`,
/// LIMIT and OFFSET of the statements it receives.
struct MemoryConnection {
    rows: Vec<RawRow>,
    log: Mutex<Vec<Sent>>,
}

impl MemoryConnection {
    fn new(rows: Vec<RawRow>) -> Self {
        Self {
            rows,
            log: Mutex::new(Vec::new()),
        }
    }

    fn users() -> Self {
        Self::new(
            ["alice", "bob", "carol"]
                .into_iter()
                .enumerate()
                .map(|(i, name)| {
                    vec![
                        ("id".to_string(), Value::Int(i as i64 + 1)),
                        ("name".to_string(), Value::from(name)),
                    ]
                })
                .collect(),
        )
    }

    fn sent(&self) -> Vec<Sent> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, tag: Option<&str>, sql: &str, bound: &[Value]) {
        self.log.lock().unwrap().push(Sent {
            tag: tag.map(str::to_string),
            sql: sql.to_string(),
            bound: bound.to_vec(),
        });
    }

    fn respond(&self, sql: &str, bound: &[Value]) -> Vec<RawRow> {
        if sql.starts_with("SELECT COUNT(*)") {
            return vec![vec![(
                "aggregate".to_string(),
                Value::Int(self.rows.len() as i64),
            )]];
        }
        if sql.starts_with("SELECT EXISTS(") {
            return vec![vec![(
                "exists".to_string(),
                Value::Bool(!self.rows.is_empty()),
            )]];
        }

        let mut rows = self.rows.clone();
        if sql.contains("ORDER BY id DESC") {
            rows.reverse();
        }
        let offset = bound_after(sql, bound, " OFFSET $").unwrap_or(0) as usize;
        let limit = bound_after(sql, bound, " LIMIT $").map_or(usize::MAX, |n| n as usize);
        let rows = rows.into_iter().skip(offset).take(limit);

        let columns = sql
            .strip_prefix("SELECT ")
            .and_then(|rest| rest.split(" FROM ").next())
            .unwrap_or("*");
        if columns == "*" {
            return rows.collect();
        }
        rows.map(|row| project(&row, columns)).collect()
    }
}

fn bound_after(sql: &str, bound: &[Value], marker: &str) -> Option<i64> {
    let start = sql.find(marker)? + marker.len();
    let digits: String = sql[start..].chars().take_while(char::is_ascii_digit).collect();
    let index: usize = digits.parse().ok()?;
    bound.get(index - 1)?.as_i64()
}

fn project(row: &RawRow, columns: &str) -> RawRow {
    columns
        .split(", ")
        .map(|column| {
            let (field, alias) = column.split_once(" AS ").unwrap_or((column, column));
            let value = row
                .iter()
                .find(|(name, _)| name == field)
                .map_or(Value::Null, |(_, v)| v.clone());
            (alias.to_string(), value)
        })
        .collect()
}

impl Connection for MemoryConnection {
    async fn send(&self, sql: &str, bound: &[Value]) -> RelqResult<Vec<RawRow>> {
        self.record(None, sql, bound);
        Ok(self.respond(sql, bound))
    }

    async fn send_tagged(&self, tag: &str, sql: &str, bound: &[Value]) -> RelqResult<Vec<RawRow>> {
        self.record(Some(tag), sql, bound);
        Ok(self.respond(sql, bound))
    }

    async fn execute(&self, sql: &str, bound: &[Value]) -> RelqResult<u64> {
        self.record(None, sql, bound);
        Ok(self.rows.len() as u64)
    }
}

/// Fails every round trip.
struct BrokenConnection;

impl Connection for BrokenConnection {
    async fn send(&self, _sql: &str, _bound: &[Value]) -> RelqResult<Vec<RawRow>> {
        Err(RelqError::Connection("connection reset".to_string()))
    }
}

fn names(records: impl IntoIterator<Item = relq::Record>) -> Vec<String> {
    records
        .into_iter()
        .map(|r| r.try_get::<String>("name").unwrap())
        .collect()
}

// ==================== Fetch ====================

#[tokio::test]
async fn get_returns_every_row_and_leaves_builder_untouched() {
    let conn = MemoryConnection::users();
    let mut qb = QueryBuilder::postgres("users");
    qb.where_eq("active", true).delete();
    let before = qb.compile();

    let rows = qb.get(&conn).await.unwrap();
    assert_eq!(names(rows), ["alice", "bob", "carol"]);
    assert_eq!(qb.compile(), before);
    assert_eq!(conn.sent()[0].sql, "SELECT * FROM users WHERE active = $1");
}

#[tokio::test]
async fn first_and_first_or_fail() {
    let conn = MemoryConnection::users();
    let qb = QueryBuilder::postgres("users");

    let first = qb.first(&conn).await.unwrap().unwrap();
    assert_eq!(first.try_get::<i64>("id").unwrap(), 1);
    assert_eq!(conn.sent()[0].sql, "SELECT * FROM users LIMIT $1");
    assert_eq!(conn.sent()[0].bound, vec![Value::Int(1)]);

    let empty = MemoryConnection::new(Vec::new());
    assert!(qb.first(&empty).await.unwrap().is_none());
    let err = qb.first_or_fail(&empty).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn last_orders_by_primary_key_descending() {
    let conn = MemoryConnection::users();
    let mut qb = QueryBuilder::postgres("users");
    qb.order_by("name");

    let last = qb.last(&conn, None).await.unwrap().unwrap();
    assert_eq!(last.try_get::<String>("name").unwrap(), "carol");
    assert_eq!(
        conn.sent()[0].sql,
        "SELECT * FROM users ORDER BY id DESC LIMIT $1"
    );

    qb.primary_key("uid");
    qb.last(&conn, None).await.unwrap();
    qb.last(&conn, Some("created_at")).await.unwrap();
    let sent = conn.sent();
    assert_eq!(sent[1].sql, "SELECT * FROM users ORDER BY uid DESC LIMIT $1");
    assert_eq!(
        sent[2].sql,
        "SELECT * FROM users ORDER BY created_at DESC LIMIT $1"
    );
}

#[tokio::test]
async fn pluck_and_value() {
    let conn = MemoryConnection::users();
    let qb = QueryBuilder::postgres("users");

    let plucked = qb.pluck(&conn, "name").await.unwrap();
    assert_eq!(
        plucked.into_vec(),
        vec![Value::from("alice"), Value::from("bob"), Value::from("carol")]
    );
    assert_eq!(conn.sent()[0].sql, "SELECT name FROM users");

    let labelled = qb.pluck_as(&conn, "name", "label").await.unwrap();
    assert_eq!(labelled.len(), 3);
    assert_eq!(
        labelled.first().unwrap().get("label"),
        Some(&Value::from("alice"))
    );
    assert_eq!(conn.sent()[1].sql, "SELECT name AS label FROM users");

    let value = qb.value(&conn, "users.name").await.unwrap();
    assert_eq!(value, Some(Value::from("alice")));

    let missing = qb.value(&MemoryConnection::new(Vec::new()), "name").await.unwrap();
    assert_eq!(missing, None);
}

// ==================== Aggregates ====================

#[tokio::test]
async fn count_drops_ordering_and_pagination() {
    let conn = MemoryConnection::users();
    let mut qb = QueryBuilder::postgres("users");
    qb.where_eq("active", true).order_by("name").limit(2).offset(4);

    assert_eq!(qb.count(&conn).await.unwrap(), 3);
    let sent = conn.sent();
    assert_eq!(
        sent[0].sql,
        "SELECT COUNT(*) AS aggregate FROM users WHERE active = $1"
    );
    assert_eq!(sent[0].bound, vec![Value::Bool(true)]);
}

#[tokio::test]
async fn grouped_count_uses_derived_table() {
    let conn = MemoryConnection::users();
    let mut qb = QueryBuilder::postgres("users");
    qb.select(["team_id"]).group_by(["team_id"]);

    qb.count(&conn).await.unwrap();
    assert_eq!(
        conn.sent()[0].sql,
        "SELECT COUNT(*) AS aggregate FROM (SELECT team_id FROM users GROUP BY team_id) AS relq_count"
    );
}

#[tokio::test]
async fn exists_wraps_the_select() {
    let conn = MemoryConnection::users();
    let mut qb = QueryBuilder::mysql("users");
    qb.where_eq("id", 2);

    assert!(qb.exists(&conn).await.unwrap());
    assert_eq!(
        conn.sent()[0].sql,
        "SELECT EXISTS(SELECT * FROM users WHERE id = ?) AS `exists`"
    );
    assert!(!qb.exists(&MemoryConnection::new(Vec::new())).await.unwrap());
}

// ==================== Write ====================

#[tokio::test]
async fn execute_runs_the_statement_as_built() {
    let conn = MemoryConnection::users();
    let mut qb = QueryBuilder::postgres("users");
    qb.where_eq("id", 1).delete();

    assert_eq!(qb.execute(&conn).await.unwrap(), 3);
    assert_eq!(conn.sent()[0].sql, "DELETE FROM users WHERE id = $1");
}

#[tokio::test]
async fn tag_is_forwarded_to_the_connection() {
    let conn = MemoryConnection::users();
    let mut qb = QueryBuilder::postgres("users");
    qb.tag("users.list");

    qb.get(&conn).await.unwrap();
    qb.count(&conn).await.unwrap();
    let sent = conn.sent();
    assert!(sent.iter().all(|s| s.tag.as_deref() == Some("users.list")));
}

// ==================== Streams ====================

#[tokio::test]
async fn chunk_yields_pages_then_the_empty_page() {
    let conn = MemoryConnection::users();
    let qb = QueryBuilder::postgres("users");

    let pages: Vec<_> = qb
        .chunk(&conn, 1)
        .unwrap()
        .try_collect::<Vec<_>>()
        .await
        .unwrap();
    let sizes: Vec<usize> = pages.iter().map(|p| p.len()).collect();
    assert_eq!(sizes, [1, 1, 1, 0]);

    let sent = conn.sent();
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[0].sql, "SELECT * FROM users LIMIT $1");
    assert_eq!(sent[1].sql, "SELECT * FROM users LIMIT $1 OFFSET $2");
    assert_eq!(sent[3].bound, vec![Value::Int(1), Value::Int(3)]);
}

#[tokio::test]
async fn chunk_fetches_only_what_is_pulled() {
    let conn = MemoryConnection::users();
    let qb = QueryBuilder::postgres("users");

    let mut pages = std::pin::pin!(qb.chunk(&conn, 2).unwrap());
    let page = pages.next().await.unwrap().unwrap();
    assert_eq!(names(page), ["alice", "bob"]);
    assert_eq!(conn.sent().len(), 1);
}

#[tokio::test]
async fn chunk_rejects_non_positive_size() {
    let conn = MemoryConnection::users();
    let qb = QueryBuilder::postgres("users");
    let err = qb.chunk(&conn, 0).err().unwrap();
    assert!(err.is_validation());
    assert!(conn.sent().is_empty());
}

#[tokio::test]
async fn chunk_ends_after_an_error() {
    let qb = QueryBuilder::postgres("users");
    let results: Vec<_> = qb.chunk(&BrokenConnection, 10).unwrap().collect().await;
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(RelqError::Connection(_))));
}

#[tokio::test]
async fn iterate_streams_single_records() {
    let conn = MemoryConnection::users();
    let qb = QueryBuilder::postgres("users");

    let records: Vec<_> = qb.iterate(&conn).try_collect().await.unwrap();
    assert_eq!(names(records), ["alice", "bob", "carol"]);

    let sent = conn.sent();
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[2].bound, vec![Value::Int(1), Value::Int(2)]);
}

// ==================== Monitoring ====================

#[tokio::test]
async fn instrumented_connection_counts_builder_queries() {
    let stats = Arc::new(StatsMonitor::new());
    let conn = InstrumentedConnection::new(MemoryConnection::users())
        .with_config(MonitorConfig::new().enable_monitoring())
        .with_monitor_arc(stats.clone());

    let mut qb = QueryBuilder::postgres("users");
    qb.get(&conn).await.unwrap();
    qb.count(&conn).await.unwrap();
    qb.where_eq("id", 1).delete().execute(&conn).await.unwrap();

    let snapshot = stats.stats();
    assert_eq!(snapshot.total_queries, 3);
    assert_eq!(snapshot.select_count, 2);
    assert_eq!(snapshot.delete_count, 1);
    assert_eq!(conn.inner().sent().len(), 3);
}

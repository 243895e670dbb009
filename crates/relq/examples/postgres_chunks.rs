//! Page through a table with `chunk` and `iterate`.
//!
//! Run: DATABASE_URL=postgres://... cargo run -p relq --example postgres_chunks

use futures_util::TryStreamExt;
use relq::{
    InstrumentedConnection, MonitorConfig, QueryBuilder, RelqError, RelqResult, StatsMonitor,
    TracingSqlHook,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_postgres::NoTls;

#[tokio::main]
async fn main() -> RelqResult<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| RelqError::Connection("DATABASE_URL is required".to_string()))?;

    let (client, connection) = tokio_postgres::connect(&database_url, NoTls)
        .await
        .map_err(RelqError::from_db_error)?;
    tokio::spawn(async move {
        let _ = connection.await;
    });

    let stats = Arc::new(StatsMonitor::new());
    let conn = InstrumentedConnection::new(client)
        .with_config(
            MonitorConfig::new()
                .with_query_timeout(Duration::from_secs(5))
                .enable_monitoring(),
        )
        .with_monitor_arc(stats.clone())
        .add_hook(TracingSqlHook::new());

    let mut qb = QueryBuilder::postgres("pg_catalog.pg_type");
    qb.select(["oid", "typname"])
        .where_op("oid", "<", 100)
        .order_by("oid")
        .tag("examples.postgres_chunks");

    println!("{} rows", qb.count(&conn).await?);

    let mut pages = std::pin::pin!(qb.chunk(&conn, 10)?);
    while let Some(page) = pages.try_next().await? {
        if page.is_empty() {
            break;
        }
        println!("page of {}", page.len());
    }

    let mut records = std::pin::pin!(qb.iterate(&conn));
    while let Some(record) = records.try_next().await? {
        println!("{:?}", record.get("typname"));
        if record.try_get::<i64>("oid")? > 20 {
            break;
        }
    }

    println!("{:#?}", stats.stats());
    Ok(())
}

//! Statement monitoring and hooks.
//!
//! [`InstrumentedConnection`] wraps any [`Connection`](crate::Connection) and
//! reports every statement to a [`QueryMonitor`], lets [`QueryHook`]s inspect
//! or abort it, and enforces an optional timeout.
//!
//! # Example
//!
//! ```rust,ignore
//! use relq::monitor::{InstrumentedConnection, MonitorConfig, StatsMonitor};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let stats = Arc::new(StatsMonitor::new());
//! let conn = InstrumentedConnection::new(client)
//!     .with_config(
//!         MonitorConfig::new()
//!             .with_query_timeout(Duration::from_secs(30))
//!             .with_slow_query_threshold(Duration::from_secs(1))
//!             .enable_monitoring(),
//!     )
//!     .with_monitor_arc(stats.clone());
//!
//! QueryBuilder::postgres("users").get(&conn).await?;
//! println!("{:?}", stats.stats());
//! ```

mod config;
mod instrumented;
mod monitors;
mod types;

#[cfg(feature = "tracing")]
mod tracing_hook;


pub use config::MonitorConfig;
pub use instrumented::InstrumentedConnection;
pub use monitors::{CompositeHook, CompositeMonitor, NoopMonitor, QueryStats, StatsMonitor};
pub use types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult, QueryType};

#[cfg(feature = "tracing")]
pub use tracing_hook::TracingSqlHook;

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

use super::config::MonitorConfig;
use super::monitors::{CompositeHook, NoopMonitor};
use super::types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult};
use crate::connection::{Connection, RawRow};
use crate::error::{RelqError, RelqResult};
use crate::value::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Wraps a [`Connection`] with hooks, monitors and a statement timeout.
///
/// ```ignore
/// let conn = InstrumentedConnection::new(client)
///     .with_config(
///         MonitorConfig::new()
///             .with_query_timeout(Duration::from_secs(5))
///             .enable_monitoring(),
///     )
///     .with_monitor(StatsMonitor::new())
///     .add_hook(TracingSqlHook::new());
///
/// let users = QueryBuilder::postgres("users").get(&conn).await?;
/// ```
pub struct InstrumentedConnection<C> {
    conn: C,
    monitor: Arc<dyn QueryMonitor>,
    hook: Option<Arc<dyn QueryHook>>,
    config: MonitorConfig,
}

impl<C: Connection> InstrumentedConnection<C> {
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            monitor: Arc::new(NoopMonitor),
            hook: None,
            config: MonitorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Add a hook. Hooks already set run first.
    pub fn add_hook<H: QueryHook + 'static>(self, hook: H) -> Self {
        self.add_hook_arc(Arc::new(hook))
    }

    pub fn add_hook_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hook = Some(match self.hook.take() {
            None => hook,
            Some(existing) => Arc::new(CompositeHook::new().add_arc(existing).add_arc(hook)),
        });
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn inner(&self) -> &C {
        &self.conn
    }

    pub fn into_inner(self) -> C {
        self.conn
    }

    fn apply_hook(&self, ctx: &QueryContext) -> RelqResult<()> {
        let Some(hook) = &self.hook else {
            return Ok(());
        };
        match hook.before_query(ctx) {
            HookAction::Continue => Ok(()),
            HookAction::Abort(reason) => Err(RelqError::validation(format!(
                "Query aborted by hook: {reason}"
            ))),
        }
    }

    fn report(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        if let Some(hook) = &self.hook {
            hook.after_query(ctx, duration, result);
        }
        if !self.config.monitoring_enabled {
            return;
        }
        self.monitor.on_query_complete(ctx, duration, result);
        if let Some(threshold) = self.config.slow_query_threshold {
            if duration > threshold {
                self.monitor.on_slow_query(ctx, duration);
            }
        }
    }

    async fn with_timeout<T, F>(&self, future: F) -> RelqResult<T>
    where
        F: Future<Output = RelqResult<T>> + Send,
    {
        match self.config.query_timeout {
            Some(timeout) => tokio::time::timeout(timeout, future)
                .await
                .unwrap_or(Err(RelqError::Timeout(timeout))),
            None => future.await,
        }
    }

    async fn run<T, F>(
        &self,
        ctx: QueryContext,
        future: F,
        outcome: impl Fn(&T) -> QueryResult,
    ) -> RelqResult<T>
    where
        F: Future<Output = RelqResult<T>> + Send,
    {
        self.apply_hook(&ctx)?;
        if self.config.monitoring_enabled {
            self.monitor.on_query_start(&ctx);
        }

        let start = Instant::now();
        let result = self.with_timeout(future).await;
        let duration = start.elapsed();

        let query_result = match &result {
            Ok(value) => outcome(value),
            Err(RelqError::Timeout(d)) => QueryResult::error(format!("timeout after {d:?}")),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.report(&ctx, duration, &query_result);
        result
    }

    fn context(sql: &str, bound: &[Value], tag: Option<&str>) -> QueryContext {
        let ctx = QueryContext::new(sql, bound.len());
        match tag {
            Some(tag) => ctx.with_tag(tag),
            None => ctx,
        }
    }
}

impl<C: Connection> Connection for InstrumentedConnection<C> {
    async fn send(&self, sql: &str, bound: &[Value]) -> RelqResult<Vec<RawRow>> {
        let ctx = Self::context(sql, bound, None);
        self.run(ctx, self.conn.send(sql, bound), |rows| QueryResult::Rows(rows.len()))
            .await
    }

    async fn send_tagged(&self, tag: &str, sql: &str, bound: &[Value]) -> RelqResult<Vec<RawRow>> {
        let ctx = Self::context(sql, bound, Some(tag));
        self.run(ctx, self.conn.send_tagged(tag, sql, bound), |rows| {
            QueryResult::Rows(rows.len())
        })
        .await
    }

    async fn execute(&self, sql: &str, bound: &[Value]) -> RelqResult<u64> {
        let ctx = Self::context(sql, bound, None);
        self.run(ctx, self.conn.execute(sql, bound), |n| QueryResult::Affected(*n))
            .await
    }

    async fn execute_tagged(&self, tag: &str, sql: &str, bound: &[Value]) -> RelqResult<u64> {
        let ctx = Self::context(sql, bound, Some(tag));
        self.run(ctx, self.conn.execute_tagged(tag, sql, bound), |n| {
            QueryResult::Affected(*n)
        })
        .await
    }
}

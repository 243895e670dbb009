//! Lazy, pull-driven fetching.
//!
//! [`QueryBuilder::chunk`] and [`QueryBuilder::iterate`] return streams that
//! issue one round trip per poll that needs data. Nothing is fetched ahead of
//! the consumer.
//!
//! Dropping a stream stops further round trips, but a round trip already in
//! flight on the connection is not cancelled; whatever the connection does
//! with an abandoned future applies.

use crate::builder::QueryBuilder;
use crate::collection::Collection;
use crate::connection::Connection;
use crate::error::{RelqError, RelqResult};
use crate::record::Record;
use futures_core::Stream;
use futures_util::stream;

struct Pager<'a, C> {
    base: QueryBuilder,
    conn: &'a C,
    index: i64,
}

impl QueryBuilder {
    /// Fetch the result in pages of `size` rows.
    ///
    /// Page `n` is fetched with `LIMIT size OFFSET size * n`. The stream yields
    /// every page including the final empty one, then ends. An error is
    /// yielded once and ends the stream.
    ///
    /// ```ignore
    /// use futures_util::TryStreamExt;
    ///
    /// let mut pages = std::pin::pin!(qb.chunk(&client, 500)?);
    /// while let Some(page) = pages.try_next().await? {
    ///     if page.is_empty() {
    ///         break;
    ///     }
    ///     for record in &page {
    ///         // ...
    ///     }
    /// }
    /// ```
    pub fn chunk<'a, C: Connection>(
        &self,
        conn: &'a C,
        size: i64,
    ) -> RelqResult<impl Stream<Item = RelqResult<Collection<Record>>> + Send + use<'a, C>> {
        if size <= 0 {
            return Err(RelqError::validation(format!(
                "chunk size must be positive, got {size}"
            )));
        }
        let pager = Pager {
            base: self.select_copy(),
            conn,
            index: 0,
        };

        Ok(stream::unfold(Some(pager), move |state| async move {
            let Some(mut pager) = state else {
                return None;
            };
            let mut qb = pager.base.clone();
            qb.limit(size).offset(size * pager.index);

            match qb.fetch_records(pager.conn).await {
                Ok(page) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        target: "relq",
                        page = pager.index,
                        size,
                        rows = page.len(),
                        "fetched chunk"
                    );
                    let done = page.is_empty();
                    pager.index += 1;
                    let next = if done { None } else { Some(pager) };
                    Some((Ok(page), next))
                }
                Err(e) => Some((Err(e), None)),
            }
        }))
    }

    /// Stream records one at a time.
    ///
    /// Each record costs its own round trip (`LIMIT 1 OFFSET n`); use
    /// [`chunk`](Self::chunk) or [`get`](Self::get) for bulk reads. The stream
    /// ends at the first empty fetch or after yielding an error.
    pub fn iterate<'a, C: Connection>(
        &self,
        conn: &'a C,
    ) -> impl Stream<Item = RelqResult<Record>> + Send + use<'a, C> {
        let pager = Pager {
            base: self.select_copy(),
            conn,
            index: 0,
        };

        stream::unfold(Some(pager), |state| async move {
            let Some(mut pager) = state else {
                return None;
            };
            let mut qb = pager.base.clone();
            qb.limit(1).offset(pager.index);

            match qb.fetch_records(pager.conn).await {
                Ok(rows) => {
                    let Some(record) = rows.into_iter().next() else {
                        return None;
                    };
                    pager.index += 1;
                    Some((Ok(record), Some(pager)))
                }
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

//! Pagination executor: issues a query, follows continuation handles and
//! streams decoded rows one at a time.
//!
//! Only one page is held at any moment. The next page is fetched when the
//! consumer polls past the end of the current one, so dropping the stream
//! (or reaching the row cap) stops further remote calls.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, error};

use crate::client::{Record, RemoteClient};
use crate::decode::{decode_record, Row};
use crate::error::{ForceError, Result};
use crate::naming::ColumnResolver;
use crate::schema::Column;

/// Lazy, finite, non-restartable sequence of decoded rows.
pub type RowStream = BoxStream<'static, Result<Row>>;

struct Pager {
    client: Arc<dyn RemoteClient>,
    projection: Vec<Column>,
    resolver: Arc<ColumnResolver>,
    /// Query or continuation handle to issue once the buffer drains.
    next_query: Option<String>,
    buffer: std::vec::IntoIter<Record>,
    /// Error to yield once the current buffer drains.
    deferred: Option<ForceError>,
    remaining: Option<usize>,
    pages: usize,
    emitted: usize,
}

impl Pager {
    fn finish(&mut self) {
        self.next_query = None;
        self.buffer = Vec::new().into_iter();
        self.deferred = None;
    }

    async fn next_row(&mut self) -> Option<Result<Row>> {
        if self.remaining == Some(0) {
            debug!(
                "Row cap reached after {} rows, {} pages",
                self.emitted, self.pages
            );
            return None;
        }

        loop {
            if let Some(record) = self.buffer.next() {
                return match decode_record(&record, &self.projection, &self.resolver) {
                    Ok(row) => {
                        self.emitted += 1;
                        if let Some(remaining) = self.remaining.as_mut() {
                            *remaining -= 1;
                        }
                        Some(Ok(row))
                    }
                    Err(e) => {
                        error!("Decoding record {} failed: {}", self.emitted + 1, e);
                        self.finish();
                        Some(Err(e))
                    }
                };
            }

            if let Some(e) = self.deferred.take() {
                return Some(Err(e));
            }

            let query = match self.next_query.take() {
                Some(q) => q,
                None => {
                    debug!(
                        "Result set exhausted: {} rows over {} pages",
                        self.emitted, self.pages
                    );
                    return None;
                }
            };

            debug!("Fetching page {}: {}", self.pages + 1, query);
            let page = match self.client.query(&query).await {
                Ok(page) => page,
                Err(e) => {
                    error!("Query for page {} failed: {}", self.pages + 1, e);
                    self.finish();
                    return Some(Err(e));
                }
            };
            self.pages += 1;

            if !page.done {
                match page.next_records_url {
                    Some(next) => self.next_query = Some(next),
                    None => {
                        // rows of this page still stand; the error follows them
                        error!("Page {} has more data but no continuation handle", self.pages);
                        self.deferred = Some(ForceError::RemoteQuery(format!(
                            "page {} reported more data without a continuation handle",
                            self.pages
                        )));
                    }
                }
            }
            self.buffer = page.records.into_iter();
        }
    }
}

/// Stream the rows of `query`, decoded into `projection`.
///
/// Nothing is sent to the remote side until the stream is first polled.
/// `limit` caps the number of rows emitted regardless of what the remote
/// side returns; once reached, no further pages are requested. A remote or
/// decode error is yielded once and ends the stream.
pub fn stream_rows(
    client: Arc<dyn RemoteClient>,
    query: String,
    projection: Vec<Column>,
    resolver: Arc<ColumnResolver>,
    limit: Option<usize>,
) -> RowStream {
    let pager = Pager {
        client,
        projection,
        resolver,
        next_query: Some(query),
        buffer: Vec::new().into_iter(),
        deferred: None,
        remaining: limit,
        pages: 0,
        emitted: 0,
    };

    stream::unfold(pager, |mut pager| async move {
        let item = pager.next_row().await?;
        Some((item, pager))
    })
    .boxed()
}

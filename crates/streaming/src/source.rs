use futures_util::StreamExt;
use futures_util::stream::BoxStream;

use crate::error::QueryError;
use crate::query::Query;
use crate::row::Row;

/// Finite, single-pass stream of rows.
pub type RowStream<'a> = BoxStream<'a, Result<Row, QueryError>>;

/// External data source answering declarative queries with row streams.
///
/// Implementations must be `Send + Sync` so resolution tasks can run on any
/// executor. Failures are reported in-stream; consumers stop at the first one.
pub trait RowSource: Send + Sync {
    fn query(&self, query: &Query) -> RowStream<'_>;
}

impl<T: RowSource + ?Sized> RowSource for std::sync::Arc<T> {
    fn query(&self, query: &Query) -> RowStream<'_> {
        (**self).query(query)
    }
}

impl<T: RowSource + ?Sized> RowSource for &T {
    fn query(&self, query: &Query) -> RowStream<'_> {
        (**self).query(query)
    }
}

/// Drain a row stream, failing on the first error.
pub async fn collect_rows(mut stream: RowStream<'_>) -> Result<Vec<Row>, QueryError> {
    let mut rows = Vec::new();
    while let Some(row) = stream.next().await {
        rows.push(row?);
    }
    Ok(rows)
}

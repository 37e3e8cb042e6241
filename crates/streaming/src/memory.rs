use std::collections::BTreeMap;

use futures_util::StreamExt;
use futures_util::stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::QueryError;
use crate::query::Query;
use crate::row::{Row, scalar_text};
use crate::source::{RowSource, RowStream};

/// One stored record: column name to value.
pub type Record = BTreeMap<String, Value>;

/// In-memory data source over class tables.
///
/// Records are kept per class in insertion order, and rows are produced in
/// that order. The JSON form is an object of class name to record array:
///
/// ```json
/// { "Bis.Category": [ { "ECInstanceId": "0x17", "CodeValue": "S-BEAM" } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryRowSource {
    classes: BTreeMap<String, Vec<Record>>,
}

impl InMemoryRowSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn insert<I, K>(&mut self, class: impl Into<String>, columns: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let record: Record = columns.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.classes.entry(class.into()).or_default().push(record);
    }

    pub fn with_record<I, K>(mut self, class: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.insert(class, columns);
        self
    }

    /// Evaluate `query` eagerly; the stream wrapper only exists to honour the
    /// `RowSource` contract.
    pub fn evaluate(&self, query: &Query) -> Result<Vec<Row>, QueryError> {
        let Some(records) = self.classes.get(&query.class) else {
            return Err(QueryError::UnknownClass(query.class.clone()));
        };

        let rows: Vec<Row> = records
            .iter()
            .filter(|record| {
                query
                    .predicate
                    .matches(|column| record.get(column).and_then(scalar_text))
            })
            .map(|record| project(record, query))
            .collect();

        debug!(
            class = %query.class,
            rows = rows.len(),
            "evaluated in-memory query"
        );
        Ok(rows)
    }
}

fn project(record: &Record, query: &Query) -> Row {
    let mut row = Row::new();
    for column in &query.columns {
        // Absent columns stay absent; consumers see a `None` field.
        if let Some(value) = record.get(column) {
            row.insert(query.row_format.field_name(column), value.clone());
        }
    }
    row
}

impl RowSource for InMemoryRowSource {
    fn query(&self, query: &Query) -> RowStream<'_> {
        match self.evaluate(query) {
            Ok(rows) => stream::iter(rows.into_iter().map(Ok)).boxed(),
            Err(err) => stream::once(async move { Err::<Row, QueryError>(err) }).boxed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryRowSource;
    use crate::error::QueryError;
    use crate::query::{Predicate, Query, RowFormat};
    use crate::source::{RowSource, collect_rows};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn categories() -> InMemoryRowSource {
        InMemoryRowSource::from_json_str(
            r#"{
                "Bis.Category": [
                    { "ECInstanceId": 1, "CodeValue": "A" },
                    { "ECInstanceId": 2, "CodeValue": "C" },
                    { "ECInstanceId": 3, "CodeValue": "B" }
                ]
            }"#,
        )
        .expect("parse")
    }

    #[tokio::test]
    async fn filters_and_renames_columns() {
        let source = categories();
        let q = Query::select("Bis.Category", ["ECInstanceId"])
            .filter(Predicate::any_of("CodeValue", ["A", "B"]))
            .with_row_format(RowFormat::JsPropertyNames);
        let rows = collect_rows(source.query(&q)).await.expect("rows");
        let ids: Vec<Option<String>> = rows.iter().map(|r| r.id("id")).collect();
        assert_eq!(ids, vec![Some("1".to_string()), Some("3".to_string())]);
        assert!(rows.iter().all(|r| r.get("CodeValue").is_none()));
    }

    #[tokio::test]
    async fn unknown_class_fails_in_stream() {
        let source = categories();
        let q = Query::select("Bis.Missing", ["ECInstanceId"]);
        let err = collect_rows(source.query(&q)).await.expect_err("error");
        assert_eq!(err, QueryError::UnknownClass("Bis.Missing".into()));
    }

    #[tokio::test]
    async fn missing_columns_stay_absent() {
        let source = InMemoryRowSource::new().with_record(
            "BisCore.Element",
            [("ECInstanceId", json!("0x1"))],
        );
        let q = Query::select("BisCore.Element", ["ECInstanceId", "UserLabel"])
            .with_row_format(RowFormat::JsPropertyNames);
        let rows = collect_rows(source.query(&q)).await.expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id("id").as_deref(), Some("0x1"));
        assert_eq!(rows[0].str("userLabel"), None);
    }

    #[test]
    fn insert_appends_in_order() {
        let mut source = InMemoryRowSource::new();
        source.insert("X", [("k", json!(1))]);
        source.insert("X", [("k", json!(2))]);
        let rows = source.evaluate(&Query::select("X", ["k"])).expect("rows");
        let ids: Vec<Option<String>> = rows.iter().map(|r| r.id("k")).collect();
        assert_eq!(ids, vec![Some("1".to_string()), Some("2".to_string())]);
    }
}

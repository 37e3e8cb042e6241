use std::collections::BTreeSet;

use futures_util::StreamExt;
use scene::{CategoryId, CategorySet, Viewport};
use streaming::{Predicate, Query, QueryError, RowFormat, RowSource};
use tracing::{debug, info, warn};

use crate::config::VisibilityConfig;

pub const CATEGORY_CLASS: &str = "Bis.Category";
const ID_COLUMN: &str = "ECInstanceId";
const NAME_COLUMN: &str = "CodeValue";

/// Strip surrounding whitespace and one pair of single quotes, so `'S-BEAM'`
/// and `S-BEAM` name the same category.
pub fn normalize_category_name(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(trimmed)
}

/// Hides a fixed list of categories (by code value) in a viewport.
///
/// Names are normalized and deduplicated at construction; unknown names are
/// silently ignored because they simply match no rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryVisibilityFilter {
    names: Vec<String>,
}

impl CategoryVisibilityFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for raw in names {
            let name = normalize_category_name(raw.as_ref());
            if name.is_empty() {
                continue;
            }
            if seen.insert(name.to_string()) {
                out.push(name.to_string());
            }
        }
        Self { names: out }
    }

    pub fn from_config(config: &VisibilityConfig) -> Self {
        Self::new(&config.hidden_categories)
    }

    /// Normalized names in first-seen order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn query(&self) -> Query {
        Query::select(CATEGORY_CLASS, [ID_COLUMN])
            .filter(Predicate::any_of(NAME_COLUMN, self.names.iter().cloned()))
            .with_row_format(RowFormat::JsPropertyNames)
    }

    /// Look up the ids of the configured categories.
    ///
    /// Rows without a usable id are skipped. The first source error aborts
    /// the lookup.
    pub async fn resolve<S>(&self, source: &S) -> Result<CategorySet, QueryError>
    where
        S: RowSource + ?Sized,
    {
        let mut ids = CategorySet::new();
        if self.names.is_empty() {
            debug!("no categories configured; skipping lookup");
            return Ok(ids);
        }

        let query = self.query();
        let id_field = query.row_format.field_name(ID_COLUMN);
        let mut rows = source.query(&query);
        while let Some(row) = rows.next().await {
            let row = row?;
            match row.id(&id_field) {
                Some(id) => {
                    ids.insert(CategoryId::new(id));
                }
                None => warn!(field = %id_field, "category row without id skipped"),
            }
        }
        debug!(
            requested = self.names.len(),
            resolved = ids.len(),
            "resolved category ids"
        );
        Ok(ids)
    }

    /// Resolve and hide. The viewport receives exactly one bulk
    /// `change_category_display(ids, false)` call, even when nothing matched.
    /// On error the viewport is untouched.
    pub async fn apply<S, V>(&self, source: &S, viewport: &mut V) -> Result<CategorySet, QueryError>
    where
        S: RowSource + ?Sized,
        V: Viewport + ?Sized,
    {
        let ids = self.resolve(source).await?;
        hide_categories(viewport, &ids);
        Ok(ids)
    }
}

/// Single bulk hide call.
pub fn hide_categories<V>(viewport: &mut V, ids: &CategorySet)
where
    V: Viewport + ?Sized,
{
    info!(count = ids.len(), "hiding categories");
    viewport.change_category_display(ids, false);
}

#[cfg(test)]
mod tests {
    use super::{CATEGORY_CLASS, CategoryVisibilityFilter, normalize_category_name};
    use foundation::math::{Vec2, Vec3};
    use futures_util::StreamExt;
    use futures_util::stream;
    use pretty_assertions::assert_eq;
    use scene::{CategoryId, CategorySet, PlanViewport};
    use serde_json::json;
    use streaming::{InMemoryRowSource, Query, QueryError, Row, RowSource, RowStream};

    fn viewport() -> PlanViewport {
        PlanViewport::new(Vec3::ZERO, 1.0, Vec2::new(100.0, 100.0))
    }

    fn categories() -> InMemoryRowSource {
        InMemoryRowSource::new()
            .with_record(
                CATEGORY_CLASS,
                [("ECInstanceId", json!("1")), ("CodeValue", json!("A"))],
            )
            .with_record(
                CATEGORY_CLASS,
                [("ECInstanceId", json!("2")), ("CodeValue", json!("C"))],
            )
    }

    fn set(ids: &[&str]) -> CategorySet {
        ids.iter().map(|id| CategoryId::new(*id)).collect()
    }

    #[test]
    fn names_are_unquoted_and_deduplicated() {
        let f = CategoryVisibilityFilter::new(["'A'", "B", "A", " 'B' ", "", "''"]);
        assert_eq!(f.names(), ["A", "B"]);
        assert_eq!(normalize_category_name("'TC_Rail Ballast'"), "TC_Rail Ballast");
        assert_eq!(normalize_category_name("'half"), "'half");
    }

    #[test]
    fn query_selects_ids_by_code_value() {
        let f = CategoryVisibilityFilter::new(["A", "O'Neil"]);
        assert_eq!(
            f.query().statement(),
            "SELECT ECInstanceId FROM Bis.Category WHERE CodeValue IN ('A', 'O''Neil')"
        );
    }

    #[tokio::test]
    async fn hides_only_matching_categories_in_one_call() {
        let f = CategoryVisibilityFilter::new(["'A'", "'B'"]);
        let mut vp = viewport();
        let ids = f.apply(&categories(), &mut vp).await.expect("apply");

        assert_eq!(ids, set(&["1"]));
        assert_eq!(vp.category_calls(), [(set(&["1"]), false)]);
        assert_eq!(vp.hidden_categories(), &set(&["1"]));
    }

    #[tokio::test]
    async fn no_matches_still_issues_one_empty_call() {
        let f = CategoryVisibilityFilter::new(["Z"]);
        let mut vp = viewport();
        let ids = f.apply(&categories(), &mut vp).await.expect("apply");

        assert!(ids.is_empty());
        assert_eq!(vp.category_calls(), [(CategorySet::new(), false)]);
    }

    #[tokio::test]
    async fn applying_twice_is_idempotent() {
        let f = CategoryVisibilityFilter::new(["A", "C"]);
        let source = categories();
        let mut vp = viewport();
        let first = f.apply(&source, &mut vp).await.expect("first");
        let second = f.apply(&source, &mut vp).await.expect("second");

        assert_eq!(first, set(&["1", "2"]));
        assert_eq!(first, second);
        assert_eq!(
            vp.category_calls(),
            [(first.clone(), false), (second.clone(), false)]
        );
        assert_eq!(vp.hidden_categories(), &first);
    }

    #[tokio::test]
    async fn rows_without_id_are_skipped() {
        let source = categories().with_record(CATEGORY_CLASS, [("CodeValue", json!("A"))]);
        let f = CategoryVisibilityFilter::new(["A"]);
        assert_eq!(f.resolve(&source).await.expect("resolve"), set(&["1"]));
    }

    struct FailsMidStream;

    impl RowSource for FailsMidStream {
        fn query(&self, _query: &Query) -> RowStream<'_> {
            stream::iter(vec![
                Ok(Row::new().with("id", "1")),
                Err(QueryError::source("connection reset")),
            ])
            .boxed()
        }
    }

    #[tokio::test]
    async fn source_error_leaves_viewport_untouched() {
        let f = CategoryVisibilityFilter::new(["A"]);
        let mut vp = viewport();
        let err = f.apply(&FailsMidStream, &mut vp).await.expect_err("fails");

        assert_eq!(err, QueryError::source("connection reset"));
        assert!(vp.category_calls().is_empty());
    }

    #[tokio::test]
    async fn empty_list_issues_no_query() {
        let f = CategoryVisibilityFilter::new(Vec::<String>::new());
        let mut vp = viewport();
        // An unknown-class error would surface if a query were issued.
        let ids = f
            .apply(&InMemoryRowSource::new(), &mut vp)
            .await
            .expect("apply");
        assert!(ids.is_empty());
        assert_eq!(vp.category_calls().len(), 1);
    }
}

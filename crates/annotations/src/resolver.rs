use std::collections::BTreeMap;

use foundation::math::{Vec2, Vec3};
use futures_util::StreamExt;
use scene::EventStatus;
use streaming::{Predicate, Query, QueryError, RowFormat, RowSource};
use tracing::{debug, info, warn};

use crate::cluster::MarkerCluster;
use crate::config::{ClusterConfig, ResolverConfig};
use crate::decorator::{DecoratorId, DecoratorRegistry};
use crate::marker::{Placement, SpatialMarker};

pub const ELEMENT_CLASS: &str = "BisCore.Element";
const ID_COLUMN: &str = "ECInstanceId";
const LABEL_COLUMN: &str = "UserLabel";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One element row as returned by the label query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRecord {
    pub id: ElementId,
    pub label: Option<String>,
}

/// Element id -> world position, with a fallback for everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionTable {
    entries: BTreeMap<ElementId, Vec3>,
    fallback: Vec3,
}

impl PositionTable {
    pub fn new(fallback: Vec3) -> Self {
        Self {
            entries: BTreeMap::new(),
            fallback,
        }
    }

    pub fn with_position(mut self, id: impl Into<String>, position: Vec3) -> Self {
        self.entries.insert(ElementId::new(id), position);
        self
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        let entries = config
            .positions
            .iter()
            .map(|(id, p)| (ElementId::new(id.clone()), Vec3::from(*p)))
            .collect();
        Self {
            entries,
            fallback: Vec3::from(config.fallback),
        }
    }

    pub fn resolve(&self, id: &ElementId) -> (Vec3, Placement) {
        match self.entries.get(id) {
            Some(p) => (*p, Placement::Resolved),
            None => (self.fallback, Placement::Fallback),
        }
    }
}

/// Finds elements by user label and turns each into a marker.
///
/// Every matching element is annotated. Elements without a known position are
/// placed at the fallback coordinate and flagged, never dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementAnnotationResolver {
    label: String,
    positions: PositionTable,
    marker_size: Vec2,
    threshold_px: f64,
}

impl ElementAnnotationResolver {
    pub fn new(label: impl Into<String>, positions: PositionTable, marker_size: Vec2) -> Self {
        Self {
            label: label.into(),
            positions,
            marker_size,
            threshold_px: crate::config::DEFAULT_CLUSTER_THRESHOLD_PX,
        }
    }

    pub fn from_config(resolver: &ResolverConfig, clustering: &ClusterConfig) -> Self {
        Self {
            label: resolver.label.clone(),
            positions: PositionTable::from_config(resolver),
            marker_size: Vec2::from(resolver.marker_size),
            threshold_px: clustering.threshold_px,
        }
    }

    pub fn query(&self) -> Query {
        Query::select(ELEMENT_CLASS, [ID_COLUMN, LABEL_COLUMN])
            .filter(Predicate::eq(LABEL_COLUMN, self.label.clone()))
            .with_row_format(RowFormat::JsPropertyNames)
    }

    /// Drain the label query. Rows without an id are skipped.
    pub async fn fetch_records<S>(&self, source: &S) -> Result<Vec<ElementRecord>, QueryError>
    where
        S: RowSource + ?Sized,
    {
        let query = self.query();
        let id_field = query.row_format.field_name(ID_COLUMN);
        let label_field = query.row_format.field_name(LABEL_COLUMN);

        let mut records = Vec::new();
        let mut rows = source.query(&query);
        while let Some(row) = rows.next().await {
            let row = row?;
            let Some(id) = row.id(&id_field) else {
                warn!(field = %id_field, "element row without id skipped");
                continue;
            };
            records.push(ElementRecord {
                id: ElementId::new(id),
                label: row.str(&label_field).map(str::to_string),
            });
        }
        debug!(label = %self.label, records = records.len(), "fetched element records");
        Ok(records)
    }

    pub fn build_marker(&self, record: &ElementRecord) -> SpatialMarker {
        let (position, placement) = self.positions.resolve(&record.id);
        if placement == Placement::Fallback {
            warn!(element = %record.id, ?position, "no known position; using fallback");
        }
        let label = match &record.label {
            Some(label) => label.clone(),
            None => {
                debug!(element = %record.id, "element has no label; using its id");
                record.id.to_string()
            }
        };

        let element = record.id.clone();
        let hover = record.id.clone();
        SpatialMarker::new(position, self.marker_size)
            .with_label(label)
            .with_placement(placement)
            .on_pointer_enter(move |_| debug!(element = %hover, "marker hovered"))
            .on_pointer_down(move |ev| {
                info!(element = %element, button = ev.button, "marker selected");
                EventStatus::Handled
            })
    }

    /// Build the marker cluster for every element carrying the label.
    pub async fn resolve<S>(&self, source: &S) -> Result<MarkerCluster, QueryError>
    where
        S: RowSource + ?Sized,
    {
        let records = self.fetch_records(source).await?;
        let mut cluster = MarkerCluster::new(self.threshold_px).with_name("element-annotations");
        let mut fallback = 0usize;
        for record in &records {
            let marker = self.build_marker(record);
            if marker.placement == Placement::Fallback {
                fallback += 1;
            }
            cluster.add(marker);
        }
        info!(markers = cluster.len(), fallback, "element annotations resolved");
        Ok(cluster)
    }

    /// Resolve and register the resulting cluster.
    pub async fn attach<S>(
        &self,
        source: &S,
        registry: &mut DecoratorRegistry,
    ) -> Result<DecoratorId, QueryError>
    where
        S: RowSource + ?Sized,
    {
        let cluster = self.resolve(source).await?;
        Ok(cluster.register(registry))
    }
}

#[cfg(test)]
mod tests {
    use super::{ELEMENT_CLASS, ElementAnnotationResolver, ElementId, ElementRecord, PositionTable};
    use crate::config::{ClusterConfig, DEFAULT_KNOWN_ELEMENT, DEFAULT_KNOWN_POSITION, ResolverConfig};
    use crate::decorator::DecoratorRegistry;
    use crate::marker::Placement;
    use foundation::math::{Vec2, Vec3};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use streaming::{InMemoryRowSource, QueryError};

    fn resolver() -> ElementAnnotationResolver {
        ElementAnnotationResolver::from_config(&ResolverConfig::default(), &ClusterConfig::default())
    }

    fn elements() -> InMemoryRowSource {
        InMemoryRowSource::new()
            .with_record(
                ELEMENT_CLASS,
                [
                    ("ECInstanceId", json!(DEFAULT_KNOWN_ELEMENT)),
                    ("UserLabel", json!("A_Platform.dgn.i.dgn")),
                ],
            )
            .with_record(
                ELEMENT_CLASS,
                [
                    ("ECInstanceId", json!("0x99")),
                    ("UserLabel", json!("A_Platform.dgn.i.dgn")),
                ],
            )
            .with_record(
                ELEMENT_CLASS,
                [("ECInstanceId", json!("0x7")), ("UserLabel", json!("Other"))],
            )
    }

    #[test]
    fn query_matches_label_exactly() {
        assert_eq!(
            resolver().query().statement(),
            "SELECT ECInstanceId, UserLabel FROM BisCore.Element WHERE UserLabel = 'A_Platform.dgn.i.dgn'"
        );
    }

    #[test]
    fn position_table_falls_back_for_unknown_ids() {
        let table = PositionTable::new(Vec3::ZERO).with_position("1", Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(
            table.resolve(&ElementId::new("1")),
            (Vec3::new(1.0, 2.0, 3.0), Placement::Resolved)
        );
        assert_eq!(
            table.resolve(&ElementId::new("2")),
            (Vec3::ZERO, Placement::Fallback)
        );
    }

    #[tokio::test]
    async fn every_labelled_element_becomes_a_marker() {
        let cluster = resolver().resolve(&elements()).await.expect("resolve");
        assert_eq!(cluster.len(), 2);

        let known = &cluster.markers()[0];
        assert_eq!(known.position, Vec3::from(DEFAULT_KNOWN_POSITION));
        assert_eq!(known.placement, Placement::Resolved);
        assert_eq!(known.size, Vec2::new(50.0, 50.0));
        assert_eq!(known.label, "A_Platform.dgn.i.dgn");

        let unknown = &cluster.markers()[1];
        assert_eq!(unknown.position, Vec3::ZERO);
        assert_eq!(unknown.placement, Placement::Fallback);
        assert!(unknown.has_pointer_handlers());
    }

    #[tokio::test]
    async fn missing_id_is_skipped_and_missing_label_is_none() {
        let source = InMemoryRowSource::new()
            .with_record(ELEMENT_CLASS, [("UserLabel", json!("A_Platform.dgn.i.dgn"))])
            .with_record(ELEMENT_CLASS, [("ECInstanceId", json!(42))]);
        let r = ElementAnnotationResolver::new(
            "A_Platform.dgn.i.dgn",
            PositionTable::new(Vec3::ZERO),
            Vec2::new(50.0, 50.0),
        );

        // The label-less row does not match the label predicate.
        assert!(r.fetch_records(&source).await.expect("fetch").is_empty());

        let marker = r.build_marker(&ElementRecord {
            id: ElementId::new("42"),
            label: None,
        });
        assert_eq!(marker.label, "42");
    }

    #[tokio::test]
    async fn no_matching_rows_gives_an_empty_cluster() {
        let source = InMemoryRowSource::new().with_record(
            ELEMENT_CLASS,
            [("ECInstanceId", json!("1")), ("UserLabel", json!("x"))],
        );
        let cluster = resolver().resolve(&source).await.expect("resolve");
        assert!(cluster.is_empty());
    }

    #[tokio::test]
    async fn query_error_propagates_and_registers_nothing() {
        let mut registry = DecoratorRegistry::new();
        let err = resolver()
            .attach(&InMemoryRowSource::new(), &mut registry)
            .await
            .expect_err("unknown class");
        assert_eq!(err, QueryError::UnknownClass(ELEMENT_CLASS.to_string()));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn attach_registers_one_decorator() {
        let mut registry = DecoratorRegistry::new();
        let id = resolver().attach(&elements(), &mut registry).await.expect("attach");
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec![id]);
    }
}

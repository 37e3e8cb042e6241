use foundation::math::{Vec2, Vec3};
use scene::{DecorateContext, EventStatus, PointerEvent, PointerEventKind, Projector};
use tracing::warn;

use crate::decorator::{Decorator, DecoratorId, DecoratorRegistry};
use crate::error::DecorateError;
use crate::marker::{MarkerId, SpatialMarker};

/// Label given to a synthesized cluster placeholder.
pub const PLACEHOLDER_LABEL: &str = "cluster";
const PLACEHOLDER_SIZE_PX: f64 = 24.0;

/// Frame-local group of markers whose projections lie within the threshold
/// of the group's seed (its first member).
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Members in insertion order; the first one is the seed.
    pub members: Vec<MarkerId>,
    pub seed_px: Vec2,
    /// Mean world position of the members.
    pub centroid: Vec3,
}

impl Cluster {
    fn seeded(id: MarkerId, seed_px: Vec2, position: Vec3) -> Self {
        Self {
            members: vec![id],
            seed_px,
            centroid: position,
        }
    }

    /// A cluster with no members. Never produced by `cluster_markers`.
    pub fn empty_at(centroid: Vec3) -> Self {
        Self {
            members: Vec::new(),
            seed_px: Vec2::ZERO,
            centroid,
        }
    }

    fn push(&mut self, id: MarkerId, position: Vec3) {
        let n = self.members.len() as f64;
        self.centroid = (self.centroid * n + position) * (1.0 / (n + 1.0));
        self.members.push(id);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Greedy screen-space clustering.
///
/// Ordering contract:
/// - Markers are visited in slice order; a marker joins the first cluster whose
///   seed is strictly closer than `threshold_px`, otherwise it seeds a new one.
/// - Clusters are returned in seed order, so the output is a pure function of
///   (markers, projection, threshold).
///
/// Hidden and unprojectable markers belong to no cluster.
pub fn cluster_markers<P>(markers: &[SpatialMarker], projector: &P, threshold_px: f64) -> Vec<Cluster>
where
    P: Projector + ?Sized,
{
    let mut clusters: Vec<Cluster> = Vec::new();

    for (index, marker) in markers.iter().enumerate() {
        if !marker.visible {
            continue;
        }
        let Some(screen) = projector.world_to_screen(marker.position) else {
            continue;
        };
        if !screen.is_finite() {
            continue;
        }

        let id = MarkerId(index);
        match clusters
            .iter_mut()
            .find(|c| c.seed_px.distance(screen) < threshold_px)
        {
            Some(cluster) => cluster.push(id, marker.position),
            None => clusters.push(Cluster::seeded(id, screen, marker.position)),
        }
    }

    clusters
}

/// What gets drawn for a cluster.
#[derive(Debug)]
pub enum Representative {
    /// An owned marker drawn as-is (the cluster's first member).
    Member(MarkerId),
    /// Synthesized stand-in for a cluster with no members.
    Placeholder(SpatialMarker),
}

/// Pick the representative of `cluster`.
///
/// A non-empty cluster is represented by its first member. An empty one gets a
/// placeholder at its centroid, which needs a viewport to be placed.
///
/// `MarkerCluster::decorate` never builds empty clusters and returns early
/// without a viewport, so `NoViewport` only reaches direct callers.
pub fn select_representative(
    cluster: &Cluster,
    viewport: Option<&dyn Projector>,
) -> Result<Representative, DecorateError> {
    if let Some(first) = cluster.members.first() {
        return Ok(Representative::Member(*first));
    }

    let Some(viewport) = viewport else {
        return Err(DecorateError::NoViewport);
    };
    if viewport.world_to_screen(cluster.centroid).is_none() {
        warn!(centroid = ?cluster.centroid, "empty cluster placeholder is off-screen");
    }
    Ok(Representative::Placeholder(
        SpatialMarker::new(
            cluster.centroid,
            Vec2::new(PLACEHOLDER_SIZE_PX, PLACEHOLDER_SIZE_PX),
        )
        .with_label(PLACEHOLDER_LABEL),
    ))
}

/// Decorator owning an ordered set of markers, clustered every frame.
#[derive(Debug)]
pub struct MarkerCluster {
    name: String,
    threshold_px: f64,
    markers: Vec<SpatialMarker>,
}

impl MarkerCluster {
    pub fn new(threshold_px: f64) -> Self {
        Self {
            name: "markers".to_string(),
            threshold_px,
            markers: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append a marker. No duplicate detection: every call adds a new member.
    pub fn add(&mut self, marker: SpatialMarker) -> MarkerId {
        self.markers.push(marker);
        MarkerId(self.markers.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn markers(&self) -> &[SpatialMarker] {
        &self.markers
    }

    /// Hand this cluster to the host registry.
    pub fn register(self, registry: &mut DecoratorRegistry) -> DecoratorId {
        registry.add_decorator(Box::new(self))
    }
}

impl Decorator for MarkerCluster {
    fn name(&self) -> &str {
        &self.name
    }

    /// Cluster, pick representatives, draw them. A cluster that fails is
    /// skipped so the others still draw; the first failure is returned.
    fn decorate(&self, ctx: &mut DecorateContext<'_>) -> Result<(), DecorateError> {
        let Some(viewport) = ctx.viewport() else {
            return Ok(());
        };

        let mut first_err = None;
        for cluster in cluster_markers(&self.markers, viewport, self.threshold_px) {
            let draw = match select_representative(&cluster, Some(viewport)) {
                Ok(Representative::Member(id)) => self
                    .markers
                    .get(id.0)
                    .and_then(|m| m.draw(viewport, cluster.len())),
                Ok(Representative::Placeholder(marker)) => marker.draw(viewport, 0),
                Err(err) => {
                    first_err.get_or_insert(err);
                    continue;
                }
            };
            if let Some(draw) = draw {
                ctx.push(draw);
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Moves update hover on every marker. Button events are hit-tested in
    /// insertion order and stop at the first marker that handles them.
    fn on_pointer(&mut self, event: &PointerEvent, projector: &dyn Projector) -> EventStatus {
        if event.kind == PointerEventKind::Move {
            for marker in &mut self.markers {
                marker.update_hover(event, projector);
            }
            return EventStatus::NotHandled;
        }

        for marker in &mut self.markers {
            if marker.dispatch(event, projector).is_handled() {
                return EventStatus::Handled;
            }
        }
        EventStatus::NotHandled
    }
}

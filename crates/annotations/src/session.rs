use futures_util::future::join;
use runtime::cancel::CancelToken;
use scene::{CategorySet, Viewport};
use streaming::{QueryError, RowSource};
use tracing::{info, warn};

use crate::config::AnnotationConfig;
use crate::decorator::{DecoratorId, DecoratorRegistry};
use crate::resolver::ElementAnnotationResolver;
use crate::visibility::{CategoryVisibilityFilter, hide_categories};

/// Result of one connection-time task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T> {
    Applied(T),
    /// The query failed; no side effect was made.
    Failed(QueryError),
    /// The connection was abandoned before the side effect.
    Cancelled,
}

impl<T> TaskOutcome<T> {
    pub fn applied(&self) -> Option<&T> {
        match self {
            TaskOutcome::Applied(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, TaskOutcome::Applied(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    /// Categories hidden in the viewport.
    pub categories: TaskOutcome<CategorySet>,
    /// Marker decorator registered with the host.
    pub markers: TaskOutcome<DecoratorId>,
}

impl SessionReport {
    pub fn decorator(&self) -> Option<DecoratorId> {
        self.markers.applied().copied()
    }
}

/// Connection-time wiring of category hiding and element annotations.
///
/// Ordering contract:
/// - Both lookups run concurrently and are joined before anything visible
///   happens.
/// - After the join the cancel token is checked once; a cancelled session
///   makes no viewport or registry change.
/// - Category hiding fails open (model stays fully visible) and annotation
///   fails empty (no decorator). Neither failure affects the other task.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSession {
    visibility: CategoryVisibilityFilter,
    resolver: ElementAnnotationResolver,
}

impl AnnotationSession {
    pub fn new(visibility: CategoryVisibilityFilter, resolver: ElementAnnotationResolver) -> Self {
        Self {
            visibility,
            resolver,
        }
    }

    pub fn from_config(config: &AnnotationConfig) -> Self {
        Self {
            visibility: CategoryVisibilityFilter::from_config(&config.visibility),
            resolver: ElementAnnotationResolver::from_config(
                &config.annotations,
                &config.clustering,
            ),
        }
    }

    pub fn visibility(&self) -> &CategoryVisibilityFilter {
        &self.visibility
    }

    pub fn resolver(&self) -> &ElementAnnotationResolver {
        &self.resolver
    }

    pub async fn connect<S, V>(
        &self,
        source: &S,
        viewport: &mut V,
        registry: &mut DecoratorRegistry,
        cancel: &CancelToken,
    ) -> SessionReport
    where
        S: RowSource + ?Sized,
        V: Viewport + ?Sized,
    {
        if cancel.is_cancelled() {
            info!("session cancelled before connect");
            return SessionReport {
                categories: TaskOutcome::Cancelled,
                markers: TaskOutcome::Cancelled,
            };
        }

        let (categories, markers) = join(
            self.visibility.resolve(source),
            self.resolver.resolve(source),
        )
        .await;

        if cancel.is_cancelled() {
            info!("session cancelled; discarding resolved annotations");
            return SessionReport {
                categories: TaskOutcome::Cancelled,
                markers: TaskOutcome::Cancelled,
            };
        }

        let categories = match categories {
            Ok(ids) => {
                hide_categories(viewport, &ids);
                TaskOutcome::Applied(ids)
            }
            Err(err) => {
                warn!("category lookup failed; model stays fully visible: {err}");
                TaskOutcome::Failed(err)
            }
        };

        let markers = match markers {
            Ok(cluster) => TaskOutcome::Applied(cluster.register(registry)),
            Err(err) => {
                warn!("element lookup failed; no annotations: {err}");
                TaskOutcome::Failed(err)
            }
        };

        info!(
            categories = categories.is_applied(),
            markers = markers.is_applied(),
            "session connected"
        );
        SessionReport {
            categories,
            markers,
        }
    }

    /// Remove the decorator a previous `connect` registered. Hidden categories
    /// are left as they are.
    pub fn disconnect(&self, report: &SessionReport, registry: &mut DecoratorRegistry) -> bool {
        match report.decorator() {
            Some(id) => registry.remove_decorator(id),
            None => false,
        }
    }
}

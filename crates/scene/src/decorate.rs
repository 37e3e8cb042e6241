use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use runtime::frame::Frame;

use crate::viewport::Projector;

/// One marker drawn this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDraw {
    pub label: String,
    /// Projected marker anchor.
    pub anchor_px: Vec2,
    pub image_rect: Aabb2,
    pub label_px: Vec2,
    /// Number of markers this draw stands for (1 unless clustered).
    pub cluster_size: usize,
    /// Marker position came from a fallback rather than a resolved location.
    pub flagged: bool,
}

/// Per-frame drawing context handed to decorators.
///
/// The context collects draw output; it never exposes application state, so a
/// decoration pass can't have effects beyond the frame it draws.
pub struct DecorateContext<'a> {
    pub frame: Frame,
    viewport: Option<&'a dyn Projector>,
    draws: Vec<MarkerDraw>,
}

impl<'a> DecorateContext<'a> {
    pub fn new(frame: Frame, viewport: &'a dyn Projector) -> Self {
        Self {
            frame,
            viewport: Some(viewport),
            draws: Vec::new(),
        }
    }

    /// A context with no rendering viewport (e.g. an offscreen pass).
    pub fn detached(frame: Frame) -> Self {
        Self {
            frame,
            viewport: None,
            draws: Vec::new(),
        }
    }

    pub fn viewport(&self) -> Option<&'a dyn Projector> {
        self.viewport
    }

    pub fn push(&mut self, draw: MarkerDraw) {
        self.draws.push(draw);
    }

    pub fn draws(&self) -> &[MarkerDraw] {
        &self.draws
    }

    pub fn into_draws(self) -> Vec<MarkerDraw> {
        self.draws
    }
}

impl std::fmt::Debug for DecorateContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecorateContext")
            .field("frame", &self.frame)
            .field("has_viewport", &self.viewport.is_some())
            .field("draws", &self.draws.len())
            .finish()
    }
}

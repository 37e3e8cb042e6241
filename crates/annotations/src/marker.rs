use foundation::bounds::Aabb2;
use foundation::math::{Vec2, Vec3};
use scene::{DecorateContext, EventStatus, MarkerDraw, PointerEvent, PointerEventKind, Projector};

/// Identity of a marker inside the `MarkerCluster` that owns it (insertion index).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub usize);

/// How a marker's world position was obtained.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Placement {
    #[default]
    Resolved,
    /// No location was known; the marker sits at the fallback coordinate.
    Fallback,
}

pub type PointerHandler = Box<dyn FnMut(&PointerEvent) -> EventStatus + Send>;
pub type HoverHandler = Box<dyn FnMut(&PointerEvent) + Send>;

/// One annotation anchored to a world position.
///
/// Offsets, sizes and visibility are configuration: set them while building
/// the marker, before it is handed to a cluster. The only state a marker
/// carries between events is whether the pointer is currently over it.
pub struct SpatialMarker {
    pub position: Vec3,
    /// Hit region size in pixels, centred on the projected position.
    pub size: Vec2,
    pub label: String,
    pub image_offset: Vec2,
    /// Image size in pixels; `None` draws the image at `size`.
    pub image_size: Option<Vec2>,
    pub label_offset: Vec2,
    pub visible: bool,
    pub placement: Placement,
    hovered: bool,
    on_pointer_enter: Option<HoverHandler>,
    on_pointer_leave: Option<HoverHandler>,
    on_pointer_down: Option<PointerHandler>,
}

impl SpatialMarker {
    pub fn new(position: Vec3, size: Vec2) -> Self {
        Self {
            position,
            size,
            label: String::new(),
            image_offset: Vec2::ZERO,
            image_size: None,
            label_offset: Vec2::ZERO,
            visible: true,
            placement: Placement::Resolved,
            hovered: false,
            on_pointer_enter: None,
            on_pointer_leave: None,
            on_pointer_down: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_image_offset(mut self, offset: Vec2) -> Self {
        self.image_offset = offset;
        self
    }

    pub fn with_image_size(mut self, size: Vec2) -> Self {
        self.image_size = Some(size);
        self
    }

    pub fn with_label_offset(mut self, offset: Vec2) -> Self {
        self.label_offset = offset;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn on_pointer_enter(mut self, handler: impl FnMut(&PointerEvent) + Send + 'static) -> Self {
        self.on_pointer_enter = Some(Box::new(handler));
        self
    }

    pub fn on_pointer_leave(mut self, handler: impl FnMut(&PointerEvent) + Send + 'static) -> Self {
        self.on_pointer_leave = Some(Box::new(handler));
        self
    }

    pub fn on_pointer_down(
        mut self,
        handler: impl FnMut(&PointerEvent) -> EventStatus + Send + 'static,
    ) -> Self {
        self.on_pointer_down = Some(Box::new(handler));
        self
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn has_pointer_handlers(&self) -> bool {
        self.on_pointer_enter.is_some()
            || self.on_pointer_leave.is_some()
            || self.on_pointer_down.is_some()
    }

    /// Screen rectangle used for hit-testing, or `None` when the marker is
    /// hidden or can't be projected this frame.
    pub fn hit_region(&self, projector: &dyn Projector) -> Option<Aabb2> {
        if !self.visible {
            return None;
        }
        let anchor = projector.world_to_screen(self.position)?;
        if !anchor.is_finite() {
            return None;
        }
        Some(Aabb2::from_center_size(anchor, self.size))
    }

    /// Draw record for this marker standing in for `cluster_size` markers.
    pub fn draw(&self, projector: &dyn Projector, cluster_size: usize) -> Option<MarkerDraw> {
        if !self.visible {
            return None;
        }
        let anchor = projector.world_to_screen(self.position)?;
        if !anchor.is_finite() {
            return None;
        }
        let image_size = self.image_size.unwrap_or(self.size);
        Some(MarkerDraw {
            label: self.label.clone(),
            anchor_px: anchor,
            image_rect: Aabb2::from_center_size(anchor + self.image_offset, image_size),
            label_px: anchor + self.label_offset,
            cluster_size,
            flagged: self.placement == Placement::Fallback,
        })
    }

    /// Draw this marker on its own. Hidden or unprojectable markers draw nothing.
    pub fn decorate(&self, ctx: &mut DecorateContext<'_>) {
        let Some(viewport) = ctx.viewport() else {
            return;
        };
        if let Some(draw) = self.draw(viewport, 1) {
            ctx.push(draw);
        }
    }

    /// Button dispatch: a `ButtonDown` inside the hit region runs
    /// `on_pointer_down`. Everything else is `NotHandled`.
    pub fn dispatch(&mut self, event: &PointerEvent, projector: &dyn Projector) -> EventStatus {
        if event.kind != PointerEventKind::ButtonDown {
            return EventStatus::NotHandled;
        }
        let Some(region) = self.hit_region(projector) else {
            return EventStatus::NotHandled;
        };
        if !region.contains(event.position) {
            return EventStatus::NotHandled;
        }
        match self.on_pointer_down.as_mut() {
            Some(handler) => handler(event),
            None => EventStatus::NotHandled,
        }
    }

    /// Track enter/leave on pointer moves. Returns `true` if the hover state
    /// changed.
    pub fn update_hover(&mut self, event: &PointerEvent, projector: &dyn Projector) -> bool {
        if event.kind != PointerEventKind::Move {
            return false;
        }
        let inside = self
            .hit_region(projector)
            .is_some_and(|r| r.contains(event.position));
        if inside == self.hovered {
            return false;
        }
        self.hovered = inside;
        let handler = if inside {
            self.on_pointer_enter.as_mut()
        } else {
            self.on_pointer_leave.as_mut()
        };
        if let Some(handler) = handler {
            handler(event);
        }
        true
    }
}

impl std::fmt::Debug for SpatialMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialMarker")
            .field("position", &self.position)
            .field("size", &self.size)
            .field("label", &self.label)
            .field("visible", &self.visible)
            .field("placement", &self.placement)
            .field("hovered", &self.hovered)
            .field("handlers", &self.has_pointer_handlers())
            .finish()
    }
}

use std::collections::VecDeque;

use runtime::event_bus::{Event, EventBus};
use runtime::frame::Frame;
use scene::{DecorateContext, EventStatus, PointerEvent, PointerEventKind, Projector};
use tracing::{debug, info, warn};

use crate::error::DecorateError;

/// Unit registered with the host that draws into each frame and may receive
/// pointer input.
///
/// `decorate` runs on the frame loop: it must not block, await or touch
/// application state.
pub trait Decorator: Send {
    fn name(&self) -> &str {
        "decorator"
    }

    fn decorate(&self, ctx: &mut DecorateContext<'_>) -> Result<(), DecorateError>;

    fn on_pointer(&mut self, _event: &PointerEvent, _projector: &dyn Projector) -> EventStatus {
        EventStatus::NotHandled
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecoratorId(pub u64);

struct Entry {
    id: DecoratorId,
    decorator: Box<dyn Decorator>,
}

/// Host-side decorator list and pointer router.
///
/// Ordering contract:
/// - Decorators draw and receive events in registration order.
/// - A button event stops at the first decorator that reports `Handled`;
///   there is no z-order across decorators, registration order is the priority.
/// - Pointer moves reach every decorator.
pub struct DecoratorRegistry {
    next_id: u64,
    entries: Vec<Entry>,
    last_frame: Frame,
    bus: EventBus,
}

impl Default for DecoratorRegistry {
    fn default() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
            last_frame: Frame::default(),
            bus: EventBus::with_capacity_limit(1024),
        }
    }
}

impl DecoratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_decorator(&mut self, decorator: Box<dyn Decorator>) -> DecoratorId {
        let id = DecoratorId(self.next_id);
        self.next_id += 1;
        info!(id = id.0, name = decorator.name(), "decorator registered");
        self.entries.push(Entry { id, decorator });
        id
    }

    /// Returns `true` if the decorator was registered.
    pub fn remove_decorator(&mut self, id: DecoratorId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let removed = self.entries.len() != before;
        if removed {
            info!(id = id.0, "decorator removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = DecoratorId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    /// Run one frame of decoration. A failing decorator is logged and recorded;
    /// the rest still draw. Returns the number of failures.
    pub fn decorate_all(&mut self, ctx: &mut DecorateContext<'_>) -> usize {
        self.last_frame = ctx.frame;
        let mut failures = 0;
        for entry in &self.entries {
            if let Err(err) = entry.decorator.decorate(ctx) {
                failures += 1;
                warn!(
                    frame = ctx.frame.index,
                    decorator = entry.decorator.name(),
                    "decoration failed: {err}"
                );
                self.bus.emit(
                    ctx.frame,
                    "decorate.failed",
                    format!("{}: {err}", entry.decorator.name()),
                );
            }
        }
        failures
    }

    pub fn dispatch_pointer(
        &mut self,
        event: &PointerEvent,
        projector: &dyn Projector,
    ) -> EventStatus {
        if event.kind == PointerEventKind::Move {
            for entry in &mut self.entries {
                entry.decorator.on_pointer(event, projector);
            }
            return EventStatus::NotHandled;
        }

        for entry in &mut self.entries {
            if entry.decorator.on_pointer(event, projector).is_handled() {
                debug!(
                    decorator = entry.decorator.name(),
                    button = event.button,
                    "pointer event handled"
                );
                self.bus.emit(
                    self.last_frame,
                    "pointer.handled",
                    entry.decorator.name().to_string(),
                );
                return EventStatus::Handled;
            }
        }
        EventStatus::NotHandled
    }

    /// Trace of decorator failures and handled pointer events.
    pub fn events(&self) -> &VecDeque<Event> {
        self.bus.events()
    }
}

impl std::fmt::Debug for DecoratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.entries.iter().map(|e| e.decorator.name()).collect();
        f.debug_struct("DecoratorRegistry")
            .field("decorators", &names)
            .field("last_frame", &self.last_frame)
            .finish()
    }
}

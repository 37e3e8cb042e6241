use foundation::math::Vec2;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerEventKind {
    Move,
    ButtonDown,
    ButtonUp,
}

/// Pointer input delivered by the host, in viewport pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    /// Host button code; 0 is the primary button.
    pub button: u8,
    pub position: Vec2,
}

impl PointerEvent {
    pub fn moved(position: Vec2) -> Self {
        Self {
            kind: PointerEventKind::Move,
            button: 0,
            position,
        }
    }

    pub fn button_down(button: u8, position: Vec2) -> Self {
        Self {
            kind: PointerEventKind::ButtonDown,
            button,
            position,
        }
    }

    pub fn button_up(button: u8, position: Vec2) -> Self {
        Self {
            kind: PointerEventKind::ButtonUp,
            button,
            position,
        }
    }
}

/// Whether a handler consumed an event. `Handled` stops further dispatch.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum EventStatus {
    Handled,
    #[default]
    NotHandled,
}

impl EventStatus {
    pub fn is_handled(self) -> bool {
        self == EventStatus::Handled
    }
}

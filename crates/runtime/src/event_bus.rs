use std::collections::VecDeque;

use crate::frame::Frame;

/// Structured trace record for things that happen inside a frame or an event
/// dispatch (decorator failures, handled pointer input).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub frame_index: u64,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: VecDeque<Event>,
    capacity: Option<usize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` events; the oldest are dropped first.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    pub fn emit(&mut self, frame: Frame, kind: &'static str, message: impl Into<String>) {
        if let Some(cap) = self.capacity {
            if cap == 0 {
                return;
            }
            while self.events.len() >= cap {
                self.events.pop_front();
            }
        }
        self.events.push_back(Event {
            frame_index: frame.index,
            kind,
            message: message.into(),
        });
    }

    /// Events oldest first.
    pub fn events(&self) -> &VecDeque<Event> {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;
    use crate::frame::Frame;

    #[test]
    fn records_events_with_frame_index() {
        let mut bus = EventBus::new();
        bus.emit(Frame::new(2, 0.1), "decorate.failed", "boom");
        assert_eq!(bus.events().len(), 1);
        assert_eq!(bus.events()[0].frame_index, 2);
        assert_eq!(bus.events()[0].kind, "decorate.failed");
    }

    #[test]
    fn capacity_limit_drops_oldest() {
        let mut bus = EventBus::with_capacity_limit(2);
        for i in 0..5 {
            bus.emit(Frame::new(i, 1.0), "k", format!("m{i}"));
        }
        let got: Vec<u64> = bus.events().iter().map(|e| e.frame_index).collect();
        assert_eq!(got, vec![3, 4]);
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let mut bus = EventBus::with_capacity_limit(0);
        bus.emit(Frame::default(), "k", "m");
        assert!(bus.events().is_empty());
    }
}

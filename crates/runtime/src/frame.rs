/// Deterministic frame metadata handed to every decoration pass.
///
/// Decorators must treat this as read-only; it exists so per-frame output
/// (draw commands, trace events) can be attributed to the frame that produced it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Fixed delta time (seconds).
    pub dt_s: f64,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self { index, dt_s }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new(0, 1.0 / 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;

    #[test]
    fn default_runs_at_sixty_hertz() {
        let f = Frame::default();
        assert_eq!(f.index, 0);
        assert_eq!(f.dt_s, 1.0 / 60.0);
    }

    #[test]
    fn next_advances_index_and_keeps_timestep() {
        let f1 = Frame::new(0, 0.5).next();
        assert_eq!(f1, Frame::new(1, 0.5));
    }
}

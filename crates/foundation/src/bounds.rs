use crate::math::Vec2;

/// Axis-aligned screen-space rectangle (pixels).
///
/// `min` is the top-left corner, `max` the bottom-right one. Containment is
/// inclusive on every edge.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let hw = size.x.abs() * 0.5;
        let hh = size.y.abs() * 0.5;
        Aabb2 {
            min: [center.x - hw, center.y - hh],
            max: [center.x + hw, center.y + hh],
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min[0] && p.x <= self.max[0] && p.y >= self.min[1] && p.y <= self.max[1]
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;
    use crate::math::Vec2;

    #[test]
    fn from_center_size_spans_half_extents() {
        let r = Aabb2::from_center_size(Vec2::new(10.0, 20.0), Vec2::new(4.0, 6.0));
        assert_eq!(r.min, [8.0, 17.0]);
        assert_eq!(r.max, [12.0, 23.0]);
    }

    #[test]
    fn negative_size_is_treated_as_magnitude() {
        let r = Aabb2::from_center_size(Vec2::new(0.0, 0.0), Vec2::new(-2.0, 2.0));
        assert_eq!(r, Aabb2::new([-1.0, -1.0], [1.0, 1.0]));
    }

    #[test]
    fn contains_is_edge_inclusive() {
        let r = Aabb2::new([0.0, 0.0], [10.0, 10.0]);
        assert!(r.contains(Vec2::new(0.0, 10.0)));
        assert!(r.contains(Vec2::new(5.0, 5.0)));
        assert!(!r.contains(Vec2::new(10.1, 5.0)));
    }
}

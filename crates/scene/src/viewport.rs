use foundation::math::{Vec2, Vec3};
use tracing::debug;

use crate::category::CategorySet;

/// World -> screen mapping for the current camera.
///
/// Returns `None` for points that can't be drawn this frame (behind the
/// camera, outside the view, non-finite).
pub trait Projector {
    fn world_to_screen(&self, world: Vec3) -> Option<Vec2>;
}

impl<F> Projector for F
where
    F: Fn(Vec3) -> Option<Vec2>,
{
    fn world_to_screen(&self, world: Vec3) -> Option<Vec2> {
        self(world)
    }
}

/// Host viewport contract consumed by the annotation subsystem.
pub trait Viewport: Projector {
    /// Bulk category display toggle.
    fn change_category_display(&mut self, categories: &CategorySet, visible: bool);

    fn as_projector(&self) -> &dyn Projector;
}

/// Headless top-down viewport: orthographic plan view with pan and zoom.
///
/// Screen y grows downward. Points projecting outside the pixel rectangle are
/// reported as not drawable.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanViewport {
    /// World point shown at the viewport centre (z is ignored).
    pub center: Vec3,
    pub px_per_unit: f64,
    pub size_px: Vec2,
    hidden: CategorySet,
    category_calls: Vec<(CategorySet, bool)>,
}

impl PlanViewport {
    pub fn new(center: Vec3, px_per_unit: f64, size_px: Vec2) -> Self {
        Self {
            center,
            px_per_unit,
            size_px,
            hidden: CategorySet::new(),
            category_calls: Vec::new(),
        }
    }

    pub fn pan(&mut self, delta: Vec3) {
        self.center = self.center + delta;
    }

    pub fn zoom(&mut self, factor: f64) {
        if factor.is_finite() && factor > 0.0 {
            self.px_per_unit *= factor;
        }
    }

    pub fn hidden_categories(&self) -> &CategorySet {
        &self.hidden
    }

    /// Every `change_category_display` call received, in order.
    pub fn category_calls(&self) -> &[(CategorySet, bool)] {
        &self.category_calls
    }
}

impl Projector for PlanViewport {
    fn world_to_screen(&self, world: Vec3) -> Option<Vec2> {
        if !world.is_finite() {
            return None;
        }
        let x = self.size_px.x * 0.5 + (world.x - self.center.x) * self.px_per_unit;
        let y = self.size_px.y * 0.5 - (world.y - self.center.y) * self.px_per_unit;
        if !(0.0..=self.size_px.x).contains(&x) || !(0.0..=self.size_px.y).contains(&y) {
            return None;
        }
        Some(Vec2::new(x, y))
    }
}

impl Viewport for PlanViewport {
    fn change_category_display(&mut self, categories: &CategorySet, visible: bool) {
        if visible {
            self.hidden.diff_in_place(categories);
        } else {
            self.hidden.union_in_place(categories);
        }
        debug!(
            count = categories.len(),
            visible,
            hidden_total = self.hidden.len(),
            "category display changed"
        );
        self.category_calls.push((categories.clone(), visible));
    }

    fn as_projector(&self) -> &dyn Projector {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{PlanViewport, Projector, Viewport};
    use crate::category::{CategoryId, CategorySet};
    use foundation::math::{Vec2, Vec3};

    fn viewport() -> PlanViewport {
        PlanViewport::new(Vec3::ZERO, 2.0, Vec2::new(100.0, 100.0))
    }

    #[test]
    fn projects_with_y_down() {
        let vp = viewport();
        assert_eq!(
            vp.world_to_screen(Vec3::new(0.0, 0.0, 5.0)),
            Some(Vec2::new(50.0, 50.0))
        );
        assert_eq!(
            vp.world_to_screen(Vec3::new(10.0, 10.0, 0.0)),
            Some(Vec2::new(70.0, 30.0))
        );
    }

    #[test]
    fn culls_points_outside_view() {
        let mut vp = viewport();
        assert_eq!(vp.world_to_screen(Vec3::new(30.0, 0.0, 0.0)), None);
        vp.pan(Vec3::new(30.0, 0.0, 0.0));
        assert_eq!(
            vp.world_to_screen(Vec3::new(30.0, 0.0, 0.0)),
            Some(Vec2::new(50.0, 50.0))
        );
        assert_eq!(vp.world_to_screen(Vec3::new(f64::NAN, 0.0, 0.0)), None);
    }

    #[test]
    fn zoom_rejects_non_positive_factors() {
        let mut vp = viewport();
        vp.zoom(0.0);
        vp.zoom(-1.0);
        assert_eq!(vp.px_per_unit, 2.0);
        vp.zoom(2.0);
        assert_eq!(vp.px_per_unit, 4.0);
    }

    #[test]
    fn category_display_tracks_hidden_set_and_calls() {
        let mut vp = viewport();
        let set: CategorySet = ["1", "2"].into_iter().map(CategoryId::new).collect();
        vp.change_category_display(&set, false);
        assert_eq!(vp.hidden_categories().len(), 2);

        let one: CategorySet = std::iter::once(CategoryId::new("1")).collect();
        vp.change_category_display(&one, true);
        assert!(!vp.hidden_categories().contains(&CategoryId::new("1")));
        assert_eq!(vp.category_calls().len(), 2);
        assert_eq!(vp.category_calls()[0], (set, false));
    }

    #[test]
    fn closures_are_projectors() {
        let p = |w: Vec3| Some(Vec2::new(w.x, w.y));
        assert_eq!(
            p.world_to_screen(Vec3::new(1.0, 2.0, 3.0)),
            Some(Vec2::new(1.0, 2.0))
        );
    }
}

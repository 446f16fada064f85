use crate::math::Vec2;

/// Axis-aligned bounding boxes
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Canvas rectangle `[0, width) x [0, height)`.
    pub fn from_size(width: f64, height: f64) -> Self {
        Aabb2::new([0.0, 0.0], [width, height])
    }

    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let first = points.first()?;
        let mut b = Aabb2::new([first.x, first.y], [first.x, first.y]);
        for p in &points[1..] {
            b.min[0] = b.min[0].min(p.x);
            b.min[1] = b.min[1].min(p.y);
            b.max[0] = b.max[0].max(p.x);
            b.max[1] = b.max[1].max(p.y);
        }
        Some(b)
    }

    /// Overlap test against a half-open region: touching the far edge does not count.
    pub fn overlaps(&self, region: &Aabb2) -> bool {
        self.max[0] >= region.min[0]
            && self.max[1] >= region.min[1]
            && self.min[0] < region.max[0]
            && self.min[1] < region.max[1]
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min[0] && p.x < self.max[0] && p.y >= self.min[1] && p.y < self.max[1]
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;
    use crate::math::Vec2;

    #[test]
    fn overlap_is_half_open() {
        let canvas = Aabb2::from_size(100.0, 50.0);
        let inside = Aabb2::from_points(&[Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0)]).unwrap();
        let right = Aabb2::from_points(&[Vec2::new(100.0, 10.0), Vec2::new(120.0, 20.0)]).unwrap();
        let straddle = Aabb2::from_points(&[Vec2::new(-5.0, -5.0), Vec2::new(0.0, 0.0)]).unwrap();
        assert!(inside.overlaps(&canvas));
        assert!(!right.overlaps(&canvas));
        assert!(straddle.overlaps(&canvas));
    }

    #[test]
    fn empty_points_have_no_bounds() {
        assert!(Aabb2::from_points(&[]).is_none());
        assert!(Aabb2::from_size(4.0, 4.0).contains(Vec2::new(0.0, 3.9)));
        assert_eq!(Aabb2::from_size(4.0, 2.0).center(), Vec2::new(2.0, 1.0));
    }
}

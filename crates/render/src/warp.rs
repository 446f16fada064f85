use foundation::math::Vec2;

/// How far each warp triangle's clip region is pushed out from its centroid.
pub const CLIP_EXPANSION: f64 = 0.05;

/// 2D affine map in canvas `setTransform` order:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine2 {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine2 {
    pub const IDENTITY: Affine2 = Affine2 {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// The map taking each `src[i]` to `dst[i]`. `None` for a degenerate source triangle.
    pub fn from_triangles(src: [Vec2; 3], dst: [Vec2; 3]) -> Option<Self> {
        let u1 = src[1] - src[0];
        let u2 = src[2] - src[0];
        let v1 = dst[1] - dst[0];
        let v2 = dst[2] - dst[0];
        let det = u1.x * u2.y - u2.x * u1.y;
        if det.abs() < 1e-12 || !det.is_finite() {
            return None;
        }
        let a = (v1.x * u2.y - v2.x * u1.y) / det;
        let c = (v2.x * u1.x - v1.x * u2.x) / det;
        let b = (v1.y * u2.y - v2.y * u1.y) / det;
        let d = (v2.y * u1.x - v1.y * u2.x) / det;
        let e = dst[0].x - (a * src[0].x + c * src[0].y);
        let f = dst[0].y - (b * src[0].x + d * src[0].y);
        Some(Self { a, b, c, d, e, f })
    }

    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < 1e-12 || !det.is_finite() {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Self {
            a,
            b,
            c,
            d,
            e: -(a * self.e + c * self.f),
            f: -(b * self.e + d * self.f),
        })
    }
}

/// Pushes each vertex away from the centroid by `factor` of its distance.
pub fn expand_triangle(tri: [Vec2; 3], factor: f64) -> [Vec2; 3] {
    let centroid = (tri[0] + tri[1] + tri[2]) * (1.0 / 3.0);
    tri.map(|p| p + (p - centroid) * factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec2, b: Vec2, eps: f64) {
        let diff = a.distance(b);
        assert!(diff <= eps, "expected {a:?} ~= {b:?} (diff {diff})");
    }

    #[test]
    fn maps_triangle_vertices_exactly() {
        let src = [Vec2::new(512.0, 512.0), Vec2::new(512.0, 0.0), Vec2::new(0.0, 512.0)];
        let dst = [Vec2::new(10.0, 20.0), Vec2::new(200.0, 40.0), Vec2::new(30.0, 250.0)];
        let m = Affine2::from_triangles(src, dst).unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            assert_close(m.apply(*s), *d, 1e-9);
        }
        let inv = m.inverse().unwrap();
        assert_close(inv.apply(dst[1]), src[1], 1e-9);
    }

    #[test]
    fn degenerate_source_is_rejected() {
        let src = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)];
        let dst = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
        assert!(Affine2::from_triangles(src, dst).is_none());
        assert_eq!(Affine2::IDENTITY.inverse(), Some(Affine2::IDENTITY));
    }

    #[test]
    fn expansion_keeps_centroid() {
        let tri = [Vec2::new(0.0, 0.0), Vec2::new(30.0, 0.0), Vec2::new(0.0, 30.0)];
        let grown = expand_triangle(tri, CLIP_EXPANSION);
        assert_close(grown[0], Vec2::new(-0.5, -0.5), 1e-9);
        assert_close(grown[1], Vec2::new(31.0, -0.5), 1e-9);
        let c0 = (tri[0] + tri[1] + tri[2]) * (1.0 / 3.0);
        let c1 = (grown[0] + grown[1] + grown[2]) * (1.0 / 3.0);
        assert_close(c0, c1, 1e-9);
    }
}

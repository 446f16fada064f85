use super::{Vec3, cos_deg, sin_deg};

/// Row-major 3x3 rotation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat3 {
    pub m: [[f64; 3]; 3],
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub const fn from_rows(m: [[f64; 3]; 3]) -> Self {
        Self { m }
    }

    /// Rotation that carries the direction `(lon, lat)` (degrees) onto +x,
    /// with east along +y and north along +z.
    pub fn center_on(lon: f64, lat: f64) -> Self {
        let (cl, sl) = (cos_deg(lat), sin_deg(lat));
        let (co, so) = (cos_deg(lon), sin_deg(lon));
        Self::from_rows([
            [cl * co, cl * so, sl],
            [-so, co, 0.0],
            [-sl * co, -sl * so, cl],
        ])
    }

    pub fn apply(&self, v: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }

    /// Applies the inverse rotation.
    pub fn apply_transpose(&self, v: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0][0] * v.x + m[1][0] * v.y + m[2][0] * v.z,
            m[0][1] * v.x + m[1][1] * v.y + m[2][1] * v.z,
            m[0][2] * v.x + m[1][2] * v.y + m[2][2] * v.z,
        )
    }

    pub fn transpose(&self) -> Self {
        let m = &self.m;
        Self::from_rows([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }
}

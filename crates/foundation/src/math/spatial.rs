use std::cell::Cell;

use super::{LonLat, Vec3, wrap_lon_deg};

/// Unit direction on the sphere with lazily derived angular coordinates.
///
/// The cartesian triple is authoritative. Longitude/latitude are computed on first read
/// and cached; any write through [`SpatialVector::set_xyz`] drops the cached pair.
#[derive(Debug, Clone)]
pub struct SpatialVector {
    x: f64,
    y: f64,
    z: f64,
    angles: Cell<Option<LonLat>>,
}

impl SpatialVector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            angles: Cell::new(None),
        }
    }

    pub fn from_vec3(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    /// Builds from longitude/latitude in degrees; the pair is cached as given.
    pub fn from_lon_lat(lon: f64, lat: f64) -> Self {
        let (lon_r, lat_r) = (lon.to_radians(), lat.to_radians());
        let cos_lat = lat_r.cos();
        let v = Self::new(cos_lat * lon_r.cos(), cos_lat * lon_r.sin(), lat_r.sin());
        v.angles.set(Some(LonLat::new(wrap_lon_deg(lon), lat)));
        v
    }

    /// Builds from colatitude `theta` and longitude `phi`, both in radians.
    pub fn from_theta_phi(theta: f64, phi: f64) -> Self {
        let sin_theta = theta.sin();
        Self::new(sin_theta * phi.cos(), sin_theta * phi.sin(), theta.cos())
    }

    /// Builds from `z = cos(theta)` and `phi` in radians.
    pub fn from_z_phi(z: f64, phi: f64) -> Self {
        let sin_theta = ((1.0 - z) * (1.0 + z)).max(0.0).sqrt();
        Self::new(sin_theta * phi.cos(), sin_theta * phi.sin(), z)
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn set_xyz(&mut self, x: f64, y: f64, z: f64) {
        self.x = x;
        self.y = y;
        self.z = z;
        self.angles.set(None);
    }

    pub fn set_lon_lat(&mut self, lon: f64, lat: f64) {
        *self = Self::from_lon_lat(lon, lat);
    }

    pub fn has_cached_angles(&self) -> bool {
        self.angles.get().is_some()
    }

    /// Longitude in [0, 360) and latitude in [-90, 90], degrees.
    pub fn lon_lat(&self) -> LonLat {
        if let Some(cached) = self.angles.get() {
            return cached;
        }
        let rxy = self.x.hypot(self.y);
        let lon = if rxy == 0.0 {
            0.0
        } else {
            wrap_lon_deg(self.y.atan2(self.x).to_degrees())
        };
        let lat = self.z.atan2(rxy).to_degrees();
        let angles = LonLat::new(lon, lat);
        self.angles.set(Some(angles));
        angles
    }

    pub fn lon(&self) -> f64 {
        self.lon_lat().lon
    }

    pub fn lat(&self) -> f64 {
        self.lon_lat().lat
    }

    /// Colatitude in [0, pi] and longitude in [0, 2pi), radians.
    pub fn theta_phi(&self) -> (f64, f64) {
        let rxy = self.x.hypot(self.y);
        let theta = rxy.atan2(self.z);
        let mut phi = if rxy == 0.0 { 0.0 } else { self.y.atan2(self.x) };
        if phi < 0.0 {
            phi += std::f64::consts::TAU;
        }
        if phi >= std::f64::consts::TAU {
            phi = 0.0;
        }
        (theta, phi)
    }

    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn dot(&self, other: &SpatialVector) -> f64 {
        self.as_vec3().dot(other.as_vec3())
    }

    /// Angular separation in radians.
    pub fn angle_to(&self, other: &SpatialVector) -> f64 {
        self.as_vec3().angle_to(other.as_vec3())
    }
}

impl PartialEq for SpatialVector {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}

impl From<Vec3> for SpatialVector {
    fn from(v: Vec3) -> Self {
        Self::from_vec3(v)
    }
}

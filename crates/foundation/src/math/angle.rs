use serde::{Deserialize, Serialize};

/// Sky position in degrees: longitude in [0, 360), latitude in [-90, 90].
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Wraps longitude and clamps latitude into their canonical ranges.
    pub fn normalized(self) -> Self {
        Self::new(wrap_lon_deg(self.lon), clamp_lat_deg(self.lat))
    }

    pub fn is_finite(self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

pub fn wrap_lon_deg(lon: f64) -> f64 {
    let wrapped = lon.rem_euclid(360.0);
    // rem_euclid can round up to the modulus for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

pub fn clamp_lat_deg(lat: f64) -> f64 {
    lat.clamp(-90.0, 90.0)
}

/// Cosine of an angle in degrees, exact at multiples of 90.
pub fn cos_deg(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    if r == 0.0 {
        1.0
    } else if r == 90.0 || r == 270.0 {
        0.0
    } else if r == 180.0 {
        -1.0
    } else {
        deg.to_radians().cos()
    }
}

/// Sine of an angle in degrees, exact at multiples of 90.
pub fn sin_deg(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    if r == 0.0 || r == 180.0 {
        0.0
    } else if r == 90.0 {
        1.0
    } else if r == 270.0 {
        -1.0
    } else {
        deg.to_radians().sin()
    }
}

/// Great-circle separation in degrees.
pub fn angular_distance_deg(a: LonLat, b: LonLat) -> f64 {
    let (a_lon, a_lat) = (a.lon.to_radians(), a.lat.to_radians());
    let (b_lon, b_lat) = (b.lon.to_radians(), b.lat.to_radians());
    let dlat = (b_lat - a_lat) * 0.5;
    let dlon = (b_lon - a_lon) * 0.5;
    let h = dlat.sin().powi(2) + a_lat.cos() * b_lat.cos() * dlon.sin().powi(2);
    (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{LonLat, Mat3, SpatialVector, Vec3};

/// Celestial reference frames a view or an imagery source can be expressed in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkyFrame {
    /// Equatorial J2000.
    #[default]
    Celestial,
    Galactic,
}

impl SkyFrame {
    pub fn as_str(self) -> &'static str {
        match self {
            SkyFrame::Celestial => "celestial",
            SkyFrame::Galactic => "galactic",
        }
    }
}

impl fmt::Display for SkyFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkyFrame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "celestial" | "equatorial" | "j2000" | "icrs" | "c" => Ok(SkyFrame::Celestial),
            "galactic" | "gal" | "g" => Ok(SkyFrame::Galactic),
            other => Err(format!("unknown sky frame: {other}")),
        }
    }
}

/// Equatorial J2000 to galactic rotation.
pub const CELESTIAL_TO_GALACTIC: Mat3 = Mat3::from_rows([
    [-0.054_875_560_402_435_9, -0.873_437_090_247_923, -0.483_835_015_526_738_1],
    [0.494_109_427_943_568_1, -0.444_829_629_919_504_5, 0.746_982_244_476_370_7],
    [-0.867_666_148_981_161, -0.198_076_373_464_673_7, 0.455_983_776_232_537_2],
]);

pub fn celestial_to_galactic(c: LonLat) -> LonLat {
    rotate_lon_lat(c, |v| CELESTIAL_TO_GALACTIC.apply(v))
}

pub fn galactic_to_celestial(c: LonLat) -> LonLat {
    rotate_lon_lat(c, |v| CELESTIAL_TO_GALACTIC.apply_transpose(v))
}

/// Re-expresses a unit vector given in `from` in the `to` frame.
pub fn convert_vector(v: Vec3, from: SkyFrame, to: SkyFrame) -> Vec3 {
    match (from, to) {
        (SkyFrame::Celestial, SkyFrame::Galactic) => CELESTIAL_TO_GALACTIC.apply(v),
        (SkyFrame::Galactic, SkyFrame::Celestial) => CELESTIAL_TO_GALACTIC.apply_transpose(v),
        _ => v,
    }
}

pub fn convert(c: LonLat, from: SkyFrame, to: SkyFrame) -> LonLat {
    if from == to {
        return c;
    }
    rotate_lon_lat(c, |v| convert_vector(v, from, to))
}

fn rotate_lon_lat(c: LonLat, rotate: impl Fn(Vec3) -> Vec3) -> LonLat {
    let v = SpatialVector::from_lon_lat(c.lon, c.lat).as_vec3();
    SpatialVector::from_vec3(rotate(v)).lon_lat()
}

//! Sky-to-plane projections.
//!
//! A [`Projection`] first rotates the sphere so the view center sits on +x (east on +y,
//! north on +z), then applies the family's planar mapping. Plane coordinates are
//! `(east, north)` in projection units: one unit is one radian at the center for the
//! zenithal families.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{LonLat, Mat3, SpatialVector, Vec2, Vec3};

use std::f64::consts::{FRAC_PI_2, PI};

/// Slack on plane-domain boundary checks so points projected onto the edge map back.
const EDGE_TOLERANCE: f64 = 1e-12;

/// Off-axis distance below which a direction counts as the center or its antipode.
const AXIS_EPSILON: f64 = 1e-15;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionFamily {
    Gnomonic,
    Stereographic,
    #[default]
    Orthographic,
    ZenithalEqualArea,
    ZenithalEquidistant,
    Aitoff,
    Sinusoidal,
    Mercator,
    CylindricalEqualArea,
}

impl ProjectionFamily {
    pub const ALL: [ProjectionFamily; 9] = [
        ProjectionFamily::Gnomonic,
        ProjectionFamily::Stereographic,
        ProjectionFamily::Orthographic,
        ProjectionFamily::ZenithalEqualArea,
        ProjectionFamily::ZenithalEquidistant,
        ProjectionFamily::Aitoff,
        ProjectionFamily::Sinusoidal,
        ProjectionFamily::Mercator,
        ProjectionFamily::CylindricalEqualArea,
    ];

    /// Families that map the whole sphere and cut it along the meridian opposite the center.
    pub fn is_whole_sphere(self) -> bool {
        matches!(
            self,
            ProjectionFamily::Aitoff
                | ProjectionFamily::Sinusoidal
                | ProjectionFamily::Mercator
                | ProjectionFamily::CylindricalEqualArea
        )
    }

    /// FITS-style three letter code.
    pub fn code(self) -> &'static str {
        match self {
            ProjectionFamily::Gnomonic => "TAN",
            ProjectionFamily::Stereographic => "STG",
            ProjectionFamily::Orthographic => "SIN",
            ProjectionFamily::ZenithalEqualArea => "ZEA",
            ProjectionFamily::ZenithalEquidistant => "ARC",
            ProjectionFamily::Aitoff => "AIT",
            ProjectionFamily::Sinusoidal => "GLS",
            ProjectionFamily::Mercator => "MER",
            ProjectionFamily::CylindricalEqualArea => "CEA",
        }
    }

    /// Maps a direction already rotated into the center-on-+x frame.
    fn forward(self, u: Vec3) -> Option<Vec2> {
        match self {
            ProjectionFamily::Gnomonic => {
                if u.x <= 0.0 {
                    return None;
                }
                Some(Vec2::new(u.y / u.x, u.z / u.x))
            }
            ProjectionFamily::Stereographic => {
                let o = (1.0 + u.x) * 0.5;
                if o <= 0.0 {
                    return None;
                }
                Some(Vec2::new(u.y / o, u.z / o))
            }
            ProjectionFamily::Orthographic => {
                if u.x < 0.0 {
                    return None;
                }
                Some(Vec2::new(u.y, u.z))
            }
            ProjectionFamily::ZenithalEqualArea => {
                let rho = u.y.hypot(u.z);
                if rho <= AXIS_EPSILON {
                    return if u.x > 0.0 { Some(Vec2::default()) } else { None };
                }
                let k = 2.0 * (rho.atan2(u.x) * 0.5).sin() / rho;
                Some(Vec2::new(u.y * k, u.z * k))
            }
            ProjectionFamily::ZenithalEquidistant => {
                let r = u.y.hypot(u.z);
                if r <= AXIS_EPSILON {
                    return if u.x > 0.0 { Some(Vec2::default()) } else { None };
                }
                let k = r.atan2(u.x) / r;
                Some(Vec2::new(u.y * k, u.z * k))
            }
            ProjectionFamily::Aitoff => {
                // Hammer-Aitoff on the half longitude; the seam sits at +/-180.
                let (lon, _) = rotated_lon_lat(u);
                let r = u.x.hypot(u.y);
                let half = lon * 0.5;
                let w = ((1.0 + r * half.cos()) * 0.5).sqrt();
                if w <= 0.0 {
                    return None;
                }
                Some(Vec2::new(2.0 * r * half.sin() / w, u.z / w))
            }
            ProjectionFamily::Sinusoidal => {
                let (lon, lat) = rotated_lon_lat(u);
                Some(Vec2::new(lon * lat.cos(), lat))
            }
            ProjectionFamily::Mercator => {
                let r = u.x.hypot(u.y);
                if r == 0.0 || u.z.abs() >= 1.0 {
                    return None;
                }
                Some(Vec2::new(u.y.atan2(u.x), (u.z / r).asinh()))
            }
            ProjectionFamily::CylindricalEqualArea => {
                let (lon, _) = rotated_lon_lat(u);
                Some(Vec2::new(lon, u.z.clamp(-1.0, 1.0)))
            }
        }
    }

    /// Inverse of [`ProjectionFamily::forward`]; `None` outside the family's domain.
    fn inverse(self, p: Vec2) -> Option<Vec3> {
        let (x, y) = (p.x, p.y);
        let r2 = x * x + y * y;
        match self {
            ProjectionFamily::Gnomonic => {
                let s = 1.0 / (1.0 + r2).sqrt();
                Some(Vec3::new(s, x * s, y * s))
            }
            ProjectionFamily::Stereographic => {
                let o = r2 * 0.25;
                let s = 1.0 / (1.0 + o);
                Some(Vec3::new((1.0 - o) * s, x * s, y * s))
            }
            ProjectionFamily::Orthographic => {
                let d = 1.0 - r2;
                if d < -EDGE_TOLERANCE {
                    return None;
                }
                Some(Vec3::new(d.max(0.0).sqrt(), x, y))
            }
            ProjectionFamily::ZenithalEqualArea => {
                let rho = r2.sqrt();
                if rho > 2.0 * (1.0 + EDGE_TOLERANCE) {
                    return None;
                }
                if rho == 0.0 {
                    return Some(Vec3::new(1.0, 0.0, 0.0));
                }
                // Angle from the center; stays well conditioned up to the antipode.
                let t = 2.0 * (rho * 0.5).min(1.0).asin();
                let s = t.sin() / rho;
                Some(Vec3::new(t.cos(), x * s, y * s))
            }
            ProjectionFamily::ZenithalEquidistant => {
                let rho = r2.sqrt();
                if rho > PI {
                    return None;
                }
                if rho == 0.0 {
                    return Some(Vec3::new(1.0, 0.0, 0.0));
                }
                let s = rho.sin() / rho;
                Some(Vec3::new(rho.cos(), x * s, y * s))
            }
            ProjectionFamily::Aitoff => {
                if x * x / 8.0 + y * y / 2.0 > 1.0 + EDGE_TOLERANCE {
                    return None;
                }
                let z = (1.0 - x * x / 16.0 - y * y / 4.0).max(0.0).sqrt();
                let lon = 2.0 * (z * x).atan2(2.0 * (2.0 * z * z - 1.0));
                let lat = (z * y).clamp(-1.0, 1.0).asin();
                Some(from_rotated_lon_lat(lon, lat))
            }
            ProjectionFamily::Sinusoidal => {
                if y.abs() > FRAC_PI_2 {
                    return None;
                }
                let c = y.cos();
                let lon = if c <= 0.0 { 0.0 } else { x / c };
                if lon.abs() > PI * (1.0 + EDGE_TOLERANCE) {
                    return None;
                }
                Some(from_rotated_lon_lat(lon.clamp(-PI, PI), y))
            }
            ProjectionFamily::Mercator => {
                if x.abs() > PI {
                    return None;
                }
                let c = 1.0 / y.cosh();
                Some(Vec3::new(c * x.cos(), c * x.sin(), y.tanh()))
            }
            ProjectionFamily::CylindricalEqualArea => {
                if x.abs() > PI || y.abs() > 1.0 {
                    return None;
                }
                let c = ((1.0 - y) * (1.0 + y)).sqrt();
                Some(Vec3::new(c * x.cos(), c * x.sin(), y))
            }
        }
    }

    /// Plane distance from the center of a point `angle_deg` away along the equator.
    pub fn radius_at(self, angle_deg: f64) -> Option<f64> {
        let a = angle_deg.to_radians();
        self.forward(Vec3::new(a.cos(), a.sin(), 0.0))
            .map(|p| p.x)
            .filter(|r| r.is_finite() && *r > 0.0)
    }
}

impl fmt::Display for ProjectionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ProjectionFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let family = match s.trim().to_ascii_lowercase().as_str() {
            "tan" | "gnomonic" => ProjectionFamily::Gnomonic,
            "stg" | "stereographic" => ProjectionFamily::Stereographic,
            "sin" | "orthographic" => ProjectionFamily::Orthographic,
            "zea" | "zenithal_equal_area" | "lambert_azimuthal" => {
                ProjectionFamily::ZenithalEqualArea
            }
            "arc" | "zenithal_equidistant" => ProjectionFamily::ZenithalEquidistant,
            "ait" | "aitoff" | "hammer" => ProjectionFamily::Aitoff,
            "gls" | "sfl" | "sinusoidal" => ProjectionFamily::Sinusoidal,
            "mer" | "mercator" => ProjectionFamily::Mercator,
            "cea" | "cylindrical_equal_area" | "lambert" => ProjectionFamily::CylindricalEqualArea,
            other => return Err(format!("unknown projection: {other}")),
        };
        Ok(family)
    }
}

fn rotated_lon_lat(u: Vec3) -> (f64, f64) {
    let r = u.x.hypot(u.y);
    let lon = if r == 0.0 { 0.0 } else { u.y.atan2(u.x) };
    (lon, u.z.atan2(r))
}

fn from_rotated_lon_lat(lon: f64, lat: f64) -> Vec3 {
    let c = lat.cos();
    Vec3::new(c * lon.cos(), c * lon.sin(), lat.sin())
}

/// Family plus view center; maps sky directions to plane coordinates and back.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    family: ProjectionFamily,
    center: LonLat,
    rotation: Mat3,
}

impl Projection {
    pub fn new(family: ProjectionFamily, center: LonLat) -> Self {
        let center = center.normalized();
        Self {
            family,
            center,
            rotation: Mat3::center_on(center.lon, center.lat),
        }
    }

    pub fn family(&self) -> ProjectionFamily {
        self.family
    }

    pub fn center(&self) -> LonLat {
        self.center
    }

    pub fn set_family(&mut self, family: ProjectionFamily) {
        self.family = family;
    }

    pub fn set_center(&mut self, center: LonLat) {
        self.center = center.normalized();
        self.rotation = Mat3::center_on(self.center.lon, self.center.lat);
    }

    /// Projects `(lon, lat)` in degrees; `None` when not representable.
    pub fn project(&self, lon: f64, lat: f64) -> Option<Vec2> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
            return None;
        }
        self.project_vector(SpatialVector::from_lon_lat(lon, lat).as_vec3())
    }

    /// Projects a unit vector expressed in the same frame as the center.
    pub fn project_vector(&self, v: Vec3) -> Option<Vec2> {
        self.family
            .forward(self.rotation.apply(v))
            .filter(|p| p.is_finite())
    }

    /// Inverse projection to `(lon, lat)` in degrees.
    pub fn unproject(&self, x: f64, y: f64) -> Option<LonLat> {
        self.unproject_vector(Vec2::new(x, y))
            .map(|v| SpatialVector::from_vec3(v).lon_lat())
    }

    pub fn unproject_vector(&self, p: Vec2) -> Option<Vec3> {
        if !p.is_finite() {
            return None;
        }
        self.family
            .inverse(p)
            .map(|u| self.rotation.apply_transpose(u))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::angular_distance_deg;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn center_projects_to_origin_for_every_family() {
        for family in ProjectionFamily::ALL {
            let proj = Projection::new(family, LonLat::new(123.0, -31.0));
            let p = proj.project(123.0, -31.0).unwrap();
            assert_close(p.x, 0.0, 1e-12);
            assert_close(p.y, 0.0, 1e-12);
        }
    }

    /// Worst angular error (radians) of `unproject(project(p))` over a 1 degree grid,
    /// with the point it happened at; `inf` when `unproject` rejected a projected point.
    fn worst_roundtrip(proj: &Projection) -> (f64, (f64, f64)) {
        let mut worst = (0.0, (0.0, 0.0));
        for lon in 0..360 {
            for k in -90..90 {
                let (lon, lat) = (f64::from(lon), f64::from(k) + 0.5);
                let Some(p) = proj.project(lon, lat) else {
                    continue;
                };
                let err = match proj.unproject(p.x, p.y) {
                    Some(back) => angular_distance_deg(back, LonLat::new(lon, lat)).to_radians(),
                    None => f64::INFINITY,
                };
                if err > worst.0 {
                    worst = (err, (lon, lat));
                }
            }
        }
        worst
    }

    #[test]
    fn roundtrip_over_the_whole_sphere() {
        for center in [
            LonLat::new(40.0, 20.0),
            LonLat::new(123.0, -31.0),
            LonLat::new(300.0, 75.0),
        ] {
            for family in ProjectionFamily::ALL {
                let proj = Projection::new(family, center);
                let (err, at) = worst_roundtrip(&proj);
                assert!(err < 1e-9, "{family} centered on {center:?}: error {err} rad at {at:?}");
            }
        }
    }

    #[test]
    fn opposite_meridian_maps_back() {
        let center = LonLat::new(40.0, 20.0);
        for family in [ProjectionFamily::Aitoff, ProjectionFamily::Sinusoidal] {
            let proj = Projection::new(family, center);
            for lat in [64.5, 65.5, -30.0, 0.0] {
                let p = proj.project(220.0, lat).unwrap();
                let back = proj
                    .unproject(p.x, p.y)
                    .unwrap_or_else(|| panic!("{family} rejected the seam at lat {lat}"));
                let err = angular_distance_deg(back, LonLat::new(220.0, lat));
                assert!(err.to_radians() < 1e-9, "{family}: {back:?}");
            }
        }

        let zea = Projection::new(ProjectionFamily::ZenithalEqualArea, center);
        let p = zea.project(220.0, -20.5).unwrap();
        let back = zea.unproject(p.x, p.y).unwrap();
        assert!(angular_distance_deg(back, LonLat::new(220.0, -20.5)).to_radians() < 1e-9);
    }

    #[test]
    fn east_is_plus_x_and_north_is_plus_y() {
        let proj = Projection::new(ProjectionFamily::Gnomonic, LonLat::new(0.0, 0.0));
        let east = proj.project(5.0, 0.0).unwrap();
        let north = proj.project(0.0, 5.0).unwrap();
        assert!(east.x > 0.0 && east.y.abs() < 1e-12);
        assert!(north.y > 0.0 && north.x.abs() < 1e-12);
    }

    #[test]
    fn hemisphere_limited_families_reject_far_side() {
        let origin = LonLat::new(0.0, 0.0);
        let gnomonic = Projection::new(ProjectionFamily::Gnomonic, origin);
        assert!(gnomonic.project(90.0, 0.0).is_none());
        assert!(gnomonic.project(135.0, 0.0).is_none());

        let ortho = Projection::new(ProjectionFamily::Orthographic, origin);
        assert!(ortho.project(120.0, 10.0).is_none());
        assert!(ortho.project(89.0, 0.0).is_some());
    }

    #[test]
    fn antipode_is_rejected_where_singular() {
        let origin = LonLat::new(0.0, 0.0);
        for family in [
            ProjectionFamily::Stereographic,
            ProjectionFamily::ZenithalEqualArea,
            ProjectionFamily::ZenithalEquidistant,
        ] {
            let proj = Projection::new(family, origin);
            assert!(proj.project(180.0, 0.0).is_none(), "{family}");
        }
    }

    #[test]
    fn inverse_rejects_points_outside_the_domain() {
        let origin = LonLat::new(0.0, 0.0);
        let cases = [
            (ProjectionFamily::Orthographic, 0.8, 0.8),
            (ProjectionFamily::ZenithalEqualArea, 2.1, 0.0),
            (ProjectionFamily::ZenithalEquidistant, 3.2, 0.0),
            (ProjectionFamily::Aitoff, 2.9, 0.0),
            (ProjectionFamily::Aitoff, 0.0, 1.5),
            (ProjectionFamily::Sinusoidal, 0.0, 1.6),
            (ProjectionFamily::Sinusoidal, 3.2, 0.0),
            (ProjectionFamily::Mercator, 3.2, 0.0),
            (ProjectionFamily::CylindricalEqualArea, 0.0, 1.1),
        ];
        for (family, x, y) in cases {
            let proj = Projection::new(family, origin);
            assert!(proj.unproject(x, y).is_none(), "{family} accepted ({x}, {y})");
        }
    }

    #[test]
    fn whole_sphere_families_map_the_back_side() {
        let proj = Projection::new(ProjectionFamily::Aitoff, LonLat::new(0.0, 0.0));
        let p = proj.project(170.0, 10.0).unwrap();
        assert!(p.x > 2.0);
        assert!(ProjectionFamily::Aitoff.is_whole_sphere());
        assert!(!ProjectionFamily::Gnomonic.is_whole_sphere());
    }

    #[test]
    fn radius_at_grows_with_angle() {
        for family in ProjectionFamily::ALL {
            let near = family.radius_at(10.0).unwrap();
            let far = family.radius_at(40.0).unwrap();
            assert!(far > near, "{family}");
        }
        assert!(ProjectionFamily::Gnomonic.radius_at(100.0).is_none());
    }

    #[test]
    fn parses_codes_and_names() {
        assert_eq!("AIT".parse::<ProjectionFamily>(), Ok(ProjectionFamily::Aitoff));
        assert_eq!("mercator".parse::<ProjectionFamily>(), Ok(ProjectionFamily::Mercator));
        assert_eq!(
            ProjectionFamily::ZenithalEqualArea.code().parse::<ProjectionFamily>(),
            Ok(ProjectionFamily::ZenithalEqualArea)
        );
        assert!("hammer-time".parse::<ProjectionFamily>().is_err());
    }
}

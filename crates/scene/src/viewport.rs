//! View state and navigation.
//!
//! Screen coordinates are pixels with the origin top-left. The view center maps to the
//! canvas center; east is drawn to the left and north up, as on the sky.

use foundation::math::{
    self, LonLat, Projection, ProjectionFamily, SkyFrame, Vec2, Vec3, clamp_lat_deg, wrap_lon_deg,
};
use serde::{Deserialize, Serialize};
use sphere::{MAX_ORDER, nside_to_order, recommended_nside};
use tracing::debug;

/// Each zoom level shrinks the field of view by this factor.
pub const ZOOM_BASE: f64 = 1.15;
pub const MAX_ZOOM_LEVEL: f64 = 60.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum NavigationState {
    #[default]
    Idle,
    Panning,
    Zooming,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
    /// Pixel width of one tile image.
    pub tile_width: u32,
    /// Above this field of view (degrees) every cell is a candidate.
    pub whole_sky_fov_deg: f64,
    pub projection: ProjectionFamily,
    pub frame: SkyFrame,
    /// Initial center, equatorial J2000 degrees.
    pub center: LonLat,
    pub zoom_level: f64,
    pub min_fov_deg: Option<f64>,
    pub max_fov_deg: Option<f64>,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            tile_width: 512,
            whole_sky_fov_deg: 80.0,
            projection: ProjectionFamily::default(),
            frame: SkyFrame::default(),
            center: LonLat::default(),
            zoom_level: 0.0,
            min_fov_deg: None,
            max_fov_deg: None,
        }
    }
}

/// Orders an imagery source can serve.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OrderRange {
    pub min: Option<u8>,
    pub max: u8,
}

impl Default for OrderRange {
    fn default() -> Self {
        Self {
            min: None,
            max: MAX_ORDER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Viewport {
    config: ViewportConfig,
    projection: Projection,
    frame: SkyFrame,
    zoom_level: f64,
    zoom_factor: f64,
    state: NavigationState,
    drag_anchor: Option<Vec2>,
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Self {
        let frame = config.frame;
        let center = math::convert(config.center, SkyFrame::Celestial, frame);
        let mut viewport = Self {
            projection: Projection::new(config.projection, center),
            frame,
            zoom_level: 0.0,
            zoom_factor: 1.0,
            state: NavigationState::Idle,
            drag_anchor: None,
            config,
        };
        viewport.config.width = viewport.config.width.max(1);
        viewport.config.height = viewport.config.height.max(1);
        let level = viewport.clamp_level(viewport.config.zoom_level);
        viewport.apply_zoom_level(level);
        viewport
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn width(&self) -> f64 {
        f64::from(self.config.width)
    }

    pub fn height(&self) -> f64 {
        f64::from(self.config.height)
    }

    pub fn largest_dim(&self) -> f64 {
        self.width().max(self.height())
    }

    /// Long side over short side, never below 1.
    pub fn aspect(&self) -> f64 {
        self.largest_dim() / self.width().min(self.height())
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn family(&self) -> ProjectionFamily {
        self.projection.family()
    }

    pub fn frame(&self) -> SkyFrame {
        self.frame
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    /// View center in the view frame.
    pub fn center(&self) -> LonLat {
        self.projection.center()
    }

    pub fn center_in(&self, frame: SkyFrame) -> LonLat {
        math::convert(self.center(), self.frame, frame)
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    /// Field of view across the largest canvas dimension, degrees.
    pub fn fov(&self) -> f64 {
        fov_for_level(self.zoom_level)
    }

    /// Screen pixels per projection-plane unit.
    pub fn pixel_scale(&self) -> f64 {
        self.largest_dim() * 0.5 * self.zoom_factor
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
    }

    /// Centers the view on equatorial J2000 `(lon, lat)` degrees.
    pub fn point_to(&mut self, lon: f64, lat: f64) {
        let target = math::convert(LonLat::new(lon, lat), SkyFrame::Celestial, self.frame);
        self.set_center(target);
    }

    /// Centers the view on a position given in the view frame.
    pub fn set_center(&mut self, center: LonLat) {
        if !center.is_finite() {
            debug!(?center, "ignoring non-finite view center");
            return;
        }
        self.projection.set_center(center);
    }

    /// Shifts the center by degree deltas; latitude clamps at the poles.
    pub fn pan_by(&mut self, dlon: f64, dlat: f64) {
        let c = self.center();
        let next = LonLat::new(wrap_lon_deg(c.lon + dlon), clamp_lat_deg(c.lat + dlat));
        self.set_center(next);
    }

    pub fn begin_drag(&mut self, at: Vec2) {
        self.state = NavigationState::Panning;
        self.drag_anchor = Some(at);
    }

    /// Moves the sky under the pointer from the previous drag position to `to`.
    /// Returns whether the center changed.
    pub fn drag_to(&mut self, to: Vec2) -> bool {
        if self.state != NavigationState::Panning {
            return false;
        }
        let Some(from) = self.drag_anchor.replace(to) else {
            return false;
        };
        let (Some(a), Some(b)) = (self.screen_to_world(from), self.screen_to_world(to)) else {
            return false;
        };
        let dlon = (a.lon - b.lon + 540.0).rem_euclid(360.0) - 180.0;
        let dlat = a.lat - b.lat;
        if dlon == 0.0 && dlat == 0.0 {
            return false;
        }
        self.pan_by(dlon, dlat);
        true
    }

    pub fn end_drag(&mut self) {
        if self.state == NavigationState::Panning {
            self.state = NavigationState::Idle;
        }
        self.drag_anchor = None;
    }

    pub fn begin_zoom(&mut self) {
        self.drag_anchor = None;
        self.state = NavigationState::Zooming;
    }

    pub fn end_zoom(&mut self) {
        if self.state == NavigationState::Zooming {
            self.state = NavigationState::Idle;
        }
    }

    pub fn min_zoom_level(&self) -> f64 {
        min_level_for(self.family())
    }

    /// Sets the zoom level, clamped to the family's range.
    ///
    /// Rejected when the resulting field of view leaves the configured FOV bounds.
    pub fn set_zoom_level(&mut self, level: f64) -> bool {
        if !level.is_finite() {
            return false;
        }
        let level = self.clamp_level(level);
        let fov = fov_for_level(level);
        let too_narrow = self.config.min_fov_deg.is_some_and(|min| fov < min);
        let too_wide = self.config.max_fov_deg.is_some_and(|max| fov > max);
        if too_narrow || too_wide {
            debug!(level, fov, "zoom rejected by fov bounds");
            return false;
        }
        self.apply_zoom_level(level);
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom_level(self.zoom_level + 1.0)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom_level(self.zoom_level - 1.0)
    }

    /// Zooms so the largest dimension spans `fov_deg`. Ignored outside `(0, 180]`.
    pub fn set_fov(&mut self, fov_deg: f64) -> bool {
        if !(fov_deg > 0.0 && fov_deg <= 180.0) {
            return false;
        }
        self.set_zoom_level((180.0 / fov_deg).ln() / ZOOM_BASE.ln())
    }

    pub fn set_projection(&mut self, family: ProjectionFamily) {
        self.projection.set_family(family);
        let level = self.clamp_level(self.zoom_level);
        self.apply_zoom_level(level);
    }

    /// Switches the view frame, keeping the same sky under the center.
    pub fn set_frame(&mut self, frame: SkyFrame) {
        if frame == self.frame {
            return;
        }
        let center = math::convert(self.center(), self.frame, frame);
        self.frame = frame;
        self.projection.set_center(center);
    }

    fn clamp_level(&self, level: f64) -> f64 {
        level.clamp(self.min_zoom_level(), MAX_ZOOM_LEVEL)
    }

    fn apply_zoom_level(&mut self, level: f64) {
        self.zoom_level = level;
        self.zoom_factor = zoom_factor_for(self.family(), level);
    }

    pub fn plane_to_screen(&self, p: Vec2) -> Vec2 {
        let s = self.pixel_scale();
        Vec2::new(self.width() * 0.5 - s * p.x, self.height() * 0.5 - s * p.y)
    }

    pub fn screen_to_plane(&self, px: Vec2) -> Vec2 {
        let s = self.pixel_scale();
        Vec2::new(
            (self.width() * 0.5 - px.x) / s,
            (self.height() * 0.5 - px.y) / s,
        )
    }

    /// Sky position (view frame) under a screen pixel.
    pub fn screen_to_world(&self, px: Vec2) -> Option<LonLat> {
        let p = self.screen_to_plane(px);
        self.projection.unproject(p.x, p.y)
    }

    /// Screen pixel of a view-frame position.
    pub fn world_to_screen(&self, at: LonLat) -> Option<Vec2> {
        self.projection
            .project(at.lon, at.lat)
            .map(|p| self.plane_to_screen(p))
    }

    /// Screen pixel of a unit vector given in the view frame.
    pub fn vector_to_screen(&self, v: Vec3) -> Option<Vec2> {
        self.projection
            .project_vector(v)
            .map(|p| self.plane_to_screen(p))
    }

    /// Order whose tile pixels best match screen pixels at the current zoom.
    pub fn working_order(&self, range: &OrderRange) -> u8 {
        let fov = self.fov();
        let cell_arcsec = 3600.0 * f64::from(self.config.tile_width) * fov / self.largest_dim();
        let nside = recommended_nside(cell_arcsec);
        let mut order = nside_to_order(nside).unwrap_or(MAX_ORDER).max(1);
        if fov <= 50.0 && order <= 2 {
            order = 3;
        }
        if order <= 2
            && let Some(min) = range.min
        {
            order = order.max(min);
        }
        order.min(range.max).min(MAX_ORDER)
    }
}

pub fn fov_for_level(level: f64) -> f64 {
    if level > 0.0 {
        180.0 / ZOOM_BASE.powf(level)
    } else {
        180.0
    }
}

fn min_level_for(family: ProjectionFamily) -> f64 {
    if family == ProjectionFamily::Orthographic {
        -2.0
    } else {
        -7.0
    }
}

/// Scale that puts a point `fov/2` from the center on the edge of the largest dimension.
fn zoom_factor_for(family: ProjectionFamily, level: f64) -> f64 {
    if level > 0.0 {
        family
            .radius_at(fov_for_level(level) * 0.5)
            .map_or(1.0, |r| 1.0 / r)
    } else {
        1.0 + 0.1 * level
    }
}

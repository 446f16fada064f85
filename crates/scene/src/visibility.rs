//! Which cells of an order cover the canvas, and where their corners land.

use foundation::bounds::Aabb2;
use foundation::math::{self, SkyFrame, SpatialVector, Vec2};
use sphere::{Cell, MAX_ORDER, SphereIndex};
use tracing::{debug, trace};

use crate::Viewport;

/// A cell with its corners in screen pixels, ordered north, west, south, east.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VisibleCell {
    pub cell: Cell,
    pub corners: [Vec2; 4],
}

impl VisibleCell {
    pub fn centroid(&self) -> Vec2 {
        let sum = self
            .corners
            .iter()
            .fold(Vec2::default(), |acc, c| acc + *c);
        sum * 0.25
    }
}

impl Viewport {
    /// Cells of `order` (laid out in `frame`) that may cover the canvas.
    ///
    /// Above the whole-sky threshold this is every cell. Otherwise it is a padded disc
    /// around the view center, with the center's own cell first.
    pub fn candidate_cells(&self, order: u8, frame: SkyFrame) -> Vec<Cell> {
        let order = order.min(MAX_ORDER);
        let Ok(index) = SphereIndex::from_order(order) else {
            return Vec::new();
        };
        let fov = self.fov();
        if fov > self.config().whole_sky_fov_deg {
            return (0..index.npix()).map(|id| Cell::new(order, id)).collect();
        }

        let center = self.center_in(frame);
        let center = SpatialVector::from_lon_lat(center.lon, center.lat);
        let center_id = index.vector_to_cell(&center);

        let scale = if fov > 60.0 {
            1.6
        } else if fov > 12.0 {
            1.45
        } else {
            1.1
        };
        let radius = (0.5 * fov * self.aspect() * scale)
            .to_radians()
            .min(std::f64::consts::PI);
        let ids = match index.query_disc(&center, radius, true, true) {
            Ok(ids) => ids,
            Err(err) => {
                debug!(%err, order, "disc query failed, using the center cell only");
                Vec::new()
            }
        };

        let mut cells = Vec::with_capacity(ids.len() + 1);
        cells.push(Cell::new(order, center_id));
        cells.extend(
            ids.into_iter()
                .filter(|&id| id != center_id)
                .map(|id| Cell::new(order, id)),
        );
        cells
    }

    /// Screen corners of `cell`, or `None` if any corner is not representable.
    pub fn project_cell(&self, cell: Cell, frame: SkyFrame) -> Option<[Vec2; 4]> {
        let index = SphereIndex::from_order(cell.order).ok()?;
        let quad = index.cell_quad(cell.id).ok()?;
        let mut corners = [Vec2::default(); 4];
        for (slot, v) in corners.iter_mut().zip(quad.iter()) {
            let in_view = math::convert_vector(v.as_vec3(), frame, self.frame());
            *slot = self.vector_to_screen(in_view)?;
        }
        Some(corners)
    }

    /// Candidate cells whose projected quads actually land on the canvas.
    ///
    /// For whole-sphere families, quads stretched across the projection's seam are
    /// dropped.
    pub fn visible_cells(&self, order: u8, frame: SkyFrame) -> Vec<VisibleCell> {
        let canvas = Aabb2::from_size(self.width(), self.height());
        let seam = self
            .family()
            .is_whole_sphere()
            .then(|| self.seam_threshold(order));

        let candidates = self.candidate_cells(order, frame);
        let total = candidates.len();
        let visible: Vec<VisibleCell> = candidates
            .into_iter()
            .filter_map(|cell| {
                let corners = self.project_cell(cell, frame)?;
                let bounds = Aabb2::from_points(&corners)?;
                if !bounds.overlaps(&canvas) {
                    return None;
                }
                if let Some(limit) = seam {
                    let d1 = corners[0].distance(corners[2]);
                    let d2 = corners[1].distance(corners[3]);
                    if d1 > limit || d2 > limit {
                        trace!(%cell, d1, d2, "cell straddles the projection seam");
                        return None;
                    }
                }
                Some(VisibleCell { cell, corners })
            })
            .collect();
        trace!(order, total, visible = visible.len(), "visible cells");
        visible
    }

    /// Longest quad diagonal (px) accepted before a cell counts as torn by the seam.
    fn seam_threshold(&self, order: u8) -> f64 {
        let cell_rad = (4.0 * std::f64::consts::PI / sphere::cells_at_order(order) as f64).sqrt();
        let nominal = cell_rad * self.pixel_scale();
        (self.largest_dim() / 5.0).max(4.0 * std::f64::consts::SQRT_2 * nominal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ViewportConfig;
    use foundation::math::{LonLat, ProjectionFamily, angular_distance_deg};
    use pretty_assertions::assert_eq;

    fn viewport(family: ProjectionFamily) -> Viewport {
        Viewport::new(ViewportConfig {
            projection: family,
            ..ViewportConfig::default()
        })
    }

    #[test]
    fn wide_field_covers_the_whole_sky() {
        let vp = viewport(ProjectionFamily::Orthographic);
        assert!(vp.fov() > 80.0);
        let cells = vp.candidate_cells(3, SkyFrame::Celestial);
        assert_eq!(cells.len(), 768);
        assert_eq!(cells[767], Cell::new(3, 767));
    }

    #[test]
    fn narrow_field_is_a_small_neighbourhood_of_the_center() {
        let mut vp = viewport(ProjectionFamily::Orthographic);
        vp.point_to(0.0, 0.0);
        vp.set_fov(5.0);

        let index = SphereIndex::from_order(3).unwrap();
        let center_id = index.vector_to_cell(&SpatialVector::from_lon_lat(0.0, 0.0));
        let cells = vp.candidate_cells(3, SkyFrame::Celestial);
        assert!(cells.len() < 768);
        assert_eq!(cells[0], Cell::new(3, center_id));

        // Everything returned is near the center.
        let reach = (0.5 * 5.0 * vp.aspect() * 1.1) + 2.0 * index.max_pixel_radius().to_degrees();
        for cell in &cells {
            let c = index.cell_to_vector(cell.id).unwrap().lon_lat();
            assert!(angular_distance_deg(c, LonLat::new(0.0, 0.0)) <= reach, "{cell}");
        }

        let visible = vp.visible_cells(3, SkyFrame::Celestial);
        assert!(!visible.is_empty());
        assert!(visible.len() <= cells.len());
        assert!(visible.iter().any(|v| v.cell.id == center_id));
    }

    #[test]
    fn visible_quads_overlap_the_canvas() {
        let mut vp = viewport(ProjectionFamily::Gnomonic);
        vp.point_to(120.0, 35.0);
        vp.set_fov(30.0);
        let canvas = Aabb2::from_size(vp.width(), vp.height());
        let visible = vp.visible_cells(4, SkyFrame::Celestial);
        assert!(!visible.is_empty());
        for v in &visible {
            assert!(Aabb2::from_points(&v.corners).unwrap().overlaps(&canvas));
        }
    }

    #[test]
    fn hemisphere_projection_drops_the_far_side() {
        let vp = viewport(ProjectionFamily::Orthographic);
        let visible = vp.visible_cells(3, SkyFrame::Celestial);
        // Only cells fully on the near hemisphere project.
        assert!(visible.len() < 768 / 2);
        assert!(visible.len() > 768 / 4);
    }

    #[test]
    fn aitoff_drops_cells_torn_by_the_seam() {
        let mut vp = viewport(ProjectionFamily::Aitoff);
        vp.set_zoom_level(-7.0);
        let visible = vp.visible_cells(3, SkyFrame::Celestial);
        assert!(visible.len() < 768);
        assert!(visible.len() > 600);
        let limit = vp.seam_threshold(3);
        for v in &visible {
            assert!(v.corners[1].distance(v.corners[3]) <= limit);
        }
    }

    #[test]
    fn galactic_cells_are_placed_through_the_frame_rotation() {
        let mut vp = viewport(ProjectionFamily::Gnomonic);
        // Galactic center, viewed in equatorial coordinates.
        vp.point_to(266.405, -28.936);
        vp.set_fov(10.0);
        let here = vp.center_in(SkyFrame::Galactic);
        assert!(angular_distance_deg(here, LonLat::new(0.0, 0.0)) < 0.1);

        let index = SphereIndex::from_order(5).unwrap();
        let gc = index.vector_to_cell(&SpatialVector::from_lon_lat(here.lon, here.lat));
        let cells = vp.candidate_cells(5, SkyFrame::Galactic);
        assert_eq!(cells[0], Cell::new(5, gc));

        // The cell under the view center lands in the middle of the canvas.
        let quad = vp.project_cell(Cell::new(5, gc), SkyFrame::Galactic).unwrap();
        let mid = VisibleCell { cell: Cell::new(5, gc), corners: quad }.centroid();
        assert!(mid.distance(Vec2::new(512.0, 384.0)) < 200.0, "{mid:?}");
    }
}

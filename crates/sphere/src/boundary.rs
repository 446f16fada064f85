use std::f64::consts::FRAC_PI_2;

use foundation::math::SpatialVector;

use crate::index::{JPLL, JRLL};
use crate::{IndexError, SphereIndex};

impl SphereIndex {
    /// Points along the boundary of `cell`, `4 * step` in total.
    ///
    /// Edges are walked from the northern corner through the western, southern and
    /// eastern corners; with `step == 1` the result is exactly those four corners.
    pub fn cell_corners(&self, cell: u64, step: u32) -> Result<Vec<SpatialVector>, IndexError> {
        self.check_cell(cell)?;
        let step = step.max(1);
        let (ix, iy, face) = self.cell_to_xyf(cell);
        let n = self.nside as f64;
        let dc = 0.5 / n;
        let xc = (ix as f64 + 0.5) / n;
        let yc = (iy as f64 + 0.5) / n;
        let d = 1.0 / (f64::from(step) * n);

        let mut out = Vec::with_capacity(4 * step as usize);
        for i in 0..step {
            let t = f64::from(i) * d;
            out.push(face_to_vector(xc + dc - t, yc + dc, face));
        }
        for i in 0..step {
            let t = f64::from(i) * d;
            out.push(face_to_vector(xc - dc, yc + dc - t, face));
        }
        for i in 0..step {
            let t = f64::from(i) * d;
            out.push(face_to_vector(xc - dc + t, yc - dc, face));
        }
        for i in 0..step {
            let t = f64::from(i) * d;
            out.push(face_to_vector(xc + dc, yc - dc + t, face));
        }
        Ok(out)
    }

    /// The four corners, in [`SphereIndex::cell_corners`] order.
    pub fn cell_quad(&self, cell: u64) -> Result<[SpatialVector; 4], IndexError> {
        self.cell_corners(cell, 1)?
            .try_into()
            .map_err(|_| IndexError::CellOutOfRange { cell, npix: self.npix })
    }
}

/// Continuous face-local coordinates `(x, y)` in [0, 1]^2 to a direction.
fn face_to_vector(x: f64, y: f64, face: usize) -> SpatialVector {
    let jr = JRLL[face] as f64 - x - y;
    let (nr, z) = if jr < 1.0 {
        let nr = jr;
        (nr, 1.0 - nr * nr / 3.0)
    } else if jr > 3.0 {
        let nr = 4.0 - jr;
        (nr, nr * nr / 3.0 - 1.0)
    } else {
        (1.0, (2.0 - jr) * 2.0 / 3.0)
    };

    let mut tmp = JPLL[face] as f64 * nr + x - y;
    if tmp < 0.0 {
        tmp += 8.0;
    }
    if tmp >= 8.0 {
        tmp -= 8.0;
    }
    let phi = if nr < 1e-15 {
        0.0
    } else {
        0.5 * FRAC_PI_2 * tmp / nr
    };
    SpatialVector::from_z_phi(z, phi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_surround_the_center() {
        let index = SphereIndex::from_order(3).unwrap();
        let limit = index.max_pixel_radius() + 1e-12;
        for cell in (0..index.npix()).step_by(7) {
            let center = index.cell_to_vector(cell).unwrap();
            let corners = index.cell_corners(cell, 1).unwrap();
            assert_eq!(corners.len(), 4);
            for c in &corners {
                let d = c.angle_to(&center);
                assert!(d > 0.0 && d <= limit, "cell {cell}: corner at {d}");
            }
        }
    }

    #[test]
    fn step_subdivides_each_edge() {
        let index = SphereIndex::from_order(2).unwrap();
        let coarse = index.cell_corners(17, 1).unwrap();
        let fine = index.cell_corners(17, 3).unwrap();
        assert_eq!(fine.len(), 12);
        for k in 0..4 {
            let a = &coarse[k];
            let b = &fine[3 * k];
            assert!(a.angle_to(b) < 1e-12);
        }
    }

    #[test]
    fn northern_corner_is_northernmost() {
        let index = SphereIndex::from_order(1).unwrap();
        for cell in 0..index.npix() {
            let [north, west, south, east] = index.cell_quad(cell).unwrap();
            assert!(north.z() >= west.z() - 1e-12);
            assert!(north.z() >= east.z() - 1e-12);
            assert!(south.z() <= west.z() + 1e-12);
            assert!(south.z() <= east.z() + 1e-12);
        }
    }

    #[test]
    fn adjacent_children_share_a_corner() {
        let index = SphereIndex::from_order(4).unwrap();
        let parent = SphereIndex::from_order(3).unwrap();
        let [pn, ..] = parent.cell_quad(100).unwrap();
        // The child with both bits set holds the parent's northern corner.
        let [cn, ..] = index.cell_quad(4 * 100 + 3).unwrap();
        assert!(pn.angle_to(&cn) < 1e-12);
    }

    #[test]
    fn out_of_range_cell_fails() {
        let index = SphereIndex::from_order(0).unwrap();
        assert!(index.cell_corners(12, 1).is_err());
    }
}

use std::f64::consts::{FRAC_2_PI, FRAC_PI_2, PI, TAU};

use foundation::math::SpatialVector;

use crate::bits;
use crate::{IndexError, MAX_ORDER, nside_to_order, order_to_nside};

/// Ring offset of each base face's northern corner, in units of `nside`.
pub(crate) const JRLL: [i64; 12] = [2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];
/// Longitude offset of each base face's center, in units of `pi / 4`.
pub(crate) const JPLL: [i64; 12] = [1, 3, 5, 7, 0, 2, 4, 6, 1, 3, 5, 7];

pub(crate) const TWO_THIRDS: f64 = 2.0 / 3.0;

/// Cell numbering schemes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Scheme {
    /// Hierarchical: children of `p` are `4p..4p+4`.
    Nested,
    /// Iso-latitude rings from north to south, west to east within a ring.
    Ring,
}

/// Index for one resolution level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereIndex {
    pub(crate) nside: i64,
    pub(crate) order: u8,
    pub(crate) npface: u64,
    pub(crate) npix: u64,
    pub(crate) ncap: i64,
    pub(crate) fact1: f64,
    pub(crate) fact2: f64,
}

impl SphereIndex {
    pub fn new(nside: u32) -> Result<Self, IndexError> {
        let order = nside_to_order(nside).ok_or(IndexError::InvalidNside(nside))?;
        Ok(Self::with_order(order))
    }

    pub fn from_order(order: u8) -> Result<Self, IndexError> {
        if order > MAX_ORDER {
            return Err(IndexError::OrderTooLarge(order));
        }
        Ok(Self::with_order(order))
    }

    fn with_order(order: u8) -> Self {
        let nside = i64::from(order_to_nside(order));
        let npface = (nside * nside) as u64;
        let npix = 12 * npface;
        let fact2 = 4.0 / npix as f64;
        Self {
            nside,
            order,
            npface,
            npix,
            ncap: 2 * nside * (nside - 1),
            fact1: (2 * nside) as f64 * fact2,
            fact2,
        }
    }

    pub fn nside(&self) -> u32 {
        self.nside as u32
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    pub fn npix(&self) -> u64 {
        self.npix
    }

    pub fn check_cell(&self, cell: u64) -> Result<(), IndexError> {
        if cell >= self.npix {
            return Err(IndexError::CellOutOfRange {
                cell,
                npix: self.npix,
            });
        }
        Ok(())
    }

    /// Nested id of the cell containing colatitude `theta` in [0, pi] and longitude
    /// `phi` in [0, 2pi), both radians.
    pub fn angle_to_cell(&self, theta: f64, phi: f64) -> Result<u64, IndexError> {
        if !(0.0..=PI).contains(&theta) {
            return Err(IndexError::ThetaOutOfRange(theta));
        }
        if !(0.0..TAU).contains(&phi) {
            return Err(IndexError::PhiOutOfRange(phi));
        }
        Ok(self.loc_to_cell(theta.cos(), phi))
    }

    /// Center of `cell` as `(theta, phi)` in radians.
    pub fn cell_to_angle(&self, cell: u64) -> Result<(f64, f64), IndexError> {
        self.check_cell(cell)?;
        let (z, phi) = self.cell_to_z_phi(cell);
        Ok((z.clamp(-1.0, 1.0).acos(), phi))
    }

    pub fn vector_to_cell(&self, v: &SpatialVector) -> u64 {
        let len = v.as_vec3().length();
        let z = if len > 0.0 { v.z() / len } else { 1.0 };
        self.loc_to_cell(z.clamp(-1.0, 1.0), v.y().atan2(v.x()))
    }

    pub fn cell_to_vector(&self, cell: u64) -> Result<SpatialVector, IndexError> {
        self.check_cell(cell)?;
        let (z, phi) = self.cell_to_z_phi(cell);
        Ok(SpatialVector::from_z_phi(z, phi))
    }

    pub fn nest_to_ring(&self, cell: u64) -> Result<u64, IndexError> {
        self.check_cell(cell)?;
        let (ix, iy, face) = self.cell_to_xyf(cell);
        Ok(self.xyf_to_ring(ix, iy, face))
    }

    pub fn ring_to_nest(&self, cell: u64) -> Result<u64, IndexError> {
        self.check_cell(cell)?;
        let (ix, iy, face) = self.ring_to_xyf(cell as i64);
        Ok(self.xyf_to_cell(ix, iy, face))
    }

    pub fn convert(&self, cell: u64, from: Scheme, to: Scheme) -> Result<u64, IndexError> {
        match (from, to) {
            (Scheme::Nested, Scheme::Ring) => self.nest_to_ring(cell),
            (Scheme::Ring, Scheme::Nested) => self.ring_to_nest(cell),
            _ => self.check_cell(cell).map(|()| cell),
        }
    }

    /// Upper bound, in radians, on the distance from any cell center to its corners.
    pub fn max_pixel_radius(&self) -> f64 {
        let n = self.nside as f64;
        let va = SpatialVector::from_z_phi(TWO_THIRDS, PI / (4.0 * n));
        let t1 = (1.0 - 1.0 / n).powi(2);
        let vb = SpatialVector::from_z_phi(1.0 - t1 / 3.0, 0.0);
        va.angle_to(&vb)
    }

    /// `z = cos(theta)`, any `phi`.
    pub(crate) fn loc_to_cell(&self, z: f64, phi: f64) -> u64 {
        let nside = self.nside;
        let za = z.abs();
        let mut tt = (phi * FRAC_2_PI).rem_euclid(4.0);
        if tt >= 4.0 {
            tt = 0.0;
        }

        if za <= TWO_THIRDS {
            let temp1 = nside as f64 * (0.5 + tt);
            let temp2 = nside as f64 * (z * 0.75);
            let jp = (temp1 - temp2) as i64;
            let jm = (temp1 + temp2) as i64;
            let ifp = jp >> self.order;
            let ifm = jm >> self.order;
            let face = if ifp == ifm {
                ifp | 4
            } else if ifp < ifm {
                ifp
            } else {
                ifm + 8
            };
            let ix = jm & (nside - 1);
            let iy = nside - (jp & (nside - 1)) - 1;
            self.xyf_to_cell(ix, iy, face as usize)
        } else {
            let ntt = (tt as i64).min(3);
            let tp = tt - ntt as f64;
            let tmp = nside as f64 * (3.0 * (1.0 - za)).sqrt();
            let jp = ((tp * tmp) as i64).min(nside - 1);
            let jm = (((1.0 - tp) * tmp) as i64).min(nside - 1);
            if z >= 0.0 {
                self.xyf_to_cell(nside - jm - 1, nside - jp - 1, ntt as usize)
            } else {
                self.xyf_to_cell(jp, jm, (ntt + 8) as usize)
            }
        }
    }

    pub(crate) fn cell_to_z_phi(&self, cell: u64) -> (f64, f64) {
        let (ix, iy, face) = self.cell_to_xyf(cell);
        let nside = self.nside;
        let jr = (JRLL[face] << self.order) - ix - iy - 1;

        let (nr, z) = if jr < nside {
            (jr, 1.0 - (jr * jr) as f64 * self.fact2)
        } else if jr > 3 * nside {
            let nr = 4 * nside - jr;
            (nr, (nr * nr) as f64 * self.fact2 - 1.0)
        } else {
            (nside, (2 * nside - jr) as f64 * self.fact1)
        };

        let mut tmp = JPLL[face] * nr + ix - iy;
        if tmp < 0 {
            tmp += 8 * nr;
        }
        let phi = 0.5 * FRAC_PI_2 * tmp as f64 / nr as f64;
        (z, phi)
    }

    pub(crate) fn cell_to_xyf(&self, cell: u64) -> (i64, i64, usize) {
        let face = (cell >> (2 * u32::from(self.order))) as usize;
        let (ix, iy) = bits::deinterleave(cell & (self.npface - 1));
        (i64::from(ix), i64::from(iy), face)
    }

    pub(crate) fn xyf_to_cell(&self, ix: i64, iy: i64, face: usize) -> u64 {
        ((face as u64) << (2 * u32::from(self.order))) + bits::interleave(ix as u32, iy as u32)
    }
}

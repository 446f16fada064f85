//! Iso-latitude ring bookkeeping shared by scheme conversion and disc queries.

use crate::index::{JPLL, JRLL, SphereIndex, TWO_THIRDS};

/// First cell, cell count and half-cell phase of one ring.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct RingInfo {
    pub start: i64,
    pub count: i64,
    pub shifted: bool,
}

fn isqrt(v: i64) -> i64 {
    let mut r = (v as f64).sqrt() as i64;
    while r * r > v {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= v {
        r += 1;
    }
    r
}

impl SphereIndex {
    /// Rings are numbered `1 ..= 4 * nside - 1` from north to south.
    pub(crate) fn ring_info(&self, ring: i64) -> RingInfo {
        let nside = self.nside;
        if ring < nside {
            RingInfo {
                start: 2 * ring * (ring - 1),
                count: 4 * ring,
                shifted: true,
            }
        } else if ring < 3 * nside {
            RingInfo {
                start: self.ncap + (ring - nside) * 4 * nside,
                count: 4 * nside,
                shifted: (ring - nside) & 1 == 0,
            }
        } else {
            let nr = 4 * nside - ring;
            RingInfo {
                start: self.npix as i64 - 2 * nr * (nr + 1),
                count: 4 * nr,
                shifted: true,
            }
        }
    }

    /// Index of the ring immediately north of `z`.
    pub(crate) fn ring_above(&self, z: f64) -> i64 {
        let n = self.nside as f64;
        let az = z.abs();
        if az <= TWO_THIRDS {
            return (n * (2.0 - 1.5 * z)) as i64;
        }
        let iring = (n * (3.0 * (1.0 - az)).sqrt()) as i64;
        if z > 0.0 {
            iring
        } else {
            4 * self.nside - iring - 1
        }
    }

    pub(crate) fn ring_to_z(&self, ring: i64) -> f64 {
        let nside = self.nside;
        if ring < nside {
            1.0 - (ring * ring) as f64 * self.fact2
        } else if ring <= 3 * nside {
            (2 * nside - ring) as f64 * self.fact1
        } else {
            let r = 4 * nside - ring;
            (r * r) as f64 * self.fact2 - 1.0
        }
    }

    pub(crate) fn xyf_to_ring(&self, ix: i64, iy: i64, face: usize) -> u64 {
        let nl4 = 4 * self.nside;
        let jr = JRLL[face] * self.nside - ix - iy - 1;
        let info = self.ring_info(jr);
        let nr = info.count >> 2;
        let kshift = if info.shifted { 0 } else { 1 };
        let mut jp = (JPLL[face] * nr + ix - iy + 1 + kshift) / 2;
        if jp > nl4 {
            jp -= nl4;
        } else if jp < 1 {
            jp += nl4;
        }
        (info.start + jp - 1) as u64
    }

    pub(crate) fn ring_to_xyf(&self, pix: i64) -> (i64, i64, usize) {
        let nside = self.nside;
        let nl2 = 2 * nside;
        let npix = self.npix as i64;
        let order = i64::from(self.order);

        let (iring, iphi, kshift, nr, face) = if pix < self.ncap {
            let iring = (1 + isqrt(1 + 2 * pix)) >> 1;
            let iphi = pix + 1 - 2 * iring * (iring - 1);
            (iring, iphi, 0, iring, (iphi - 1) / iring)
        } else if pix < npix - self.ncap {
            let ip = pix - self.ncap;
            let tmp = ip >> (order + 2);
            let iring = tmp + nside;
            let iphi = ip - tmp * 4 * nside + 1;
            let kshift = (iring + nside) & 1;
            let ire = tmp + 1;
            let irm = nl2 + 2 - ire;
            let ifm = (iphi - ire / 2 + nside - 1) >> order;
            let ifp = (iphi - irm / 2 + nside - 1) >> order;
            let face = if ifp == ifm {
                ifp | 4
            } else if ifp < ifm {
                ifp
            } else {
                ifm + 8
            };
            (iring, iphi, kshift, nside, face)
        } else {
            let ip = npix - pix;
            let from_south = (1 + isqrt(2 * ip - 1)) >> 1;
            let iphi = 4 * from_south + 1 - (ip - 2 * from_south * (from_south - 1));
            (
                2 * nl2 - from_south,
                iphi,
                0,
                from_south,
                (iphi - 1) / from_south + 8,
            )
        };

        let face = face as usize;
        let irt = iring - JRLL[face] * nside + 1;
        let mut ipt = 2 * iphi - JPLL[face] * nr - kshift - 1;
        if ipt >= nl2 {
            ipt -= 8 * nside;
        }
        ((ipt - irt) >> 1, (-ipt - irt) >> 1, face)
    }
}

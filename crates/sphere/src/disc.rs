use std::f64::consts::{PI, TAU};
use std::ops::Range;

use foundation::math::SpatialVector;

use crate::{IndexError, SphereIndex};

/// Half-width, in radians, past which a ring is treated as entirely inside the disc.
const FULL_RING_EPS: f64 = 1e-15;

impl SphereIndex {
    /// Cells whose centers lie within `radius` radians of `center`.
    ///
    /// With `inclusive` the radius is padded by [`SphereIndex::max_pixel_radius`], so the
    /// result is a superset of every cell overlapping the disc. `sorted` returns nested ids
    /// ascending without duplicates; otherwise cells come out in north-to-south ring order.
    pub fn query_disc(
        &self,
        center: &SpatialVector,
        radius: f64,
        inclusive: bool,
        sorted: bool,
    ) -> Result<Vec<u64>, IndexError> {
        if !(0.0..=PI).contains(&radius) {
            return Err(IndexError::RadiusOutOfRange(radius));
        }
        let mut cells = Vec::new();
        for range in self.disc_ring_ranges(center, radius, inclusive) {
            for ring_id in range {
                let (ix, iy, face) = self.ring_to_xyf(ring_id as i64);
                cells.push(self.xyf_to_cell(ix, iy, face));
            }
        }
        if sorted {
            cells.sort_unstable();
            cells.dedup();
        }
        Ok(cells)
    }

    /// Disc as ranges of ring-scheme ids.
    fn disc_ring_ranges(
        &self,
        center: &SpatialVector,
        radius: f64,
        inclusive: bool,
    ) -> Vec<Range<u64>> {
        let rsmall = if inclusive {
            radius + self.max_pixel_radius()
        } else {
            radius
        };
        if rsmall >= PI {
            return vec![0..self.npix];
        }

        let (theta0, phi0) = center.theta_phi();
        let cosr = rsmall.cos();
        let z0 = theta0.cos();
        let xa = 1.0 / ((1.0 - z0) * (1.0 + z0)).sqrt();
        let nl4 = 4 * self.nside;

        let mut ranges = Vec::new();

        let rlat1 = theta0 - rsmall;
        let zmax = rlat1.cos();
        let irmin = self.ring_above(zmax) + 1;
        if rlat1 <= 0.0 && irmin > 1 {
            // Disc covers the north pole: every ring above irmin is complete.
            let info = self.ring_info(irmin - 1);
            ranges.push(0..(info.start + info.count) as u64);
        }

        let rlat2 = theta0 + rsmall;
        let zmin = rlat2.cos();
        let irmax = self.ring_above(zmin);

        for ring in irmin..=irmax {
            let z = self.ring_to_z(ring);
            let x = (cosr - z * z0) * xa;
            let ysq = 1.0 - z * z - x * x;
            let dphi = if ysq > 0.0 {
                ysq.sqrt().atan2(x)
            } else if x < 0.0 {
                // Ring lies wholly inside the disc.
                PI
            } else {
                continue;
            };
            if !(dphi > 0.0) {
                continue;
            }
            let info = self.ring_info(ring);
            let (start, count) = (info.start, info.count);
            let end = start + count - 1;
            if dphi >= PI - FULL_RING_EPS {
                ranges.push(start as u64..(end + 1) as u64);
                continue;
            }

            let shift = if info.shifted { 0.5 } else { 0.0 };
            let scale = count as f64 / TAU;
            let mut ip_lo = ((phi0 - dphi) * scale - shift).floor() as i64 + 1;
            let mut ip_hi = ((phi0 + dphi) * scale - shift).floor() as i64;
            if ip_hi >= count {
                ip_lo -= count;
                ip_hi -= count;
            }
            if ip_lo < 0 {
                ranges.push(start as u64..(start + ip_hi + 1) as u64);
                ranges.push((start + ip_lo + count) as u64..(end + 1) as u64);
            } else if ip_lo <= ip_hi {
                ranges.push((start + ip_lo) as u64..(start + ip_hi + 1) as u64);
            }
        }

        if rlat2 >= PI && irmax + 1 < nl4 {
            // Disc covers the south pole.
            let info = self.ring_info(irmax + 1);
            ranges.push(info.start as u64..self.npix);
        }
        ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    /// Brute-force reference: every cell whose center is within `radius`.
    fn brute_force(index: &SphereIndex, center: &SpatialVector, radius: f64) -> BTreeSet<u64> {
        (0..index.npix())
            .filter(|&c| {
                let v = index.cell_to_vector(c).unwrap();
                v.angle_to(center) <= radius
            })
            .collect()
    }

    #[test]
    fn rejects_bad_radius() {
        let index = SphereIndex::from_order(2).unwrap();
        let c = SpatialVector::from_lon_lat(0.0, 0.0);
        assert!(matches!(
            index.query_disc(&c, -0.1, false, true),
            Err(IndexError::RadiusOutOfRange(_))
        ));
        assert!(index.query_disc(&c, 3.5, false, true).is_err());
    }

    #[test]
    fn exact_query_matches_brute_force() {
        let index = SphereIndex::from_order(4).unwrap();
        let centers = [
            SpatialVector::from_lon_lat(0.0, 0.0),
            SpatialVector::from_lon_lat(359.0, 12.0),
            SpatialVector::from_lon_lat(120.0, 75.0),
            SpatialVector::from_lon_lat(250.0, -60.0),
        ];
        for center in &centers {
            for radius in [0.05, 0.2, 0.6] {
                let got: BTreeSet<u64> = index
                    .query_disc(center, radius, false, true)
                    .unwrap()
                    .into_iter()
                    .collect();
                let want = brute_force(&index, center, radius);
                // Centers sitting on the boundary may fall either way.
                let diff: Vec<_> = got.symmetric_difference(&want).collect();
                for &c in &diff {
                    let d = index.cell_to_vector(*c).unwrap().angle_to(center);
                    assert!((d - radius).abs() < 1e-9, "cell {c} at {d} vs radius {radius}");
                }
            }
        }
    }

    #[test]
    fn inclusive_covers_cells_touched_by_the_disc() {
        let index = SphereIndex::from_order(5).unwrap();
        let center = SpatialVector::from_lon_lat(33.0, 21.0);
        let radius = 0.1;
        let cells = index.query_disc(&center, radius, true, true).unwrap();
        // Any point inside the disc must land in a returned cell.
        for k in 0..64 {
            let bearing = k as f64 * TAU / 64.0;
            for frac in [0.0, 0.5, 0.99] {
                let d = radius * frac;
                let lat = 21f64.to_radians();
                let plat = (lat.sin() * d.cos() + lat.cos() * d.sin() * bearing.cos()).asin();
                let plon = 33f64.to_radians()
                    + (bearing.sin() * d.sin() * lat.cos()).atan2(d.cos() - lat.sin() * plat.sin());
                let p = SpatialVector::from_lon_lat(plon.to_degrees(), plat.to_degrees());
                let cell = index.vector_to_cell(&p);
                assert!(cells.binary_search(&cell).is_ok(), "missing {cell}");
            }
        }
    }

    #[test]
    fn larger_radius_is_a_superset() {
        let index = SphereIndex::from_order(6).unwrap();
        let center = SpatialVector::from_lon_lat(200.0, -5.0);
        let small = index.query_disc(&center, 0.05, true, true).unwrap();
        let large = index.query_disc(&center, 0.1, true, true).unwrap();
        assert!(large.len() > small.len());
        for c in &small {
            assert!(large.binary_search(c).is_ok());
        }
    }

    #[test]
    fn polar_discs_include_the_pole_cells() {
        let index = SphereIndex::from_order(3).unwrap();
        let north = SpatialVector::from_lon_lat(0.0, 90.0);
        let cells = index.query_disc(&north, 0.3, false, true).unwrap();
        let pole_cell = index.vector_to_cell(&north);
        assert!(cells.binary_search(&pole_cell).is_ok());

        let south = SpatialVector::from_lon_lat(10.0, -88.0);
        let cells = index.query_disc(&south, 0.3, false, true).unwrap();
        let want = brute_force(&index, &south, 0.3);
        assert_eq!(cells.len(), want.len());
    }

    #[test]
    fn huge_radius_returns_everything() {
        let index = SphereIndex::from_order(2).unwrap();
        let c = SpatialVector::from_lon_lat(45.0, 45.0);
        let all = index.query_disc(&c, PI, false, true).unwrap();
        assert_eq!(all.len() as u64, index.npix());
        let inclusive = index.query_disc(&c, 3.0, true, false).unwrap();
        assert_eq!(inclusive.len() as u64, index.npix());
    }

    #[test]
    fn full_radius_returns_every_cell_at_every_order() {
        let centers = [(0.0, 90.0), (45.0, 45.0), (200.0, 0.0), (300.0, -75.0), (0.0, -90.0)];
        for order in 0..=4 {
            let index = SphereIndex::from_order(order).unwrap();
            for (lon, lat) in centers {
                let c = SpatialVector::from_lon_lat(lon, lat);
                for inclusive in [false, true] {
                    let cells = index.query_disc(&c, PI, inclusive, true).unwrap();
                    assert_eq!(
                        cells,
                        (0..index.npix()).collect::<Vec<_>>(),
                        "order {order} center ({lon}, {lat}) inclusive {inclusive}"
                    );
                }
            }
        }
    }

    #[test]
    fn growing_the_radius_never_drops_cells() {
        let centers = [(0.0, 90.0), (17.0, 0.0), (40.0, 20.0), (300.0, -75.0), (0.0, -90.0)];
        for order in 1..=5 {
            let index = SphereIndex::from_order(order).unwrap();
            for (lon, lat) in centers {
                let c = SpatialVector::from_lon_lat(lon, lat);
                for radius in [0.02, 0.1, 0.4, 1.0, 2.0, 3.0] {
                    for inclusive in [false, true] {
                        let small = index.query_disc(&c, radius / 2.0, inclusive, true).unwrap();
                        let large = index.query_disc(&c, radius, inclusive, true).unwrap();
                        let dropped: Vec<_> =
                            small.iter().filter(|cell| large.binary_search(cell).is_err()).collect();
                        assert!(
                            dropped.is_empty(),
                            "order {order} center ({lon}, {lat}) radius {radius} inclusive {inclusive}: {dropped:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn unsorted_output_has_no_duplicates() {
        let index = SphereIndex::from_order(4).unwrap();
        let c = SpatialVector::from_lon_lat(180.0, 0.0);
        let cells = index.query_disc(&c, 0.4, true, false).unwrap();
        let unique: BTreeSet<u64> = cells.iter().copied().collect();
        assert_eq!(unique.len(), cells.len());
    }
}

use std::f64::consts::PI;

use tracing::debug;

pub const MAX_ORDER: u8 = 13;
pub const NS_MAX: u32 = 1 << MAX_ORDER;

pub fn order_to_nside(order: u8) -> u32 {
    1 << order.min(MAX_ORDER)
}

/// `None` unless `nside` is a power of two no larger than [`NS_MAX`].
pub fn nside_to_order(nside: u32) -> Option<u8> {
    if nside == 0 || !nside.is_power_of_two() || nside > NS_MAX {
        return None;
    }
    Some(nside.trailing_zeros() as u8)
}

pub fn cells_at_order(order: u8) -> u64 {
    12u64 << (2 * u32::from(order.min(MAX_ORDER)))
}

/// Smallest power-of-two `nside` whose cells are no larger than `cell_size_arcsec`.
///
/// Requests finer than the deepest supported order are clamped to [`NS_MAX`].
pub fn recommended_nside(cell_size_arcsec: f64) -> u32 {
    if !(cell_size_arcsec > 0.0) || !cell_size_arcsec.is_finite() {
        return NS_MAX;
    }
    let sky_arcsec2 = 4.0 * PI * (180.0 / PI).powi(2) * 3600.0 * 3600.0;
    let cells = (sky_arcsec2 / (cell_size_arcsec * cell_size_arcsec)).floor();
    let wanted = (cells / 12.0).sqrt();
    if wanted > f64::from(NS_MAX) {
        debug!(cell_size_arcsec, "requested resolution beyond deepest order, clamping");
        return NS_MAX;
    }
    let mut nside = 1u32;
    while f64::from(nside) < wanted {
        nside <<= 1;
    }
    nside
}

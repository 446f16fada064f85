//! Hierarchical equal-area partition of the sphere.
//!
//! Twelve base faces are each split into `nside x nside` cells; `nside = 2^order`.
//! Cells are numbered in the hierarchical (nested) scheme: the four children of a cell
//! at order `k` are `4 * id .. 4 * id + 4` at order `k + 1`.

pub mod bits;
pub mod boundary;
pub mod cell;
pub mod disc;
pub mod error;
pub mod index;
pub mod nside;
mod ring;

pub use cell::*;
pub use error::*;
pub use index::*;
pub use nside::*;

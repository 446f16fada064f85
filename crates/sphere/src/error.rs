use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum IndexError {
    ThetaOutOfRange(f64),
    PhiOutOfRange(f64),
    CellOutOfRange { cell: u64, npix: u64 },
    RadiusOutOfRange(f64),
    InvalidNside(u32),
    OrderTooLarge(u8),
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::ThetaOutOfRange(t) => write!(f, "colatitude {t} outside [0, pi]"),
            IndexError::PhiOutOfRange(p) => write!(f, "longitude {p} outside [0, 2pi)"),
            IndexError::CellOutOfRange { cell, npix } => {
                write!(f, "cell {cell} outside [0, {npix})")
            }
            IndexError::RadiusOutOfRange(r) => write!(f, "disc radius {r} outside [0, pi]"),
            IndexError::InvalidNside(n) => write!(f, "nside {n} is not a power of two <= 8192"),
            IndexError::OrderTooLarge(o) => write!(f, "order {o} exceeds the maximum of 13"),
        }
    }
}

impl std::error::Error for IndexError {}

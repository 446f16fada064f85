pub mod viewport;
pub mod visibility;

pub use viewport::*;
pub use visibility::*;

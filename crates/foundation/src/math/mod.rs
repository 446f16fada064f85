pub mod angle;
pub mod frame;
pub mod projection;
pub mod rotation;
pub mod spatial;
pub mod vec;

pub use angle::*;
pub use frame::*;
pub use projection::*;
pub use rotation::*;
pub use spatial::*;
pub use vec::*;

pub mod bounds;
pub mod handles;
pub mod math;
pub mod time;

// Sky geometry primitives shared by every other crate.
pub use bounds::*;
pub use handles::*;
pub use time::*;

pub mod renderer;
pub mod surface;
pub mod view;
pub mod warp;

#[cfg(test)]
pub(crate) mod testing;

pub use renderer::*;
pub use surface::*;
pub use view::*;
pub use warp::*;

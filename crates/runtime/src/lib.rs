pub mod metrics;
pub mod redraw;

pub use metrics::*;
pub use redraw::*;

pub mod cache;
pub mod pipeline;
pub mod protocol;
pub mod queue;
pub mod request;
pub mod residency;

pub use cache::*;
pub use pipeline::*;
pub use protocol::*;
pub use queue::*;
pub use request::*;
pub use residency::*;

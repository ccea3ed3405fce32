//! Path assembly: near-plane clipping, move-to tracking and depth ordering.

pub mod batch;
pub mod builder;
pub mod depth;

pub use batch::*;
pub use builder::*;
pub use depth::*;

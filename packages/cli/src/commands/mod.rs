pub mod normalize;
pub mod replay;

pub use normalize::{normalize, NormalizeArgs};
pub use replay::{replay, ReplayArgs};

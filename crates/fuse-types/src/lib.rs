pub mod stats;
pub mod threads;

pub use stats::*;
pub use threads::*;

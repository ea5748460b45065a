pub mod market;
pub mod sample;

pub use market::*;
pub use sample::*;

//! Domain types for Promptgate.

mod classification;
mod decision;

pub use classification::*;
pub use decision::*;

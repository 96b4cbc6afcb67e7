//! Cucumber bindings for scenario state
//!
//! [`ApiWorld`] carries one [`State`](crate::State) per scenario and the
//! step definitions in this module forward to it.

mod world;
pub use world::*;

mod steps;
pub use steps::*;

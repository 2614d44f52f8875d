//! Trips, disappointments and the strategies that generate trips

pub mod generator;
pub mod trip;

pub use generator::*;
pub use trip::*;

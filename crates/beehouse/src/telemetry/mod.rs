//! Sensor telemetry
//!
//! Immutable sensor readings and the yield aggregation built on top of them.

mod aggregator;
mod reading;

#[cfg(test)]
mod aggregator_property_tests;

pub use aggregator::*;
pub use reading::*;

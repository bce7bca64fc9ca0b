//! Production classification
//!
//! High and low producer rankings over hive yields.

mod classifier;

#[cfg(test)]
mod classifier_property_tests;

pub use classifier::*;

//! # beehouse
//!
//! Hive composition and honey yield engine.
//!
//! Provides:
//! - The hive hierarchy: a base plus up to five extensions, ten frame slots
//!   per container
//! - The frame lifecycle driven by measured honey weight
//! - Yield aggregation over sensor readings
//! - High and low production rankings
//! - An async service over pluggable storage
//!
//! ## Quick start
//!
//! ```rust
//! use beehouse::prelude::*;
//!
//! let mut hive = Hive::new("Lavender row").unwrap();
//! let super_box = hive.add_extension(Extension::new("super", 1).unwrap()).unwrap();
//! let frame = hive
//!     .add_frame(ContainerKey::Extension(super_box), Frame::new("f1"), 1)
//!     .unwrap();
//!
//! assert_eq!(hive.apply_frame_weight(frame, 2400.0).unwrap(), FrameState::Full);
//! assert_eq!(hive.total_frames(), 1);
//! ```

pub mod config;
pub mod error;
pub mod hive;
pub mod production;
pub mod service;
pub mod store;
pub mod telemetry;

pub use config::EngineConfig;
pub use error::{HiveError, HiveResult};
pub use service::{HiveService, Revision};

pub mod prelude {
    //! Common imports
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::hive::*;
    pub use crate::production::*;
    pub use crate::service::*;
    pub use crate::store::*;
    pub use crate::telemetry::*;
}

//! # Strip Nesting Core
//!
//! Shared building blocks for the strip nesting engine: errors, run
//! configuration, the generic genetic algorithm runner, the fitness memo and
//! robust geometric predicates.
//!
//! The 2D geometry, no-fit polygons and the packer live in
//! `strip-nesting-d2`, which builds on the types defined here.
//!
//! ## Configuration
//!
//! ```rust
//! use strip_nesting_core::{CollisionMode, Config};
//!
//! let config = Config::new()
//!     .with_bin_width(220.0)
//!     .with_spacing(5.0)
//!     .with_angles(vec![0.0, 180.0])
//!     .with_collision_mode(CollisionMode::Nfp)
//!     .with_seed(42);
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod cache;
pub mod config;
pub mod error;
pub mod ga;
pub mod robust;

// Re-exports
pub use cache::FitnessCache;
pub use config::{CollisionMode, Config};
pub use error::{Error, Result};
pub use ga::{GaConfig, GaProblem, GaProgress, GaResult, GaRunner};
pub use robust::{Location, Orientation};

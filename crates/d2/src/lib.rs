//! # Strip Nesting 2D
//!
//! Nests irregular polygons into a fixed-width strip of unbounded length,
//! minimizing the consumed length while keeping a minimum spacing between
//! parts and using a discrete set of rotation angles.
//!
//! ## Components
//!
//! - [`geometry`]: polygon helpers, part profiles and outline preparation
//! - [`nfp`]: no-fit polygons and their cache
//! - [`skyline`]: top-height profile of the strip
//! - [`packer`]: bottom-left placement of an ordered part sequence
//! - [`ga_nesting`]: genetic search over placement order and rotations
//!
//! ## Quick Start
//!
//! ```rust
//! use strip_nesting_d2::{Config, Part, StripNester};
//!
//! let parts: Vec<Part> = (0..4)
//!     .map(|id| Part::rectangle(id, 100.0, 50.0, &[0.0], 0.0))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//!
//! let config = Config::new()
//!     .with_bin_width(220.0)
//!     .with_spacing(5.0)
//!     .with_angles(vec![0.0])
//!     .with_population_size(8)
//!     .with_generations(3)
//!     .with_seed(7);
//!
//! let nester = StripNester::new(parts, config).unwrap();
//! let result = nester.run().unwrap();
//!
//! println!("Length {:.1}, utilization {:.1}%",
//!     result.total_length(),
//!     result.utilization() * 100.0);
//! ```

pub mod ga_nesting;
pub mod geometry;
pub mod nfp;
pub mod packer;
pub mod skyline;
pub mod spatial_index;

// Re-exports
pub use ga_nesting::{Gene, GenerationSnapshot, Genome, NestingProblem, NestingResult, StripNester};
pub use geometry::{OrientedProfile, Part};
pub use nfp::{compute_nfp, NfpCache, NfpKey, NfpRecord};
pub use packer::{Layout, Packer, PlacedItem};
pub use skyline::{Skyline, SkylineNode};
pub use spatial_index::{PlacedBox, SpatialIndex};
pub use strip_nesting_core::{CollisionMode, Config, Error, Result};

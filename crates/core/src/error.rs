//! Error types for strip nesting.

use thiserror::Error;

/// Result type alias for strip nesting operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing parts, computing NFPs or packing.
#[derive(Debug, Error)]
pub enum Error {
    /// Degenerate or invalid polygon input.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Invalid settings, rejected at construction.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A part is wider than the strip at every allowed angle.
    #[error("Part {part_id} cannot be placed: width {width:.3} exceeds bin width {bin_width:.3}")]
    PlacementExhausted {
        /// Offending part.
        part_id: usize,
        /// Footprint width of the part.
        width: f64,
        /// Strip width it had to fit in.
        bin_width: f64,
    },

    /// NFP computation failed.
    #[error("NFP computation failed: {0}")]
    NfpError(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true for errors caused by bad input rather than internal failures.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidGeometry(_) | Error::ConfigError(_) | Error::PlacementExhausted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_exhausted_message() {
        let err = Error::PlacementExhausted {
            part_id: 3,
            width: 250.0,
            bin_width: 220.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("Part 3"));
        assert!(msg.contains("220.000"));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_internal_is_not_input_error() {
        assert!(!Error::Internal("lock poisoned".into()).is_input_error());
    }
}

//! Error types for datamosh-stream.

use thiserror::Error;

/// Result type for datamosh-stream operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for datamosh-stream operations.
///
/// Frame data never produces an error: malformed or short frames degrade to
/// predictive frames and pass through. Only the effect window configuration
/// can be rejected.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// The shifted effect start lies after the shifted effect end.
    #[error("effect window is inverted: start {start}s is after end {end}s on the trimmed timeline")]
    InvertedWindow { start: f64, end: f64 },

    /// Frame rate must be a positive integer.
    #[error("invalid frame rate: {0} (must be greater than zero)")]
    InvalidFrameRate(u32),

    /// A timestamp was NaN or infinite.
    #[error("invalid {field} time: {value}")]
    InvalidTime { field: &'static str, value: f64 },
}

impl Error {
    /// Create an inverted window error.
    pub fn inverted_window(start: f64, end: f64) -> Self {
        Self::InvertedWindow { start, end }
    }
}

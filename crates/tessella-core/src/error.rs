/// Core error types for tessella.
use std::path::PathBuf;

/// A specialized Result type for tessella operations.
pub type TessellaResult<T> = Result<T, TessellaError>;

/// Top-level error type shared by every tessella crate.
#[derive(Debug, thiserror::Error)]
pub enum TessellaError {
    /// Non-positive frame counts or framerates, mismatched frame sizes,
    /// malformed assets. Fatal before any rendering starts.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The requested grid cannot be laid out over the input image.
    #[error("degenerate layout: {0}")]
    DegenerateLayout(String),

    /// The repetition search produced no candidate at all.
    #[error("no convergence: {0}")]
    NoConvergence(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("asset error: {message} ({path:?})")]
    Asset { message: String, path: PathBuf },

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TessellaError {
    /// Create an invalid-input error.
    pub fn invalid(message: impl Into<String>) -> Self {
        TessellaError::InvalidInput(message.into())
    }

    /// Create an asset error.
    pub fn asset(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        TessellaError::Asset {
            message: message.into(),
            path: path.into(),
        }
    }
}

use thiserror::Error;

/// Unified error type for `sigma_cancellation` operations.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Raised when two Green's functions disagree on mesh or target shape.
    #[error("dimension mismatch in {context}: expected {expected} but found {found}")]
    DimensionMismatch {
        /// Human-readable context describing the operation.
        context: &'static str,
        /// The required dimension.
        expected: usize,
        /// The dimension that was actually supplied.
        found: usize,
    },

    /// Raised when the inverse temperature is not a positive finite number.
    #[error("inverse temperature must be positive and finite, found {beta}")]
    InvalidTemperature { beta: f64 },

    /// Raised when a mesh would contain no frequencies.
    #[error("a Matsubara mesh needs at least one frequency per half-axis")]
    EmptyMesh,

    /// Raised when the dispersion ensemble is empty.
    #[error("at least one dispersion sample is required")]
    EmptySampleSet,

    /// Raised when the sampling interval is degenerate.
    #[error("dispersion half-bandwidth must be positive and finite, found {half_bandwidth}")]
    InvalidBandwidth { half_bandwidth: f64 },

    /// Raised when a propagator cannot be inverted at a mesh point.
    #[error("matrix in {context} is singular at mesh index {index}")]
    SingularPropagator {
        context: &'static str,
        /// Linear index into the mesh.
        index: usize,
    },

    /// Raised when numerical routines produce NaN or infinity.
    #[error("encountered a non-finite value during {context}")]
    NumericalError { context: &'static str },

    /// Raised when the fit window cannot support the requested expansion.
    #[error("tail fit needs {required} points in the fit window but only {available} are available")]
    InsufficientTailPoints { available: usize, required: usize },

    /// Raised when the least-squares solve fails.
    #[error("tail fit failed: {context}")]
    FitFailed { context: &'static str },

    /// Raised when a configuration value is out of range.
    #[error("option `{name}` is out of range: {value}")]
    InvalidOption { name: &'static str, value: f64 },

    /// Raised when the extracted moment misses the analytic value by too much.
    #[error("moment discrepancy {diff:e} is not below the tolerance {tolerance:e}")]
    ToleranceExceeded { diff: f64, tolerance: f64 },

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CheckError {
    /// Helper to format a [`DimensionMismatch`](CheckError::DimensionMismatch) error.
    pub fn dimension_mismatch(context: &'static str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            context,
            expected,
            found,
        }
    }

    /// Helper to raise when a propagator inversion fails.
    pub fn singular(context: &'static str, index: usize) -> Self {
        Self::SingularPropagator { context, index }
    }

    /// Helper for rejecting an out-of-range configuration value.
    pub fn invalid_option(name: &'static str, value: f64) -> Self {
        Self::InvalidOption { name, value }
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, CheckError>;

//! Error types of this crate.
//!
//! Domain and dimension errors are raised when a solver is constructed, sample-count, shape
//! and density errors when `integrate` is called. An integration either succeeds completely or
//! fails without changing the state of the solver.

use thiserror::Error;

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors that can be returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The integration domain is empty, has an interval with `low >= high`, a non-finite bound
    /// or a malformed pair of bounds.
    #[error("invalid integration domain: {reason}")]
    InvalidDomain {
        /// Description of the problem.
        reason: String,
    },

    /// The number of requested samples is not positive.
    #[error("the number of samples must be positive, got {samples}")]
    InvalidSampleCount {
        /// The requested number of samples.
        samples: usize,
    },

    /// A low-discrepancy sequence does not support the requested number of dimensions.
    #[error("{family} sequences support at most {max} dimensions, requested {requested}")]
    UnsupportedDimension {
        /// Name of the sequence family.
        family: String,
        /// The requested dimensionality.
        requested: usize,
        /// The largest supported dimensionality.
        max: usize,
    },

    /// The integrand returned a different number of values than points it was given.
    #[error("the integrand returned {actual} values for a batch of {expected} points")]
    IntegrandShapeMismatch {
        /// Number of points in the batch.
        expected: usize,
        /// Number of values returned by the integrand.
        actual: usize,
    },

    /// The proposal density vanishes at a point it has drawn.
    #[error("the proposal density is zero at sample {index}")]
    DivisionByZeroDensity {
        /// Index of the offending sample within the batch.
        index: usize,
    },

    /// The proposal density is negative or not a number.
    #[error("the proposal density at sample {index} is {density}, which is not a density")]
    InvalidDensity {
        /// Index of the offending sample within the batch.
        index: usize,
        /// The value returned by the proposal.
        density: f64,
    },

    /// The proposal has drawn a point outside of the integration domain, so its support does not
    /// match the domain.
    #[error("the proposal drew sample {index} outside of the integration domain")]
    ProposalSupportViolation {
        /// Index of the offending sample within the batch.
        index: usize,
    },

    /// A proposal was constructed with invalid parameters.
    #[error("invalid proposal distribution: {reason}")]
    InvalidProposal {
        /// Description of the problem.
        reason: String,
    },

    /// Two objects that must share a dimensionality do not.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality of the integration domain.
        expected: usize,
        /// The dimensionality of the other object.
        actual: usize,
    },

    /// A low-discrepancy sequence cannot produce the requested number of further points.
    #[error("{family} sequence exhausted: cannot go past index {max}")]
    SequenceExhausted {
        /// Name of the sequence family.
        family: String,
        /// The number of points the sequence is able to produce.
        max: u64,
    },

    /// The name of a sequence family was not recognized.
    #[error("unknown sequence family '{name}'")]
    UnknownSequenceFamily {
        /// The unrecognized name.
        name: String,
    },

    /// (De)serialization of a configuration or checkpoint failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

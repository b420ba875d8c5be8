use thiserror::Error as ThisError;

/// Represents errors that can occur while building or querying a Chi-square QQ analysis.
#[derive(Debug, ThisError, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The input contains no observations.
    #[error("The sample must contain at least one observation.")]
    EmptySample,

    /// The first observation has no variables, so the sample has no columns.
    #[error("Observations must have at least one variable.")]
    NoVariables,

    /// An observation does not have the same number of variables as the first one.
    #[error("Observation {row} has {given} variables, but {expected} were expected.")]
    DimensionMismatch { row: usize, expected: usize, given: usize },

    /// The input data contains `NaN` values.
    #[error("Input data must not contain NaN values.")]
    ContainsNaN,

    /// The input data contains infinite values.
    #[error("Input data must not contain infinite values.")]
    ContainsInfinity,

    /// The input sample size is too small for the covariance estimator.
    #[error("Sample size must be at least {needed}, but was given {given}.")]
    InsufficientSampleSize { given: usize, needed: usize },

    /// The estimated covariance matrix does not have shape `p x p`.
    #[error("Covariance matrix must be {expected}x{expected}, but is {rows}x{cols}.")]
    CovarianceShape { expected: usize, rows: usize, cols: usize },

    /// The covariance matrix cannot be inverted.
    ///
    /// The eigenvalues are those of the correlation matrix, or of the covariance matrix itself
    /// when a column is constant.
    #[error(
        "The covariance matrix is singular (eigenvalues range from {min_eigenvalue:e} to \
         {max_eigenvalue:e})."
    )]
    SingularCovariance { min_eigenvalue: f64, max_eigenvalue: f64 },

    /// A probability passed to a quantile function is outside `(0, 1)`.
    #[error("Probability must lie strictly between 0 and 1, but was {0}.")]
    InvalidProbability(f64),

    /// The coordinate sequences handed to a renderer differ in length.
    #[error("Coordinate sequences must have equal length, but were {x} and {y}.")]
    LengthMismatch { x: usize, y: usize },

    /// See [`statrs::distribution::GammaError`].
    #[error("{0}")]
    GammaError(#[from] statrs::distribution::GammaError),
}

/// Coarse classification of an [`Error`], grouping variants by how a caller would remedy them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorKind {
    /// The input is not a well-formed numeric matrix. Fix the input.
    InvalidInput,

    /// There are too few observations. Collect more data.
    InsufficientSample,

    /// The covariance matrix is not invertible. Collect more data or drop collinear variables.
    SingularCovariance,

    /// An internal consistency check failed.
    InternalInvariant,

    /// A distribution was constructed or evaluated with invalid parameters.
    Distribution,
}

impl Error {
    /// Returns the [`ErrorKind`] this error belongs to.
    ///
    /// ```
    /// use chiqq::{ChiSquareQQ, ErrorKind};
    ///
    /// let err = ChiSquareQQ::new(vec![vec![1.0_f64, 2.0]]).unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::InsufficientSample);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySample
            | Self::NoVariables
            | Self::DimensionMismatch { .. }
            | Self::ContainsNaN
            | Self::ContainsInfinity
            | Self::LengthMismatch { .. } => ErrorKind::InvalidInput,
            Self::InsufficientSampleSize { .. } => ErrorKind::InsufficientSample,
            Self::SingularCovariance { .. } => ErrorKind::SingularCovariance,
            Self::CovarianceShape { .. } => ErrorKind::InternalInvariant,
            Self::InvalidProbability(_) | Self::GammaError(_) => ErrorKind::Distribution,
        }
    }
}

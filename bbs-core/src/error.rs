use std::fmt;

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, BbsError>;

/// A structured error type for generator construction.
///
/// Once a generator is built, its operations cannot fail; every variant here
/// surfaces during seeding or parameter validation.
#[non_exhaustive]
#[derive(Debug)]
pub enum BbsError {
    /// The entropy source could not produce random bytes.
    Entropy { source: rand::Error },
    /// A parameter, prime, or seed failed validation.
    InvalidParameters { reason: String },
}

impl BbsError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        BbsError::InvalidParameters {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for BbsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BbsError::Entropy { source } => write!(f, "entropy source failed: {source}"),
            BbsError::InvalidParameters { reason } => write!(f, "invalid parameters: {reason}"),
        }
    }
}

impl std::error::Error for BbsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BbsError::Entropy { source } => Some(source),
            _ => None,
        }
    }
}

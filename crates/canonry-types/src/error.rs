use thiserror::Error;

/// Errors produced by artifact model operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// The metadata record is missing a required field or has the wrong
    /// shape. A directory carrying such a record is not a valid artifact.
    #[error("malformed artifact at {location}: {reason}")]
    MalformedArtifact { location: String, reason: String },

    /// The metadata's declared id/type disagrees with its storage-derived
    /// location. A moved or hand-edited record is rejected, never trusted.
    #[error("identity mismatch at {location}: expected {expected}, meta declares {declared}")]
    IdentityMismatch {
        location: String,
        expected: String,
        declared: String,
    },

    /// A parent reference string could not be parsed.
    #[error("invalid parent reference {value:?}: {reason}")]
    InvalidParentRef { value: String, reason: String },

    /// Serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for artifact model operations.
pub type Result<T> = std::result::Result<T, TypeError>;

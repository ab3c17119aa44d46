use canonry_substrate::SubstrateError;
use canonry_types::TypeError;
use thiserror::Error;

/// Errors from observation queries.
///
/// Every failure terminates the single query that triggered it; the engine
/// never returns partial or best-effort results.
#[derive(Debug, Error)]
pub enum ObserveError {
    /// No artifact with this id matched the query.
    #[error("artifact not found: {id}")]
    NotFound { id: String },

    /// Several artifacts share this id; the candidates' locations are
    /// listed so the caller can narrow with a type or canonical hint.
    #[error("ambiguous id {id}; candidates: {}", candidates.join(", "))]
    AmbiguousId { id: String, candidates: Vec<String> },

    /// A `meta.json` exists at the ref without its companion `content.md`.
    #[error("incomplete artifact at {location}: missing content.md")]
    IncompleteArtifact { location: String },

    /// The ref holds no managed artifacts at all.
    #[error("no artifacts found under memory/ at {ref_name}")]
    ProjectNotFound { ref_name: String },

    /// Malformed metadata or an identity mismatch at a storage location.
    #[error(transparent)]
    Artifact(#[from] TypeError),

    /// Substrate failure, surfaced verbatim.
    #[error(transparent)]
    Substrate(#[from] SubstrateError),
}

/// Result alias for observation queries.
pub type ObserveResult<T> = Result<T, ObserveError>;

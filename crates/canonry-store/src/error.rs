use canonry_substrate::SubstrateError;
use canonry_types::{ParentRef, TypeError};
use thiserror::Error;

/// Domain errors from lifecycle operations.
///
/// Every variant means the operation's preconditions were violated and the
/// substrate was left untouched, except [`StoreError::Substrate`], which
/// surfaces the underlying failure verbatim.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `init` was called but the root artifact already exists.
    #[error("root already exists")]
    RootAlreadyExists,

    /// A lifecycle operation ran before `init` created the root.
    #[error("root not initialized")]
    RootNotInitialized,

    /// The requested parent does not exist in any managed area.
    #[error("parent not found: {parent}")]
    ParentNotFound { parent: ParentRef },

    /// The requested parent exists but is archived.
    #[error("parent is archived: {parent}")]
    ParentArchived { parent: ParentRef },

    /// No branch with this id exists in any managed area.
    #[error("branch not found: {id}")]
    BranchNotFound { id: String },

    /// The branch exists but is no longer active.
    #[error("branch is not active: {id}")]
    BranchNotActive { id: String },

    /// No summary with this id exists in any managed area.
    #[error("summary not found: {id}")]
    SummaryNotFound { id: String },

    /// The summary exists but is no longer active.
    #[error("summary is not active: {id}")]
    SummaryNotActive { id: String },

    /// The summary was already merged; merging twice is an error, not a
    /// silent success.
    #[error("summary already canonical: {id}")]
    AlreadyCanonical { id: String },

    /// The branch was already archived.
    #[error("branch already archived: {id}")]
    AlreadyArchived { id: String },

    /// The requested transition does not exist in the state machine, e.g.
    /// merging a branch directly into the root.
    #[error("unsupported transition for {id}: {reason}")]
    UnsupportedTransition { id: String, reason: String },

    /// A freshly generated id collides with an existing artifact.
    #[error("id already in use: {id}")]
    DuplicateId { id: String },

    /// A `meta.json` exists without its companion `content.md`.
    #[error("incomplete artifact at {location}: missing content.md")]
    IncompleteArtifact { location: String },

    /// Malformed metadata or an identity mismatch at a storage location.
    #[error(transparent)]
    Artifact(#[from] TypeError),

    /// Substrate failure, surfaced verbatim.
    #[error(transparent)]
    Substrate(#[from] SubstrateError),
}

/// Result alias for lifecycle operations.
pub type StoreResult<T> = Result<T, StoreError>;

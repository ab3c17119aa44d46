//! Observation engine for Canonry.
//!
//! [`Observer`] reconstructs read-only views of the lifecycle graph
//! strictly from substrate state at a named ref — never from a cache or
//! from the lifecycle store's write path — so the current tree and any
//! historical ref answer queries identically.

pub mod engine;
pub mod error;
pub mod payload;

pub use engine::{ObservedArtifact, Observer};
pub use error::{ObserveError, ObserveResult};
pub use payload::{
    ArtifactRecord, ArtifactSummary, IndexPayload, ObservationPayload,
    OBSERVATION_SCHEMA_VERSION,
};

//! Versioned JSON payloads for observation output.
//!
//! Two shapes: an index (many artifact summaries) for `list`/`children`,
//! and a single observation (full record, optionally with content) for
//! `get`. Both carry `schema_version` and the ref they were answered at.

use canonry_types::{ArtifactStatus, ArtifactType, ParentRef};
use serde::Serialize;

use crate::engine::ObservedArtifact;

/// Version stamp on every observation payload.
pub const OBSERVATION_SCHEMA_VERSION: &str = "1";

/// Summary row of one artifact in an index payload.
#[derive(Clone, Debug, Serialize)]
pub struct ArtifactSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ArtifactType,
    pub status: ArtifactStatus,
    pub canonical: bool,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,
}

impl From<&ObservedArtifact> for ArtifactSummary {
    fn from(artifact: &ObservedArtifact) -> Self {
        Self {
            id: artifact.meta.id.clone(),
            kind: artifact.meta.kind,
            status: artifact.meta.status,
            canonical: artifact.canonical(),
            location: artifact.location.clone(),
            parent: artifact.meta.parent.clone(),
        }
    }
}

/// Payload for `observe list` and `observe children`.
#[derive(Debug, Serialize)]
pub struct IndexPayload {
    pub schema_version: &'static str,
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub artifacts: Vec<ArtifactSummary>,
}

impl IndexPayload {
    /// Build an index over the given artifacts.
    pub fn new(ref_name: &str, artifacts: &[ObservedArtifact]) -> Self {
        Self {
            schema_version: OBSERVATION_SCHEMA_VERSION,
            ref_name: ref_name.to_string(),
            artifacts: artifacts.iter().map(ArtifactSummary::from).collect(),
        }
    }
}

/// Full record of one artifact in an observation payload.
#[derive(Debug, Serialize)]
pub struct ArtifactRecord {
    #[serde(flatten)]
    pub summary: ArtifactSummary,
    pub title: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Payload for `observe get`.
#[derive(Debug, Serialize)]
pub struct ObservationPayload {
    pub schema_version: &'static str,
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub artifact: ArtifactRecord,
}

impl ObservationPayload {
    /// Build an observation of one artifact; `content` is `None` for
    /// metadata-only queries.
    pub fn new(ref_name: &str, artifact: &ObservedArtifact, content: Option<String>) -> Self {
        Self {
            schema_version: OBSERVATION_SCHEMA_VERSION,
            ref_name: ref_name.to_string(),
            artifact: ArtifactRecord {
                summary: ArtifactSummary::from(artifact),
                title: artifact.meta.title.clone(),
                created_at: artifact.meta.created_at.clone(),
                content,
            },
        }
    }
}

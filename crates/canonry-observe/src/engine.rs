//! Reconstruction of artifact views from substrate snapshots.
//!
//! The observer reads strictly through [`TreeReader`] at a caller-named
//! ref — never a cache, never the store's write path — so the current
//! tree and any historical ref answer queries the same way.

use std::collections::BTreeSet;

use canonry_substrate::TreeReader;
use canonry_types::{
    layout::{self, MEMORY_DIR},
    ArtifactMeta, ArtifactStatus, ArtifactType, ParentRef, TypeError,
};
use tracing::debug;

use crate::error::{ObserveError, ObserveResult};

/// One artifact as seen at a ref: its metadata plus where it lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedArtifact {
    /// The decoded `meta.json` record.
    pub meta: ArtifactMeta,
    /// Artifact directory at the ref.
    pub location: String,
}

impl ObservedArtifact {
    /// Whether this artifact is canonical.
    pub fn canonical(&self) -> bool {
        self.meta.status == ArtifactStatus::Canonical
    }

    /// Path of the companion content blob.
    pub fn content_path(&self) -> String {
        layout::content_path(&self.location)
    }
}

/// Read-only observation engine over a [`TreeReader`].
pub struct Observer<R: TreeReader> {
    reader: R,
}

impl<R: TreeReader> Observer<R> {
    /// Wrap a substrate reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Every managed artifact visible at `ref_name`, sorted by location
    /// path — the deterministic order callers can rely on across substrate
    /// backends. Unmanaged paths are skipped; a malformed or misplaced
    /// record, or one missing its content blob, fails the whole query.
    pub fn collect(&self, ref_name: &str) -> ObserveResult<Vec<ObservedArtifact>> {
        let paths = self.reader.list_tree(ref_name, MEMORY_DIR)?;
        let path_set: BTreeSet<&str> = paths.iter().map(String::as_str).collect();

        let mut artifacts = Vec::new();
        for path in &paths {
            let Some(parsed) = layout::parse_meta_path(path) else {
                continue;
            };
            let bytes = self.reader.show_blob(ref_name, path)?.ok_or_else(|| {
                // Listed a moment ago; racing ref updates surface here.
                ObserveError::IncompleteArtifact {
                    location: parsed.location.clone(),
                }
            })?;
            let meta = ArtifactMeta::from_json(&parsed.location, &bytes)?;
            meta.check_identity(&parsed.location, parsed.kind, &parsed.id)?;

            if !path_set.contains(layout::content_path(&parsed.location).as_str()) {
                return Err(ObserveError::IncompleteArtifact {
                    location: parsed.location,
                });
            }
            artifacts.push(ObservedArtifact {
                meta,
                location: parsed.location,
            });
        }

        if artifacts.is_empty() {
            return Err(ObserveError::ProjectNotFound {
                ref_name: ref_name.to_string(),
            });
        }
        artifacts.sort_by(|a, b| a.location.cmp(&b.location));
        debug!(ref_name, count = artifacts.len(), "collected artifacts");
        Ok(artifacts)
    }

    /// Artifacts at `ref_name`, filtered by type and/or canonical status.
    pub fn list(
        &self,
        ref_name: &str,
        type_filter: Option<ArtifactType>,
        canonical: Option<bool>,
    ) -> ObserveResult<Vec<ObservedArtifact>> {
        let artifacts = self.collect(ref_name)?;
        Ok(artifacts
            .into_iter()
            .filter(|a| type_filter.map_or(true, |t| a.meta.kind == t))
            .filter(|a| canonical.map_or(true, |c| a.canonical() == c))
            .collect())
    }

    /// Resolve a single artifact by id.
    ///
    /// Ids are only unique within a type+status partition, so a bare id
    /// can match several artifacts. Hints narrow the candidates: type
    /// first, then canonical/non-canonical. A residual tie fails with
    /// [`ObserveError::AmbiguousId`] naming every candidate, never a
    /// guess.
    pub fn get(
        &self,
        ref_name: &str,
        id: &str,
        type_hint: Option<ArtifactType>,
        canonical_hint: Option<bool>,
    ) -> ObserveResult<ObservedArtifact> {
        let mut matches: Vec<ObservedArtifact> = self
            .collect(ref_name)?
            .into_iter()
            .filter(|a| a.meta.id == id)
            .filter(|a| type_hint.map_or(true, |t| a.meta.kind == t))
            .filter(|a| canonical_hint.map_or(true, |c| a.canonical() == c))
            .collect();

        match matches.len() {
            0 => Err(ObserveError::NotFound { id: id.to_string() }),
            1 => Ok(matches.remove(0)),
            _ => Err(ObserveError::AmbiguousId {
                id: id.to_string(),
                candidates: matches.into_iter().map(|a| a.location).collect(),
            }),
        }
    }

    /// All artifacts whose parent matches the typed reference, across all
    /// statuses.
    pub fn children(
        &self,
        ref_name: &str,
        parent: &ParentRef,
    ) -> ObserveResult<Vec<ObservedArtifact>> {
        let artifacts = self.collect(ref_name)?;
        Ok(artifacts
            .into_iter()
            .filter(|a| a.meta.parent.as_ref() == Some(parent))
            .collect())
    }

    /// The content blob of an observed artifact at the same ref. Decoded
    /// strictly; non-UTF-8 content is an error, never silently repaired.
    pub fn content(&self, ref_name: &str, artifact: &ObservedArtifact) -> ObserveResult<String> {
        let bytes = self
            .reader
            .show_blob(ref_name, &artifact.content_path())?
            .ok_or_else(|| ObserveError::IncompleteArtifact {
                location: artifact.location.clone(),
            })?;
        String::from_utf8(bytes).map_err(|_| {
            TypeError::MalformedArtifact {
                location: artifact.location.clone(),
                reason: "content.md is not valid UTF-8".into(),
            }
            .into()
        })
    }
}

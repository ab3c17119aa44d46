//! The managed-area layout on the substrate.
//!
//! An artifact's directory is a pure function of its `(type, status)`:
//!
//! ```text
//! memory/root/root/            the singular root
//! memory/branch/<id>/          active branches
//! memory/summary/<id>/         active summaries
//! memory/canon/<id>/           canonical (merged) summaries
//! memory/archive/branch/<id>/  archived branches
//! ```
//!
//! Each artifact directory holds `meta.json` and `content.md`. Anything
//! else under `memory/` (notably the `_ops/` scratch area) is unmanaged
//! and invisible to every kernel operation.
//!
//! Paths are plain `/`-separated strings: they address blobs inside the
//! substrate's tree, not host filesystem paths.

use crate::artifact::{ArtifactStatus, ArtifactType};

/// Top-level managed directory.
pub const MEMORY_DIR: &str = "memory";
/// Fixed id (and directory name) of the root artifact.
pub const ROOT_ID: &str = "root";
/// Metadata file name inside an artifact directory.
pub const META_FILE: &str = "meta.json";
/// Content file name inside an artifact directory.
pub const CONTENT_FILE: &str = "content.md";

const ROOT_AREA: &str = "root";
const BRANCH_AREA: &str = "branch";
const SUMMARY_AREA: &str = "summary";
const CANON_AREA: &str = "canon";
const ARCHIVE_AREA: &str = "archive";

/// Directory of the root artifact.
pub fn root_dir() -> String {
    format!("{MEMORY_DIR}/{ROOT_AREA}/{ROOT_ID}")
}

/// Directory of an active branch.
pub fn branch_dir(id: &str) -> String {
    format!("{MEMORY_DIR}/{BRANCH_AREA}/{id}")
}

/// Directory of an active summary.
pub fn summary_dir(id: &str) -> String {
    format!("{MEMORY_DIR}/{SUMMARY_AREA}/{id}")
}

/// Directory of a canonical (merged) summary.
pub fn canon_dir(id: &str) -> String {
    format!("{MEMORY_DIR}/{CANON_AREA}/{id}")
}

/// Directory of an archived branch.
pub fn archive_branch_dir(id: &str) -> String {
    format!("{MEMORY_DIR}/{ARCHIVE_AREA}/{BRANCH_AREA}/{id}")
}

/// Directory for an artifact in the given lifecycle state, or `None` if the
/// combination is not reachable (e.g. an archived summary).
pub fn artifact_dir(kind: ArtifactType, status: ArtifactStatus, id: &str) -> Option<String> {
    match (kind, status) {
        (ArtifactType::Root, ArtifactStatus::Canonical) => Some(root_dir()),
        (ArtifactType::Branch, ArtifactStatus::Active) => Some(branch_dir(id)),
        (ArtifactType::Branch, ArtifactStatus::Archived) => Some(archive_branch_dir(id)),
        (ArtifactType::Summary, ArtifactStatus::Active) => Some(summary_dir(id)),
        (ArtifactType::Summary, ArtifactStatus::Canonical) => Some(canon_dir(id)),
        _ => None,
    }
}

/// Path of `meta.json` inside an artifact directory.
pub fn meta_path(dir: &str) -> String {
    format!("{dir}/{META_FILE}")
}

/// Path of `content.md` inside an artifact directory.
pub fn content_path(dir: &str) -> String {
    format!("{dir}/{CONTENT_FILE}")
}

/// The type and id a `meta.json` path implies by its location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedLocation {
    /// The artifact directory (path without the `/meta.json` suffix).
    pub location: String,
    /// Type implied by the containing area.
    pub kind: ArtifactType,
    /// Id implied by the directory name.
    pub id: String,
}

/// Parse a blob path into the artifact location it belongs to.
///
/// Returns `None` for any path that is not a `meta.json` directly inside a
/// managed area — operational areas, nested directories, stray files.
pub fn parse_meta_path(path: &str) -> Option<ParsedLocation> {
    let parts: Vec<&str> = path.split('/').collect();
    let (kind, id) = match parts[..] {
        [MEMORY_DIR, ROOT_AREA, id, META_FILE] if id == ROOT_ID => (ArtifactType::Root, id),
        [MEMORY_DIR, BRANCH_AREA, id, META_FILE] => (ArtifactType::Branch, id),
        [MEMORY_DIR, SUMMARY_AREA, id, META_FILE] => (ArtifactType::Summary, id),
        [MEMORY_DIR, CANON_AREA, id, META_FILE] => (ArtifactType::Summary, id),
        [MEMORY_DIR, ARCHIVE_AREA, BRANCH_AREA, id, META_FILE] => (ArtifactType::Branch, id),
        _ => return None,
    };
    let location = path
        .strip_suffix(META_FILE)?
        .trim_end_matches('/')
        .to_string();
    Some(ParsedLocation {
        location,
        kind,
        id: id.to_string(),
    })
}

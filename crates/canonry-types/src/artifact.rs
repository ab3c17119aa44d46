//! The artifact metadata record and the lifecycle enums.
//!
//! An artifact on the substrate is a directory holding exactly two files:
//! `meta.json` (an [`ArtifactMeta`] record) and `content.md` (free text).
//! A directory without `meta.json` is unmanaged and invisible to the kernel.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::layout::ROOT_ID;

/// The type of an artifact. Canon and archive are *statuses* reached by
/// existing typed artifacts, not types of their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    /// The singular project root; the canon surface merges accumulate into.
    Root,
    /// A line of exploration forked from an existing context.
    Branch,
    /// A condensation of a branch; the only type eligible for canon merge.
    Summary,
}

impl ArtifactType {
    /// The lowercase wire/path name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Branch => "branch",
            Self::Summary => "summary",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "root" => Ok(Self::Root),
            "branch" => Ok(Self::Branch),
            "summary" => Ok(Self::Summary),
            other => Err(TypeError::InvalidParentRef {
                value: other.to_string(),
                reason: "type must be root, branch, or summary".into(),
            }),
        }
    }
}

/// Lifecycle status of an artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    /// Open for content edits and lifecycle transitions.
    Active,
    /// Merged into the canon. Terminal.
    Canonical,
    /// Explicitly retired. Terminal.
    Archived,
}

impl ArtifactStatus {
    /// The lowercase wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Canonical => "canonical",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed reference to a parent artifact.
///
/// Parent pointers are type-qualified (`branch:2026-...`) because bare id
/// strings are only unique within a type+status partition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentRef {
    /// Type of the referenced artifact.
    #[serde(rename = "type")]
    pub kind: ArtifactType,
    /// Id of the referenced artifact.
    pub id: String,
}

impl ParentRef {
    /// Reference to the project root.
    pub fn root() -> Self {
        Self {
            kind: ArtifactType::Root,
            id: ROOT_ID.to_string(),
        }
    }

    /// Reference to a branch by id.
    pub fn branch(id: impl Into<String>) -> Self {
        Self {
            kind: ArtifactType::Branch,
            id: id.into(),
        }
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for ParentRef {
    type Err = TypeError;

    /// Parse `root` or `<type>:<id>`.
    ///
    /// The shorthand `root` (and any `root:*`) normalizes to `root:root`,
    /// since there is only ever one root.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "root" {
            return Ok(Self::root());
        }
        let Some((kind, id)) = s.split_once(':') else {
            return Err(TypeError::InvalidParentRef {
                value: s.to_string(),
                reason: "expected 'root' or '<type>:<id>'".into(),
            });
        };
        let kind: ArtifactType = kind.parse()?;
        if id.is_empty() {
            return Err(TypeError::InvalidParentRef {
                value: s.to_string(),
                reason: "id must not be empty".into(),
            });
        }
        if kind == ArtifactType::Root {
            return Ok(Self::root());
        }
        Ok(Self {
            kind,
            id: id.to_string(),
        })
    }
}

/// The `meta.json` record accompanying every managed artifact.
///
/// Field values never change after creation except `status`; the root's
/// content grows via merges but its metadata stays fixed. Unknown extra
/// fields are tolerated on read and never written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    /// Artifact id; stable once assigned.
    pub id: String,
    /// Artifact type.
    #[serde(rename = "type")]
    pub kind: ArtifactType,
    /// Current lifecycle status.
    pub status: ArtifactStatus,
    /// Human-readable title. Non-empty.
    pub title: String,
    /// Creation timestamp (RFC 3339, UTC). Immutable.
    pub created_at: String,
    /// Originating context; absent only on the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,
}

impl ArtifactMeta {
    /// Decode a `meta.json` blob, checking structural shape.
    ///
    /// `location` is the artifact directory the blob was read from; it is
    /// carried into errors so callers can report where the bad record
    /// lives.
    pub fn from_json(location: &str, bytes: &[u8]) -> Result<Self, TypeError> {
        let meta: ArtifactMeta =
            serde_json::from_slice(bytes).map_err(|err| TypeError::MalformedArtifact {
                location: location.to_string(),
                reason: err.to_string(),
            })?;
        meta.check_shape(location)?;
        Ok(meta)
    }

    /// Encode as pretty-printed JSON with a trailing newline, the on-disk
    /// format of `meta.json`.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, TypeError> {
        let mut bytes = serde_json::to_vec_pretty(self)
            .map_err(|err| TypeError::Serialization(err.to_string()))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Structural shape checks beyond what deserialization enforces.
    fn check_shape(&self, location: &str) -> Result<(), TypeError> {
        let malformed = |reason: &str| TypeError::MalformedArtifact {
            location: location.to_string(),
            reason: reason.to_string(),
        };
        if self.id.is_empty() {
            return Err(malformed("id must not be empty"));
        }
        if self.title.is_empty() {
            return Err(malformed("title must not be empty"));
        }
        if self.created_at.is_empty() {
            return Err(malformed("created_at must not be empty"));
        }
        match self.kind {
            ArtifactType::Root => {
                if self.parent.is_some() {
                    return Err(malformed("root must not have a parent"));
                }
            }
            ArtifactType::Branch | ArtifactType::Summary => {
                if self.parent.is_none() {
                    return Err(malformed("branch and summary require a parent"));
                }
            }
        }
        Ok(())
    }

    /// Reject a record whose declared id/type disagrees with the type and
    /// id derived from its storage location.
    pub fn check_identity(
        &self,
        location: &str,
        expected_type: ArtifactType,
        expected_id: &str,
    ) -> Result<(), TypeError> {
        if self.kind != expected_type || self.id != expected_id {
            return Err(TypeError::IdentityMismatch {
                location: location.to_string(),
                expected: format!("{expected_type}:{expected_id}"),
                declared: format!("{}:{}", self.kind, self.id),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::now_iso;

    fn branch_meta() -> ArtifactMeta {
        ArtifactMeta {
            id: "2026-08-29-120000-explore-x".into(),
            kind: ArtifactType::Branch,
            status: ArtifactStatus::Active,
            title: "Explore X".into(),
            created_at: now_iso(),
            parent: Some(ParentRef::root()),
        }
    }

    #[test]
    fn meta_round_trip() {
        let meta = branch_meta();
        let bytes = meta.to_json_bytes().unwrap();
        let back = ArtifactMeta::from_json("memory/branch/x", &bytes).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn meta_json_ends_with_newline() {
        assert!(branch_meta().to_json_bytes().unwrap().ends_with(b"\n"));
    }

    #[test]
    fn root_meta_omits_parent_field() {
        let meta = ArtifactMeta {
            id: ROOT_ID.into(),
            kind: ArtifactType::Root,
            status: ArtifactStatus::Canonical,
            title: "Proj".into(),
            created_at: now_iso(),
            parent: None,
        };
        let text = String::from_utf8(meta.to_json_bytes().unwrap()).unwrap();
        assert!(!text.contains("parent"));
    }

    #[test]
    fn missing_field_is_malformed() {
        let err = ArtifactMeta::from_json("memory/branch/x", br#"{"id": "x"}"#).unwrap_err();
        assert!(matches!(err, TypeError::MalformedArtifact { .. }));
    }

    #[test]
    fn unknown_status_is_malformed() {
        let bytes = br#"{
            "id": "x", "type": "branch", "status": "pending",
            "title": "T", "created_at": "2026-08-29T00:00:00Z",
            "parent": {"type": "root", "id": "root"}
        }"#;
        let err = ArtifactMeta::from_json("memory/branch/x", bytes).unwrap_err();
        assert!(matches!(err, TypeError::MalformedArtifact { .. }));
    }

    #[test]
    fn extra_fields_are_tolerated() {
        let bytes = br#"{
            "id": "x", "type": "branch", "status": "archived",
            "title": "T", "created_at": "2026-08-29T00:00:00Z",
            "parent": {"type": "root", "id": "root"},
            "archived_at": "2026-08-29T01:00:00Z"
        }"#;
        let meta = ArtifactMeta::from_json("memory/archive/branch/x", bytes).unwrap();
        assert_eq!(meta.status, ArtifactStatus::Archived);
    }

    #[test]
    fn branch_without_parent_is_malformed() {
        let mut meta = branch_meta();
        meta.parent = None;
        let err = ArtifactMeta::from_json("memory/branch/x", &meta.to_json_bytes().unwrap()).unwrap_err();
        assert!(matches!(err, TypeError::MalformedArtifact { .. }));
    }

    #[test]
    fn root_with_parent_is_malformed() {
        let bytes = br#"{
            "id": "root", "type": "root", "status": "canonical",
            "title": "Proj", "created_at": "2026-08-29T00:00:00Z",
            "parent": {"type": "root", "id": "root"}
        }"#;
        let err = ArtifactMeta::from_json("memory/root/root", bytes).unwrap_err();
        assert!(matches!(err, TypeError::MalformedArtifact { .. }));
    }

    #[test]
    fn identity_mismatch_is_rejected() {
        let meta = branch_meta();
        let err = meta
            .check_identity("memory/branch/other", ArtifactType::Branch, "other")
            .unwrap_err();
        assert!(matches!(err, TypeError::IdentityMismatch { .. }));
        meta.check_identity("memory/branch/x", ArtifactType::Branch, &meta.id)
            .unwrap();
    }

    #[test]
    fn parse_parent_shorthand() {
        assert_eq!("root".parse::<ParentRef>().unwrap(), ParentRef::root());
        assert_eq!(
            "root:anything".parse::<ParentRef>().unwrap(),
            ParentRef::root()
        );
    }

    #[test]
    fn parse_parent_typed() {
        let parent: ParentRef = "branch:b1".parse().unwrap();
        assert_eq!(parent, ParentRef::branch("b1"));
        assert_eq!(parent.to_string(), "branch:b1");
    }

    #[test]
    fn parse_parent_rejects_garbage() {
        assert!("".parse::<ParentRef>().is_err());
        assert!("b1".parse::<ParentRef>().is_err());
        assert!("widget:b1".parse::<ParentRef>().is_err());
        assert!("branch:".parse::<ParentRef>().is_err());
    }
}

//! The lifecycle store: the kernel's only write path.
//!
//! Every operation checks its preconditions against the working tree, then
//! lands all of its writes — blob creation, content append, relocation —
//! in a single substrate commit. On any error nothing is committed.

use canonry_substrate::{TreeOp, WorkTree};
use canonry_types::{
    layout, make_id, now_iso, ArtifactMeta, ArtifactStatus, ArtifactType, ParentRef, TypeError,
    ROOT_ID,
};
use tracing::info;

use crate::error::{StoreError, StoreResult};

/// Lifecycle store over a substrate working tree.
pub struct LifecycleStore<S: WorkTree> {
    substrate: S,
}

impl<S: WorkTree> LifecycleStore<S> {
    /// Wrap a substrate.
    pub fn new(substrate: S) -> Self {
        Self { substrate }
    }

    /// The underlying substrate.
    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    /// Create the singular root artifact.
    pub fn init(&self, title: &str) -> StoreResult<()> {
        if self.artifact_exists(&layout::root_dir())? {
            return Err(StoreError::RootAlreadyExists);
        }
        let meta = ArtifactMeta {
            id: ROOT_ID.to_string(),
            kind: ArtifactType::Root,
            status: ArtifactStatus::Canonical,
            title: title.to_string(),
            created_at: now_iso(),
            parent: None,
        };
        let content = format!("# {title}\n\nCanonical root context.\n");
        self.create_artifact(&layout::root_dir(), &meta, &content, &format!("init: {title}"))?;
        info!(title, "root created");
        Ok(())
    }

    /// Create an active branch forked from `parent` (default: the root).
    /// Returns the new branch id.
    pub fn new_branch(&self, title: &str, parent: &ParentRef) -> StoreResult<String> {
        self.require_root()?;
        self.check_parent(parent)?;

        let id = make_id(title);
        let dir = layout::branch_dir(&id);
        if self.artifact_exists(&dir)? {
            return Err(StoreError::DuplicateId { id });
        }
        let meta = ArtifactMeta {
            id: id.clone(),
            kind: ArtifactType::Branch,
            status: ArtifactStatus::Active,
            title: title.to_string(),
            created_at: now_iso(),
            parent: Some(parent.clone()),
        };
        let content = format!("# {title}\n\nBranch context.\n");
        self.create_artifact(&dir, &meta, &content, &format!("branch: {id}"))?;
        info!(id, %parent, "branch created");
        Ok(id)
    }

    /// Create an active summary of an active branch. Returns the new
    /// summary id.
    pub fn new_summary(&self, title: &str, branch_id: &str) -> StoreResult<String> {
        self.require_root()?;
        let branch_meta = self.load_branch(branch_id)?;
        if branch_meta.status != ArtifactStatus::Active {
            return Err(StoreError::BranchNotActive {
                id: branch_id.to_string(),
            });
        }

        let id = make_id(title);
        let dir = layout::summary_dir(&id);
        if self.artifact_exists(&dir)? {
            return Err(StoreError::DuplicateId { id });
        }
        let meta = ArtifactMeta {
            id: id.clone(),
            kind: ArtifactType::Summary,
            status: ArtifactStatus::Active,
            title: title.to_string(),
            created_at: now_iso(),
            parent: Some(ParentRef::branch(branch_id)),
        };
        let content = format!("# {title}\n\nSummary content.\n");
        self.create_artifact(&dir, &meta, &content, &format!("summary: {id}"))?;
        info!(id, branch_id, "summary created");
        Ok(id)
    }

    /// Merge an active summary into the canon: append its content to the
    /// root (prior root content is never rewritten), flip its status to
    /// canonical, and relocate it to the canon area — one commit.
    pub fn merge_canon(&self, summary_id: &str) -> StoreResult<()> {
        self.require_root()?;

        let summary_dir = layout::summary_dir(summary_id);
        if !self.artifact_exists(&summary_dir)? {
            return Err(self.classify_missing_summary(summary_id)?);
        }
        let mut summary_meta =
            self.load_meta(&summary_dir, ArtifactType::Summary, summary_id)?;
        if summary_meta.status != ArtifactStatus::Active {
            return Err(StoreError::SummaryNotActive {
                id: summary_id.to_string(),
            });
        }
        let summary_content = self.load_content(&summary_dir)?;

        let root_dir = layout::root_dir();
        let root_content = self.load_content(&root_dir)?;
        let updated = append_canon_block(&root_content, &summary_meta, &summary_content);

        summary_meta.status = ArtifactStatus::Canonical;
        let ops = [
            TreeOp::put(layout::content_path(&root_dir), updated),
            TreeOp::put(layout::meta_path(&summary_dir), summary_meta.to_json_bytes()?),
            TreeOp::mv(summary_dir, layout::canon_dir(summary_id)),
        ];
        self.substrate
            .commit(&ops, &format!("canonry canon merge: {summary_id}"))?;
        info!(id = summary_id, "summary merged into canon");
        Ok(())
    }

    /// Archive an active branch: flip its status and relocate it to the
    /// archive area — one commit.
    pub fn archive_branch(&self, branch_id: &str) -> StoreResult<()> {
        self.require_root()?;

        let dir = layout::branch_dir(branch_id);
        if !self.artifact_exists(&dir)? {
            if self.artifact_exists(&layout::archive_branch_dir(branch_id))? {
                return Err(StoreError::AlreadyArchived {
                    id: branch_id.to_string(),
                });
            }
            return Err(StoreError::BranchNotFound {
                id: branch_id.to_string(),
            });
        }
        let mut meta = self.load_meta(&dir, ArtifactType::Branch, branch_id)?;
        if meta.status == ArtifactStatus::Archived {
            return Err(StoreError::AlreadyArchived {
                id: branch_id.to_string(),
            });
        }

        meta.status = ArtifactStatus::Archived;
        let ops = [
            TreeOp::put(layout::meta_path(&dir), meta.to_json_bytes()?),
            TreeOp::mv(dir, layout::archive_branch_dir(branch_id)),
        ];
        self.substrate
            .commit(&ops, &format!("canonry branch archive: {branch_id}"))?;
        info!(id = branch_id, "branch archived");
        Ok(())
    }

    // -- precondition helpers -----------------------------------------------

    /// An artifact exists exactly when its `meta.json` does.
    fn artifact_exists(&self, dir: &str) -> StoreResult<bool> {
        Ok(self.substrate.exists(&layout::meta_path(dir))?)
    }

    fn require_root(&self) -> StoreResult<()> {
        if !self.artifact_exists(&layout::root_dir())? {
            return Err(StoreError::RootNotInitialized);
        }
        Ok(())
    }

    /// A branch parent must exist and be active; a root or summary parent
    /// must exist and not be archived (a canonical summary is fine).
    fn check_parent(&self, parent: &ParentRef) -> StoreResult<()> {
        let not_found = || StoreError::ParentNotFound {
            parent: parent.clone(),
        };
        match parent.kind {
            ArtifactType::Root => Ok(()), // require_root already ran
            ArtifactType::Branch => {
                let dir = layout::branch_dir(&parent.id);
                if self.artifact_exists(&dir)? {
                    // The meta record is authoritative, not the area: a
                    // hand-edited record whose status disagrees with its
                    // location must not pass as an active parent.
                    let meta = self.load_meta(&dir, ArtifactType::Branch, &parent.id)?;
                    if meta.status == ArtifactStatus::Active {
                        Ok(())
                    } else {
                        Err(StoreError::ParentArchived {
                            parent: parent.clone(),
                        })
                    }
                } else if self.artifact_exists(&layout::archive_branch_dir(&parent.id))? {
                    Err(StoreError::ParentArchived {
                        parent: parent.clone(),
                    })
                } else {
                    Err(not_found())
                }
            }
            ArtifactType::Summary => {
                if self.artifact_exists(&layout::summary_dir(&parent.id))?
                    || self.artifact_exists(&layout::canon_dir(&parent.id))?
                {
                    Ok(())
                } else {
                    Err(not_found())
                }
            }
        }
    }

    /// Distinguish "already merged", "that id is a branch", and "no such
    /// summary" when the active summary directory is absent.
    fn classify_missing_summary(&self, id: &str) -> StoreResult<StoreError> {
        if self.artifact_exists(&layout::canon_dir(id))? {
            return Ok(StoreError::AlreadyCanonical { id: id.to_string() });
        }
        if self.artifact_exists(&layout::branch_dir(id))?
            || self.artifact_exists(&layout::archive_branch_dir(id))?
        {
            return Ok(StoreError::UnsupportedTransition {
                id: id.to_string(),
                reason: "only summaries merge into the canon; branches never merge directly".into(),
            });
        }
        Ok(StoreError::SummaryNotFound { id: id.to_string() })
    }

    fn load_branch(&self, branch_id: &str) -> StoreResult<ArtifactMeta> {
        let dir = layout::branch_dir(branch_id);
        if !self.artifact_exists(&dir)? {
            if self.artifact_exists(&layout::archive_branch_dir(branch_id))? {
                return Err(StoreError::BranchNotActive {
                    id: branch_id.to_string(),
                });
            }
            return Err(StoreError::BranchNotFound {
                id: branch_id.to_string(),
            });
        }
        self.load_meta(&dir, ArtifactType::Branch, branch_id)
    }

    fn load_meta(
        &self,
        dir: &str,
        kind: ArtifactType,
        id: &str,
    ) -> StoreResult<ArtifactMeta> {
        let bytes = self
            .substrate
            .read(&layout::meta_path(dir))?
            .ok_or_else(|| StoreError::IncompleteArtifact {
                location: dir.to_string(),
            })?;
        let meta = ArtifactMeta::from_json(dir, &bytes)?;
        meta.check_identity(dir, kind, id)?;
        Ok(meta)
    }

    /// Content is decoded strictly: lossy decoding would substitute
    /// replacement characters and `merge_canon` would then write the
    /// mangled text back, rewriting pre-merge root bytes.
    fn load_content(&self, dir: &str) -> StoreResult<String> {
        let bytes = self
            .substrate
            .read(&layout::content_path(dir))?
            .ok_or_else(|| StoreError::IncompleteArtifact {
                location: dir.to_string(),
            })?;
        String::from_utf8(bytes).map_err(|_| {
            TypeError::MalformedArtifact {
                location: dir.to_string(),
                reason: "content.md is not valid UTF-8".into(),
            }
            .into()
        })
    }

    fn create_artifact(
        &self,
        dir: &str,
        meta: &ArtifactMeta,
        content: &str,
        message: &str,
    ) -> StoreResult<()> {
        let ops = [
            TreeOp::put(layout::meta_path(dir), meta.to_json_bytes()?),
            TreeOp::put(layout::content_path(dir), content.as_bytes().to_vec()),
        ];
        self.substrate.commit(&ops, &format!("canonry {message}"))?;
        Ok(())
    }
}

/// Append a canon-update block to the root content.
///
/// The existing content is preserved byte-for-byte as a prefix; only a
/// blank-line separator and the new block are appended.
fn append_canon_block(existing: &str, summary: &ArtifactMeta, content: &str) -> String {
    let mut block = String::new();
    block.push_str("---\n");
    block.push_str(&format!("## Canon Update: {}\n", summary.title));
    block.push_str(&format!("- Summary: {}\n", summary.id));
    block.push_str(&format!("- Merged: {}\n", now_iso()));
    if let Some(parent) = &summary.parent {
        if parent.kind == ArtifactType::Branch {
            block.push_str(&format!("- Source branch: {}\n", parent.id));
        }
    }
    block.push_str("---\n\n");
    block.push_str(content.trim());
    block.push('\n');

    let separator = if existing.ends_with("\n\n") {
        ""
    } else if existing.ends_with('\n') {
        "\n"
    } else {
        "\n\n"
    };
    format!("{existing}{separator}{block}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use canonry_substrate::MemorySubstrate;

    fn store() -> LifecycleStore<MemorySubstrate> {
        LifecycleStore::new(MemorySubstrate::new())
    }

    fn initialized() -> LifecycleStore<MemorySubstrate> {
        let store = store();
        store.init("Proj Root").unwrap();
        store
    }

    fn meta_at(store: &LifecycleStore<MemorySubstrate>, dir: &str) -> ArtifactMeta {
        let bytes = store
            .substrate()
            .read(&layout::meta_path(dir))
            .unwrap()
            .expect("meta present");
        ArtifactMeta::from_json(dir, &bytes).unwrap()
    }

    fn content_at(store: &LifecycleStore<MemorySubstrate>, dir: &str) -> String {
        let bytes = store
            .substrate()
            .read(&layout::content_path(dir))
            .unwrap()
            .expect("content present");
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn init_creates_singular_root() {
        let store = initialized();
        let meta = meta_at(&store, &layout::root_dir());
        assert_eq!(meta.id, ROOT_ID);
        assert_eq!(meta.kind, ArtifactType::Root);
        assert_eq!(meta.status, ArtifactStatus::Canonical);
        assert_eq!(meta.title, "Proj Root");
        assert!(meta.parent.is_none());
        assert!(content_at(&store, &layout::root_dir()).starts_with("# Proj Root\n"));
    }

    #[test]
    fn init_twice_fails() {
        let store = initialized();
        assert!(matches!(
            store.init("Again"),
            Err(StoreError::RootAlreadyExists)
        ));
        // Only the first init committed.
        assert_eq!(store.substrate().commit_count(), 1);
    }

    #[test]
    fn operations_before_init_fail() {
        let store = store();
        assert!(matches!(
            store.new_branch("Explore", &ParentRef::root()),
            Err(StoreError::RootNotInitialized)
        ));
        assert!(matches!(
            store.merge_canon("s1"),
            Err(StoreError::RootNotInitialized)
        ));
    }

    #[test]
    fn new_branch_from_root() {
        let store = initialized();
        let id = store.new_branch("Explore X", &ParentRef::root()).unwrap();
        assert!(id.ends_with("-explore-x"));

        let meta = meta_at(&store, &layout::branch_dir(&id));
        assert_eq!(meta.kind, ArtifactType::Branch);
        assert_eq!(meta.status, ArtifactStatus::Active);
        assert_eq!(meta.parent, Some(ParentRef::root()));
    }

    #[test]
    fn new_branch_from_missing_parent_fails() {
        let store = initialized();
        let err = store
            .new_branch("Explore", &ParentRef::branch("nope"))
            .unwrap_err();
        assert!(matches!(err, StoreError::ParentNotFound { .. }));
    }

    #[test]
    fn new_branch_from_archived_parent_fails() {
        let store = initialized();
        let b1 = store.new_branch("Old", &ParentRef::root()).unwrap();
        store.archive_branch(&b1).unwrap();

        let err = store
            .new_branch("Child", &ParentRef::branch(&b1))
            .unwrap_err();
        assert!(matches!(err, StoreError::ParentArchived { .. }));
    }

    #[test]
    fn new_summary_requires_active_branch() {
        let store = initialized();
        assert!(matches!(
            store.new_summary("Findings", "nope"),
            Err(StoreError::BranchNotFound { .. })
        ));

        let b1 = store.new_branch("Explore", &ParentRef::root()).unwrap();
        store.archive_branch(&b1).unwrap();
        assert!(matches!(
            store.new_summary("Findings", &b1),
            Err(StoreError::BranchNotActive { .. })
        ));
    }

    #[test]
    fn merge_appends_and_relocates() {
        let store = initialized();
        let b1 = store.new_branch("Explore X", &ParentRef::root()).unwrap();
        let s1 = store.new_summary("Findings", &b1).unwrap();

        let root_before = content_at(&store, &layout::root_dir());
        store.merge_canon(&s1).unwrap();

        // Prefix-preserving append.
        let root_after = content_at(&store, &layout::root_dir());
        assert!(root_after.starts_with(&root_before));
        assert!(root_after.contains("## Canon Update: Findings"));
        assert!(root_after.contains(&format!("- Summary: {s1}")));
        assert!(root_after.contains(&format!("- Source branch: {b1}")));
        assert!(root_after.contains("Summary content."));

        // Relocated, not copied; status flipped.
        assert!(!store.artifact_exists(&layout::summary_dir(&s1)).unwrap());
        let meta = meta_at(&store, &layout::canon_dir(&s1));
        assert_eq!(meta.status, ArtifactStatus::Canonical);
        assert_eq!(meta.id, s1);
    }

    #[test]
    fn merge_is_one_commit() {
        let store = initialized();
        let b1 = store.new_branch("Explore", &ParentRef::root()).unwrap();
        let s1 = store.new_summary("Findings", &b1).unwrap();
        let before = store.substrate().commit_count();
        store.merge_canon(&s1).unwrap();
        assert_eq!(store.substrate().commit_count(), before + 1);
    }

    #[test]
    fn merge_twice_fails_already_canonical() {
        let store = initialized();
        let b1 = store.new_branch("Explore", &ParentRef::root()).unwrap();
        let s1 = store.new_summary("Findings", &b1).unwrap();
        store.merge_canon(&s1).unwrap();

        assert!(matches!(
            store.merge_canon(&s1),
            Err(StoreError::AlreadyCanonical { .. })
        ));
    }

    #[test]
    fn merge_of_branch_is_unsupported() {
        let store = initialized();
        let b1 = store.new_branch("Explore", &ParentRef::root()).unwrap();
        assert!(matches!(
            store.merge_canon(&b1),
            Err(StoreError::UnsupportedTransition { .. })
        ));
        // Still unsupported (not "not found") once the branch is archived.
        store.archive_branch(&b1).unwrap();
        assert!(matches!(
            store.merge_canon(&b1),
            Err(StoreError::UnsupportedTransition { .. })
        ));
    }

    #[test]
    fn merge_of_unknown_id_is_not_found() {
        let store = initialized();
        assert!(matches!(
            store.merge_canon("ghost"),
            Err(StoreError::SummaryNotFound { .. })
        ));
    }

    #[test]
    fn archive_relocates_and_is_terminal() {
        let store = initialized();
        let b1 = store.new_branch("Explore", &ParentRef::root()).unwrap();
        store.archive_branch(&b1).unwrap();

        assert!(!store.artifact_exists(&layout::branch_dir(&b1)).unwrap());
        let meta = meta_at(&store, &layout::archive_branch_dir(&b1));
        assert_eq!(meta.status, ArtifactStatus::Archived);

        assert!(matches!(
            store.archive_branch(&b1),
            Err(StoreError::AlreadyArchived { .. })
        ));
    }

    #[test]
    fn archive_unknown_branch_fails() {
        let store = initialized();
        assert!(matches!(
            store.archive_branch("ghost"),
            Err(StoreError::BranchNotFound { .. })
        ));
    }

    #[test]
    fn archive_after_merge_keeps_canon_readable() {
        let store = initialized();
        let b1 = store.new_branch("Explore", &ParentRef::root()).unwrap();
        let s1 = store.new_summary("Findings", &b1).unwrap();
        store.merge_canon(&s1).unwrap();
        store.archive_branch(&b1).unwrap();

        // The merged summary stays permanently readable in the canon area.
        assert!(store.artifact_exists(&layout::canon_dir(&s1)).unwrap());
        assert!(matches!(
            store.new_summary("Another", &b1),
            Err(StoreError::BranchNotActive { .. })
        ));
    }

    #[test]
    fn failed_operation_commits_nothing() {
        let store = initialized();
        let before = store.substrate().commit_count();
        let _ = store.merge_canon("ghost").unwrap_err();
        let _ = store.archive_branch("ghost").unwrap_err();
        let _ = store.new_branch("x", &ParentRef::branch("ghost")).unwrap_err();
        assert_eq!(store.substrate().commit_count(), before);
    }

    #[test]
    fn merge_rejects_non_utf8_root_content() {
        let store = initialized();
        let b1 = store.new_branch("Explore", &ParentRef::root()).unwrap();
        let s1 = store.new_summary("Findings", &b1).unwrap();

        // Hand-authored root content with a latin-1 byte (0xE9).
        let root_content = layout::content_path(&layout::root_dir());
        store
            .substrate()
            .commit(
                &[TreeOp::put(root_content.clone(), b"# Proj\n\ncaf\xE9\n".to_vec())],
                "hand edit",
            )
            .unwrap();
        let before = store.substrate().read(&root_content).unwrap().unwrap();

        let err = store.merge_canon(&s1).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Artifact(TypeError::MalformedArtifact { .. })
        ));
        // The root bytes are untouched and the summary is still active.
        let after = store.substrate().read(&root_content).unwrap().unwrap();
        assert_eq!(after, before);
        assert!(store.artifact_exists(&layout::summary_dir(&s1)).unwrap());
    }

    #[test]
    fn parent_meta_status_is_authoritative() {
        let store = initialized();
        let b1 = store.new_branch("Old", &ParentRef::root()).unwrap();

        // Hand-edit the record so its status disagrees with its area.
        let dir = layout::branch_dir(&b1);
        let mut meta = meta_at(&store, &dir);
        meta.status = ArtifactStatus::Archived;
        store
            .substrate()
            .commit(
                &[TreeOp::put(layout::meta_path(&dir), meta.to_json_bytes().unwrap())],
                "hand edit",
            )
            .unwrap();

        let err = store.new_branch("Child", &ParentRef::branch(&b1)).unwrap_err();
        assert!(matches!(err, StoreError::ParentArchived { .. }));
    }

    #[test]
    fn append_block_preserves_existing_prefix() {
        let summary = ArtifactMeta {
            id: "s1".into(),
            kind: ArtifactType::Summary,
            status: ArtifactStatus::Active,
            title: "Findings".into(),
            created_at: now_iso(),
            parent: Some(ParentRef::branch("b1")),
        };
        for existing in ["# Root", "# Root\n", "# Root\n\n", "# Root\n\n\n"] {
            let updated = append_canon_block(existing, &summary, "body\n");
            assert!(updated.starts_with(existing), "lost prefix for {existing:?}");
            assert!(updated.ends_with("body\n"));
        }
    }
}

//! In-memory substrate for tests and embedding.
//!
//! [`MemorySubstrate`] keeps a working tree and a linear history of
//! committed snapshots in a `BTreeMap` behind an `RwLock`. Refs are `HEAD`
//! and `HEAD~n`. Data is lost when the substrate is dropped.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::debug;

use crate::error::{SubstrateError, SubstrateResult};
use crate::ops::TreeOp;
use crate::traits::{TreeReader, WorkTree};

#[derive(Clone)]
struct Snapshot {
    message: String,
    tree: BTreeMap<String, Vec<u8>>,
}

#[derive(Default)]
struct State {
    worktree: BTreeMap<String, Vec<u8>>,
    commits: Vec<Snapshot>,
}

/// An in-memory implementation of [`TreeReader`] and [`WorkTree`].
pub struct MemorySubstrate {
    inner: RwLock<State>,
}

impl MemorySubstrate {
    /// Create a new empty substrate with no commits.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(State::default()),
        }
    }

    /// Number of commits in the history.
    pub fn commit_count(&self) -> usize {
        self.inner.read().expect("lock poisoned").commits.len()
    }

    /// Message of the most recent commit, if any.
    pub fn head_message(&self) -> Option<String> {
        self.inner
            .read()
            .expect("lock poisoned")
            .commits
            .last()
            .map(|c| c.message.clone())
    }

    /// Resolve `HEAD` or `HEAD~n` to a commit index.
    fn resolve(state: &State, ref_name: &str) -> SubstrateResult<usize> {
        let not_found = || SubstrateError::RefNotFound {
            ref_name: ref_name.to_string(),
        };
        let back = if ref_name == "HEAD" {
            0
        } else {
            ref_name
                .strip_prefix("HEAD~")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(not_found)?
        };
        state
            .commits
            .len()
            .checked_sub(back + 1)
            .ok_or_else(not_found)
    }
}

impl Default for MemorySubstrate {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeReader for MemorySubstrate {
    fn list_tree(&self, ref_name: &str, prefix: &str) -> SubstrateResult<Vec<String>> {
        let state = self.inner.read().expect("lock poisoned");
        let index = Self::resolve(&state, ref_name)?;
        let dir_prefix = format!("{}/", prefix.trim_end_matches('/'));
        Ok(state.commits[index]
            .tree
            .keys()
            .filter(|path| prefix.is_empty() || path.starts_with(&dir_prefix))
            .cloned()
            .collect())
    }

    fn show_blob(&self, ref_name: &str, path: &str) -> SubstrateResult<Option<Vec<u8>>> {
        let state = self.inner.read().expect("lock poisoned");
        let index = Self::resolve(&state, ref_name)?;
        Ok(state.commits[index].tree.get(path).cloned())
    }
}

impl WorkTree for MemorySubstrate {
    fn read(&self, path: &str) -> SubstrateResult<Option<Vec<u8>>> {
        let state = self.inner.read().expect("lock poisoned");
        Ok(state.worktree.get(path).cloned())
    }

    fn commit(&self, ops: &[TreeOp], message: &str) -> SubstrateResult<()> {
        let mut state = self.inner.write().expect("lock poisoned");

        // Apply to a scratch copy first so a bad batch leaves both the
        // working tree and the history untouched.
        let mut tree = state.worktree.clone();
        for op in ops {
            match op {
                TreeOp::Put { path, bytes } => {
                    tree.insert(path.clone(), bytes.clone());
                }
                TreeOp::Move { from, to } => {
                    apply_move(&mut tree, from, to)?;
                }
            }
        }

        debug!(ops = ops.len(), message, "memory substrate commit");
        state.worktree = tree.clone();
        state.commits.push(Snapshot {
            message: message.to_string(),
            tree,
        });
        Ok(())
    }
}

fn apply_move(tree: &mut BTreeMap<String, Vec<u8>>, from: &str, to: &str) -> SubstrateResult<()> {
    let invalid = |reason: &str| SubstrateError::InvalidMove {
        from: from.to_string(),
        to: to.to_string(),
        reason: reason.to_string(),
    };
    let from_prefix = format!("{}/", from.trim_end_matches('/'));
    let to_prefix = format!("{}/", to.trim_end_matches('/'));

    if tree.keys().any(|path| path.starts_with(&to_prefix)) {
        return Err(invalid("destination already exists"));
    }
    let moved: Vec<String> = tree
        .keys()
        .filter(|path| path.starts_with(&from_prefix))
        .cloned()
        .collect();
    if moved.is_empty() {
        return Err(invalid("source does not exist"));
    }
    for path in moved {
        let bytes = tree.remove(&path).expect("key listed above");
        let rest = &path[from_prefix.len()..];
        tree.insert(format!("{to_prefix}{rest}"), bytes);
    }
    Ok(())
}

impl std::fmt::Debug for MemorySubstrate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySubstrate")
            .field("commits", &self.commit_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_substrate_has_no_head() {
        let sub = MemorySubstrate::new();
        assert!(matches!(
            sub.list_tree("HEAD", ""),
            Err(SubstrateError::RefNotFound { .. })
        ));
    }

    #[test]
    fn commit_then_read_at_head() {
        let sub = MemorySubstrate::new();
        sub.commit(&[TreeOp::put("memory/branch/b1/meta.json", b"{}".to_vec())], "c1")
            .unwrap();

        assert_eq!(
            sub.show_blob("HEAD", "memory/branch/b1/meta.json").unwrap(),
            Some(b"{}".to_vec())
        );
        assert_eq!(sub.list_tree("HEAD", "memory").unwrap().len(), 1);
        assert_eq!(sub.head_message().as_deref(), Some("c1"));
    }

    #[test]
    fn worktree_read_tracks_latest_state() {
        let sub = MemorySubstrate::new();
        sub.commit(&[TreeOp::put("a/x", b"1".to_vec())], "c1").unwrap();
        assert_eq!(sub.read("a/x").unwrap(), Some(b"1".to_vec()));
        assert!(sub.exists("a/x").unwrap());
        assert!(!sub.exists("a/y").unwrap());
    }

    #[test]
    fn head_tilde_reads_history() {
        let sub = MemorySubstrate::new();
        sub.commit(&[TreeOp::put("a/x", b"1".to_vec())], "c1").unwrap();
        sub.commit(&[TreeOp::put("a/x", b"2".to_vec())], "c2").unwrap();

        assert_eq!(sub.show_blob("HEAD", "a/x").unwrap(), Some(b"2".to_vec()));
        assert_eq!(sub.show_blob("HEAD~1", "a/x").unwrap(), Some(b"1".to_vec()));
        assert!(matches!(
            sub.show_blob("HEAD~2", "a/x"),
            Err(SubstrateError::RefNotFound { .. })
        ));
    }

    #[test]
    fn unknown_ref_is_an_error() {
        let sub = MemorySubstrate::new();
        sub.commit(&[TreeOp::put("a/x", b"1".to_vec())], "c1").unwrap();
        assert!(matches!(
            sub.show_blob("main", "a/x"),
            Err(SubstrateError::RefNotFound { .. })
        ));
    }

    #[test]
    fn move_relocates_every_blob() {
        let sub = MemorySubstrate::new();
        sub.commit(
            &[
                TreeOp::put("mem/summary/s1/meta.json", b"m".to_vec()),
                TreeOp::put("mem/summary/s1/content.md", b"c".to_vec()),
            ],
            "c1",
        )
        .unwrap();
        sub.commit(&[TreeOp::mv("mem/summary/s1", "mem/canon/s1")], "c2")
            .unwrap();

        assert!(!sub.exists("mem/summary/s1/meta.json").unwrap());
        assert_eq!(sub.read("mem/canon/s1/meta.json").unwrap(), Some(b"m".to_vec()));
        assert_eq!(sub.read("mem/canon/s1/content.md").unwrap(), Some(b"c".to_vec()));
        // History is unaffected by the move.
        assert_eq!(
            sub.show_blob("HEAD~1", "mem/summary/s1/meta.json").unwrap(),
            Some(b"m".to_vec())
        );
    }

    #[test]
    fn move_to_occupied_destination_fails_atomically() {
        let sub = MemorySubstrate::new();
        sub.commit(
            &[
                TreeOp::put("mem/summary/s1/meta.json", b"m".to_vec()),
                TreeOp::put("mem/canon/s1/meta.json", b"other".to_vec()),
            ],
            "c1",
        )
        .unwrap();

        let err = sub
            .commit(&[TreeOp::mv("mem/summary/s1", "mem/canon/s1")], "c2")
            .unwrap_err();
        assert!(matches!(err, SubstrateError::InvalidMove { .. }));
        // Nothing changed: the failed batch left worktree and history alone.
        assert_eq!(sub.commit_count(), 1);
        assert!(sub.exists("mem/summary/s1/meta.json").unwrap());
    }

    #[test]
    fn move_of_missing_source_fails() {
        let sub = MemorySubstrate::new();
        sub.commit(&[TreeOp::put("a/x", b"1".to_vec())], "c1").unwrap();
        let err = sub
            .commit(&[TreeOp::mv("mem/summary/s9", "mem/canon/s9")], "c2")
            .unwrap_err();
        assert!(matches!(err, SubstrateError::InvalidMove { .. }));
    }

    #[test]
    fn list_tree_respects_prefix_boundaries() {
        let sub = MemorySubstrate::new();
        sub.commit(
            &[
                TreeOp::put("memory/branch/b1/meta.json", b"m".to_vec()),
                TreeOp::put("memory/branchlike/x", b"x".to_vec()),
            ],
            "c1",
        )
        .unwrap();
        let paths = sub.list_tree("HEAD", "memory/branch").unwrap();
        assert_eq!(paths, vec!["memory/branch/b1/meta.json".to_string()]);
    }
}

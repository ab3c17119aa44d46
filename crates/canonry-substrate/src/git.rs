//! Git-backed substrate.
//!
//! [`GitSubstrate`] shells out to the `git` binary. Committed snapshots are
//! read with `ls-tree` / `show` so any ref the repository knows about can
//! be observed; working-tree access goes straight to the filesystem. One
//! [`WorkTree::commit`] batch becomes one git commit covering exactly the
//! paths the batch touched.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use crate::error::{SubstrateError, SubstrateResult};
use crate::ops::TreeOp;
use crate::traits::{TreeReader, WorkTree};

/// Stderr fragments that indicate a lock race with another writer.
const LOCK_SIGNATURES: &[&str] = &["index.lock", "cannot lock ref", "could not lock"];

/// Stderr fragments that indicate the ref itself did not resolve.
const BAD_REF_SIGNATURES: &[&str] = &[
    "not a valid object name",
    "invalid object name",
    "unknown revision",
    "bad revision",
];

/// Stderr fragments that indicate the ref resolved but the path is absent.
const MISSING_PATH_SIGNATURES: &[&str] = &["does not exist in", "exists on disk, but not in"];

/// A git repository acting as the versioned substrate.
pub struct GitSubstrate {
    base: PathBuf,
}

impl GitSubstrate {
    /// Open an existing repository at `base`.
    pub fn open(base: impl Into<PathBuf>) -> SubstrateResult<Self> {
        let substrate = Self { base: base.into() };
        if !substrate.base.exists() || !substrate.is_repo()? {
            return Err(SubstrateError::NotARepository {
                path: substrate.base.clone(),
            });
        }
        Ok(substrate)
    }

    /// Open `base`, creating the directory and initializing a repository if
    /// needed. Seeds a repo-local committer identity when none is
    /// configured, so commits never fail on a bare environment.
    pub fn init(base: impl Into<PathBuf>) -> SubstrateResult<Self> {
        let substrate = Self { base: base.into() };
        if !substrate.base.exists() {
            std::fs::create_dir_all(&substrate.base)?;
        }
        if !substrate.is_repo()? {
            substrate.run(&["init"])?;
        }
        if !substrate.run_unchecked(&["config", "user.email"])?.status.success() {
            substrate.run(&["config", "user.email", "canonry@localhost"])?;
            substrate.run(&["config", "user.name", "canonry"])?;
        }
        Ok(substrate)
    }

    /// The repository working directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn is_repo(&self) -> SubstrateResult<bool> {
        if !self.base.exists() {
            return Ok(false);
        }
        Ok(self
            .run_unchecked(&["rev-parse", "--is-inside-work-tree"])?
            .status
            .success())
    }

    /// Run git, mapping a missing binary to [`SubstrateError::GitUnavailable`]
    /// but leaving exit-status interpretation to the caller.
    fn run_unchecked(&self, args: &[&str]) -> SubstrateResult<Output> {
        Command::new("git")
            .arg("-C")
            .arg(&self.base)
            .args(args)
            .output()
            .map_err(|err| {
                if err.kind() == io::ErrorKind::NotFound {
                    SubstrateError::GitUnavailable
                } else {
                    SubstrateError::Io(err)
                }
            })
    }

    /// Run git and fail on a non-zero exit, classifying lock contention as
    /// [`SubstrateError::ConcurrentModification`].
    fn run(&self, args: &[&str]) -> SubstrateResult<Output> {
        let output = self.run_unchecked(args)?;
        if output.status.success() {
            return Ok(output);
        }
        let detail = stderr_detail(&output);
        if matches_any(&detail, LOCK_SIGNATURES) {
            return Err(SubstrateError::ConcurrentModification { detail });
        }
        Err(SubstrateError::Git {
            command: args.join(" "),
            detail,
        })
    }
}

fn stderr_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr.trim();
    if detail.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        detail.to_string()
    }
}

fn matches_any(detail: &str, signatures: &[&str]) -> bool {
    let lowered = detail.to_lowercase();
    signatures.iter().any(|sig| lowered.contains(sig))
}

impl TreeReader for GitSubstrate {
    fn list_tree(&self, ref_name: &str, prefix: &str) -> SubstrateResult<Vec<String>> {
        let mut args = vec!["ls-tree", "-r", "--name-only", ref_name];
        if !prefix.is_empty() {
            args.extend(["--", prefix]);
        }
        let output = self.run_unchecked(&args)?;
        if !output.status.success() {
            let detail = stderr_detail(&output);
            if matches_any(&detail, BAD_REF_SIGNATURES) {
                return Err(SubstrateError::RefNotFound {
                    ref_name: ref_name.to_string(),
                });
            }
            return Err(SubstrateError::Git {
                command: format!("ls-tree -r --name-only {ref_name} -- {prefix}"),
                detail,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn show_blob(&self, ref_name: &str, path: &str) -> SubstrateResult<Option<Vec<u8>>> {
        let spec = format!("{ref_name}:{path}");
        let output = self.run_unchecked(&["show", &spec])?;
        if output.status.success() {
            return Ok(Some(output.stdout));
        }
        let detail = stderr_detail(&output);
        if matches_any(&detail, MISSING_PATH_SIGNATURES) {
            return Ok(None);
        }
        if matches_any(&detail, BAD_REF_SIGNATURES) {
            // `git show ref:missing-path` also reports "invalid object
            // name" when the path is absent; only a bare ref failure means
            // the ref itself is bad.
            if self.run_unchecked(&["rev-parse", "--verify", ref_name])?.status.success() {
                return Ok(None);
            }
            return Err(SubstrateError::RefNotFound {
                ref_name: ref_name.to_string(),
            });
        }
        Err(SubstrateError::Git {
            command: format!("show {spec}"),
            detail,
        })
    }
}

impl WorkTree for GitSubstrate {
    fn read(&self, path: &str) -> SubstrateResult<Option<Vec<u8>>> {
        match std::fs::read(self.base.join(path)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn exists(&self, path: &str) -> SubstrateResult<bool> {
        Ok(self.base.join(path).is_file())
    }

    fn commit(&self, ops: &[TreeOp], message: &str) -> SubstrateResult<()> {
        let mut pathspecs: Vec<String> = Vec::new();
        for op in ops {
            match op {
                TreeOp::Put { path, bytes } => {
                    let file = self.base.join(path);
                    if let Some(parent) = file.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(file, bytes)?;
                    pathspecs.push(path.clone());
                }
                TreeOp::Move { from, to } => {
                    self.apply_move(from, to)?;
                    pathspecs.push(from.clone());
                    pathspecs.push(to.clone());
                }
            }
        }

        let mut add: Vec<&str> = vec!["add", "-A", "--"];
        add.extend(pathspecs.iter().map(String::as_str));
        self.run(&add)?;

        let mut status: Vec<&str> = vec!["status", "--porcelain", "--"];
        status.extend(pathspecs.iter().map(String::as_str));
        let output = self.run(&status)?;
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            // Nothing changed; an empty commit would only add noise.
            return Ok(());
        }

        debug!(ops = ops.len(), message, "git substrate commit");
        let mut commit: Vec<&str> = vec!["commit", "-m", message, "--"];
        commit.extend(pathspecs.iter().map(String::as_str));
        self.run(&commit)?;
        Ok(())
    }
}

impl GitSubstrate {
    /// Relocate a working-tree directory. A rename, never a copy.
    fn apply_move(&self, from: &str, to: &str) -> SubstrateResult<()> {
        let invalid = |reason: &str| SubstrateError::InvalidMove {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.to_string(),
        };
        let src = self.base.join(from);
        let dst = self.base.join(to);
        if !src.is_dir() {
            return Err(invalid("source does not exist"));
        }
        if dst.exists() {
            return Err(invalid("destination already exists"));
        }
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(src, dst)?;
        Ok(())
    }
}

impl std::fmt::Debug for GitSubstrate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitSubstrate").field("base", &self.base).finish()
    }
}

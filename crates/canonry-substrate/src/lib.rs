//! Versioned-tree substrate for Canonry.
//!
//! The lifecycle kernel never touches storage directly; it speaks to an
//! abstract versioned key-value tree (path → bytes) with atomic multi-key
//! commit. This crate defines that contract and ships two backends:
//!
//! - [`GitSubstrate`] — the production backend, shelling out to the `git`
//!   binary; one lifecycle operation becomes one git commit.
//! - [`MemorySubstrate`] — an in-memory backend for tests and embedding,
//!   holding a working tree and a linear history of snapshots.
//!
//! Read access is split from write access: the observation engine only
//! needs [`TreeReader`] (consistent snapshots at a named ref), the
//! lifecycle store needs [`WorkTree`] (working-tree reads plus the atomic
//! [`WorkTree::commit`]).

pub mod error;
pub mod git;
pub mod memory;
pub mod ops;
pub mod traits;

pub use error::{SubstrateError, SubstrateResult};
pub use git::GitSubstrate;
pub use memory::MemorySubstrate;
pub use ops::TreeOp;
pub use traits::{TreeReader, WorkTree};

/// The ref observation defaults to when none is given.
pub const HEAD_REF: &str = "HEAD";

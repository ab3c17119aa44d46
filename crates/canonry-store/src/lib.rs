//! Lifecycle store for Canonry.
//!
//! [`LifecycleStore`] is the kernel's only write path: it creates,
//! transitions, and relocates artifacts, enforcing the state machine
//!
//! ```text
//! branch:  active --archive--> archived   (terminal)
//! summary: active --merge----> canonical  (terminal)
//! root:    no transitions; content grows via merges
//! ```
//!
//! Each operation is atomic from the caller's perspective: all of its
//! writes land in one substrate commit, or none do. The observation side
//! lives in `canonry-observe` and never calls into this crate.

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::LifecycleStore;

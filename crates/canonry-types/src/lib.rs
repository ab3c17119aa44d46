//! Foundation types for Canonry.
//!
//! This crate provides the artifact data model used throughout the Canonry
//! lifecycle kernel. Every other Canonry crate depends on `canonry-types`.
//!
//! # Key Types
//!
//! - [`ArtifactType`] / [`ArtifactStatus`] — the lifecycle enums
//! - [`ArtifactMeta`] — the `meta.json` metadata record
//! - [`ParentRef`] — typed reference to a parent artifact
//! - [`layout`] — the pure `(type, status) → path` mapping for the managed
//!   areas, and its inverse

pub mod artifact;
pub mod error;
pub mod ident;
pub mod layout;

pub use artifact::{ArtifactMeta, ArtifactStatus, ArtifactType, ParentRef};
pub use error::TypeError;
pub use ident::{make_id, now_iso, slugify};
pub use layout::{ParsedLocation, ROOT_ID};

//! Artifact id and timestamp generation.
//!
//! Artifact ids are human-readable: a UTC timestamp slug followed by a
//! slugified title, e.g. `2026-08-29-141503-explore-caching`. Ids are unique
//! within a `(type, status)` partition at any instant; uniqueness across
//! time is not promised (the observation layer disambiguates with hints).

use chrono::{SecondsFormat, Utc};

/// Current UTC time as RFC 3339 with seconds precision and a `Z` suffix,
/// e.g. `2026-08-29T14:15:03Z`. Used for `created_at` and merge headers.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current UTC time as a filename-safe slug, e.g. `2026-08-29-141503`.
fn timestamp_slug() -> String {
    Utc::now().format("%Y-%m-%d-%H%M%S").to_string()
}

/// Reduce a title to a filename-safe slug.
///
/// Lowercases, collapses every run of non-alphanumeric characters to a
/// single `-`, and trims leading/trailing `-`. An empty result becomes
/// `untitled`.
///
/// # Examples
///
/// ```
/// use canonry_types::slugify;
///
/// assert_eq!(slugify("Explore Caching!"), "explore-caching");
/// assert_eq!(slugify("  ---  "), "untitled");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Generate a fresh artifact id for the given title.
pub fn make_id(title: &str) -> String {
    format!("{}-{}", timestamp_slug(), slugify(title))
}

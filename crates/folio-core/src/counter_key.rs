#![forbid(unsafe_code)]

//! Identity of a countable entity.
//!
//! A [`CounterKey`] is the `(namespace, id)` pair the counting service and the
//! local cache agree on. Ids for labelled entities (project cards) are derived
//! with [`slugify`] so that the same label always lands on the same counter.
//!
//! # Invariants
//!
//! 1. **Deterministic ids**: `slugify(label)` depends only on `label`.
//! 2. **Idempotent slugs**: `slugify(slugify(label)) == slugify(label)`.
//! 3. **Slug alphabet**: a slug only contains `[a-z0-9-]`, never starts or
//!    ends with `-`, and never contains `--`.
//! 4. **Cache key shape**: `cache_key()` is always `vcache:<namespace>:<id>`.

use core::fmt;

/// Prefix of every cache entry written by the view counter.
pub const CACHE_PREFIX: &str = "vcache";

/// Id of the site-wide counter.
pub const SITE_COUNTER_ID: &str = "site";

/// Prefix of per-project counter ids.
pub const PROJECT_ID_PREFIX: &str = "project-";

/// Unique identifier of one counter.
///
/// ```
/// # use folio_core::counter_key::CounterKey;
/// let key = CounterKey::project("portfolio", "Carla-RL Bus");
/// assert_eq!(key.id, "project-carla-rl-bus");
/// assert_eq!(key.cache_key(), "vcache:portfolio:project-carla-rl-bus");
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CounterKey {
    /// Grouping namespace on the counting service.
    pub namespace: String,
    /// Counter id within the namespace.
    pub id: String,
}

impl CounterKey {
    /// Create a key from an explicit namespace and id.
    #[must_use]
    pub fn new(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
        }
    }

    /// The site-wide counter of a namespace.
    #[must_use]
    pub fn site(namespace: impl Into<String>) -> Self {
        Self::new(namespace, SITE_COUNTER_ID)
    }

    /// Key whose id is the slug of a human-readable label.
    #[must_use]
    pub fn from_label(namespace: impl Into<String>, label: &str) -> Self {
        Self::new(namespace, slugify(label))
    }

    /// Per-project key: `project-<slug(title)>`.
    #[must_use]
    pub fn project(namespace: impl Into<String>, title: &str) -> Self {
        Self::new(namespace, format!("{PROJECT_ID_PREFIX}{}", slugify(title)))
    }

    /// Local cache entry name: `"vcache:<namespace>:<id>"`.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{CACHE_PREFIX}:{}:{}", self.namespace, self.id)
    }

    /// Request path on the counting service: `/hit/<namespace>/<id>`.
    ///
    /// Both components are percent-encoded.
    #[must_use]
    pub fn hit_path(&self) -> String {
        format!(
            "/hit/{}/{}",
            urlencoding::encode(&self.namespace),
            urlencoding::encode(&self.id)
        )
    }

    /// Full hit URL against a counting host such as `https://api.countapi.xyz`.
    #[must_use]
    pub fn hit_url(&self, host: &str) -> String {
        format!("{}{}", host.trim_end_matches('/'), self.hit_path())
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.id)
    }
}

/// Normalize a label into a counter id.
///
/// The label is lowercased, every run of characters outside `[a-z0-9]` becomes
/// one `-`, and separators at either end are dropped.
///
/// ```
/// # use folio_core::counter_key::slugify;
/// assert_eq!(slugify("Carla-RL Bus"), "carla-rl-bus");
/// assert_eq!(slugify("  Data Stack Demo!! "), "data-stack-demo");
/// assert_eq!(slugify("---"), "");
/// ```
#[must_use]
pub fn slugify(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_separator = false;
    for ch in label.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.push(ch);
        } else {
            pending_separator = true;
        }
    }
    out
}

//! The slug value type and title derivation.

use serde::{Deserialize, Serialize};

/// A unique, human-readable path segment within a group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Wraps a path as a slug without normalizing it.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the slug as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the slug holds no characters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Slug {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Slug {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fallback used when a title has no usable characters.
const EMPTY_TITLE_SLUG: &str = "item";

/// Derives a slug candidate from a free-form title.
///
/// Letters are transliterated to ASCII and lowercased, every other run of
/// characters becomes a single `-`. Leading and trailing dashes are dropped.
pub fn slugify(title: &str) -> String {
    let out = ::slug::slugify(title);
    if out.is_empty() {
        EMPTY_TITLE_SLUG.to_string()
    } else {
        out
    }
}

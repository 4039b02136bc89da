//! URL-safe slug type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// Nothing URL-safe is left after normalization.
    #[error("slug must contain at least one letter or digit")]
    Empty,
    /// The input is longer than the allowed maximum.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input is not lowercase kebab-case.
    #[error("slug must be lowercase kebab-case")]
    Malformed,
}

/// Normalize free text into slug form.
///
/// Lowercases the input, drops every character outside `[a-z0-9\s-]`,
/// turns whitespace runs into a single hyphen, collapses repeated hyphens
/// and trims hyphens from both ends. The result may be empty.
///
/// ```
/// use backoffice_core::slugify;
///
/// assert_eq!(slugify("Men's Shoes"), "mens-shoes");
/// assert_eq!(slugify("  --Summer   Sale--  "), "summer-sale");
/// ```
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        }
    }

    out
}

/// A URL-safe category identifier derived from a display name.
///
/// ## Constraints
///
/// - Only `a-z`, `0-9` and `-`
/// - No leading, trailing or doubled hyphens
/// - Length: 1-100 characters for a base slug; a collision suffix
///   (`-1`, `-2`, ...) may extend it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Maximum length of a base slug.
    pub const MAX_LENGTH: usize = 100;

    /// Derive a slug from free text (a category name or a caller-supplied hint).
    ///
    /// Text that normalizes to more than [`Self::MAX_LENGTH`] characters is
    /// cut at the limit.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] when no letter or digit survives
    /// normalization.
    pub fn from_text(text: &str) -> Result<Self, SlugError> {
        let mut slug = slugify(text);
        if slug.is_empty() {
            return Err(SlugError::Empty);
        }
        if slug.len() > Self::MAX_LENGTH {
            // slugify output is pure ASCII, so any byte index is a char boundary.
            slug.truncate(Self::MAX_LENGTH);
            let trimmed = slug.trim_end_matches('-').len();
            slug.truncate(trimmed);
        }
        Ok(Self(slug))
    }

    /// Parse an already-normalized slug, e.g. one read back from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or not lowercase kebab-case.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }

        let well_formed = !s.starts_with('-')
            && !s.ends_with('-')
            && !s.contains("--")
            && s
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

        if well_formed {
            Ok(Self(s.to_owned()))
        } else {
            Err(SlugError::Malformed)
        }
    }

    /// Returns this slug with a numeric collision suffix (`base-n`).
    #[must_use]
    pub fn with_suffix(&self, n: u32) -> Self {
        Self(format!("{}-{n}", self.0))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

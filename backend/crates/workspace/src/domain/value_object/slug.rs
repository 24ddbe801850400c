//! Workspace URL Slug
//!
//! The path segment identifying a workspace. Globally unique and immutable
//! after creation.

use std::fmt;
use thiserror::Error;

/// Maximum slug length in characters
pub const MAX_SLUG_LENGTH: usize = 64;

/// Slug validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    #[error("Slug cannot be empty")]
    Empty,

    #[error("Slug must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    /// Only lowercase ASCII letters, digits and dashes
    #[error("Slug may only contain lowercase letters, digits and dashes")]
    InvalidCharacter,

    #[error("Slug cannot start or end with a dash")]
    EdgeDash,
}

/// Validated workspace slug
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    pub fn new(raw: &str) -> Result<Self, SlugError> {
        if raw.is_empty() {
            return Err(SlugError::Empty);
        }

        let len = raw.chars().count();
        if len > MAX_SLUG_LENGTH {
            return Err(SlugError::TooLong {
                max: MAX_SLUG_LENGTH,
                actual: len,
            });
        }

        if !raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(SlugError::InvalidCharacter);
        }

        if raw.starts_with('-') || raw.ends_with('-') {
            return Err(SlugError::EdgeDash);
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

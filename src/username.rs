//! Mailbox names
//!
//! A [`Username`] is the only client-supplied text that ever becomes a
//! filesystem path component, so it is checked once at construction
//! and carried around as a typed value afterwards.

use crate::error::{Error, Result};
use std::fmt;

/// A validated mailbox name.
///
/// Guaranteed non-empty and free of anything that could escape the
/// spool root when joined onto it: no `/`, `\`, NUL or line breaks,
/// and never `.`, `..` or a dot-prefixed name.
///
/// # Examples
///
/// ```
/// use mailspool::Username;
///
/// let bob = Username::parse("bob").unwrap();
/// assert_eq!(bob.as_str(), "bob");
///
/// assert!(Username::parse("../etc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Username(String);

impl Username {
    /// Validate `name` as a mailbox name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUsername`] if `name` is empty, starts with
    /// `.`, or contains `/`, `\\`, NUL or a line break.
    pub fn parse(name: &str) -> Result<Self> {
        if name.is_empty() || name.starts_with('.') {
            return Err(Error::InvalidUsername(name.to_string()));
        }
        if name.chars().any(|c| matches!(c, '/' | '\\' | '\0' | '\r' | '\n')) {
            return Err(Error::InvalidUsername(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    /// The mailbox name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

//! Server-independent folder paths
//!
//! A [`FolderPath`] stores the hierarchy levels of a mailbox name
//! separately from the separator a particular server uses to spell
//! it. Two paths are equal when their levels match, whatever their
//! separators. Comparing against a raw string is deliberately not
//! possible; render first with [`FolderPath::render`].

use crate::error::{Error, Result};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Separator used when a path is shown to people or written in a copy plan.
pub const CANONICAL_SEPARATOR: char = '/';

/// A mailbox path as a sequence of hierarchy levels.
///
/// # Examples
///
/// ```
/// use mailshift::FolderPath;
///
/// let source = FolderPath::parse("Work/Projects", '/');
/// let dest = source.with_separator('.').unwrap();
///
/// assert_eq!(source, dest);
/// assert_eq!(dest.render(), "Work.Projects");
/// ```
#[derive(Debug, Clone)]
pub struct FolderPath {
    segments: Vec<String>,
    separator: char,
}

impl FolderPath {
    /// Split a protocol-level mailbox name on `separator`.
    #[must_use]
    pub fn parse(name: &str, separator: char) -> Self {
        Self {
            segments: name.split(separator).map(str::to_string).collect(),
            separator,
        }
    }

    /// Build a path from its levels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFolderPath`] if there are no levels or a
    /// level contains `separator`.
    pub fn from_segments<I, S>(segments: I, separator: char) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(Error::InvalidFolderPath("empty path".to_string()));
        }
        if let Some(bad) = segments.iter().find(|s| s.contains(separator)) {
            return Err(Error::InvalidFolderPath(format!(
                "level {bad:?} contains separator {separator:?}"
            )));
        }
        Ok(Self {
            segments,
            separator,
        })
    }

    /// The same levels spelled with another server's separator.
    ///
    /// # Errors
    ///
    /// Fails when a level contains the new separator, since the
    /// rendered name would no longer split back into the same levels.
    pub fn with_separator(&self, separator: char) -> Result<Self> {
        Self::from_segments(self.segments.iter().cloned(), separator)
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub const fn separator(&self) -> char {
        self.separator
    }

    /// The protocol-level name, joined with this path's own separator.
    #[must_use]
    pub fn render(&self) -> String {
        self.segments.join(&self.separator.to_string())
    }
}

impl PartialEq for FolderPath {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for FolderPath {}

impl Hash for FolderPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments.hash(state);
    }
}

/// Shows the path with `/` between levels, independent of the server.
impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join(&CANONICAL_SEPARATOR.to_string()))
    }
}

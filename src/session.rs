//! The protocol-session boundary
//!
//! Everything the label reconciler and the migrator need from a mail
//! server goes through [`MailSession`]. [`ImapConnection`] is the
//! network implementation; tests substitute an in-memory one.
//!
//! [`ImapConnection`]: crate::ImapConnection

#![allow(async_fn_in_trait)]

use crate::error::Result;
use std::fmt;

/// Separator assumed when a server reports no hierarchy delimiter.
pub const DEFAULT_SEPARATOR: char = '/';

/// One line of a LIST response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub name: String,
    pub delimiter: Option<char>,
    /// Mailbox attributes as sent on the wire, e.g. `\Noselect`, `\All`.
    pub attributes: Vec<String>,
}

impl ListEntry {
    pub fn new(name: impl Into<String>, delimiter: Option<char>) -> Self {
        Self {
            name: name.into(),
            delimiter,
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    /// Whether the entry carries `attribute`, compared case-insensitively.
    #[must_use]
    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes
            .iter()
            .any(|a| a.eq_ignore_ascii_case(attribute))
    }

    #[must_use]
    pub fn separator(&self) -> char {
        self.delimiter.unwrap_or(DEFAULT_SEPARATOR)
    }
}

/// The hierarchy separator of a server, taken from its first LIST entry.
#[must_use]
pub fn separator(listing: &[ListEntry]) -> char {
    listing.first().map_or(DEFAULT_SEPARATOR, ListEntry::separator)
}

/// Label mutation mode for STORE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Add,
    Remove,
    Replace,
}

impl StoreOperation {
    /// The STORE data item for Gmail labels.
    #[must_use]
    pub const fn as_labels_item(self) -> &'static str {
        match self {
            Self::Add => "+X-GM-LABELS",
            Self::Remove => "-X-GM-LABELS",
            Self::Replace => "X-GM-LABELS",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_labels_item())
    }
}

/// One authenticated connection to a mail server.
///
/// At most one command is in flight at a time; every method takes
/// `&mut self`. Any non-OK server status comes back as an `Err`.
pub trait MailSession {
    /// Open the connection and log in. On an already connected session
    /// the old connection is dropped first.
    async fn connect(&mut self) -> Result<()>;

    /// Log out and drop the connection. A no-op when disconnected.
    async fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// `LIST "" "*"`.
    async fn list(&mut self) -> Result<Vec<ListEntry>>;

    /// Select `folder` (EXAMINE when `read_only`) and return its message count.
    async fn select(&mut self, folder: &str, read_only: bool) -> Result<u32>;

    /// SEARCH the selected folder, returning sequence numbers in ascending order.
    async fn search(&mut self, criteria: &str) -> Result<Vec<u32>>;

    /// FETCH `items` for `set`, returning one raw line per message in the
    /// form `<seq> (<attributes>)`.
    async fn fetch(&mut self, set: &str, items: &str) -> Result<Vec<String>>;

    /// FETCH the complete RFC 2822 message at sequence number `seq`.
    async fn fetch_message(&mut self, seq: u32) -> Result<Vec<u8>>;

    /// STORE a label mutation on `set`; `value` is a parenthesized list.
    async fn store(&mut self, set: &str, operation: StoreOperation, value: &str) -> Result<()>;

    async fn append(
        &mut self,
        folder: &str,
        flags: Option<&str>,
        internal_date: Option<&str>,
        content: &[u8],
    ) -> Result<()>;

    /// CREATE `folder`; an existing mailbox yields [`Error::AlreadyExists`].
    ///
    /// [`Error::AlreadyExists`]: crate::Error::AlreadyExists
    async fn create(&mut self, folder: &str) -> Result<()>;
}

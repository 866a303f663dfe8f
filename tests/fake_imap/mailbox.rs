//! Test data model for the fake IMAP server
//!
//! Provides a builder-style API for constructing mailbox state:
//!
//! ```ignore
//! let mailbox = MailboxBuilder::new()
//!     .separator('.')
//!     .folder("INBOX")
//!         .message(raw_rfc2822_bytes)
//!     .folder("[Gmail]/All Mail")
//!         .attribute("\\All")
//!         .gmail_message(7, &["Work"], raw_rfc2822_bytes)
//!     .build();
//! ```
//!
//! The server shares one `Mailbox` between all of its connections, so
//! a message appended over one session is visible to the next, and
//! tests can inspect the final state through
//! [`FakeImapServer::mailbox`](super::FakeImapServer::mailbox).

/// A complete mailbox: the hierarchy separator the server reports and
/// a collection of named folders.
#[derive(Debug, Clone)]
pub struct Mailbox {
    pub separator: char,
    pub folders: Vec<Folder>,
}

impl Mailbox {
    /// Look up a folder by name (case-sensitive, matching real IMAP).
    pub fn get_folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.name == name)
    }

    pub fn get_folder_mut(&mut self, name: &str) -> Option<&mut Folder> {
        self.folders.iter_mut().find(|f| f.name == name)
    }

    /// Raw bodies of every message in `name`, in sequence order.
    pub fn bodies(&self, name: &str) -> Vec<Vec<u8>> {
        self.get_folder(name)
            .map(|f| f.messages.iter().map(|m| m.raw.clone()).collect())
            .unwrap_or_default()
    }
}

/// A single IMAP folder.
///
/// `attributes` are the LIST name attributes, such as `\All` for
/// Gmail's "All Mail". A folder marked `\Noselect` is listed but
/// refuses SELECT and EXAMINE.
#[derive(Debug, Clone)]
pub struct Folder {
    pub name: String,
    pub attributes: Vec<String>,
    pub messages: Vec<TestMessage>,
}

impl Folder {
    pub fn is_selectable(&self) -> bool {
        !self
            .attributes
            .iter()
            .any(|a| a.eq_ignore_ascii_case("\\Noselect"))
    }
}

/// A test message stored in a folder.
///
/// - `raw`: the complete RFC 2822 message, returned by `FETCH BODY[]`.
/// - `labels`: Gmail labels as they travel inside a quoted string, so
///   system labels are spelled `\\Inbox`.
/// - `thread`: the Gmail conversation id (`X-GM-THRID`).
#[derive(Debug, Clone)]
pub struct TestMessage {
    pub raw: Vec<u8>,
    pub labels: Vec<String>,
    pub thread: u64,
}

/// Builder for constructing a `Mailbox` step by step.
///
/// Call `.folder(name)` to start a new folder, then chain
/// `.message(raw)` or `.gmail_message(..)` calls to add messages to it.
pub struct MailboxBuilder {
    separator: char,
    folders: Vec<Folder>,
}

impl MailboxBuilder {
    pub fn new() -> Self {
        Self {
            separator: '/',
            folders: Vec::new(),
        }
    }

    /// Hierarchy separator reported in LIST responses (default `/`).
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Add a new folder. Subsequent calls add to this folder.
    pub fn folder(mut self, name: &str) -> Self {
        self.folders.push(Folder {
            name: name.to_string(),
            attributes: Vec::new(),
            messages: Vec::new(),
        });
        self
    }

    fn current(&mut self) -> &mut Folder {
        self.folders
            .last_mut()
            .expect("call .folder() before adding to it")
    }

    /// Add a LIST name attribute to the most recently added folder.
    pub fn attribute(mut self, attribute: &str) -> Self {
        self.current().attributes.push(attribute.to_string());
        self
    }

    /// Add a plain message to the most recently added folder.
    pub fn message(mut self, raw: &[u8]) -> Self {
        let folder = self.current();
        let thread = folder.messages.len() as u64 + 1;
        folder.messages.push(TestMessage {
            raw: raw.to_vec(),
            labels: Vec::new(),
            thread,
        });
        self
    }

    /// Add a message belonging to Gmail conversation `thread`.
    pub fn gmail_message(mut self, thread: u64, labels: &[&str], raw: &[u8]) -> Self {
        self.current().messages.push(TestMessage {
            raw: raw.to_vec(),
            labels: labels.iter().map(|l| (*l).to_string()).collect(),
            thread,
        });
        self
    }

    /// Consume the builder and return the finished `Mailbox`.
    pub fn build(self) -> Mailbox {
        Mailbox {
            separator: self.separator,
            folders: self.folders,
        }
    }
}

//! Network implementation of [`MailSession`] over async-imap

use crate::config::ImapConfig;
use crate::connection::{self, TlsSession};
use crate::error::{Error, Result};
use crate::session::{ListEntry, MailSession, StoreOperation};
use async_imap::types::NameAttribute;
use futures::StreamExt;
use tracing::{debug, info, warn};

/// An IMAP connection that can be dropped and re-established at will.
pub struct ImapConnection {
    config: ImapConfig,
    session: Option<TlsSession>,
}

impl ImapConnection {
    /// Create a disconnected session for `config`.
    #[must_use]
    pub const fn new(config: ImapConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ImapConfig {
        &self.config
    }

    fn session(&mut self) -> Result<&mut TlsSession> {
        self.session.as_mut().ok_or(Error::NotConnected)
    }
}

/// Quote a decoded label the way it travels on the wire.
fn quote_label(label: &str) -> String {
    format!("\"{}\"", label.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Spell the Gmail attributes of one FETCH result as `<seq> (<items>)`.
fn fetch_line(seq: u32, labels: Option<&[String]>, thread: Option<String>) -> String {
    let mut items = Vec::new();
    if let Some(labels) = labels {
        let quoted: Vec<String> = labels.iter().map(|l| quote_label(l)).collect();
        items.push(format!("X-GM-LABELS ({})", quoted.join(" ")));
    }
    if let Some(thread) = thread {
        items.push(format!("X-GM-THRID {thread}"));
    }
    format!("{seq} ({})", items.join(" "))
}

fn attribute_name(attribute: &NameAttribute<'_>) -> String {
    match attribute {
        NameAttribute::Extension(name) => name.to_string(),
        flag => format!("\\{flag:?}"),
    }
}

fn is_already_exists(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("alreadyexists") || lower.contains("already exists")
}

impl MailSession for ImapConnection {
    async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            self.disconnect().await?;
        }
        self.session = Some(connection::connect(&self.config).await?);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.logout().await {
                warn!("LOGOUT on {} failed: {}", self.config.host, e);
            }
            info!("Disconnected from {}", self.config.host);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    async fn list(&mut self) -> Result<Vec<ListEntry>> {
        let session = self.session()?;
        let mut stream = session
            .list(Some(""), Some("*"))
            .await
            .map_err(|e| Error::Imap(format!("List folders failed: {e}")))?;

        let mut entries = Vec::new();
        while let Some(item) = stream.next().await {
            let name = item.map_err(|e| Error::Imap(format!("List folders failed: {e}")))?;
            entries.push(ListEntry {
                name: name.name().to_string(),
                delimiter: name.delimiter().and_then(|d| d.chars().next()),
                attributes: name.attributes().iter().map(attribute_name).collect(),
            });
        }
        drop(stream);

        Ok(entries)
    }

    async fn select(&mut self, folder: &str, read_only: bool) -> Result<u32> {
        let session = self.session()?;
        let mailbox = (if read_only {
            session.examine(folder).await
        } else {
            session.select(folder).await
        })
        .map_err(|e| Error::Imap(format!("Failed to select {folder}: {e}")))?;
        Ok(mailbox.exists)
    }

    async fn search(&mut self, criteria: &str) -> Result<Vec<u32>> {
        let ids = self
            .session()?
            .search(criteria)
            .await
            .map_err(|e| Error::Imap(format!("Search failed: {e}")))?;
        let mut ids: Vec<u32> = ids.into_iter().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn fetch(&mut self, set: &str, items: &str) -> Result<Vec<String>> {
        let wants_labels = items.contains("X-GM-LABELS");
        let wants_thread = items.contains("X-GM-THRID");
        debug!("{} > FETCH {} {}", self.config.host, set, items);

        let session = self.session()?;
        let mut stream = session
            .fetch(set, items)
            .await
            .map_err(|e| Error::Imap(format!("Fetch {items} failed: {e}")))?;

        let mut lines = Vec::new();
        while let Some(item) = stream.next().await {
            let fetch = item.map_err(|e| Error::Imap(format!("Fetch {items} failed: {e}")))?;
            let labels: Option<Vec<String>> = wants_labels
                .then(|| fetch.gmail_labels())
                .flatten()
                .map(|ls| ls.iter().map(ToString::to_string).collect());
            let thread = if wants_thread {
                fetch.gmail_thrid().map(|t| t.to_string())
            } else {
                None
            };
            lines.push(fetch_line(fetch.message, labels.as_deref(), thread));
        }
        drop(stream);

        Ok(lines)
    }

    async fn fetch_message(&mut self, seq: u32) -> Result<Vec<u8>> {
        let session = self.session()?;
        let mut messages = session
            .fetch(seq.to_string(), "BODY.PEEK[]")
            .await
            .map_err(|e| Error::Imap(format!("Fetch failed: {e}")))?;

        let mut body = None;
        while let Some(item) = messages.next().await {
            let msg = item.map_err(|e| Error::Imap(format!("Fetch error: {e}")))?;
            if msg.message == seq {
                if let Some(raw) = msg.body() {
                    body = Some(raw.to_vec());
                }
            }
        }
        drop(messages);

        body.ok_or_else(|| Error::Imap(format!("No body found for message {seq}")))
    }

    async fn store(&mut self, set: &str, operation: StoreOperation, value: &str) -> Result<()> {
        let query = format!("{operation} {value}");
        debug!("{} > STORE {} {}", self.config.host, set, query);

        let session = self.session()?;
        let mut updates = session
            .store(set, &query)
            .await
            .map_err(|e| Error::Imap(format!("Store {operation} failed: {e}")))?;
        while let Some(item) = updates.next().await {
            item.map_err(|e| Error::Imap(format!("Store {operation} failed: {e}")))?;
        }
        drop(updates);

        Ok(())
    }

    async fn append(
        &mut self,
        folder: &str,
        flags: Option<&str>,
        internal_date: Option<&str>,
        content: &[u8],
    ) -> Result<()> {
        self.session()?
            .append(folder, flags, internal_date, content)
            .await
            .map_err(|e| Error::Imap(format!("Append to {folder} failed: {e}")))
    }

    async fn create(&mut self, folder: &str) -> Result<()> {
        match self.session()?.create(folder).await {
            Ok(()) => Ok(()),
            Err(e) if is_already_exists(&e.to_string()) => {
                Err(Error::AlreadyExists(folder.to_string()))
            }
            Err(e) => Err(Error::Imap(format!(
                "Unable to create destination folder {folder}: {e}"
            ))),
        }
    }
}

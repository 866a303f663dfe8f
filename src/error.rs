//! Error types for mailshift

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The server answered a command with a non-OK status.
    #[error("IMAP error: {0}")]
    Imap(String),

    #[error("Mailbox already exists: {0}")]
    AlreadyExists(String),

    #[error("Session is not connected")]
    NotConnected,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid folder path: {0}")]
    InvalidFolderPath(String),

    #[error("Unable to reconcile labels for thread {thread}: {reason}")]
    Reconcile { thread: u64, reason: String },

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),
}

pub type Result<T> = std::result::Result<T, Error>;

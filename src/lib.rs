//! Gmail label reconciliation and staged IMAP migration
//!
//! Two jobs, both driven through the [`MailSession`] trait:
//!
//! - [`ThreadLabelReconciler`] makes every message of a Gmail
//!   conversation carry the same labels, so whole threads show up in
//!   each label's IMAP folder.
//! - [`StagedMigrator`] copies folders between two servers, renaming
//!   them and translating hierarchy separators according to a
//!   [`build_plan`] copy plan. Messages are staged on disk between
//!   download and upload.
//!
//! [`ImapConnection`] is the TLS network implementation of
//! [`MailSession`].

mod client;
mod config;
mod connection;
mod error;
mod folder;
mod label;
mod migrate;
mod observer;
mod plan;
mod reconcile;
mod session;
mod staging;

pub use client::ImapConnection;
pub use config::{Endpoint, FailurePolicy, ImapConfig, Security, StagingCleanup};
pub use error::{Error, Result};
pub use folder::{CANONICAL_SEPARATOR, FolderPath};
pub use label::{LabelSet, LabelTokenParser, ORPHANED_LABEL, SENT_ONLY_LABEL};
pub use migrate::{JobOutcome, JobReport, MigrationOptions, Stage, StagedMigrator};
pub use observer::{MigrationObserver, NoopObserver, ReconcileObserver};
pub use plan::{CopyJob, FolderInfo, GMAIL_RESERVED_FOLDER, Plan, build_plan, list_folders, source_folders};
pub use reconcile::{
    ReconcileOptions, ReconcileSummary, Resolution, Thread, ThreadLabelReconciler, ThreadOutcome,
    find_all_mail,
};
pub use session::{DEFAULT_SEPARATOR, ListEntry, MailSession, StoreOperation, separator};
pub use staging::StagingArea;

//! Copy plans
//!
//! A copy plan turns a folder selection such as `"*"` or
//! `"INBOX.Saved,Lists/rust"` into an ordered list of [`CopyJob`]s
//! against the folders the source server actually has.
//!
//! Grammar:
//!
//! - `*` copies every source folder under its own name.
//! - Otherwise a comma-separated list of tokens. A token `src.dst`
//!   copies `src` into `dst`; a token without a dot keeps the name.
//!   Hierarchy levels inside a token are written with `/`, whatever
//!   the servers use.

use crate::error::{Error, Result};
use crate::folder::{CANONICAL_SEPARATOR, FolderPath};
use crate::session::{ListEntry, MailSession};
use serde::Serialize;
use tracing::{debug, warn};

/// Aggregate folder Gmail lists but never lets anyone select.
pub const GMAIL_RESERVED_FOLDER: &str = "[Gmail]";

/// Token that selects every folder.
pub const ALL_FOLDERS: &str = "*";

/// One folder to copy, each side spelled for its own server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyJob {
    pub source: FolderPath,
    pub destination: FolderPath,
}

impl Serialize for CopyJob {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("CopyJob", 2)?;
        state.serialize_field("source", &self.source.render())?;
        state.serialize_field("destination", &self.destination.render())?;
        state.end()
    }
}

/// Result of planning: the jobs to run and the tokens that matched nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub jobs: Vec<CopyJob>,
    pub skipped: Vec<String>,
}

/// Turn LIST entries into paths, dropping the reserved `[Gmail]` folder.
#[must_use]
pub fn source_folders(listing: &[ListEntry]) -> Vec<FolderPath> {
    listing
        .iter()
        .map(|entry| FolderPath::parse(&entry.name, entry.separator()))
        .filter(|path| !is_reserved(path))
        .collect()
}

/// A source folder and how many messages it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderInfo {
    pub path: FolderPath,
    /// `None` when the folder could not be selected.
    pub messages: Option<u32>,
}

impl Serialize for FolderInfo {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("FolderInfo", 2)?;
        state.serialize_field("name", &self.path.render())?;
        state.serialize_field("messages", &self.messages)?;
        state.end()
    }
}

/// List the plannable folders of a server with their message counts.
///
/// Each folder is examined read-only to count it; a folder that cannot
/// be selected is still listed, without a count.
pub async fn list_folders<S: MailSession>(session: &mut S) -> Result<Vec<FolderInfo>> {
    let listing = session.list().await?;
    let mut folders = Vec::new();
    for path in source_folders(&listing) {
        let messages = match session.select(&path.render(), true).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("Unable to examine {}: {}", path, e);
                None
            }
        };
        folders.push(FolderInfo { path, messages });
    }
    Ok(folders)
}

fn is_reserved(path: &FolderPath) -> bool {
    matches!(path.segments(), [only] if only == GMAIL_RESERVED_FOLDER)
}

/// Build the job list for `selection` against the source folders.
///
/// `source_listing` holds paths as the source server spells them, and
/// every job's source is taken from it. Destination paths are spelled
/// with `dest_separator`; a folder with a level that contains it cannot
/// be spelled there and lands in `skipped` instead.
///
/// # Errors
///
/// Returns [`Error::Config`] for a blank `selection`.
pub fn build_plan(
    source_listing: &[FolderPath],
    selection: &str,
    dest_separator: char,
) -> Result<Plan> {
    let selection = selection.trim();
    if selection.is_empty() {
        return Err(Error::Config("Invalid folder list: empty copy plan".to_string()));
    }

    let listing: Vec<&FolderPath> = source_listing.iter().filter(|p| !is_reserved(p)).collect();
    let mut plan = Plan::default();

    if selection == ALL_FOLDERS {
        for source in listing {
            match source.with_separator(dest_separator) {
                Ok(destination) => plan.jobs.push(CopyJob {
                    source: source.clone(),
                    destination,
                }),
                Err(e) => {
                    warn!("Skipping {source}: {e}");
                    plan.skipped.push(source.to_string());
                }
            }
        }
        return Ok(plan);
    }

    for token in selection.split(',').map(str::trim) {
        let parts: Vec<&str> = token.split('.').collect();
        let (src_name, dst_name) = match parts.as_slice() {
            [same] => (*same, *same),
            [src, dst] => (*src, *dst),
            _ => {
                warn!("Skipping malformed copy token {token:?}");
                plan.skipped.push(token.to_string());
                continue;
            }
        };

        let wanted = FolderPath::parse(src_name, CANONICAL_SEPARATOR);
        let Some(source) = listing.iter().copied().find(|p| **p == wanted) else {
            debug!("Folder {src_name:?} not found on the source server");
            plan.skipped.push(token.to_string());
            continue;
        };

        let destination =
            match FolderPath::parse(dst_name, CANONICAL_SEPARATOR).with_separator(dest_separator) {
                Ok(destination) => destination,
                Err(e) => {
                    warn!("Skipping copy token {token:?}: {e}");
                    plan.skipped.push(token.to_string());
                    continue;
                }
            };
        plan.jobs.push(CopyJob {
            source: source.clone(),
            destination,
        });
    }

    Ok(plan)
}

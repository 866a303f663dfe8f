//! Gmail labels
//!
//! [`LabelTokenParser`] splits the label list of an `X-GM-LABELS`
//! fetch response into tokens. [`LabelSet`] accumulates them without
//! duplicates, remembering the order labels were first seen in, and
//! renders the list sent back with STORE.

use crate::error::Result;
use regex::Regex;
use serde::Serialize;

/// Prefix the server puts in front of its own system labels.
pub const INTERNAL_PREFIX: &str = "\\\\";
/// System label of messages in the inbox. Always kept.
pub const INBOX_MARKER: &str = "\\\\Inbox";
/// System label of messages the account sent.
pub const SENT_MARKER: &str = "\\\\Sent";

/// Label given to a single sent message that has no other label.
pub const SENT_ONLY_LABEL: &str = "sent_only";
/// Label given to a thread that has no label at all.
pub const ORPHANED_LABEL: &str = "orphaned";

/// Whether `label` is a server-internal label that reconciliation ignores.
#[must_use]
pub fn is_internal(label: &str) -> bool {
    label.starts_with(INTERNAL_PREFIX) && label != INBOX_MARKER
}

/// Tokenizer for the inside of an `X-GM-LABELS (...)` list.
///
/// A token is either a double-quoted string (which may contain spaces)
/// or a run of non-whitespace characters. Quotes are stripped; no
/// other unescaping is done.
///
/// # Examples
///
/// ```
/// use mailshift::LabelTokenParser;
///
/// let parser = LabelTokenParser::new().unwrap();
/// assert_eq!(
///     parser.parse(r#""\Inbox" Work "Project X""#),
///     vec!["\\Inbox", "Work", "Project X"],
/// );
/// ```
#[derive(Debug, Clone)]
pub struct LabelTokenParser {
    token: Regex,
}

impl LabelTokenParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            token: Regex::new(r#"^\s*(?:"(.*?)"|(\S+))"#)?,
        })
    }

    /// Decode every token in `fragment`, in order.
    #[must_use]
    pub fn parse(&self, fragment: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut rest = fragment;
        while let Some(caps) = self.token.captures(rest) {
            let Some(value) = caps.get(1).or_else(|| caps.get(2)) else {
                break;
            };
            tokens.push(value.as_str().to_string());
            rest = &rest[caps.get(0).map_or(rest.len(), |m| m.end())..];
        }
        tokens
    }
}

/// An insertion-ordered set of labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    #[must_use]
    pub const fn new() -> Self {
        Self { labels: Vec::new() }
    }

    /// Add `label` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        if self.contains(&label) {
            return false;
        }
        self.labels.push(label);
        true
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Render as the STORE value: `("a" "b c")`.
    #[must_use]
    pub fn to_store_list(&self) -> String {
        let quoted: Vec<String> = self.labels.iter().map(|l| format!("\"{l}\"")).collect();
        format!("({})", quoted.join(" "))
    }
}

impl<S: Into<String>> FromIterator<S> for LabelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for label in iter {
            set.insert(label);
        }
        set
    }
}

impl<S: Into<String>> Extend<S> for LabelSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for label in iter {
            self.insert(label);
        }
    }
}

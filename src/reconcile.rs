//! Thread label reconciliation
//!
//! Gmail files a conversation under a label only for the messages
//! that actually carry it, so a thread can end up split across IMAP
//! folders. [`ThreadLabelReconciler`] gives every message of a thread
//! the union of the thread's user labels. A thread with no usable
//! label gets a synthetic one (`sent_only` or `orphaned`) so that it
//! still surfaces in some folder.

use crate::config::FailurePolicy;
use crate::error::{Error, Result};
use crate::label::{self, LabelSet, LabelTokenParser, ORPHANED_LABEL, SENT_MARKER, SENT_ONLY_LABEL};
use crate::observer::ReconcileObserver;
use crate::session::{ListEntry, MailSession, StoreOperation};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// A conversation: Gmail's thread id plus the sequence numbers of its
/// messages in the currently selected folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thread {
    pub id: u64,
    pub messages: Vec<u32>,
}

impl Thread {
    pub fn new(id: u64, messages: impl Into<Vec<u32>>) -> Self {
        Self {
            id,
            messages: messages.into(),
        }
    }

    /// The comma-separated sequence set addressing every message.
    #[must_use]
    pub fn selector(&self) -> String {
        self.messages
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// How the final label set of a thread was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The union of the labels found on the messages.
    Labelled,
    /// A lone sent message with no other label.
    SentOnly,
    /// Nothing usable was found.
    Orphaned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadOutcome {
    pub thread: u64,
    pub labels: LabelSet,
    pub resolution: Resolution,
}

impl ThreadOutcome {
    #[must_use]
    pub fn is_orphaned(&self) -> bool {
        self.resolution == Resolution::Orphaned
    }

    #[must_use]
    pub fn is_sent_only(&self) -> bool {
        self.resolution == Resolution::SentOnly
    }
}

/// Counters for a whole reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub threads: usize,
    pub orphaned: usize,
    pub sent_only: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    pub failure_policy: FailurePolicy,
}

pub struct ThreadLabelReconciler {
    parser: LabelTokenParser,
    labels_line: regex::Regex,
    thread_line: regex::Regex,
    options: ReconcileOptions,
}

impl ThreadLabelReconciler {
    pub fn new(options: ReconcileOptions) -> Result<Self> {
        Ok(Self {
            parser: LabelTokenParser::new()?,
            labels_line: regex::Regex::new(r"^(?P<msgid>\d+) +\(X-GM-LABELS +\((?P<labels>.+)\)\)$")?,
            thread_line: regex::Regex::new(r"^(?P<msgid>\d+) +\(X-GM-THRID +(?P<thread>\d+)\)$")?,
            options,
        })
    }

    /// Compute the label set for a thread of `message_count` messages
    /// from its raw `X-GM-LABELS` fetch lines.
    ///
    /// Lines that do not look like `<seq> (X-GM-LABELS (...))` are ignored.
    #[must_use]
    pub fn resolve(&self, responses: &[String], message_count: usize) -> (LabelSet, Resolution) {
        let mut labels = LabelSet::new();
        let mut last_message: Vec<String> = Vec::new();

        for line in responses {
            let Some(caps) = self.labels_line.captures(line) else {
                debug!("Ignoring unexpected label response {line:?}");
                continue;
            };
            last_message = self.parser.parse(&caps["labels"]);
            labels.extend(
                last_message
                    .iter()
                    .filter(|l| !l.is_empty() && !label::is_internal(l))
                    .cloned(),
            );
        }

        if !labels.is_empty() {
            return (labels, Resolution::Labelled);
        }

        if message_count == 1 && last_message.iter().any(|l| l == SENT_MARKER) {
            labels.insert(SENT_ONLY_LABEL);
            (labels, Resolution::SentOnly)
        } else {
            labels.insert(ORPHANED_LABEL);
            (labels, Resolution::Orphaned)
        }
    }

    /// Fetch the labels of every message in `thread` and add the union
    /// back to all of them with a single STORE.
    pub async fn reconcile_thread<S: MailSession>(
        &self,
        session: &mut S,
        thread: &Thread,
    ) -> Result<ThreadOutcome> {
        let selector = thread.selector();

        let responses = session
            .fetch(&selector, "(X-GM-LABELS)")
            .await
            .map_err(|e| Error::Reconcile {
                thread: thread.id,
                reason: format!("unable to fetch labels: {e}"),
            })?;

        let (labels, resolution) = self.resolve(&responses, thread.messages.len());
        debug!("Thread {} -> {} ({:?})", thread.id, labels.to_store_list(), resolution);

        session
            .store(&selector, StoreOperation::Add, &labels.to_store_list())
            .await
            .map_err(|e| Error::Reconcile {
                thread: thread.id,
                reason: format!("unable to store labels: {e}"),
            })?;

        Ok(ThreadOutcome {
            thread: thread.id,
            labels,
            resolution,
        })
    }

    /// Reconcile every thread in order.
    ///
    /// Under [`FailurePolicy::Abort`] the first failing thread ends the
    /// run with its error; under [`FailurePolicy::Continue`] failures are
    /// counted and the run goes on.
    pub async fn reconcile_all<S, O>(
        &self,
        session: &mut S,
        threads: &[Thread],
        observer: &mut O,
    ) -> Result<ReconcileSummary>
    where
        S: MailSession,
        O: ReconcileObserver,
    {
        let mut summary = ReconcileSummary::default();
        let total = threads.len();

        for (i, thread) in threads.iter().enumerate() {
            observer.thread_started(i + 1, total, thread);
            summary.threads += 1;

            match self.reconcile_thread(session, thread).await {
                Ok(outcome) => {
                    summary.orphaned += usize::from(outcome.is_orphaned());
                    summary.sent_only += usize::from(outcome.is_sent_only());
                    observer.thread_finished(&outcome);
                }
                Err(e) => {
                    warn!("{}", e);
                    observer.thread_failed(thread, &e);
                    if self.options.failure_policy == FailurePolicy::Abort {
                        return Err(e);
                    }
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Reconciled {} thread(s): {} orphaned, {} sent only, {} failed",
            summary.threads, summary.orphaned, summary.sent_only, summary.failed
        );
        Ok(summary)
    }

    /// Group the messages of `folder` into threads by `X-GM-THRID`.
    ///
    /// Selects `folder` read-only. Threads come out in the order their
    /// first message appears.
    pub async fn discover_threads<S: MailSession>(
        &self,
        session: &mut S,
        folder: &str,
    ) -> Result<Vec<Thread>> {
        let count = session.select(folder, true).await?;
        info!("{} contains {} messages", folder, count);
        if count == 0 {
            return Ok(Vec::new());
        }

        let responses = session
            .fetch(&format!("1:{count}"), "(X-GM-THRID)")
            .await?;
        Ok(self.group_threads(&responses))
    }

    fn group_threads(&self, responses: &[String]) -> Vec<Thread> {
        let mut threads: Vec<Thread> = Vec::new();
        let mut index: HashMap<u64, usize> = HashMap::new();

        for line in responses {
            let Some(caps) = self.thread_line.captures(line) else {
                debug!("Ignoring unexpected thread response {line:?}");
                continue;
            };
            let (Ok(seq), Ok(id)) = (caps["msgid"].parse::<u32>(), caps["thread"].parse::<u64>())
            else {
                continue;
            };
            match index.get(&id) {
                Some(&i) => threads[i].messages.push(seq),
                None => {
                    index.insert(id, threads.len());
                    threads.push(Thread::new(id, vec![seq]));
                }
            }
        }

        threads
    }
}

/// Name of Gmail's "All Mail" folder, found by its special-use attribute.
pub fn find_all_mail(listing: &[ListEntry]) -> Result<String> {
    listing
        .iter()
        .find(|e| e.has_attribute("\\All") || e.has_attribute("\\AllMail"))
        .map(|e| e.name.clone())
        .ok_or_else(|| Error::Config("Unable to find the \"All Mail\" folder".to_string()))
}

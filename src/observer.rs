//! Progress callbacks
//!
//! The pipelines never print. Callers that want progress output
//! implement these traits; every method has an empty default.

use crate::error::Error;
use crate::migrate::JobReport;
use crate::plan::CopyJob;
use crate::reconcile::{Thread, ThreadOutcome};

pub trait MigrationObserver {
    /// `index` is 1-based.
    fn job_started(&mut self, _job: &CopyJob, _index: usize, _total: usize) {}

    fn message_downloaded(&mut self, _position: usize, _total: usize) {}

    fn message_uploaded(&mut self, _position: usize, _total: usize) {}

    fn job_finished(&mut self, _report: &JobReport) {}
}

pub trait ReconcileObserver {
    /// `index` is 1-based.
    fn thread_started(&mut self, _index: usize, _total: usize, _thread: &Thread) {}

    fn thread_finished(&mut self, _outcome: &ThreadOutcome) {}

    fn thread_failed(&mut self, _thread: &Thread, _error: &Error) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MigrationObserver for NoopObserver {}

impl ReconcileObserver for NoopObserver {}

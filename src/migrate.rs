//! Staged folder migration
//!
//! Each [`CopyJob`] runs the same fixed sequence against two sessions:
//!
//! ```text
//!   refresh source -> select (read-only) -> idle destination
//!     -> search ALL -> download every message to staging
//!     -> reconnect destination -> create folder
//!     -> upload from staging (deleting each entry once appended)
//! ```
//!
//! The destination is disconnected while downloading because that
//! phase can take long enough for an idle connection to be dropped by
//! the server. Downloading is all-or-nothing: nothing is appended
//! unless every message was staged.

use crate::config::{FailurePolicy, StagingCleanup};
use crate::error::{Error, Result};
use crate::observer::MigrationObserver;
use crate::plan::CopyJob;
use crate::session::MailSession;
use crate::staging::StagingArea;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

/// Point in the job pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RefreshSource,
    Select,
    IdleDestination,
    Enumerate,
    Download,
    CreateDestination,
    Upload,
}

impl Stage {
    /// 1-based step number.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::RefreshSource => 1,
            Self::Select => 2,
            Self::IdleDestination => 3,
            Self::Enumerate => 4,
            Self::Download => 5,
            Self::CreateDestination => 6,
            Self::Upload => 7,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RefreshSource => "refresh source",
            Self::Select => "select source folder",
            Self::IdleDestination => "idle destination",
            Self::Enumerate => "enumerate messages",
            Self::Download => "download",
            Self::CreateDestination => "create destination folder",
            Self::Upload => "upload",
        };
        write!(f, "{name} (stage {})", self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Completed,
    Aborted { stage: Stage, reason: String },
}

/// What happened to one copy job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job: CopyJob,
    pub outcome: JobOutcome,
    /// Messages found in the source folder.
    pub total: usize,
    pub downloaded: usize,
    pub uploaded: usize,
    /// Staging directory left behind by an aborted job.
    pub staging_dir: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobReport {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.outcome, JobOutcome::Completed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    /// Directory under which per-job staging directories are made.
    pub staging_root: Option<PathBuf>,
    pub cleanup: StagingCleanup,
    pub failure_policy: FailurePolicy,
}

/// Progress of the job currently running.
struct JobState {
    total: usize,
    downloaded: usize,
    uploaded: usize,
    staging: Option<StagingArea>,
}

struct Abort {
    stage: Stage,
    error: Error,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, Abort>;
}

impl<T> AtStage<T> for Result<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, Abort> {
        self.map_err(|error| Abort { stage, error })
    }
}

/// Runs copy jobs from a source session into a destination session.
pub struct StagedMigrator<S, D> {
    source: S,
    destination: D,
    options: MigrationOptions,
}

impl<S: MailSession, D: MailSession> StagedMigrator<S, D> {
    pub const fn new(source: S, destination: D, options: MigrationOptions) -> Self {
        Self {
            source,
            destination,
            options,
        }
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    pub const fn destination(&self) -> &D {
        &self.destination
    }

    /// Give back both sessions.
    pub fn into_sessions(self) -> (S, D) {
        (self.source, self.destination)
    }

    /// Run `jobs` one after another and report each.
    ///
    /// An aborted job never aborts the run unless the failure policy is
    /// [`FailurePolicy::Abort`], in which case the aborted job is the
    /// last one reported.
    pub async fn run<O: MigrationObserver>(
        &mut self,
        jobs: &[CopyJob],
        observer: &mut O,
    ) -> Vec<JobReport> {
        let mut reports = Vec::with_capacity(jobs.len());
        for (i, job) in jobs.iter().enumerate() {
            observer.job_started(job, i + 1, jobs.len());
            let report = self.copy_job(job, observer).await;
            observer.job_finished(&report);
            let stop = !report.is_completed() && self.options.failure_policy == FailurePolicy::Abort;
            reports.push(report);
            if stop {
                warn!("Stopping after failed job; {} job(s) not run", jobs.len() - i - 1);
                break;
            }
        }
        reports
    }

    /// Run a single job through every stage.
    pub async fn copy_job<O: MigrationObserver>(
        &mut self,
        job: &CopyJob,
        observer: &mut O,
    ) -> JobReport {
        let started_at = Utc::now();
        info!("Copying {} => {}", job.source, job.destination);

        let mut state = JobState {
            total: 0,
            downloaded: 0,
            uploaded: 0,
            staging: None,
        };
        let result = self.execute(job, &mut state, observer).await;

        let (outcome, staging_dir) = match result {
            Ok(()) => {
                info!("Copied {} message(s) into {}", state.uploaded, job.destination);
                (JobOutcome::Completed, None)
            }
            Err(Abort { stage, error }) => {
                warn!("Job {} => {} aborted at {}: {}", job.source, job.destination, stage, error);
                let staging_dir = state
                    .staging
                    .take()
                    .and_then(|area| area.abandon(self.options.cleanup));
                (
                    JobOutcome::Aborted {
                        stage,
                        reason: error.to_string(),
                    },
                    staging_dir,
                )
            }
        };

        JobReport {
            job: job.clone(),
            outcome,
            total: state.total,
            downloaded: state.downloaded,
            uploaded: state.uploaded,
            staging_dir,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn execute<O: MigrationObserver>(
        &mut self,
        job: &CopyJob,
        state: &mut JobState,
        observer: &mut O,
    ) -> std::result::Result<(), Abort> {
        let source_name = job.source.render();
        let dest_name = job.destination.render();

        self.source.disconnect().await.at(Stage::RefreshSource)?;
        self.source.connect().await.at(Stage::RefreshSource)?;

        self.source.select(&source_name, true).await.at(Stage::Select)?;

        self.destination.disconnect().await.at(Stage::IdleDestination)?;

        let ids = self.source.search("ALL").await.at(Stage::Enumerate)?;
        state.total = ids.len();

        // Created even for an empty folder: the job still creates the
        // destination, and the empty directory goes away with the area.
        let staging = state
            .staging
            .insert(StagingArea::create(self.options.staging_root.as_deref()).at(Stage::Download)?);
        for (i, id) in ids.iter().enumerate() {
            let position = i + 1;
            let content = self.source.fetch_message(*id).await.at(Stage::Download)?;
            staging.put(position, &content).await.at(Stage::Download)?;
            state.downloaded += 1;
            observer.message_downloaded(position, state.total);
        }

        self.destination.connect().await.at(Stage::CreateDestination)?;
        match self.destination.create(&dest_name).await {
            Ok(()) => {}
            Err(Error::AlreadyExists(_)) => info!("{} already exists", dest_name),
            Err(error) => {
                return Err(Abort {
                    stage: Stage::CreateDestination,
                    error,
                });
            }
        }

        let positions = staging.positions().to_vec();
        for position in positions {
            let content = staging.get(position).await.at(Stage::Upload)?;
            self.destination
                .append(&dest_name, None, None, &content)
                .await
                .at(Stage::Upload)?;
            staging.remove(position).await.at(Stage::Upload)?;
            state.uploaded += 1;
            observer.message_uploaded(position, state.total);
        }

        // Drained; dropping the area removes the directory.
        state.staging = None;
        Ok(())
    }
}

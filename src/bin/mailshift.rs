#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for copying IMAP folders between servers and fixing Gmail thread labels

use clap::{Parser, Subcommand};
use mailshift::{
    CopyJob, Endpoint, Error, FailurePolicy, ImapConfig, ImapConnection, JobOutcome, JobReport,
    MailSession, MigrationObserver, MigrationOptions, ReconcileObserver, ReconcileOptions,
    StagedMigrator, StagingCleanup, Thread, ThreadLabelReconciler, build_plan,
    find_all_mail, list_folders, separator, source_folders,
};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailshift")]
#[command(about = "Copy IMAP folders between servers and reconcile Gmail thread labels")]
#[command(after_help = "Credentials are read from SOURCE_USERNAME / SOURCE_PASSWORD and \
DESTINATION_USERNAME / DESTINATION_PASSWORD (a .env file is honoured). \
Set <PREFIX>_SECURITY=starttls and <PREFIX>_ACCEPT_INVALID_CERTS=true as needed.")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List the folders on the source server with their message counts
    List {
        /// Source server as host:port
        #[arg(long, value_parser = parse_endpoint)]
        source: Endpoint,
    },

    /// Copy folders from the source server to the destination server
    Copy {
        /// Source server as host:port
        #[arg(long, value_parser = parse_endpoint)]
        source: Endpoint,

        /// Destination server as host:port
        #[arg(long, value_parser = parse_endpoint)]
        destination: Endpoint,

        /// Folders to copy: `*` for all, `x,y,z` for some, `x.x1,y.y1` to rename.
        /// Write nested folders with `/`.
        #[arg(long)]
        folders: String,

        /// Stop at the first job that fails
        #[arg(long)]
        stop_on_error: bool,

        /// Delete the staged messages of a failed job instead of keeping them
        #[arg(long)]
        remove_staging: bool,

        /// Directory to stage messages in (default: system temp dir)
        #[arg(long)]
        staging_dir: Option<PathBuf>,
    },

    /// Give every message of each Gmail thread the labels of the whole thread
    Labels {
        /// Gmail server as host:port, e.g. imap.gmail.com:993
        #[arg(long, value_parser = parse_endpoint)]
        source: Endpoint,

        /// Stop at the first thread that fails
        #[arg(long)]
        stop_on_error: bool,
    },
}

fn parse_endpoint(s: &str) -> Result<Endpoint, String> {
    Endpoint::parse(s).map_err(|e| e.to_string())
}

const fn policy(stop_on_error: bool) -> FailurePolicy {
    if stop_on_error {
        FailurePolicy::Abort
    } else {
        FailurePolicy::Continue
    }
}

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let result = match &args.command {
        Command::List { source } => cmd_list(&args, source).await,
        Command::Copy {
            source,
            destination,
            folders,
            stop_on_error,
            remove_staging,
            staging_dir,
        } => {
            let options = MigrationOptions {
                staging_root: staging_dir.clone(),
                cleanup: if *remove_staging {
                    StagingCleanup::Remove
                } else {
                    StagingCleanup::Keep
                },
                failure_policy: policy(*stop_on_error),
            };
            cmd_copy(&args, source, destination, folders, options).await
        }
        Command::Labels {
            source,
            stop_on_error,
        } => cmd_labels(&args, source, policy(*stop_on_error)).await,
    };

    if let Err(e) = result {
        eprintln!("[!] Error: {e}");
        std::process::exit(1);
    }
}

async fn connect(prefix: &str, endpoint: &Endpoint) -> anyhow::Result<ImapConnection> {
    let mut session = ImapConnection::new(ImapConfig::from_env(prefix, endpoint)?);
    session.connect().await?;
    Ok(session)
}

async fn cmd_list(args: &Args, source: &Endpoint) -> anyhow::Result<()> {
    let mut session = connect("SOURCE", source).await?;
    let folders = list_folders(&mut session).await;
    session.disconnect().await?;
    let folders = folders?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&folders)?);
    } else {
        for folder in &folders {
            match folder.messages {
                Some(count) => println!("{} ({count})", folder.path),
                None => println!("{} (-)", folder.path),
            }
        }
    }

    Ok(())
}

async fn cmd_copy(
    args: &Args,
    source: &Endpoint,
    destination: &Endpoint,
    folders: &str,
    options: MigrationOptions,
) -> anyhow::Result<()> {
    let mut src = connect("SOURCE", source).await?;
    let mut dest = connect("DESTINATION", destination).await?;

    let listing = source_folders(&src.list().await?);
    let dest_separator = separator(&dest.list().await?);
    let plan = build_plan(&listing, folders, dest_separator)?;

    if !plan.skipped.is_empty() && !args.json {
        println!(
            "The following folders were not found on the source server: {}",
            plan.skipped.join(", ")
        );
    }

    let mut migrator = StagedMigrator::new(src, dest, options);
    let mut progress = CopyProgress { quiet: args.json };
    let reports = migrator.run(&plan.jobs, &mut progress).await;

    let (mut src, mut dest) = migrator.into_sessions();
    dest.disconnect().await?;
    src.disconnect().await?;

    if args.json {
        let out = serde_json::json!({ "skipped": plan.skipped, "jobs": reports });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("ALL DONE");
    }

    let failed = reports.iter().filter(|r| !r.is_completed()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} job(s) failed", plan.jobs.len());
    }
    Ok(())
}

async fn cmd_labels(
    args: &Args,
    source: &Endpoint,
    failure_policy: FailurePolicy,
) -> anyhow::Result<()> {
    let mut session = connect("SOURCE", source).await?;
    let reconciler = ThreadLabelReconciler::new(ReconcileOptions { failure_policy })?;

    let all_mail = find_all_mail(&session.list().await?)?;
    if !args.json {
        println!("[i] Opening {all_mail}");
    }
    let threads = reconciler.discover_threads(&mut session, &all_mail).await?;
    if !args.json {
        println!("[i] Found {} threads", threads.len());
    }

    let mut progress = LabelProgress { quiet: args.json };
    let summary = reconciler
        .reconcile_all(&mut session, &threads, &mut progress)
        .await;
    session.disconnect().await?;
    let summary = summary?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!();
        println!("[i] Orphaned threads:   {}", summary.orphaned);
        println!("[i] Sent only threads:  {}", summary.sent_only);
        if summary.failed > 0 {
            println!("[!] Failed threads:     {}", summary.failed);
        }
        println!("[i] ALL DONE");
    }

    Ok(())
}

struct CopyProgress {
    quiet: bool,
}

impl MigrationObserver for CopyProgress {
    fn job_started(&mut self, job: &CopyJob, _index: usize, _total: usize) {
        if !self.quiet {
            println!("Copying {} => {}", job.source, job.destination);
        }
    }

    fn message_uploaded(&mut self, position: usize, total: usize) {
        if !self.quiet {
            print!("\rCopying {position} of {total}");
            std::io::stdout().flush().ok();
        }
    }

    fn job_finished(&mut self, report: &JobReport) {
        if self.quiet {
            return;
        }
        if report.total > 0 {
            println!();
        }
        match &report.outcome {
            JobOutcome::Completed => println!(
                "Copied {} message(s) in {}s",
                report.uploaded,
                (report.finished_at - report.started_at).num_seconds()
            ),
            JobOutcome::Aborted { stage, reason } => {
                println!("[!] Aborted at {stage}: {reason}");
                if let Some(dir) = &report.staging_dir {
                    println!("[!] Staged messages kept in {}", dir.display());
                }
            }
        }
    }
}

struct LabelProgress {
    quiet: bool,
}

impl ReconcileObserver for LabelProgress {
    fn thread_started(&mut self, index: usize, total: usize, _thread: &Thread) {
        if !self.quiet {
            print!("\r[i] Processing thread {index} of {total}");
            std::io::stdout().flush().ok();
        }
    }

    fn thread_failed(&mut self, _thread: &Thread, error: &Error) {
        if !self.quiet {
            println!();
            println!("[!] {error}");
        }
    }
}

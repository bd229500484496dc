// Console observer of a deletion job.
//
// Reads ProgressEvents from the bridge and renders connection status,
// per-channel progress and the final summary with indicatif.

use async_channel::Receiver;
use indicatif::{HumanCount, HumanDuration, ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;

use dcrm_rs::{JobSummary, ProgressEvent};

/// How the observed job ended.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEnd {
    Completed(JobSummary),
    Cancelled(JobSummary),
    Aborted(String),
    ConnectionFailed(String),
    /// The event channel closed before a terminal event.
    Disconnected,
}

/// Summary returned by [`show_indicator`] once the job has ended.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSummary {
    pub total_delete_count: u64,
    pub total_skip_count: u64,
    pub total_error_count: u64,
    pub end: JobEnd,
}

const TICK_INTERVAL_MILLIS: u64 = 100;

/// Spawn a task that renders events until the job ends.
///
/// # Arguments
/// - `events` - Progress events of the bridge
/// - `show_progress` - Whether to display the live-updating progress line
/// - `show_result` - Whether to print per-channel lines and the final summary
/// - `dry_run` - Whether counts are simulated
pub fn show_indicator(
    events: Receiver<ProgressEvent>,
    show_progress: bool,
    show_result: bool,
    dry_run: bool,
) -> JoinHandle<IndicatorSummary> {
    let progress_text = if show_progress {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) = ProgressStyle::with_template("{spinner} {wide_msg}") {
        progress_text.set_style(style);
    }

    tokio::spawn(async move {
        let start_time = Instant::now();
        let verb = if dry_run { "would delete" } else { "deleted" };

        let mut total_delete_count: u64 = 0;
        let mut total_skip_count: u64 = 0;
        let mut total_error_count: u64 = 0;

        let print_line = |line: String| {
            if show_result {
                progress_text.suspend(|| println!("{line}"));
            }
        };

        let end = loop {
            let Ok(event) = events.recv().await else {
                break JobEnd::Disconnected;
            };

            match event {
                ProgressEvent::Connected { user, communities } => {
                    print_line(format!(
                        "connected as {user} ({} guilds)",
                        communities.len()
                    ));
                }
                ProgressEvent::ConnectionFailed { reason } => {
                    break JobEnd::ConnectionFailed(reason);
                }
                ProgressEvent::JobStarted {
                    community,
                    author_id,
                    total_channels,
                } => {
                    print_line(format!(
                        "removing messages by {author_id} in {community} ({total_channels} channels)"
                    ));
                    progress_text.enable_steady_tick(std::time::Duration::from_millis(
                        TICK_INTERVAL_MILLIS,
                    ));
                }
                ProgressEvent::ChannelStarted { index, total, name } => {
                    progress_text.set_message(format!(
                        "[{index}/{total}] #{name} | {verb} {} messages",
                        HumanCount(total_delete_count)
                    ));
                }
                ProgressEvent::ChannelSkipped { name, reason } => {
                    total_skip_count += 1;
                    print_line(format!("#{name}: skipped ({reason})"));
                }
                ProgressEvent::ChannelResult { name, count } => {
                    total_delete_count += count;
                    print_line(format!("#{name}: {verb} {count} messages"));
                }
                ProgressEvent::ChannelError {
                    name,
                    kind,
                    message,
                } => {
                    total_error_count += 1;
                    print_line(format!("#{name}: failed ({kind}): {message}"));
                }
                ProgressEvent::JobCompleted { summary } => {
                    break JobEnd::Completed(summary);
                }
                ProgressEvent::JobCancelled { summary } => {
                    break JobEnd::Cancelled(summary);
                }
                ProgressEvent::JobAborted { reason } => {
                    break JobEnd::Aborted(reason);
                }
            }
        };

        // The job's own tally is authoritative when there is one.
        if let JobEnd::Completed(summary) | JobEnd::Cancelled(summary) = &end {
            total_delete_count = summary.total_deleted();
            total_skip_count = summary.channels_skipped();
            total_error_count = summary.errors_count();
        }

        let elapsed = start_time.elapsed();
        info!(
            message = "deletion summary",
            deleted_messages = total_delete_count,
            skipped_channels = total_skip_count,
            error_channels = total_error_count,
            cancelled = matches!(end, JobEnd::Cancelled(_)),
            dry_run = dry_run,
            duration_sec = elapsed.as_secs_f64(),
        );

        if show_result {
            let status = match &end {
                JobEnd::Completed(_) => "completed".to_string(),
                JobEnd::Cancelled(_) => "cancelled".to_string(),
                JobEnd::Aborted(reason) => format!("aborted: {reason}"),
                JobEnd::ConnectionFailed(reason) => format!("connection failed: {reason}"),
                JobEnd::Disconnected => "disconnected".to_string(),
            };
            progress_text.finish_and_clear();
            println!(
                "{status} | {verb} {} messages,  skipped {} channels,  error {} channels,  duration {}",
                HumanCount(total_delete_count),
                total_skip_count,
                total_error_count,
                HumanDuration(elapsed),
            );
        } else {
            progress_text.finish_and_clear();
        }

        IndicatorSummary {
            total_delete_count,
            total_skip_count,
            total_error_count,
            end,
        }
    })
}

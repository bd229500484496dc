//! Progress events emitted by a deletion job.
//!
//! Events flow from the background job to the foreground over an unbounded
//! `async_channel`, in the order they were produced.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_channel::{Receiver, Sender};
use tracing::debug;

use crate::types::error::ErrorKind;
use crate::types::{Community, JobSummary, UserId};

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// The client verified its connection. `communities` lists where it can act.
    Connected {
        user: String,
        communities: Vec<Community>,
    },
    ConnectionFailed {
        reason: String,
    },
    JobStarted {
        community: String,
        author_id: UserId,
        total_channels: usize,
    },
    /// `index` is 1-based.
    ChannelStarted {
        index: usize,
        total: usize,
        name: String,
    },
    ChannelSkipped {
        name: String,
        reason: String,
    },
    ChannelResult {
        name: String,
        count: u64,
    },
    ChannelError {
        name: String,
        kind: ErrorKind,
        message: String,
    },
    JobCompleted {
        summary: JobSummary,
    },
    JobCancelled {
        summary: JobSummary,
    },
    JobAborted {
        reason: String,
    },
}

impl ProgressEvent {
    /// Whether this event ends a job.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::JobCompleted { .. }
                | ProgressEvent::JobCancelled { .. }
                | ProgressEvent::JobAborted { .. }
        )
    }
}

/// Sending half of the progress channel.
///
/// When created with a job flag, the flag is cleared right before a terminal
/// event is sent, so a caller that reacts to the terminal event can submit
/// the next job immediately.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    sender: Sender<ProgressEvent>,
    job_flag: Option<Arc<AtomicBool>>,
}

impl ProgressSink {
    pub fn new(sender: Sender<ProgressEvent>) -> Self {
        Self {
            sender,
            job_flag: None,
        }
    }

    /// Unbounded channel pair.
    pub fn channel() -> (ProgressSink, Receiver<ProgressEvent>) {
        let (sender, receiver) = async_channel::unbounded();
        (ProgressSink::new(sender), receiver)
    }

    pub fn with_job_flag(mut self, job_flag: Arc<AtomicBool>) -> Self {
        self.job_flag = Some(job_flag);
        self
    }

    pub async fn emit(&self, event: ProgressEvent) {
        if event.is_terminal() {
            if let Some(job_flag) = &self.job_flag {
                job_flag.store(false, Ordering::SeqCst);
            }
        }

        if self.sender.send(event).await.is_err() {
            debug!("progress receiver has been dropped.");
        }
    }
}

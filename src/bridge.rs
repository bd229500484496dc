//! Hand-off between a foreground caller and the background deletion worker.
//!
//! The foreground submits jobs and drains [`ProgressEvent`]s without ever
//! touching the network. The worker task owns the client, verifies the
//! connection once on start and runs submitted jobs one at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_channel::{Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::client::ChatClient;
use crate::config::Config;
use crate::orchestrator::DeletionOrchestrator;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::types::error::DcrmError;
use crate::types::token::{JobCancellationToken, create_job_cancellation_token};
use crate::types::{ActingIdentity, CommunityId, UserId};

struct JobRequest {
    community_id: CommunityId,
    author_id: UserId,
    cancellation_token: JobCancellationToken,
}

/// Foreground handle of the background deletion worker.
///
/// # Example
///
/// ```no_run
/// use dcrm_rs::{Config, ControlBridge, ProgressEvent, create_client};
///
/// # async fn run() -> anyhow::Result<()> {
/// let config = Config::for_community(123456789012345678);
/// let bridge = ControlBridge::spawn(create_client(&config)?, config);
/// bridge.submit("123456789012345678", "80351110224678912")?;
///
/// let events = bridge.events();
/// while let Ok(event) = events.recv().await {
///     if event.is_terminal() {
///         break;
///     }
/// }
///
/// bridge.shutdown();
/// bridge.join().await
/// # }
/// ```
pub struct ControlBridge {
    request_sender: Sender<JobRequest>,
    events: Receiver<ProgressEvent>,
    busy: Arc<AtomicBool>,
    shutdown_token: JobCancellationToken,
    active_job: Mutex<Option<JobCancellationToken>>,
    worker: JoinHandle<()>,
}

impl ControlBridge {
    /// Start the worker on the current tokio runtime.
    pub fn spawn(client: ChatClient, config: Config) -> Self {
        let (request_sender, requests) = async_channel::unbounded();
        let (sink, events) = ProgressSink::channel();
        let busy = Arc::new(AtomicBool::new(false));

        let worker = BridgeWorker {
            config,
            client,
            events: sink.with_job_flag(busy.clone()),
            requests,
        };

        Self {
            request_sender,
            events,
            busy,
            shutdown_token: create_job_cancellation_token(),
            active_job: Mutex::new(None),
            worker: tokio::spawn(worker.run()),
        }
    }

    /// Validate the identifiers and queue a job. Never blocks.
    pub fn submit(&self, community_id: &str, author_id: &str) -> Result<()> {
        let community_id: CommunityId = community_id.parse()?;
        let author_id: UserId = author_id.parse()?;

        if self.request_sender.is_closed() {
            return Err(anyhow!(DcrmError::BridgeClosed));
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(anyhow!(DcrmError::JobRunning));
        }

        let cancellation_token = self.shutdown_token.child_token();
        if let Ok(mut active_job) = self.active_job.lock() {
            *active_job = Some(cancellation_token.clone());
        }

        let request = JobRequest {
            community_id,
            author_id,
            cancellation_token,
        };
        if self.request_sender.try_send(request).is_err() {
            self.busy.store(false, Ordering::SeqCst);
            return Err(anyhow!(DcrmError::BridgeClosed));
        }

        debug!(
            community_id = community_id.get(),
            author_id = author_id.get(),
            "deletion job has been submitted."
        );
        Ok(())
    }

    /// Receiving half of the progress channel. Meant for a single consumer.
    pub fn events(&self) -> Receiver<ProgressEvent> {
        self.events.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Request cancellation of the active job, if any.
    pub fn cancel(&self) {
        if let Ok(active_job) = self.active_job.lock() {
            if let Some(token) = active_job.as_ref() {
                token.cancel();
            }
        }
    }

    /// Parent of every job token. Cancelling it cancels the active job and
    /// any job submitted afterwards.
    pub fn shutdown_token(&self) -> JobCancellationToken {
        self.shutdown_token.clone()
    }

    /// Stop accepting jobs. The worker exits after the active job.
    pub fn shutdown(&self) {
        self.request_sender.close();
    }

    pub async fn join(self) -> Result<()> {
        self.worker
            .await
            .map_err(|e| anyhow!("control bridge worker failed: {e}"))
    }
}

struct BridgeWorker {
    config: Config,
    client: ChatClient,
    events: ProgressSink,
    requests: Receiver<JobRequest>,
}

impl BridgeWorker {
    async fn run(self) {
        debug!("bridge worker started.");

        let acting = self.connect().await;

        while let Ok(request) = self.requests.recv().await {
            let Some(acting) = acting.as_ref() else {
                self.events
                    .emit(ProgressEvent::JobAborted {
                        reason: DcrmError::Connection("client is not connected".to_string())
                            .to_string(),
                    })
                    .await;
                continue;
            };

            let mut orchestrator = DeletionOrchestrator::new(
                self.config.clone(),
                self.client.clone(),
                acting.clone(),
                self.events.clone(),
                request.cancellation_token,
            );
            if let Err(e) = orchestrator
                .run(request.community_id, request.author_id)
                .await
            {
                debug!(error = format!("{e:#}"), "deletion job ended with an error.");
            }
        }

        debug!("bridge worker has been completed.");
    }

    async fn connect(&self) -> Option<ActingIdentity> {
        let acting = match self.client.current_user().await {
            Ok(acting) => acting,
            Err(e) => {
                let reason = format!("{e:#}");
                error!(error = reason, "connection verification failed.");
                self.events
                    .emit(ProgressEvent::ConnectionFailed { reason })
                    .await;
                return None;
            }
        };

        let communities = match self.client.list_communities().await {
            Ok(communities) => communities,
            Err(e) => {
                warn!(error = format!("{e:#}"), "failed to list communities.");
                Vec::new()
            }
        };

        info!(
            user = acting.name,
            communities = communities.len(),
            "connected."
        );
        self.events
            .emit(ProgressEvent::Connected {
                user: acting.name.clone(),
                communities,
            })
            .await;

        Some(acting)
    }
}

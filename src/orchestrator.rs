//! Deletion job orchestration.
//!
//! [`DeletionOrchestrator`] resolves the community, enumerates its channels
//! and runs a [`ChannelProcessor`] over each of them in order, producing the
//! job's [`JobSummary`].
//!
//! ```text
//! resolve community → list channels → for each channel:
//!     ChannelStarted → PermissionGate → MessageLister → MessageFilter → Deleter
//! → JobCompleted | JobCancelled
//! ```

use anyhow::{Result, anyhow};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::client::ChatClient;
use crate::config::Config;
use crate::pacer::Pacer;
use crate::permission::PermissionGate;
use crate::processor::ChannelProcessor;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::types::error::DcrmError;
use crate::types::token::JobCancellationToken;
use crate::types::{ActingIdentity, Community, CommunityId, DeletionWindow, JobSummary, UserId};

/// Lifecycle of one orchestrator.
///
/// `Idle → Running → Completed | Cancelled`, or `Running → Aborted` when the
/// community or its channels cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Aborted,
}

/// Runs one deletion job. A `run` can be called once per instance.
pub struct DeletionOrchestrator {
    config: Config,
    client: ChatClient,
    acting: ActingIdentity,
    events: ProgressSink,
    cancellation_token: JobCancellationToken,
    state: JobState,
}

impl DeletionOrchestrator {
    pub fn new(
        config: Config,
        client: ChatClient,
        acting: ActingIdentity,
        events: ProgressSink,
        cancellation_token: JobCancellationToken,
    ) -> Self {
        Self {
            config,
            client,
            acting,
            events,
            cancellation_token,
            state: JobState::Idle,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Delete `target_author_id`'s messages inside the window in every
    /// channel of `community_id` the acting identity may moderate.
    ///
    /// Per-channel failures are recorded in the summary. Only resolution
    /// failures end the job early, as `Err` after a `JobAborted` event.
    pub async fn run(
        &mut self,
        community_id: CommunityId,
        target_author_id: UserId,
    ) -> Result<JobSummary> {
        if self.state != JobState::Idle {
            return Err(anyhow!(DcrmError::InvalidConfig(
                "a deletion job can be run only once per orchestrator".to_string()
            )));
        }
        self.state = JobState::Running;

        debug!(
            community_id = community_id.get(),
            author_id = target_author_id.get(),
            "deletion job has started."
        );

        let community = match self.resolve_community(community_id).await {
            Ok(community) => community,
            Err(e) => return Err(self.abort(e).await),
        };

        let channels = match self.client.list_channels(&community, &self.acting).await {
            Ok(channels) => channels,
            Err(e) => {
                let e = anyhow!(DcrmError::Resolution(format!(
                    "failed to list channels of {}: {e:#}",
                    community.name
                )));
                return Err(self.abort(e).await);
            }
        };

        let channels: Vec<_> = channels
            .into_iter()
            .filter(|channel| channel.kind.is_text_capable())
            .collect();
        let total = channels.len();
        let window = DeletionWindow::ending_at(target_author_id, Utc::now(), self.config.window());

        info!(
            community = community.name,
            author_id = target_author_id.get(),
            total_channels = total,
            cutoff = window.cutoff().to_rfc3339(),
            dry_run = self.config.dry_run,
            "deletion job resolved."
        );
        self.events
            .emit(ProgressEvent::JobStarted {
                community: community.name.clone(),
                author_id: target_author_id,
                total_channels: total,
            })
            .await;

        let processor = ChannelProcessor::new(
            self.config.clone(),
            self.client.clone(),
            Pacer::from_config(&self.config),
            PermissionGate::new(community.id, self.acting.clone()),
            self.events.clone(),
            self.cancellation_token.clone(),
        );

        let mut summary = JobSummary::new(self.config.dry_run);
        for (position, channel) in channels.iter().enumerate() {
            if self.cancellation_token.is_cancelled() {
                break;
            }

            let index = position + 1;
            self.events
                .emit(ProgressEvent::ChannelStarted {
                    index,
                    total,
                    name: channel.name.clone(),
                })
                .await;

            let outcome = processor.process(channel, &window, index, total).await;
            summary.record(outcome);
        }

        if self.cancellation_token.is_cancelled() {
            summary.mark_cancelled();
            self.state = JobState::Cancelled;
            warn!(
                total_deleted = summary.total_deleted(),
                channels = summary.outcomes().len(),
                "deletion job has been cancelled."
            );
            self.events
                .emit(ProgressEvent::JobCancelled {
                    summary: summary.clone(),
                })
                .await;
        } else {
            self.state = JobState::Completed;
            debug!(
                total_deleted = summary.total_deleted(),
                "deletion job has been completed."
            );
            self.events
                .emit(ProgressEvent::JobCompleted {
                    summary: summary.clone(),
                })
                .await;
        }

        Ok(summary)
    }

    async fn resolve_community(&self, community_id: CommunityId) -> Result<Community> {
        let communities = self.client.list_communities().await.map_err(|e| {
            anyhow!(DcrmError::Resolution(format!(
                "failed to list communities: {e:#}"
            )))
        })?;

        communities
            .into_iter()
            .find(|community| community.id == community_id)
            .ok_or_else(|| anyhow!(DcrmError::CommunityNotFound(community_id)))
    }

    async fn abort(&mut self, e: anyhow::Error) -> anyhow::Error {
        self.state = JobState::Aborted;
        error!(error = format!("{e:#}"), "deletion job has been aborted.");
        self.events
            .emit(ProgressEvent::JobAborted {
                reason: e.to_string(),
            })
            .await;
        e
    }
}

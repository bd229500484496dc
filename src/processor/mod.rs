//! Per-channel deletion step.
//!
//! [`ChannelProcessor::process`] authorizes a channel, streams its history
//! through the message filters and deletes matches in batches. Failures are
//! contained here: they become a failed [`ChannelOutcome`] and a
//! `ChannelError` event, never an error returned to the orchestrator.

use anyhow::{Result, anyhow};
use async_channel::Receiver;
use tracing::{debug, error, info, warn};

use crate::client::ChatClient;
use crate::config::Config;
use crate::deleter::batch::MAX_BATCH_SIZE;
use crate::deleter::{Deleter, create_deleter};
use crate::filters::{DeletionWindowFilter, MessageFilter};
use crate::lister::MessageLister;
use crate::pacer::Pacer;
use crate::permission::PermissionGate;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::types::error::classify_error;
use crate::types::token::JobCancellationToken;
use crate::types::{Channel, ChannelOutcome, DeletionWindow, Message};


pub struct ChannelProcessor {
    config: Config,
    client: ChatClient,
    deleter: Box<dyn Deleter>,
    gate: PermissionGate,
    filter: DeletionWindowFilter,
    events: ProgressSink,
    cancellation_token: JobCancellationToken,
}

impl ChannelProcessor {
    pub fn new(
        config: Config,
        client: ChatClient,
        pacer: Pacer,
        gate: PermissionGate,
        events: ProgressSink,
        cancellation_token: JobCancellationToken,
    ) -> Self {
        let deleter = create_deleter(&config, client.clone(), pacer);

        Self {
            config,
            client,
            deleter,
            gate,
            filter: DeletionWindowFilter::new(),
            events,
            cancellation_token,
        }
    }

    /// Process one channel. `index` is 1-based within `total`.
    pub async fn process(
        &self,
        channel: &Channel,
        window: &DeletionWindow,
        index: usize,
        total: usize,
    ) -> ChannelOutcome {
        let authorization = self.gate.authorize(channel);
        if !authorization.allowed {
            let reason = authorization
                .reason
                .unwrap_or_else(|| "not permitted".to_string());
            warn!(
                channel = channel.name,
                index = index,
                total = total,
                reason = reason,
                "channel skipped."
            );
            self.events
                .emit(ProgressEvent::ChannelSkipped {
                    name: channel.name.clone(),
                    reason: reason.clone(),
                })
                .await;
            return ChannelOutcome::skipped(channel, reason);
        }

        debug!(
            channel = channel.name,
            index = index,
            total = total,
            "channel processing has started."
        );

        let mut deleted = 0u64;
        match self.scan_and_delete(channel, window, &mut deleted).await {
            Ok(()) => {
                info!(
                    channel = channel.name,
                    deleted = deleted,
                    dry_run = self.config.dry_run,
                    cancelled = self.cancellation_token.is_cancelled(),
                    "channel processed."
                );
                self.events
                    .emit(ProgressEvent::ChannelResult {
                        name: channel.name.clone(),
                        count: deleted,
                    })
                    .await;
                ChannelOutcome::completed(channel, deleted)
            }
            Err(e) => {
                let kind = classify_error(&e);
                let message = format!("{e:#}");
                error!(
                    channel = channel.name,
                    deleted = deleted,
                    kind = kind.to_string(),
                    error = message,
                    "channel processing failed."
                );
                self.events
                    .emit(ProgressEvent::ChannelError {
                        name: channel.name.clone(),
                        kind: kind.clone(),
                        message,
                    })
                    .await;
                ChannelOutcome::failed(channel, deleted, kind)
            }
        }
    }

    async fn scan_and_delete(
        &self,
        channel: &Channel,
        window: &DeletionWindow,
        deleted: &mut u64,
    ) -> Result<()> {
        let (sender, receiver) =
            async_channel::bounded(self.config.message_queue_size.max(1) as usize);
        let lister = MessageLister::new(
            self.client.clone(),
            channel.clone(),
            window.cutoff(),
            self.config.page_size,
            sender,
        );
        let lister_handle = tokio::spawn(lister.list());

        let drain_result = self.drain(channel, window, &receiver, deleted).await;

        // Stops the lister if draining ended early.
        receiver.close();
        let list_result = lister_handle
            .await
            .map_err(|e| anyhow!("message lister task failed: {e}"))?;

        drain_result?;
        list_result
    }

    async fn drain(
        &self,
        channel: &Channel,
        window: &DeletionWindow,
        receiver: &Receiver<Message>,
        deleted: &mut u64,
    ) -> Result<()> {
        let batch_size = usize::from(self.config.batch_size).clamp(1, MAX_BATCH_SIZE);
        let mut buffer = Vec::with_capacity(batch_size);

        while let Ok(message) = receiver.recv().await {
            if !self.filter.matches(&message, window) {
                continue;
            }

            buffer.push(message);
            if buffer.len() >= batch_size {
                self.flush(channel, &mut buffer, deleted).await?;
            }
        }

        // A started channel always runs to completion, even once the job is cancelled.
        self.flush(channel, &mut buffer, deleted).await
    }

    async fn flush(
        &self,
        channel: &Channel,
        buffer: &mut Vec<Message>,
        deleted: &mut u64,
    ) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }

        let batch = std::mem::take(buffer);

        if self.config.dry_run {
            *deleted += batch.len() as u64;
            info!(
                channel = channel.name,
                count = batch.len(),
                "[dry-run] messages would be deleted."
            );
            return Ok(());
        }

        let result = self.deleter.delete(channel, &batch).await;
        *deleted += result.deleted;

        if result.not_found > 0 {
            debug!(
                channel = channel.name,
                not_found = result.not_found,
                "some messages were already deleted."
            );
        }

        match result.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

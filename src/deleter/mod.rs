//! Deletion backends used by the channel processor.
//!
//! This module contains the [`Deleter`] trait with its two implementations:
//! [`BatchDeleter`] and [`SingleDeleter`]. Every network mutation is paced
//! through the shared [`Pacer`].

use anyhow::Error;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::client::ChatClient;
use crate::config::Config;
use crate::pacer::Pacer;
use crate::types::Channel;
use crate::types::Message;
use crate::types::error::is_not_found_error;

pub mod batch;
pub mod single;

pub use batch::BatchDeleter;
pub use single::SingleDeleter;


// ---------------------------------------------------------------------------
// Deleter trait
// ---------------------------------------------------------------------------

/// Result of one deletion batch.
///
/// The first failure stops the batch; deletions confirmed before it are
/// still counted in `deleted`.
#[derive(Debug, Default)]
pub struct DeleteResult {
    /// Deletions the platform confirmed.
    pub deleted: u64,
    /// Messages that were already gone.
    pub not_found: u64,
    pub error: Option<Error>,
}

impl DeleteResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Trait for deletion backends (batch or single mode).
#[async_trait]
pub trait Deleter: Send + Sync {
    /// Delete the given messages from `channel`.
    async fn delete(&self, channel: &Channel, messages: &[Message]) -> DeleteResult;
}

/// Select the backend for the configured batch size.
///
/// A batch size of 1 deletes every message individually.
pub fn create_deleter(config: &Config, client: ChatClient, pacer: Pacer) -> Box<dyn Deleter> {
    if config.batch_size <= 1 {
        Box::new(SingleDeleter::new(client, pacer, config.reason.clone()))
    } else {
        Box::new(BatchDeleter::new(client, pacer, config.reason.clone()))
    }
}

/// Delete `messages` one request at a time, stopping at the first failure.
///
/// A message that is already gone is counted as `not_found` and skipped.
pub(crate) async fn delete_individually(
    client: &ChatClient,
    pacer: &Pacer,
    reason: &str,
    channel: &Channel,
    messages: &[Message],
    result: &mut DeleteResult,
) {
    for message in messages {
        pacer.wait().await;

        debug!(
            channel = channel.name,
            message_id = message.id.get(),
            "sending delete message request."
        );

        match client.delete_message(channel, message.id, reason).await {
            Ok(()) => {
                result.deleted += 1;
            }
            Err(e) if is_not_found_error(&e) => {
                debug!(
                    channel = channel.name,
                    message_id = message.id.get(),
                    "message already deleted, skipping."
                );
                result.not_found += 1;
            }
            Err(e) => {
                warn!(
                    channel = channel.name,
                    message_id = message.id.get(),
                    error = format!("{e:#}"),
                    "delete message request failed."
                );
                result.error = Some(e);
                return;
            }
        }
    }
}

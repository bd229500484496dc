//! Batch deletion using the bulk delete primitive.
//!
//! The platform only bulk deletes 2 to 100 messages younger than 14 days.
//! Anything else in a batch is deleted individually.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::client::ChatClient;
use crate::pacer::Pacer;
use crate::types::error::is_bulk_delete_rejected_error;
use crate::types::{Channel, Message, MessageId};

use super::{DeleteResult, Deleter, delete_individually};

/// Maximum messages per bulk delete call (platform limit).
pub const MAX_BATCH_SIZE: usize = 100;

/// Minimum messages per bulk delete call (platform limit).
pub const MIN_BULK_DELETE_SIZE: usize = 2;

/// Messages older than this are refused by the bulk primitive.
pub fn bulk_delete_max_age() -> Duration {
    Duration::days(14)
}

/// Clock skew allowance subtracted from the bulk age limit.
pub fn bulk_delete_age_margin() -> Duration {
    Duration::minutes(1)
}

/// Whether `message` is young enough for bulk deletion at `now`.
pub(crate) fn is_bulk_deletable(message: &Message, now: DateTime<Utc>) -> bool {
    let limit = now - (bulk_delete_max_age() - bulk_delete_age_margin());
    message.created_at.with_timezone(&Utc) > limit
}

/// Deletes messages with the bulk primitive where the platform allows it.
///
/// Messages past the bulk age limit, and a single young message left over,
/// are deleted individually. A bulk call the platform still rejects for age
/// falls back to individual deletion of that chunk.
pub struct BatchDeleter {
    client: ChatClient,
    pacer: Pacer,
    reason: String,
}

impl BatchDeleter {
    pub fn new(client: ChatClient, pacer: Pacer, reason: String) -> Self {
        Self {
            client,
            pacer,
            reason,
        }
    }

    async fn delete_bulk(&self, channel: &Channel, chunk: &[Message], result: &mut DeleteResult) {
        let ids: Vec<MessageId> = chunk.iter().map(|message| message.id).collect();

        self.pacer.wait().await;

        debug!(
            channel = channel.name,
            batch_size = ids.len(),
            "sending bulk delete request."
        );

        match self.client.delete_messages(channel, &ids, &self.reason).await {
            Ok(deleted) => {
                result.deleted += deleted as u64;
                debug!(
                    channel = channel.name,
                    deleted = deleted,
                    "bulk delete request completed."
                );
            }
            Err(e) if is_bulk_delete_rejected_error(&e) => {
                warn!(
                    channel = channel.name,
                    batch_size = ids.len(),
                    error = format!("{e:#}"),
                    "bulk delete rejected, falling back to single deletions."
                );
                delete_individually(
                    &self.client,
                    &self.pacer,
                    &self.reason,
                    channel,
                    chunk,
                    result,
                )
                .await;
            }
            Err(e) => {
                result.error = Some(e);
            }
        }
    }
}

#[async_trait]
impl Deleter for BatchDeleter {
    async fn delete(&self, channel: &Channel, messages: &[Message]) -> DeleteResult {
        let mut result = DeleteResult::default();

        if messages.is_empty() {
            return result;
        }

        let now = Utc::now();
        let (young, old): (Vec<Message>, Vec<Message>) = messages
            .iter()
            .cloned()
            .partition(|message| is_bulk_deletable(message, now));

        for chunk in young.chunks(MAX_BATCH_SIZE) {
            if chunk.len() >= MIN_BULK_DELETE_SIZE {
                self.delete_bulk(channel, chunk, &mut result).await;
            } else {
                delete_individually(
                    &self.client,
                    &self.pacer,
                    &self.reason,
                    channel,
                    chunk,
                    &mut result,
                )
                .await;
            }

            if !result.is_ok() {
                return result;
            }
        }

        if !old.is_empty() {
            debug!(
                channel = channel.name,
                count = old.len(),
                "deleting messages past the bulk age limit individually."
            );
            delete_individually(
                &self.client,
                &self.pacer,
                &self.reason,
                channel,
                &old,
                &mut result,
            )
            .await;
        }

        result
    }
}

use anyhow::Result;
use async_channel::Sender;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::client::ChatClient;
use crate::types::{Channel, Message};

/// Lists a channel's history into the processor's message queue.
///
/// A thin wrapper that delegates to `ChatClientTrait::list_messages()`. When
/// the client can bound history server side, only messages after the window
/// cutoff are requested; otherwise the full history is listed and the
/// processor's filters discard everything older.
///
/// ```text
/// MessageLister → bounded queue → MessageFilter → Deleter
/// ```
pub struct MessageLister {
    client: ChatClient,
    channel: Channel,
    after: DateTime<Utc>,
    page_size: u8,
    sender: Sender<Message>,
}

impl MessageLister {
    pub fn new(
        client: ChatClient,
        channel: Channel,
        after: DateTime<Utc>,
        page_size: u8,
        sender: Sender<Message>,
    ) -> Self {
        Self {
            client,
            channel,
            after,
            page_size,
            sender,
        }
    }

    /// List messages and send them to the queue, closing it when done.
    pub async fn list(self) -> Result<()> {
        let after = if self.client.supports_time_bounded_history() {
            Some(self.after)
        } else {
            None
        };

        debug!(
            channel = self.channel.name,
            after = after.map(|after| after.to_rfc3339()),
            page_size = self.page_size,
            "list messages has started."
        );

        let result = self
            .client
            .list_messages(&self.channel, after, self.page_size, &self.sender)
            .await;
        self.sender.close();
        result?;

        debug!(channel = self.channel.name, "list messages has been completed.");
        Ok(())
    }
}

use anyhow::{Result, anyhow};
use async_channel::Sender;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dyn_clone::DynClone;

use crate::config::Config;
use crate::types::error::DcrmError;
use crate::types::{ActingIdentity, Channel, Community, Member, Message, MessageId};

pub mod discord;

/// Type alias for a boxed chat client trait object.
pub type ChatClient = Box<dyn ChatClientTrait + Send + Sync>;

/// Connected chat platform capability consumed by the deletion job.
///
/// Failures are reported as [`ApiError`](crate::types::error::ApiError)
/// values wrapped in `anyhow::Error`, so callers can classify them with
/// [`classify_error`](crate::types::error::classify_error).
#[async_trait]
pub trait ChatClientTrait: DynClone {
    /// The identity the client is authenticated as.
    async fn current_user(&self) -> Result<ActingIdentity>;

    /// Communities the acting identity belongs to.
    async fn list_communities(&self) -> Result<Vec<Community>>;

    /// Channels of a community, with the acting identity's effective permissions.
    async fn list_channels(
        &self,
        community: &Community,
        acting: &ActingIdentity,
    ) -> Result<Vec<Channel>>;

    /// Whether `list_messages` honors its `after` bound server side.
    fn supports_time_bounded_history(&self) -> bool;

    /// Page through a channel's history and send each message to `sender`.
    ///
    /// Messages are sent oldest first. When `after` is given, only messages
    /// created after it are listed. Listing stops quietly once the receiver
    /// is closed.
    async fn list_messages(
        &self,
        channel: &Channel,
        after: Option<DateTime<Utc>>,
        page_size: u8,
        sender: &Sender<Message>,
    ) -> Result<()>;

    /// Delete 2 to 100 messages in one request. Returns the confirmed count.
    async fn delete_messages(
        &self,
        channel: &Channel,
        ids: &[MessageId],
        reason: &str,
    ) -> Result<usize>;

    /// Delete a single message.
    async fn delete_message(&self, channel: &Channel, id: MessageId, reason: &str) -> Result<()>;

    /// Members of a community, used to resolve an author by name.
    async fn list_members(&self, community: &Community) -> Result<Vec<Member>>;
}

dyn_clone::clone_trait_object!(ChatClientTrait);

/// Create the Discord client for the configured token.
pub fn create_client(config: &Config) -> Result<ChatClient> {
    let token = config.token.as_ref().ok_or_else(|| {
        anyhow!(DcrmError::InvalidConfig(
            "a bot token is required".to_string()
        ))
    })?;

    Ok(Box::new(discord::DiscordClient::new(token)))
}

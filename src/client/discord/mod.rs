//! Discord REST adapter built on serenity's HTTP client.
//!
//! Only the REST surface is used; no gateway connection is opened.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_channel::Sender;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::builder::GetMessages;
use serenity::http::{GuildPagination, Http, HttpError};
use serenity::model::channel::{ChannelType, GuildChannel};
use serenity::model::id::{
    ChannelId as DiscordChannelId, GuildId, MessageId as DiscordMessageId, UserId as DiscordUserId,
};
use serenity::model::permissions::Permissions;
use tracing::{debug, trace};

use crate::client::ChatClientTrait;
use crate::types::error::ApiError;
use crate::types::{
    ActingIdentity, BotToken, Channel, ChannelId, ChannelKind, Community, CommunityId, Member,
    Message, MessageId, PermissionSnapshot, UserId,
};

pub mod snowflake;

use snowflake::{instant_from_snowflake, snowflake_from_instant};

const GUILD_PAGE_LIMIT: u64 = 200;
const MEMBER_PAGE_LIMIT: u64 = 1000;
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

// JSON error codes returned by the Discord API.
const UNKNOWN_CHANNEL: isize = 10003;
const UNKNOWN_MESSAGE: isize = 10008;
const MISSING_ACCESS: isize = 50001;
const MISSING_PERMISSIONS: isize = 50013;
const BULK_DELETE_TOO_OLD: isize = 50034;

#[derive(Clone)]
pub struct DiscordClient {
    http: Arc<Http>,
}

impl DiscordClient {
    pub fn new(token: &BotToken) -> Self {
        Self {
            http: Arc::new(Http::new(token.expose())),
        }
    }
}

#[async_trait]
impl ChatClientTrait for DiscordClient {
    async fn current_user(&self) -> Result<ActingIdentity> {
        let user = self
            .http
            .get_current_user()
            .await
            .map_err(into_api_error)
            .context("Failed to get the current user.")?;

        Ok(ActingIdentity {
            id: UserId(user.id.get()),
            name: user.name.clone(),
        })
    }

    async fn list_communities(&self) -> Result<Vec<Community>> {
        let mut communities = Vec::new();
        let mut target = None;

        loop {
            let page = self
                .http
                .get_guilds(target, Some(GUILD_PAGE_LIMIT))
                .await
                .map_err(into_api_error)
                .context("Failed to list guilds.")?;

            let fetched = page.len();
            communities.extend(page.iter().map(|guild| Community {
                id: CommunityId(guild.id.get()),
                name: guild.name.clone(),
            }));

            match page.last() {
                Some(last) if fetched as u64 >= GUILD_PAGE_LIMIT => {
                    target = Some(GuildPagination::After(last.id));
                }
                _ => break,
            }
        }

        debug!(count = communities.len(), "guilds listed.");
        Ok(communities)
    }

    async fn list_channels(
        &self,
        community: &Community,
        acting: &ActingIdentity,
    ) -> Result<Vec<Channel>> {
        let guild_id = GuildId::new(community.id.get());

        let guild = guild_id
            .to_partial_guild(&*self.http)
            .await
            .map_err(into_api_error)
            .with_context(|| format!("Failed to get guild {}.", community.id))?;
        let member = guild_id
            .member(&*self.http, DiscordUserId::new(acting.id.get()))
            .await
            .map_err(into_api_error)
            .with_context(|| format!("Failed to get the bot member in guild {}.", community.id))?;
        let guild_channels = guild_id
            .channels(&*self.http)
            .await
            .map_err(into_api_error)
            .with_context(|| format!("Failed to list channels of guild {}.", community.id))?;

        let mut channels: Vec<Channel> = guild_channels
            .values()
            .map(|channel| {
                let permissions = guild.user_permissions_in(channel, &member);
                convert_channel(community.id, channel, permissions)
            })
            .collect();
        channels.sort_by_key(|channel| (channel.position, channel.id));

        Ok(channels)
    }

    fn supports_time_bounded_history(&self) -> bool {
        true
    }

    async fn list_messages(
        &self,
        channel: &Channel,
        after: Option<DateTime<Utc>>,
        page_size: u8,
        sender: &Sender<Message>,
    ) -> Result<()> {
        let channel_id = DiscordChannelId::new(channel.id.get());
        // Message ids are never zero; 1 lists the whole history.
        let mut cursor =
            DiscordMessageId::new(after.map(snowflake_from_instant).unwrap_or(0).max(1));

        loop {
            if sender.is_closed() {
                debug!(channel = channel.name, "message receiver closed, listing stopped.");
                return Ok(());
            }

            let mut page = channel_id
                .messages(
                    &*self.http,
                    GetMessages::new().after(cursor).limit(page_size),
                )
                .await
                .map_err(into_api_error)
                .with_context(|| format!("Failed to list messages in #{}.", channel.name))?;

            let fetched = page.len();
            trace!(channel = channel.name, fetched = fetched, "message page fetched.");

            page.sort_by_key(|message| message.id);
            for message in &page {
                let message = Message {
                    id: MessageId(message.id.get()),
                    channel_id: channel.id,
                    author_id: UserId(message.author.id.get()),
                    created_at: instant_from_snowflake(message.id.get()).fixed_offset(),
                };
                if sender.send(message).await.is_err() {
                    debug!(channel = channel.name, "message receiver closed, listing stopped.");
                    return Ok(());
                }
            }

            match page.last() {
                Some(last) if fetched >= usize::from(page_size) => cursor = last.id,
                _ => break,
            }
        }

        Ok(())
    }

    async fn delete_messages(
        &self,
        channel: &Channel,
        ids: &[MessageId],
        reason: &str,
    ) -> Result<usize> {
        let map = serde_json::json!({
            "messages": ids.iter().map(|id| id.to_string()).collect::<Vec<_>>()
        });

        self.http
            .delete_messages(DiscordChannelId::new(channel.id.get()), &map, Some(reason))
            .await
            .map_err(into_api_error)
            .with_context(|| format!("Failed to bulk delete messages in #{}.", channel.name))?;

        Ok(ids.len())
    }

    async fn delete_message(&self, channel: &Channel, id: MessageId, reason: &str) -> Result<()> {
        self.http
            .delete_message(
                DiscordChannelId::new(channel.id.get()),
                DiscordMessageId::new(id.get()),
                Some(reason),
            )
            .await
            .map_err(into_api_error)
            .with_context(|| format!("Failed to delete message {id} in #{}.", channel.name))?;

        Ok(())
    }

    async fn list_members(&self, community: &Community) -> Result<Vec<Member>> {
        let guild_id = GuildId::new(community.id.get());
        let mut members = Vec::new();
        let mut after: Option<DiscordUserId> = None;

        loop {
            let page = guild_id
                .members(&*self.http, Some(MEMBER_PAGE_LIMIT), after)
                .await
                .map_err(into_api_error)
                .with_context(|| format!("Failed to list members of guild {}.", community.id))?;

            let fetched = page.len();
            members.extend(page.iter().map(|member| Member {
                id: UserId(member.user.id.get()),
                username: member.user.name.clone(),
                display_name: member.display_name().to_string(),
            }));

            match page.last() {
                Some(last) if fetched as u64 >= MEMBER_PAGE_LIMIT => after = Some(last.user.id),
                _ => break,
            }
        }

        Ok(members)
    }
}

fn convert_channel(
    community_id: CommunityId,
    channel: &GuildChannel,
    permissions: Permissions,
) -> Channel {
    let kind = match channel.kind {
        ChannelType::Text => ChannelKind::Text,
        ChannelType::News => ChannelKind::Announcement,
        ChannelType::Voice => ChannelKind::Voice,
        ChannelType::Category => ChannelKind::Category,
        _ => ChannelKind::Other,
    };

    Channel {
        id: ChannelId(channel.id.get()),
        community_id,
        name: channel.name.clone(),
        kind,
        position: i64::from(channel.position),
        permissions: permission_snapshot(permissions),
    }
}

fn permission_snapshot(permissions: Permissions) -> PermissionSnapshot {
    let mut snapshot = PermissionSnapshot::empty();
    if permissions.view_channel() {
        snapshot |= PermissionSnapshot::VIEW_CHANNEL;
    }
    if permissions.read_message_history() {
        snapshot |= PermissionSnapshot::READ_MESSAGE_HISTORY;
    }
    if permissions.manage_messages() {
        snapshot |= PermissionSnapshot::MANAGE_MESSAGES;
    }
    snapshot
}

/// Map an unsuccessful Discord response to an [`ApiError`].
fn api_error_from_response(status: u16, code: isize, message: &str) -> ApiError {
    match (status, code) {
        (_, BULK_DELETE_TOO_OLD) => ApiError::BulkDeleteRejected(message.to_string()),
        (_, MISSING_ACCESS) | (_, MISSING_PERMISSIONS) | (401, _) | (403, _) => {
            ApiError::Forbidden(message.to_string())
        }
        (_, UNKNOWN_CHANNEL) | (_, UNKNOWN_MESSAGE) | (404, _) => {
            ApiError::NotFound(message.to_string())
        }
        (429, _) => ApiError::RateLimited {
            retry_after: DEFAULT_RETRY_AFTER,
        },
        _ => ApiError::Transport(format!("{status}: {message} (code {code})")),
    }
}

fn into_api_error(e: serenity::Error) -> anyhow::Error {
    let api_error = match &e {
        serenity::Error::Http(http_error) => {
            let http_error: &HttpError = http_error;
            match http_error {
                HttpError::UnsuccessfulRequest(response) => Some(api_error_from_response(
                    response.status_code.as_u16(),
                    response.error.code,
                    &response.error.message,
                )),
                _ => Some(ApiError::Transport(http_error.to_string())),
            }
        }
        _ => None,
    };

    match api_error {
        Some(api_error) => anyhow!(api_error),
        None => anyhow!(e),
    }
}

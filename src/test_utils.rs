//! Shared test utilities for the dcrm-rs library crate.
//!
//! Provides canonical builders for configs, channels and messages, plus a
//! recording [`MockClient`] used by the deleter, processor, orchestrator and
//! bridge tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_channel::Sender;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::client::ChatClientTrait;
use crate::config::Config;
use crate::types::error::ApiError;
use crate::types::token::JobCancellationToken;
use crate::types::{
    ActingIdentity, Channel, ChannelId, ChannelKind, Community, CommunityId, Member, Message,
    MessageId, PermissionSnapshot, UserId,
};

pub(crate) const COMMUNITY_ID: CommunityId = CommunityId(1);
pub(crate) const BOT_ID: UserId = UserId(999);

/// Initialise a dummy tracing subscriber for tests.
///
/// Uses `try_init` so that only the first call in a process actually
/// installs the subscriber; subsequent calls are silently ignored.
pub(crate) fn init_dummy_tracing_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dummy=trace")
        .try_init();
}

/// Create a default [`Config`] suitable for most unit tests.
///
/// Key defaults: `pace_milliseconds=1`, `force=true`, `batch_size=100`.
pub(crate) fn make_test_config() -> Config {
    Config {
        community_id: Some(COMMUNITY_ID),
        pace_milliseconds: 1,
        message_queue_size: 16,
        force: true,
        show_no_progress: true,
        ..Config::default()
    }
}

pub(crate) fn make_acting_identity() -> ActingIdentity {
    ActingIdentity {
        id: BOT_ID,
        name: "cleanup-bot".to_string(),
    }
}

pub(crate) fn make_community() -> Community {
    Community {
        id: COMMUNITY_ID,
        name: "test-community".to_string(),
    }
}

/// Text channel in [`COMMUNITY_ID`] positioned by its id.
pub(crate) fn make_channel(id: u64, name: &str, permissions: PermissionSnapshot) -> Channel {
    Channel {
        id: ChannelId(id),
        community_id: COMMUNITY_ID,
        name: name.to_string(),
        kind: ChannelKind::Text,
        position: id as i64,
        permissions,
    }
}

pub(crate) fn make_message(id: u64, channel: u64, author: u64, created_at: DateTime<Utc>) -> Message {
    Message {
        id: MessageId(id),
        channel_id: ChannelId(channel),
        author_id: UserId(author),
        created_at: created_at.fixed_offset(),
    }
}

/// `count` messages by `author`, one minute apart, the newest one minute old.
pub(crate) fn make_recent_messages(
    first_id: u64,
    channel: u64,
    author: u64,
    count: u64,
) -> Vec<Message> {
    let now = Utc::now();
    (0..count)
        .map(|i| {
            make_message(
                first_id + i,
                channel,
                author,
                now - Duration::minutes((count - i) as i64),
            )
        })
        .collect()
}

/// A client call recorded by [`MockClient`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MockCall {
    CurrentUser,
    ListCommunities,
    ListChannels(CommunityId),
    ListMessages(ChannelId, Option<DateTime<Utc>>),
    DeleteMessages(ChannelId, Vec<MessageId>),
    DeleteMessage(ChannelId, MessageId),
    ListMembers(CommunityId),
}

impl MockCall {
    pub(crate) fn is_channel_call(&self) -> bool {
        matches!(
            self,
            MockCall::ListChannels(_)
                | MockCall::ListMessages(..)
                | MockCall::DeleteMessages(..)
                | MockCall::DeleteMessage(..)
        )
    }

    pub(crate) fn is_delete(&self) -> bool {
        matches!(self, MockCall::DeleteMessages(..) | MockCall::DeleteMessage(..))
    }
}

#[derive(Default)]
struct MockState {
    communities: Vec<Community>,
    channels: Vec<Channel>,
    messages: HashMap<ChannelId, Vec<Message>>,
    members: Vec<Member>,
    current_user_failure: Option<ApiError>,
    communities_failure: Option<ApiError>,
    channels_failure: Option<ApiError>,
    list_failures: HashMap<ChannelId, ApiError>,
    delete_failures: HashMap<ChannelId, ApiError>,
    cancel_after_delete: Option<(ChannelId, JobCancellationToken)>,
    bulk_rejected: bool,
    time_bounded: bool,
    calls: Vec<MockCall>,
}

/// In-memory chat client that records every call.
///
/// Deleting a message removes it from the channel, so a second job over the
/// same data sees nothing left to delete. Bulk deletion of messages older
/// than 14 days is rejected the way the platform rejects it.
#[derive(Clone)]
pub(crate) struct MockClient {
    state: Arc<Mutex<MockState>>,
}

impl MockClient {
    pub(crate) fn new() -> Self {
        let state = MockState {
            communities: vec![make_community()],
            time_bounded: true,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub(crate) fn with_communities(self, communities: Vec<Community>) -> Self {
        self.state.lock().unwrap().communities = communities;
        self
    }

    pub(crate) fn with_channel(self, channel: Channel, messages: Vec<Message>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.messages.insert(channel.id, messages);
            state.channels.push(channel);
        }
        self
    }

    pub(crate) fn with_members(self, members: Vec<Member>) -> Self {
        self.state.lock().unwrap().members = members;
        self
    }

    pub(crate) fn with_time_bounded_history(self, time_bounded: bool) -> Self {
        self.state.lock().unwrap().time_bounded = time_bounded;
        self
    }

    pub(crate) fn fail_current_user(self, error: ApiError) -> Self {
        self.state.lock().unwrap().current_user_failure = Some(error);
        self
    }

    pub(crate) fn fail_list_communities(self, error: ApiError) -> Self {
        self.state.lock().unwrap().communities_failure = Some(error);
        self
    }

    pub(crate) fn fail_list_channels(self, error: ApiError) -> Self {
        self.state.lock().unwrap().channels_failure = Some(error);
        self
    }

    pub(crate) fn fail_list_messages(self, channel: ChannelId, error: ApiError) -> Self {
        self.state.lock().unwrap().list_failures.insert(channel, error);
        self
    }

    pub(crate) fn fail_delete(self, channel: ChannelId, error: ApiError) -> Self {
        self.state
            .lock()
            .unwrap()
            .delete_failures
            .insert(channel, error);
        self
    }

    /// Reject every bulk deletion as the platform does for over-age messages.
    pub(crate) fn reject_bulk_delete(self) -> Self {
        self.state.lock().unwrap().bulk_rejected = true;
        self
    }

    /// Cancel `token` right after the first successful deletion in `channel`.
    pub(crate) fn cancel_after_delete(self, channel: ChannelId, token: JobCancellationToken) -> Self {
        self.state.lock().unwrap().cancel_after_delete = Some((channel, token));
        self
    }

    pub(crate) fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn delete_calls(&self) -> Vec<MockCall> {
        self.calls().into_iter().filter(MockCall::is_delete).collect()
    }

    pub(crate) fn remaining_messages(&self, channel: ChannelId) -> Vec<Message> {
        self.state
            .lock()
            .unwrap()
            .messages
            .get(&channel)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, call: MockCall) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn after_delete(&self, channel: ChannelId) {
        let state = self.state.lock().unwrap();
        if let Some((target, token)) = &state.cancel_after_delete {
            if *target == channel {
                token.cancel();
            }
        }
    }

    fn remove_messages(&self, channel: ChannelId, ids: &[MessageId]) -> usize {
        let mut state = self.state.lock().unwrap();
        let messages = state.messages.entry(channel).or_default();
        let before = messages.len();
        messages.retain(|message| !ids.contains(&message.id));
        before - messages.len()
    }
}

#[async_trait]
impl ChatClientTrait for MockClient {
    async fn current_user(&self) -> Result<ActingIdentity> {
        self.record(MockCall::CurrentUser);
        if let Some(e) = self.state.lock().unwrap().current_user_failure.clone() {
            return Err(anyhow!(e));
        }
        Ok(make_acting_identity())
    }

    async fn list_communities(&self) -> Result<Vec<Community>> {
        self.record(MockCall::ListCommunities);
        let state = self.state.lock().unwrap();
        if let Some(e) = state.communities_failure.clone() {
            return Err(anyhow!(e));
        }
        Ok(state.communities.clone())
    }

    async fn list_channels(
        &self,
        community: &Community,
        _acting: &ActingIdentity,
    ) -> Result<Vec<Channel>> {
        self.record(MockCall::ListChannels(community.id));
        let state = self.state.lock().unwrap();
        if let Some(e) = state.channels_failure.clone() {
            return Err(anyhow!(e));
        }
        Ok(state
            .channels
            .iter()
            .filter(|channel| channel.community_id == community.id)
            .cloned()
            .collect())
    }

    fn supports_time_bounded_history(&self) -> bool {
        self.state.lock().unwrap().time_bounded
    }

    async fn list_messages(
        &self,
        channel: &Channel,
        after: Option<DateTime<Utc>>,
        _page_size: u8,
        sender: &Sender<Message>,
    ) -> Result<()> {
        self.record(MockCall::ListMessages(channel.id, after));

        let messages = {
            let state = self.state.lock().unwrap();
            if let Some(e) = state.list_failures.get(&channel.id).cloned() {
                return Err(anyhow!(e));
            }
            let mut messages: Vec<Message> = state
                .messages
                .get(&channel.id)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .filter(|message| match after {
                    Some(after) => message.created_at.with_timezone(&Utc) > after,
                    None => true,
                })
                .collect();
            messages.sort_by_key(|message| message.id);
            messages
        };

        for message in messages {
            if sender.send(message).await.is_err() {
                return Ok(());
            }
        }
        Ok(())
    }

    async fn delete_messages(
        &self,
        channel: &Channel,
        ids: &[MessageId],
        _reason: &str,
    ) -> Result<usize> {
        self.record(MockCall::DeleteMessages(channel.id, ids.to_vec()));

        {
            let state = self.state.lock().unwrap();
            if let Some(e) = state.delete_failures.get(&channel.id).cloned() {
                return Err(anyhow!(e));
            }
            let bulk_limit = Utc::now() - Duration::days(14);
            let too_old = state
                .messages
                .get(&channel.id)
                .map(|messages| {
                    messages.iter().any(|message| {
                        ids.contains(&message.id) && message.created_at.with_timezone(&Utc) < bulk_limit
                    })
                })
                .unwrap_or(false);
            if too_old || state.bulk_rejected {
                return Err(anyhow!(ApiError::BulkDeleteRejected(
                    "You can only bulk delete messages that are under 14 days old.".to_string()
                )));
            }
        }

        let deleted = self.remove_messages(channel.id, ids);
        self.after_delete(channel.id);
        Ok(deleted)
    }

    async fn delete_message(&self, channel: &Channel, id: MessageId, _reason: &str) -> Result<()> {
        self.record(MockCall::DeleteMessage(channel.id, id));

        if let Some(e) = self
            .state
            .lock()
            .unwrap()
            .delete_failures
            .get(&channel.id)
            .cloned()
        {
            return Err(anyhow!(e));
        }

        if self.remove_messages(channel.id, &[id]) == 0 {
            return Err(anyhow!(ApiError::NotFound("Unknown Message".to_string())));
        }
        self.after_delete(channel.id);
        Ok(())
    }

    async fn list_members(&self, community: &Community) -> Result<Vec<Member>> {
        self.record(MockCall::ListMembers(community.id));
        Ok(self.state.lock().unwrap().members.clone())
    }
}

use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use bitflags::bitflags;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use zeroize_derive::{Zeroize, ZeroizeOnDrop};

use crate::types::error::{DcrmError, ErrorKind};

pub mod error;
pub mod token;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(&self) -> u64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DcrmError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_positive_id(s, $label).map($name)
            }
        }
    };
}

snowflake_id!(
    /// Identifier of a community (a Discord guild).
    CommunityId,
    "community id"
);
snowflake_id!(
    /// Identifier of a text channel.
    ChannelId,
    "channel id"
);
snowflake_id!(MessageId, "message id");
snowflake_id!(
    /// Identifier of an account. Message authors and the acting bot share this space.
    UserId,
    "user id"
);

/// Parse an identifier supplied by a caller.
///
/// Identifiers must be positive integers; surrounding whitespace is ignored.
pub fn parse_positive_id(value: &str, label: &str) -> Result<u64, DcrmError> {
    match value.trim().parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(DcrmError::InvalidConfig(format!(
            "{label} must be a positive integer: '{value}'"
        ))),
    }
}

/// A community the acting identity belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Community {
    pub id: CommunityId,
    pub name: String,
}

/// Kind of a channel as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    Announcement,
    Voice,
    Category,
    Other,
}

impl ChannelKind {
    /// Whether the channel carries a message history the job can scan.
    pub fn is_text_capable(&self) -> bool {
        matches!(self, ChannelKind::Text | ChannelKind::Announcement)
    }
}

bitflags! {
    /// Effective permissions of the acting identity in one channel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PermissionSnapshot: u8 {
        const VIEW_CHANNEL = 0b0000_0001;
        const READ_MESSAGE_HISTORY = 0b0000_0010;
        const MANAGE_MESSAGES = 0b0000_0100;
    }
}

impl PermissionSnapshot {
    pub fn can_read_history(&self) -> bool {
        self.contains(PermissionSnapshot::VIEW_CHANNEL | PermissionSnapshot::READ_MESSAGE_HISTORY)
    }

    pub fn can_delete_messages(&self) -> bool {
        self.contains(PermissionSnapshot::MANAGE_MESSAGES)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub community_id: CommunityId,
    pub name: String,
    pub kind: ChannelKind,
    pub position: i64,
    pub permissions: PermissionSnapshot,
}

/// A message as seen by the job. Content is never carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub created_at: DateTime<FixedOffset>,
}

/// The identity the client is authenticated as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingIdentity {
    pub id: UserId,
    pub name: String,
}

/// A community member, used only to resolve an author by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
}

/// The (author, cutoff) pair that decides which messages qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionWindow {
    target_author_id: UserId,
    cutoff: DateTime<Utc>,
}

impl DeletionWindow {
    pub fn new(target_author_id: UserId, cutoff: DateTime<Utc>) -> Self {
        Self {
            target_author_id,
            cutoff,
        }
    }

    /// Window covering `length` back from `now`.
    pub fn ending_at(target_author_id: UserId, now: DateTime<Utc>, length: Duration) -> Self {
        Self::new(target_author_id, now - length)
    }

    pub fn target_author_id(&self) -> UserId {
        self.target_author_id
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }
}

/// Result of processing one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelOutcome {
    pub channel_id: ChannelId,
    pub channel_name: String,
    pub messages_deleted: u64,
    pub skipped: bool,
    pub skip_reason: Option<String>,
    pub error: Option<ErrorKind>,
}

impl ChannelOutcome {
    pub fn completed(channel: &Channel, messages_deleted: u64) -> Self {
        Self {
            channel_id: channel.id,
            channel_name: channel.name.clone(),
            messages_deleted,
            skipped: false,
            skip_reason: None,
            error: None,
        }
    }

    pub fn skipped(channel: &Channel, reason: String) -> Self {
        Self {
            channel_id: channel.id,
            channel_name: channel.name.clone(),
            messages_deleted: 0,
            skipped: true,
            skip_reason: Some(reason),
            error: None,
        }
    }

    /// Deletions confirmed before the failure still count.
    pub fn failed(channel: &Channel, messages_deleted: u64, kind: ErrorKind) -> Self {
        Self {
            channel_id: channel.id,
            channel_name: channel.name.clone(),
            messages_deleted,
            skipped: false,
            skip_reason: None,
            error: Some(kind),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Per-job tally.
///
/// Counters are only updated through [`JobSummary::record`], which keeps
/// `total_deleted` equal to the sum of every recorded outcome's `messages_deleted`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSummary {
    total_deleted: u64,
    channels_processed: u64,
    channels_skipped: u64,
    errors_count: u64,
    outcomes: Vec<ChannelOutcome>,
    cancelled: bool,
    dry_run: bool,
}

impl JobSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: ChannelOutcome) {
        self.total_deleted += outcome.messages_deleted;
        if outcome.skipped {
            self.channels_skipped += 1;
        } else if outcome.is_error() {
            self.errors_count += 1;
        } else {
            self.channels_processed += 1;
        }
        self.outcomes.push(outcome);
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn total_deleted(&self) -> u64 {
        self.total_deleted
    }

    /// Channels that completed without error and were not skipped.
    pub fn channels_processed(&self) -> u64 {
        self.channels_processed
    }

    pub fn channels_skipped(&self) -> u64 {
        self.channels_skipped
    }

    pub fn errors_count(&self) -> u64 {
        self.errors_count
    }

    pub fn outcomes(&self) -> &[ChannelOutcome] {
        &self.outcomes
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

/// Bot token, cleared from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct BotToken {
    token: String,
}

impl BotToken {
    pub fn new(token: String) -> Self {
        Self { token }
    }

    pub fn expose(&self) -> &str {
        &self.token
    }
}

impl Debug for BotToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotToken")
            .field("token", &"** redacted **")
            .finish()
    }
}

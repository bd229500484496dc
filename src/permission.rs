use tracing::trace;

use crate::types::{ActingIdentity, Channel, CommunityId};

/// Decision for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl Authorization {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn deny(reason: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Decides whether the acting identity may scan and delete in a channel.
///
/// Works only from the permission snapshot carried by the channel, so it
/// never performs network calls.
#[derive(Debug, Clone)]
pub struct PermissionGate {
    community_id: CommunityId,
    acting: ActingIdentity,
}

impl PermissionGate {
    pub fn new(community_id: CommunityId, acting: ActingIdentity) -> Self {
        Self {
            community_id,
            acting,
        }
    }

    pub fn authorize(&self, channel: &Channel) -> Authorization {
        let authorization = if channel.community_id != self.community_id {
            Authorization::deny(format!(
                "channel belongs to community {}, not {}",
                channel.community_id, self.community_id
            ))
        } else if !channel.permissions.can_read_history() {
            Authorization::deny(format!(
                "{} cannot read message history in #{}",
                self.acting.name, channel.name
            ))
        } else if !channel.permissions.can_delete_messages() {
            Authorization::deny(format!(
                "{} lacks manage messages in #{}",
                self.acting.name, channel.name
            ))
        } else {
            Authorization::allow()
        };

        trace!(
            channel = channel.name,
            allowed = authorization.allowed,
            "channel authorized."
        );

        authorization
    }
}

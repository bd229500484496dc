//! Single-message deletion.
//!
//! Deletes messages one at a time. Used when batch_size is 1.

use async_trait::async_trait;

use crate::client::ChatClient;
use crate::pacer::Pacer;
use crate::types::{Channel, Message};

use super::{DeleteResult, Deleter, delete_individually};

pub struct SingleDeleter {
    client: ChatClient,
    pacer: Pacer,
    reason: String,
}

impl SingleDeleter {
    pub fn new(client: ChatClient, pacer: Pacer, reason: String) -> Self {
        Self {
            client,
            pacer,
            reason,
        }
    }
}

#[async_trait]
impl Deleter for SingleDeleter {
    async fn delete(&self, channel: &Channel, messages: &[Message]) -> DeleteResult {
        let mut result = DeleteResult::default();
        delete_individually(
            &self.client,
            &self.pacer,
            &self.reason,
            channel,
            messages,
            &mut result,
        )
        .await;
        result
    }
}

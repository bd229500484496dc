//! Author filter.
//!
//! Passes messages written by the window's target author.

use tracing::trace;

use crate::filters::MessageFilter;
use crate::types::{DeletionWindow, Message};

const FILTER_NAME: &str = "AuthorFilter";

pub struct AuthorFilter;

impl MessageFilter for AuthorFilter {
    fn name(&self) -> &'static str {
        FILTER_NAME
    }

    fn matches(&self, message: &Message, window: &DeletionWindow) -> bool {
        if message.author_id != window.target_author_id() {
            trace!(
                name = FILTER_NAME,
                message_id = message.id.get(),
                author_id = message.author_id.get(),
                "message filtered."
            );
            return false;
        }

        true
    }
}

//! Creation-time filter.
//!
//! Passes messages created strictly after the window cutoff. Timestamps are
//! compared in UTC whatever offset they carry.

use chrono::Utc;
use tracing::trace;

use crate::filters::MessageFilter;
use crate::types::{DeletionWindow, Message};

const FILTER_NAME: &str = "CreatedAfterFilter";

pub struct CreatedAfterFilter;

impl MessageFilter for CreatedAfterFilter {
    fn name(&self) -> &'static str {
        FILTER_NAME
    }

    fn matches(&self, message: &Message, window: &DeletionWindow) -> bool {
        is_after(message, window)
    }
}

fn is_after(message: &Message, window: &DeletionWindow) -> bool {
    let created_at = message.created_at.with_timezone(&Utc);

    if created_at <= window.cutoff() {
        trace!(
            name = FILTER_NAME,
            message_id = message.id.get(),
            created_at = created_at.to_rfc3339(),
            cutoff = window.cutoff().to_rfc3339(),
            "message filtered."
        );
        return false;
    }

    true
}

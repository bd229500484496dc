//! Message filters applied by the channel processor.
//!
//! Each filter is a pure predicate over a message and the job's
//! [`DeletionWindow`]. A message is deleted only when every filter in the
//! chain matches it.

use crate::types::{DeletionWindow, Message};

pub mod author;
pub mod created_after;
mod filter_properties;

pub use author::AuthorFilter;
pub use created_after::CreatedAfterFilter;

/// Predicate deciding whether a message falls inside the deletion window.
pub trait MessageFilter: Send + Sync {
    fn name(&self) -> &'static str;

    fn matches(&self, message: &Message, window: &DeletionWindow) -> bool;
}

/// Logical AND of the author and creation-time filters.
pub struct DeletionWindowFilter {
    filters: Vec<Box<dyn MessageFilter>>,
}

impl DeletionWindowFilter {
    pub fn new() -> Self {
        Self {
            filters: vec![Box::new(AuthorFilter), Box::new(CreatedAfterFilter)],
        }
    }
}

impl Default for DeletionWindowFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageFilter for DeletionWindowFilter {
    fn name(&self) -> &'static str {
        "DeletionWindowFilter"
    }

    fn matches(&self, message: &Message, window: &DeletionWindow) -> bool {
        self.filters
            .iter()
            .all(|filter| filter.matches(message, window))
    }
}

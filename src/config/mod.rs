pub mod args;

use std::time::Duration;

use crate::resolver::AuthorQuery;
use crate::types::{BotToken, CommunityId};

/// Main configuration for a dcrm-rs deletion job.
///
/// Holds the credentials, the community and author to act on, the window
/// length, deletion pacing and batching, safety flags, and logging settings.
///
/// # Quick Start
///
/// Use [`Config::for_community`] for a minimal configuration with sensible defaults:
///
/// ```
/// use dcrm_rs::Config;
///
/// let config = Config::for_community(123456789012345678);
/// assert_eq!(config.window_days, 7);
/// assert_eq!(config.pace_milliseconds, 1000);
/// assert!(config.force);
/// ```
///
/// # Default
///
/// [`Config::default()`] has no token, community or author set.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: Option<BotToken>,
    pub community_id: Option<CommunityId>,
    pub author: Option<AuthorQuery>,
    pub window_days: u32,
    pub batch_size: u16,
    pub page_size: u8,
    pub pace_milliseconds: u64,
    pub message_queue_size: u32,
    pub reason: String,
    pub dry_run: bool,
    pub force: bool,
    pub show_no_progress: bool,
    pub list_guilds: bool,
    pub warn_as_error: bool,
    pub tracing_config: Option<TracingConfig>,
    pub auto_complete_shell: Option<clap_complete::shells::Shell>,
}

impl Config {
    /// Create a `Config` with defaults for the given community.
    ///
    /// The `force` flag is set to `true` to skip interactive confirmation
    /// prompts, which is appropriate for programmatic use.
    pub fn for_community(community_id: u64) -> Self {
        Config {
            community_id: Some(CommunityId(community_id)),
            force: true,
            ..Config::default()
        }
    }

    /// Length of the trailing deletion window.
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.window_days))
    }

    /// Minimum delay between two destructive requests.
    pub fn pace_interval(&self) -> Duration {
        Duration::from_millis(self.pace_milliseconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            token: None,
            community_id: None,
            author: None,
            window_days: 7,
            batch_size: 100,
            page_size: 100,
            pace_milliseconds: 1000,
            message_queue_size: 1000,
            reason: args::DEFAULT_REASON.to_string(),
            dry_run: false,
            force: false,
            show_no_progress: false,
            list_guilds: false,
            warn_as_error: false,
            tracing_config: None,
            auto_complete_shell: None,
        }
    }
}

/// Tracing (logging) configuration.
///
/// Supports verbosity levels, JSON format, color control, and HTTP client tracing.
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    pub tracing_level: log::Level,
    pub json_tracing: bool,
    pub serenity_tracing: bool,
    pub span_events_tracing: bool,
    pub disable_color_tracing: bool,
}

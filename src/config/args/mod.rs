use crate::config::{Config, TracingConfig};
use crate::resolver::AuthorQuery;
use crate::types::{BotToken, CommunityId, UserId};
use clap::builder::NonEmptyStringValueParser;
use clap::{ArgGroup, Parser};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::ffi::OsString;

mod value_parser;


use value_parser::snowflake::check_snowflake;

// ---------------------------------------------------------------------------
// Default constants
// ---------------------------------------------------------------------------

pub(crate) const DEFAULT_REASON: &str = "Bulk removal of a member's recent messages";

const DEFAULT_WINDOW_DAYS: u32 = 7;
const DEFAULT_BATCH_SIZE: u16 = 100;
const DEFAULT_PAGE_SIZE: u8 = 100;
const DEFAULT_PACE_MILLISECONDS: u64 = 1000;
const DEFAULT_MESSAGE_QUEUE_SIZE: u32 = 1000;
const DEFAULT_JSON_TRACING: bool = false;
const DEFAULT_SERENITY_TRACING: bool = false;
const DEFAULT_SPAN_EVENTS_TRACING: bool = false;
const DEFAULT_DISABLE_COLOR_TRACING: bool = false;
const DEFAULT_WARN_AS_ERROR: bool = false;
const DEFAULT_DRY_RUN: bool = false;
const DEFAULT_SHOW_NO_PROGRESS: bool = false;
const DEFAULT_LIST_GUILDS: bool = false;
const DEFAULT_FORCE: bool = false;

const MAX_BATCH_SIZE: u16 = 100;
const MAX_PAGE_SIZE: u8 = 100;
const MIN_PACE_MILLISECONDS: u64 = 100;
const MAX_PACE_MILLISECONDS: u64 = 60_000;

// ---------------------------------------------------------------------------
// Error messages
// ---------------------------------------------------------------------------

const ERROR_MESSAGE_TOKEN_REQUIRED: &str =
    "A bot token is required (--token or the DISCORD_TOKEN environment variable).";
const ERROR_MESSAGE_GUILD_REQUIRED: &str = "--guild is required unless --list-guilds is given.";
const ERROR_MESSAGE_AUTHOR_REQUIRED: &str =
    "One of --author-id, --author-name or --author-nickname is required.";
const ERROR_MESSAGE_WINDOW_DAYS_ZERO: &str = "Window days must be at least 1.";
const ERROR_MESSAGE_BATCH_SIZE_ZERO: &str = "Batch size must be at least 1.";
const ERROR_MESSAGE_BATCH_SIZE_TOO_LARGE: &str =
    "Batch size must be at most 100 (Discord bulk delete limit).";
const ERROR_MESSAGE_PAGE_SIZE_OUT_OF_RANGE: &str = "Page size must be between 1 and 100.";
const ERROR_MESSAGE_PACE_OUT_OF_RANGE: &str =
    "Pace milliseconds must be between 100 and 60000.";
const ERROR_MESSAGE_MESSAGE_QUEUE_SIZE_ZERO: &str = "Message queue size must be at least 1.";

// ---------------------------------------------------------------------------
// CLIArgs (clap-derived argument struct)
// ---------------------------------------------------------------------------

/// dcrm - Remove one member's recent messages from every channel of a Discord guild.
///
/// Scans each text channel the bot can moderate and deletes the messages the
/// target member posted within the trailing window.
///
/// Example:
///   dcrm --guild 81384788765712384 --author-id 80351110224678912 --dry-run
///   dcrm --guild 81384788765712384 --author-name spammer --force
///   dcrm --list-guilds
#[derive(Parser, Clone, Debug)]
#[command(name = "dcrm", version, about, long_about = None)]
#[command(group(
    ArgGroup::new("author")
        .args(["author_id", "author_name", "author_nickname"])
        .multiple(false)
))]
pub struct CLIArgs {
    /// Discord bot token.
    #[arg(
        long,
        env = "DISCORD_TOKEN",
        hide_env_values = true,
        value_parser = NonEmptyStringValueParser::new(),
        help_heading = "Connection"
    )]
    pub token: Option<String>,

    // -----------------------------------------------------------------------
    // Target options
    // -----------------------------------------------------------------------
    /// Guild (server) id to clean up.
    #[arg(long, env, value_parser = check_snowflake, help_heading = "Target")]
    pub guild: Option<u64>,

    /// Id of the member whose messages are deleted.
    #[arg(long, env, value_parser = check_snowflake, help_heading = "Target")]
    pub author_id: Option<u64>,

    /// Username of the member whose messages are deleted (exact match).
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "Target")]
    pub author_name: Option<String>,

    /// Nickname or display name of the member (case-insensitive match).
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "Target")]
    pub author_nickname: Option<String>,

    /// Only messages newer than this many days are deleted. Default: 7.
    #[arg(long, env, default_value_t = DEFAULT_WINDOW_DAYS, help_heading = "Target")]
    pub window_days: u32,

    // -----------------------------------------------------------------------
    // General options
    // -----------------------------------------------------------------------
    /// Simulation mode. Scans and counts matching messages but does not delete.
    #[arg(short = 'd', long, env, default_value_t = DEFAULT_DRY_RUN, help_heading = "General")]
    pub dry_run: bool,

    /// Don't show the progress bar.
    #[arg(long, env, default_value_t = DEFAULT_SHOW_NO_PROGRESS, help_heading = "General")]
    pub show_no_progress: bool,

    /// List the guilds the bot belongs to and exit.
    #[arg(long, env, default_value_t = DEFAULT_LIST_GUILDS, help_heading = "General")]
    pub list_guilds: bool,

    // -----------------------------------------------------------------------
    // Deletion options
    // -----------------------------------------------------------------------
    /// Messages per bulk deletion request (1–100). Default: 100.
    /// When set to 1, every message is deleted individually.
    #[arg(long, env, default_value_t = DEFAULT_BATCH_SIZE, help_heading = "Deletion")]
    pub batch_size: u16,

    /// Audit log reason attached to every deletion.
    #[arg(long, env, default_value = DEFAULT_REASON, value_parser = NonEmptyStringValueParser::new(), help_heading = "Deletion")]
    pub reason: String,

    // -----------------------------------------------------------------------
    // Safety options
    // -----------------------------------------------------------------------
    /// Skip confirmation prompt before deleting.
    #[arg(short = 'f', long, env, default_value_t = DEFAULT_FORCE, help_heading = "Safety")]
    pub force: bool,

    // -----------------------------------------------------------------------
    // Performance options
    // -----------------------------------------------------------------------
    /// Minimum delay in milliseconds between two deletion requests (100–60000). Default: 1000.
    #[arg(long, env, default_value_t = DEFAULT_PACE_MILLISECONDS, help_heading = "Performance")]
    pub pace_milliseconds: u64,

    /// Messages fetched per history request (1–100). Default: 100.
    #[arg(long, env, default_value_t = DEFAULT_PAGE_SIZE, help_heading = "Performance")]
    pub page_size: u8,

    /// Message listing channel queue size. Default: 1000.
    #[arg(long, env, default_value_t = DEFAULT_MESSAGE_QUEUE_SIZE, help_heading = "Performance")]
    pub message_queue_size: u32,

    // -----------------------------------------------------------------------
    // Logging options
    // -----------------------------------------------------------------------
    /// Verbosity level. -q (quiet), default (normal), -v, -vv, -vvv.
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Output logs in JSON format.
    #[arg(long, env, default_value_t = DEFAULT_JSON_TRACING, help_heading = "Logging")]
    pub json_tracing: bool,

    /// Include the Discord HTTP client's own logs.
    #[arg(long, env, default_value_t = DEFAULT_SERENITY_TRACING, help_heading = "Logging")]
    pub serenity_tracing: bool,

    /// Enable tracing span events.
    #[arg(long, env, default_value_t = DEFAULT_SPAN_EVENTS_TRACING, help_heading = "Logging")]
    pub span_events_tracing: bool,

    /// Disable colored output in logs.
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_COLOR_TRACING, help_heading = "Logging")]
    pub disable_color_tracing: bool,

    // -----------------------------------------------------------------------
    // Advanced options
    // -----------------------------------------------------------------------
    /// Treat failed and skipped channels as errors (exit code 1).
    #[arg(long, env, default_value_t = DEFAULT_WARN_AS_ERROR, help_heading = "Advanced")]
    pub warn_as_error: bool,

    /// Generate shell completions.
    #[arg(long, env, help_heading = "Advanced")]
    pub auto_complete_shell: Option<clap_complete::shells::Shell>,
}

// ---------------------------------------------------------------------------
// parse_from_args (public API)
// ---------------------------------------------------------------------------

/// Parse command-line arguments into a `CLIArgs` struct.
///
/// # Example
///
/// ```
/// use dcrm_rs::config::args::parse_from_args;
///
/// let args = vec!["dcrm", "--guild", "1", "--author-id", "2", "--dry-run"];
/// let cli_args = parse_from_args(args).unwrap();
/// assert!(cli_args.dry_run);
/// ```
pub fn parse_from_args<I, T>(args: I) -> Result<CLIArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CLIArgs::try_parse_from(args)
}

/// Parse arguments and build a Config in one step.
pub fn build_config_from_args<I, T>(args: I) -> Result<Config, String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli_args = CLIArgs::try_parse_from(args).map_err(|e| e.to_string())?;
    Config::try_from(cli_args)
}

// ---------------------------------------------------------------------------
// Validation and Config conversion
// ---------------------------------------------------------------------------

impl CLIArgs {
    fn validate(&self) -> Result<(), String> {
        if self.window_days == 0 {
            return Err(ERROR_MESSAGE_WINDOW_DAYS_ZERO.to_string());
        }
        if self.batch_size == 0 {
            return Err(ERROR_MESSAGE_BATCH_SIZE_ZERO.to_string());
        }
        if self.batch_size > MAX_BATCH_SIZE {
            return Err(ERROR_MESSAGE_BATCH_SIZE_TOO_LARGE.to_string());
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ERROR_MESSAGE_PAGE_SIZE_OUT_OF_RANGE.to_string());
        }
        if !(MIN_PACE_MILLISECONDS..=MAX_PACE_MILLISECONDS).contains(&self.pace_milliseconds) {
            return Err(ERROR_MESSAGE_PACE_OUT_OF_RANGE.to_string());
        }
        if self.message_queue_size == 0 {
            return Err(ERROR_MESSAGE_MESSAGE_QUEUE_SIZE_ZERO.to_string());
        }

        // Shell completion needs nothing else.
        if self.auto_complete_shell.is_some() {
            return Ok(());
        }

        if self.token.is_none() {
            return Err(ERROR_MESSAGE_TOKEN_REQUIRED.to_string());
        }
        if self.list_guilds {
            return Ok(());
        }
        if self.guild.is_none() {
            return Err(ERROR_MESSAGE_GUILD_REQUIRED.to_string());
        }
        if self.build_author_query().is_none() {
            return Err(ERROR_MESSAGE_AUTHOR_REQUIRED.to_string());
        }

        Ok(())
    }

    fn build_author_query(&self) -> Option<AuthorQuery> {
        if let Some(id) = self.author_id {
            return Some(AuthorQuery::Id(UserId(id)));
        }
        if let Some(name) = trimmed(&self.author_name) {
            return Some(AuthorQuery::Username(name));
        }
        trimmed(&self.author_nickname).map(AuthorQuery::Nickname)
    }

    fn build_tracing_config(&self) -> Option<TracingConfig> {
        let log_level = self.verbosity.log_level()?;

        Some(TracingConfig {
            tracing_level: log_level,
            json_tracing: self.json_tracing,
            serenity_tracing: self.serenity_tracing,
            span_events_tracing: self.span_events_tracing,
            disable_color_tracing: self.disable_color_tracing,
        })
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

impl TryFrom<CLIArgs> for Config {
    type Error = String;

    fn try_from(args: CLIArgs) -> Result<Self, Self::Error> {
        args.validate()?;

        let tracing_config = args.build_tracing_config();
        let author = args.build_author_query();

        Ok(Config {
            token: args.token.clone().map(BotToken::new),
            community_id: args.guild.map(CommunityId),
            author,
            window_days: args.window_days,
            batch_size: args.batch_size,
            page_size: args.page_size,
            pace_milliseconds: args.pace_milliseconds,
            message_queue_size: args.message_queue_size,
            reason: args.reason.clone(),
            dry_run: args.dry_run,
            force: args.force,
            show_no_progress: args.show_no_progress,
            list_guilds: args.list_guilds,
            warn_as_error: args.warn_as_error,
            tracing_config,
            auto_complete_shell: args.auto_complete_shell,
        })
    }
}

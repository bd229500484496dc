/*!
# Overview
dcrm-rs removes one member's recent messages from a Discord guild.
It walks every text-capable channel the bot can moderate and deletes the
target author's messages from a trailing window (7 days by default),
using bulk deletion where the platform allows it.

## Features
- **Paced Deletion**: A single pacer spaces every destructive request
- **Bulk Deletion**: Up to 100 messages per request, with per-message fallback
- **Permission Aware**: Channels the bot cannot moderate are skipped, not failed
- **Safety First**: Dry-run mode, confirmation prompt, force flag
- **Cancellable**: Jobs stop between channels; a started channel is finished
- **Library-First**: The dcrm CLI is a thin wrapper over this library

## As a Library
A [`ControlBridge`] runs jobs on a background worker and reports
[`ProgressEvent`]s to the caller.

Example usage
=============

```toml
[dependencies]
dcrm-rs = "0.1"
tokio = { version = "1", features = ["full"] }
```

```no_run
use dcrm_rs::config::args::build_config_from_args;
use dcrm_rs::{ControlBridge, ProgressEvent, create_client};

#[tokio::main]
async fn main() {
    let args = vec![
        "dcrm",
        "--token",
        "my-bot-token",
        "--guild",
        "123456789012345678",
        "--author-id",
        "80351110224678912",
        "--dry-run",
        "--force",
    ];

    let config = build_config_from_args(args).unwrap();
    let client = create_client(&config).unwrap();
    let bridge = ControlBridge::spawn(client, config);
    bridge
        .submit("123456789012345678", "80351110224678912")
        .unwrap();

    let events = bridge.events();
    while let Ok(event) = events.recv().await {
        if let ProgressEvent::JobCompleted { summary } = &event {
            println!("{} messages would be deleted", summary.total_deleted());
        }
        if event.is_terminal() || matches!(event, ProgressEvent::ConnectionFailed { .. }) {
            break;
        }
    }

    bridge.shutdown();
    bridge.join().await.unwrap();
}
```
*/

#![allow(clippy::collapsible_if)]
#![allow(clippy::assertions_on_constants)]

pub mod bridge;
pub mod client;
pub mod config;
pub mod deleter;
pub mod filters;
pub mod lister;
pub mod orchestrator;
pub mod pacer;
pub mod permission;
pub mod processor;
pub mod progress;
pub mod resolver;
pub mod safety;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use bridge::ControlBridge;
pub use client::{ChatClient, ChatClientTrait, create_client};
pub use config::Config;
pub use config::args::{CLIArgs, build_config_from_args, parse_from_args};
pub use orchestrator::{DeletionOrchestrator, JobState};
pub use progress::{ProgressEvent, ProgressSink};
pub use resolver::{AuthorQuery, resolve_author};
pub use safety::SafetyChecker;
pub use types::error::{
    ApiError, DcrmError, ErrorKind, classify_error, exit_code_from_error, is_cancelled_error,
};
pub use types::token::{JobCancellationToken, create_job_cancellation_token};
pub use types::{
    ActingIdentity, Channel, ChannelId, ChannelKind, ChannelOutcome, Community, CommunityId,
    DeletionWindow, JobSummary, Member, Message, MessageId, PermissionSnapshot, UserId,
};

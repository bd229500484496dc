use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing::{debug, error, trace};

use dcrm_rs::config::Config;
use dcrm_rs::{
    AuthorQuery, CLIArgs, ChatClient, Community, CommunityId, ControlBridge, DcrmError,
    SafetyChecker, UserId, create_client, exit_code_from_error, is_cancelled_error,
    resolve_author,
};

use indicator::JobEnd;

mod ctrl_c_handler;
pub mod indicator;
#[cfg(test)]
mod indicator_properties;
mod tracing_init;
pub mod ui_config;

/// dcrm - Remove one member's recent messages from a Discord guild.
///
/// This binary is a thin wrapper over the dcrm-rs library.
/// All core functionality is implemented in the library crate.
#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = load_config_exit_if_err();

    if let Some(shell) = config.auto_complete_shell {
        generate(
            shell,
            &mut CLIArgs::command(),
            "dcrm",
            &mut std::io::stdout(),
        );

        return Ok(());
    }

    start_tracing_if_necessary(&config);

    trace!("config = {:?}", config);

    if let Err(e) = run(config).await {
        if is_cancelled_error(&e) {
            debug!("deletion cancelled by user.");
            return Ok(());
        }

        error!("{e:#}");
        std::process::exit(exit_code_from_error(&e));
    }

    Ok(())
}

#[cfg_attr(coverage_nightly, coverage(off))]
fn load_config_exit_if_err() -> Config {
    match Config::try_from(CLIArgs::parse()) {
        Ok(config) => config,
        Err(error_message) => {
            clap::Error::raw(clap::error::ErrorKind::ValueValidation, error_message).exit()
        }
    }
}

fn start_tracing_if_necessary(config: &Config) -> bool {
    let Some(tracing_config) = config.tracing_config.as_ref() else {
        return false;
    };

    tracing_init::init_tracing(tracing_config);
    true
}

#[cfg_attr(coverage_nightly, coverage(off))]
async fn run(config: Config) -> Result<()> {
    let client = create_client(&config)?;

    if config.list_guilds {
        return list_guilds(&client).await;
    }

    let community_id = config
        .community_id
        .ok_or_else(|| anyhow!(DcrmError::InvalidConfig("--guild is required".to_string())))?;
    let query = config.author.clone().ok_or_else(|| {
        anyhow!(DcrmError::InvalidConfig(
            "an author is required".to_string()
        ))
    })?;

    let community = find_community(&client, community_id).await?;
    let author_id = resolve_author(&client, &community, &query).await?;

    SafetyChecker::new(&config)
        .check_before_deletion(&target_display(&config, &community, &query, author_id))?;

    let start_time = tokio::time::Instant::now();
    debug!("deletion job start.");

    let bridge = ControlBridge::spawn(client, config.clone());
    ctrl_c_handler::spawn_ctrl_c_handler(bridge.shutdown_token());

    let indicator_join_handle = indicator::show_indicator(
        bridge.events(),
        ui_config::is_progress_indicator_needed(&config),
        ui_config::is_show_result_needed(&config),
        config.dry_run,
    );

    bridge.submit(&community_id.to_string(), &author_id.to_string())?;
    let summary = indicator_join_handle.await?;

    bridge.shutdown();
    bridge.join().await?;

    let duration_sec = format!("{:.3}", start_time.elapsed().as_secs_f32());

    evaluate_job_end(summary.end, config.warn_as_error, &duration_sec)
}

fn evaluate_job_end(end: JobEnd, warn_as_error: bool, duration_sec: &str) -> Result<()> {
    match end {
        JobEnd::Completed(job_summary) if job_summary.errors_count() > 0 => {
            error!(
                duration_sec = duration_sec,
                failed_channels = job_summary.errors_count(),
                "dcrm completed with failed channels."
            );
            if warn_as_error {
                return Err(anyhow!("dcrm failed."));
            }
            Err(anyhow!(DcrmError::PartialFailure {
                deleted: job_summary.total_deleted(),
                failed: job_summary.errors_count(),
            }))
        }
        JobEnd::Completed(job_summary) if warn_as_error && job_summary.channels_skipped() > 0 => {
            error!(
                duration_sec = duration_sec,
                skipped_channels = job_summary.channels_skipped(),
                "dcrm skipped channels it cannot moderate."
            );
            Err(anyhow!("dcrm failed."))
        }
        JobEnd::Completed(_) => {
            debug!(duration_sec = duration_sec, "dcrm has been completed.");
            Ok(())
        }
        JobEnd::Cancelled(_) => {
            debug!(duration_sec = duration_sec, "dcrm has been cancelled.");
            Ok(())
        }
        JobEnd::Aborted(reason) => Err(anyhow!("deletion job aborted: {reason}")),
        JobEnd::ConnectionFailed(reason) => Err(anyhow!(DcrmError::Connection(reason))),
        JobEnd::Disconnected => Err(anyhow!("control bridge closed before the job ended.")),
    }
}

async fn list_guilds(client: &ChatClient) -> Result<()> {
    let acting = client.current_user().await?;
    let communities = client.list_communities().await?;

    println!("{} is a member of {} guilds:", acting.name, communities.len());
    for community in communities {
        println!("{}\t{}", community.id, community.name);
    }

    Ok(())
}

async fn find_community(client: &ChatClient, community_id: CommunityId) -> Result<Community> {
    client
        .list_communities()
        .await
        .map_err(|e| anyhow!(DcrmError::Resolution(format!("{e:#}"))))?
        .into_iter()
        .find(|community| community.id == community_id)
        .ok_or_else(|| anyhow!(DcrmError::CommunityNotFound(community_id)))
}

fn target_display(
    config: &Config,
    community: &Community,
    query: &AuthorQuery,
    author_id: UserId,
) -> String {
    let author = match query {
        AuthorQuery::Id(id) => id.to_string(),
        AuthorQuery::Username(name) | AuthorQuery::Nickname(name) => {
            format!("{name} ({author_id})")
        }
    };

    format!(
        "all messages by {author} in {} from the last {} days",
        community.name, config.window_days
    )
}

//! Pre-flight resolution of the target author.
//!
//! Numeric ids are taken as given. Usernames and nicknames are matched
//! against the community's member list and must identify exactly one
//! account.

use anyhow::{Result, anyhow};
use tracing::debug;

use crate::client::ChatClient;
use crate::types::error::DcrmError;
use crate::types::{Community, Member, UserId};

/// How the caller identified the author whose messages are deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorQuery {
    Id(UserId),
    /// Exact account name.
    Username(String),
    /// Display name in the community, matched case-insensitively.
    Nickname(String),
}

/// Resolve `query` to a single account id.
///
/// `AuthorQuery::Id` needs no network call.
pub async fn resolve_author(
    client: &ChatClient,
    community: &Community,
    query: &AuthorQuery,
) -> Result<UserId> {
    let label = match query {
        AuthorQuery::Id(id) => return Ok(*id),
        AuthorQuery::Username(_) => "username",
        AuthorQuery::Nickname(_) => "nickname",
    };

    let members = client.list_members(community).await?;
    let found: Vec<&Member> = members.iter().filter(|member| member_matches(query, member)).collect();

    debug!(
        community = community.name,
        query = format!("{query:?}"),
        candidates = found.len(),
        "author lookup completed."
    );

    match found.as_slice() {
        [member] => Ok(member.id),
        [] => Err(anyhow!(DcrmError::AuthorNotFound(format!(
            "no member with {label} '{}' in {}",
            query_text(query),
            community.name
        )))),
        _ => Err(anyhow!(DcrmError::AuthorNotFound(format!(
            "{} members match {label} '{}' in {}; use --author-id",
            found.len(),
            query_text(query),
            community.name
        )))),
    }
}

fn member_matches(query: &AuthorQuery, member: &Member) -> bool {
    match query {
        AuthorQuery::Id(id) => member.id == *id,
        AuthorQuery::Username(username) => member.username == username.trim(),
        AuthorQuery::Nickname(nickname) => {
            member.display_name.to_lowercase() == nickname.trim().to_lowercase()
        }
    }
}

fn query_text(query: &AuthorQuery) -> String {
    match query {
        AuthorQuery::Id(id) => id.to_string(),
        AuthorQuery::Username(text) | AuthorQuery::Nickname(text) => text.trim().to_string(),
    }
}

//! Delivers rendered messages to a subscription's channel after bringing
//! the notification role in line with the subscription's followers.

use std::collections::HashSet;

use log::debug;
use log::error;
use log::warn;

use crate::subscriber::Notifier;
use crate::subscriber::NotifyError;
use crate::subscriber::OutgoingMessage;

pub const NYAA_ROLE: &str = "Nyaa Seed Updates";
pub const MANGA_ROLE: &str = "Manga Updates";
pub const NOVEL_ROLE: &str = "Novel Updates";

/// Where one subscription's notifications go.
#[derive(Debug, Clone)]
pub struct DeliveryTarget<'a> {
    pub guild_id: u64,
    pub channel_id: u64,
    pub role_name: &'a str,
    pub followers: Vec<u64>,
}

/// Send counts of one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub sent: usize,
    pub failed: usize,
}

/// Mention syntax for a role, or an empty string when no role is available.
pub fn role_mention(role_id: Option<u64>) -> String {
    role_id.map(|id| format!("<@&{id}>")).unwrap_or_default()
}

/// Makes role holders equal to `followers`, ignoring the bot itself.
///
/// Individual add/remove failures are logged and skipped.
pub async fn converge_role(
    notifier: &dyn Notifier,
    guild_id: u64,
    role_id: u64,
    followers: &[u64],
) -> Result<(), NotifyError> {
    let bot_id = notifier.bot_user_id().await?;
    let wanted: HashSet<u64> = followers.iter().copied().filter(|u| *u != bot_id).collect();
    let holders: HashSet<u64> = notifier
        .role_members(guild_id, role_id)
        .await?
        .into_iter()
        .filter(|u| *u != bot_id)
        .collect();

    for user_id in wanted.difference(&holders) {
        if let Err(e) = notifier.add_role(guild_id, *user_id, role_id).await {
            warn!("Failed to add role {role_id} to user {user_id} in guild {guild_id}: {e}");
        }
    }
    for user_id in holders.difference(&wanted) {
        if let Err(e) = notifier.remove_role(guild_id, *user_id, role_id).await {
            warn!("Failed to remove role {role_id} from user {user_id} in guild {guild_id}: {e}");
        }
    }
    Ok(())
}

/// Resolves the target's channel inside its guild.
///
/// `Ok(None)` means the guild or channel is gone. Pollers call this before
/// committing a watermark so an unreachable target keeps its backlog.
pub async fn resolve_target(
    notifier: &dyn Notifier,
    guild_id: u64,
    channel_id: u64,
) -> Result<Option<u64>, NotifyError> {
    let resolved = notifier.resolve_channel(guild_id, channel_id).await?;
    if resolved.is_none() {
        debug!("Channel {channel_id} in guild {guild_id} is unresolvable");
    }
    Ok(resolved)
}

/// Syncs the role and sends every rendered message to a resolved channel.
///
/// `render` receives the role mention (possibly empty) and produces the
/// messages to send in order. A failed send does not stop later ones.
pub async fn deliver_to<F>(
    notifier: &dyn Notifier,
    channel_id: u64,
    target: &DeliveryTarget<'_>,
    render: F,
) -> Result<DeliveryOutcome, NotifyError>
where
    F: FnOnce(&str) -> Result<Vec<OutgoingMessage>, NotifyError>,
{
    let role_id = match notifier.ensure_role(target.guild_id, target.role_name).await {
        Ok(role_id) => {
            if let Err(e) =
                converge_role(notifier, target.guild_id, role_id, &target.followers).await
            {
                warn!(
                    "Failed to sync role `{}` in guild {}: {e}",
                    target.role_name, target.guild_id
                );
            }
            Some(role_id)
        }
        Err(e) => {
            warn!(
                "Failed to ensure role `{}` in guild {}, sending without mention: {e}",
                target.role_name, target.guild_id
            );
            None
        }
    };

    let messages = render(&role_mention(role_id))?;
    let mut sent = 0;
    let mut failed = 0;
    for message in &messages {
        match notifier.send_message(channel_id, message).await {
            Ok(()) => sent += 1,
            Err(e) => {
                error!("Failed to send message to channel {channel_id}: {e}");
                failed += 1;
            }
        }
    }
    Ok(DeliveryOutcome { sent, failed })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_mention() {
        assert_eq!(role_mention(Some(42)), "<@&42>");
        assert_eq!(role_mention(None), "");
    }
}

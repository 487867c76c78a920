use serenity::all::ChannelType;
use serenity::all::Permissions;

use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::bot::error::BotError;
use crate::service::Caller;

/// Builds the service caller for a guild command invocation.
pub async fn caller(ctx: Context<'_>) -> Result<Caller, Error> {
    let guild_id = ctx.guild_id().ok_or(BotError::GuildOnlyCommand)?;
    let member = ctx
        .author_member()
        .await
        .ok_or(BotError::GuildOnlyCommand)?;

    let permissions = match member.permissions {
        Some(permissions) => permissions,
        None => ctx
            .guild()
            .map(|guild| guild.member_permissions(&member))
            .unwrap_or_default(),
    };

    Ok(Caller {
        guild_id: guild_id.get(),
        user_id: ctx.author().id.get(),
        can_manage: can_manage_guild(permissions),
    })
}

/// Fails unless the command was invoked inside a guild thread.
pub async fn require_thread(ctx: Context<'_>) -> Result<(), Error> {
    let channel = ctx
        .channel_id()
        .to_channel(ctx)
        .await?
        .guild()
        .ok_or(BotError::ThreadOnlyCommand)?;

    Ok(check_thread_inner(channel.kind)?)
}

fn can_manage_guild(permissions: Permissions) -> bool {
    permissions.contains(Permissions::ADMINISTRATOR)
        || permissions.contains(Permissions::MANAGE_GUILD)
}

fn check_thread_inner(kind: ChannelType) -> Result<(), BotError> {
    match kind {
        ChannelType::PublicThread | ChannelType::PrivateThread | ChannelType::NewsThread => Ok(()),
        _ => Err(BotError::ThreadOnlyCommand),
    }
}

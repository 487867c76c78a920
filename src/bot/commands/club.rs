//! Club commands: named member lists that can be pulled into a thread.

use log::warn;
use poise::Command;
use serenity::all::UserId;

use crate::bot::Data;
use crate::bot::checks;
use crate::bot::commands::Cog;
use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::service::club_service::format_club_list;

pub struct ClubCog;

impl ClubCog {
    /// Commands to manage clubs.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands(
            "Self::create",
            "Self::delete",
            "Self::join",
            "Self::leave",
            "Self::list",
            "Self::publish"
        )
    )]
    pub async fn club(_ctx: Context<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Create a club
    ///
    /// Clubs are used to get mentions when threads related to the club are created.
    #[poise::command(slash_command, guild_only)]
    pub async fn create(
        ctx: Context<'_>,
        #[description = "The name of the club to create"] name: String,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let name = ctx.data().services.club.create(&caller, &name).await?;
        ctx.say(format!("Created club `{name}`")).await?;
        Ok(())
    }

    /// Delete a club
    ///
    /// This will remove all members from the club.
    #[poise::command(slash_command, guild_only)]
    pub async fn delete(
        ctx: Context<'_>,
        #[description = "The name of the club to delete"] name: String,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let name = ctx.data().services.club.delete(&caller, &name).await?;
        ctx.say(format!("Deleted club {name}")).await?;
        Ok(())
    }

    /// Join a club
    #[poise::command(slash_command, guild_only)]
    pub async fn join(
        ctx: Context<'_>,
        #[description = "The name of the club to join"] name: String,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let name = ctx.data().services.club.join(&caller, &name).await?;
        ctx.say(format!("Joined club {name}")).await?;
        Ok(())
    }

    /// Leave a club
    #[poise::command(slash_command, guild_only)]
    pub async fn leave(
        ctx: Context<'_>,
        #[description = "The name of the club to leave"] name: String,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let name = ctx.data().services.club.leave(&caller, &name).await?;
        ctx.say(format!("Left club {name}")).await?;
        Ok(())
    }

    /// List all clubs
    #[poise::command(slash_command, guild_only)]
    pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let clubs = ctx.data().services.club.list(caller.guild_id).await?;
        ctx.say(format_club_list(&clubs)).await?;
        Ok(())
    }

    /// Publish a thread to a club
    ///
    /// Adds every member of the club to this thread, which notifies them.
    #[poise::command(slash_command, guild_only)]
    pub async fn publish(
        ctx: Context<'_>,
        #[description = "The name of the club to publish to"] name: String,
    ) -> Result<(), Error> {
        checks::require_thread(ctx).await?;
        let caller = checks::caller(ctx).await?;
        ctx.defer().await?;

        let thread_id = ctx.channel_id();
        let present: Vec<u64> = thread_id
            .get_thread_members(ctx.http())
            .await?
            .into_iter()
            .map(|member| member.user_id.get())
            .collect();

        let targets = ctx
            .data()
            .services
            .club
            .publish_targets(&caller, &name, &present)
            .await?;

        for user_id in targets {
            if let Err(e) = thread_id
                .add_thread_member(ctx.http(), UserId::new(user_id))
                .await
            {
                warn!("Failed to add user {user_id} to thread {thread_id}: {e}");
            }
        }

        ctx.say(format!("Added everyone from club {}", name.to_lowercase()))
            .await?;
        Ok(())
    }
}

impl Cog for ClubCog {
    fn commands(&self) -> Vec<Command<Data, Error>> {
        vec![Self::club()]
    }
}

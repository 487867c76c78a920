//! Nyaa.si RSS feed matches.

use poise::Command;
use serenity::all::GuildChannel;

use crate::bot::Data;
use crate::bot::checks;
use crate::bot::commands::Cog;
use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::bot::views::pagination::run_notification_menu;
use crate::service::capwords;
use crate::service::subscription_service::format_nyaa_list;
use crate::task::FeedKind;

pub struct NyaaCog;

impl NyaaCog {
    /// Commands to manage Nyaa.si RSS feed stuff.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands("Self::follow", "Self::unfollow", "Self::list", "Self::notifications")
    )]
    pub async fn nyaa(_ctx: Context<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Add a new Nyaa RSS feed match
    ///
    /// New torrents whose title contains every word of the match are posted
    /// to the channel.
    #[poise::command(slash_command, guild_only)]
    pub async fn follow(
        ctx: Context<'_>,
        #[description = "The name of the RSS feed (used for identifying the feed)"] name: String,
        #[description = "The value to match the RSS feed title against (what you would search on Nyaa.si)"]
        #[rename = "match"]
        query: String,
        #[description = "The channel to send new RSS feed entries to"]
        #[channel_types("Text", "News")]
        channel: GuildChannel,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let name = ctx
            .data()
            .services
            .subscription
            .follow_nyaa(&caller, &name, &query, channel.id.get())
            .await?;
        ctx.say(format!("Added Nyaa feed `{name}`")).await?;
        Ok(())
    }

    /// Remove an RSS feed
    #[poise::command(slash_command, guild_only)]
    pub async fn unfollow(
        ctx: Context<'_>,
        #[description = "The name of the RSS feed"] name: String,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let name = ctx
            .data()
            .services
            .subscription
            .unfollow_nyaa(&caller, &name)
            .await?;
        ctx.say(format!("Removed RSS feed `{name}`")).await?;
        Ok(())
    }

    /// List all RSS feeds
    #[poise::command(slash_command, guild_only)]
    pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let feeds = ctx
            .data()
            .services
            .subscription
            .list_nyaa(caller.guild_id)
            .await?;
        ctx.say(format_nyaa_list(&feeds)).await?;
        Ok(())
    }

    /// Get notifications when a new seed matching a feed is posted.
    #[poise::command(slash_command, guild_only)]
    pub async fn notifications(ctx: Context<'_>) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let options = ctx
            .data()
            .services
            .subscription
            .notification_options(FeedKind::Nyaa, caller.guild_id, caller.user_id)
            .await?
            .into_iter()
            .map(|mut option| {
                option.label = capwords(&option.label);
                option
            })
            .collect();
        run_notification_menu(ctx, FeedKind::Nyaa, options, "Nyaa", "seeds").await
    }
}

impl Cog for NyaaCog {
    fn commands(&self) -> Vec<Command<Data, Error>> {
        vec![Self::nyaa()]
    }
}

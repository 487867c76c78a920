//! J-Novel Club series follows.

use poise::Command;
use poise::CreateReply;
use serenity::all::GuildChannel;

use crate::bot::Data;
use crate::bot::checks;
use crate::bot::commands::Cog;
use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::bot::views::pagination::run_notification_menu;
use crate::bot::views::select_one;
use crate::service::subscription_service::format_title_list;
use crate::task::FeedKind;

pub struct JNovelCog;

impl JNovelCog {
    /// Commands to manage J-Novel Club feed stuff.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands("Self::follow", "Self::unfollow", "Self::list", "Self::notifications")
    )]
    pub async fn jnovel(_ctx: Context<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Add a J-Novel series to follow and post to a channel.
    #[poise::command(slash_command, guild_only)]
    pub async fn follow(
        ctx: Context<'_>,
        #[description = "The series to follow."] series: String,
        #[description = "The channel to post new parts to."]
        #[channel_types("Text", "News")]
        channel: GuildChannel,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        ctx.defer_ephemeral().await?;

        let subscription = &ctx.data().services.subscription;
        let mut results = subscription.search_series(&series).await?;
        let channel_id = channel.id.get();

        if results.len() == 1 {
            let series = results.remove(0);
            let title = subscription
                .follow_series(&caller, &series, channel_id)
                .await?;
            ctx.send(
                CreateReply::default()
                    .content(format!("Added {title} to the follow list."))
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }

        let labels: Vec<String> = results.iter().map(|s| s.title.clone()).collect();
        let Some(selection) = select_one(
            ctx,
            "Select the series you want to follow.",
            "JNovel",
            &labels,
        )
        .await?
        else {
            return Ok(());
        };

        let outcome = subscription
            .follow_series(&caller, &results[selection.index], channel_id)
            .await
            .map(|title| format!("Added {title} to the follow list."));
        selection.finish(ctx, outcome).await
    }

    /// Stop following a series.
    #[poise::command(slash_command, guild_only)]
    pub async fn unfollow(
        ctx: Context<'_>,
        #[description = "The title of the followed series"] title: String,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let title = ctx
            .data()
            .services
            .subscription
            .unfollow_series(&caller, &title)
            .await?;
        ctx.send(
            CreateReply::default()
                .content(format!("Removed {title} from the follow list."))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// List the series followed in this server.
    #[poise::command(slash_command, guild_only)]
    pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let titles: Vec<String> = ctx
            .data()
            .services
            .subscription
            .list_series(caller.guild_id)
            .await?
            .into_iter()
            .map(|s| s.title)
            .collect();
        ctx.say(format_title_list(
            "Followed series:",
            "No series is followed in this server.",
            &titles,
        ))
        .await?;
        Ok(())
    }

    /// Get notifications when a new part of a series is released.
    #[poise::command(slash_command, guild_only)]
    pub async fn notifications(ctx: Context<'_>) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let options = ctx
            .data()
            .services
            .subscription
            .notification_options(FeedKind::JNovel, caller.guild_id, caller.user_id)
            .await?;
        run_notification_menu(ctx, FeedKind::JNovel, options, "JNovel", "series").await
    }
}

impl Cog for JNovelCog {
    fn commands(&self) -> Vec<Command<Data, Error>> {
        vec![Self::jnovel()]
    }
}

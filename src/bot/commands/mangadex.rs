//! MangaDex chapter follows.

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

pub struct MangaDexCog;

impl MangaDexCog {
    /// Commands to manage MangaDex feed stuff.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands("Self::follow", "Self::unfollow", "Self::list", "Self::notifications")
    )]
    pub async fn mangadex(_ctx: Context<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Add a manga to follow the latest chapters of.
    #[poise::command(slash_command, guild_only)]
    pub async fn follow(
        ctx: Context<'_>,
        #[description = "The title of the manga to search for"] title: String,
        #[description = "The channel to post new chapters to"]
        #[channel_types("Text", "News")]
        channel: GuildChannel,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        ctx.defer_ephemeral().await?;

        let subscription = &ctx.data().services.subscription;
        let mut results = subscription.search_manga(&title).await?;
        let channel_id = channel.id.get();

        if results.len() == 1 {
            let manga = results.remove(0);
            let title = subscription
                .follow_manga(&caller, &manga, channel_id)
                .await?;
            ctx.send(
                CreateReply::default()
                    .content(format!("Added {title} to the manga list."))
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }

        let labels: Vec<String> = results.iter().map(|m| m.title.clone()).collect();
        let prompt = format!(
            "There are {} mangas matching that search term. Please select the one you want to follow.",
            results.len()
        );
        let Some(selection) = select_one(ctx, &prompt, "Manga", &labels).await? else {
            return Ok(());
        };

        let outcome = subscription
            .follow_manga(&caller, &results[selection.index], channel_id)
            .await
            .map(|title| format!("Added {title} to the manga list."));
        selection.finish(ctx, outcome).await
    }

    /// Stop following a manga.
    #[poise::command(slash_command, guild_only)]
    pub async fn unfollow(
        ctx: Context<'_>,
        #[description = "The title of the followed manga"] title: String,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let title = ctx
            .data()
            .services
            .subscription
            .unfollow_manga(&caller, &title)
            .await?;
        ctx.send(
            CreateReply::default()
                .content(format!("Removed {title} from the manga list."))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// List the manga followed in this server.
    #[poise::command(slash_command, guild_only)]
    pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let titles: Vec<String> = ctx
            .data()
            .services
            .subscription
            .list_manga(caller.guild_id)
            .await?
            .into_iter()
            .map(|m| m.title)
            .collect();
        ctx.say(format_title_list(
            "Followed manga:",
            "No manga is followed in this server.",
            &titles,
        ))
        .await?;
        Ok(())
    }

    /// Get notifications when a new chapter of a manga is released.
    #[poise::command(slash_command, guild_only)]
    pub async fn notifications(ctx: Context<'_>) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let options = ctx
            .data()
            .services
            .subscription
            .notification_options(FeedKind::MangaDex, caller.guild_id, caller.user_id)
            .await?;
        run_notification_menu(ctx, FeedKind::MangaDex, options, "Manga", "manga").await
    }
}

impl Cog for MangaDexCog {
    fn commands(&self) -> Vec<Command<Data, Error>> {
        vec![Self::mangadex()]
    }
}

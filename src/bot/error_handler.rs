//! Error handling for Discord bot commands.

use log::error;
use log::warn;
use poise::CreateReply;
use poise::FrameworkError;

use crate::bot::Data;
use crate::bot::Error;
use crate::bot::error::BotError;
use crate::error::AppError;
use crate::service::error::ServiceError;

/// Handles framework errors and sends appropriate responses to users.
pub struct ErrorHandler;

impl ErrorHandler {
    /// Handles a framework error by classifying and responding appropriately.
    pub async fn handle(error: FrameworkError<'_, Data, Error>) {
        match error {
            FrameworkError::Command { error, ctx, .. } => {
                let message = Self::classify_error(&error, &ctx);
                Self::send_ephemeral(&ctx, message).await;
            }
            FrameworkError::ArgumentParse { error, ctx, .. } => {
                let message = format!(
                    "Invalid arguments for `/{}`: {}",
                    ctx.command().qualified_name,
                    error
                );
                Self::send_ephemeral(&ctx, message).await;
            }
            error => {
                if let Err(e) = poise::builtins::on_error(error).await {
                    error!("Error while handling error: {}", e);
                }
            }
        }
    }

    /// Returns the text shown to the invoking user.
    ///
    /// Validation failures are the user's to fix and are not logged as
    /// errors. Everything else is logged with a reference id.
    fn classify_error(error: &Error, ctx: &poise::Context<'_, Data, Error>) -> String {
        if let Some(bot_error) = error.downcast_ref::<BotError>() {
            return bot_error.to_string();
        }
        if let Some(service_error) = error.downcast_ref::<ServiceError>()
            && service_error.is_validation()
        {
            return service_error.to_string();
        }

        if let Some(service_error) = error.downcast_ref::<ServiceError>()
            && let ServiceError::FeedError(feed_error) = service_error
        {
            warn!(
                "Upstream failure in command `{}`: {}",
                ctx.command().qualified_name,
                feed_error
            );
            return "The upstream service did not respond properly. Please try again later."
                .to_string();
        }

        let ref_id = AppError::log_with_ref(&**error);
        error!(
            "Unexpected error in command `{}`: {:?}",
            ctx.command().qualified_name,
            error
        );
        format!(
            "An unexpected error occurred. Please contact the bot developer.\nReference ID: {}",
            ref_id
        )
    }

    async fn send_ephemeral(ctx: &poise::Context<'_, Data, Error>, message: String) {
        if let Err(e) = ctx
            .send(CreateReply::default().content(message).ephemeral(true))
            .await
        {
            warn!("Failed to send error reply: {}", e);
        }
    }
}

//! Interactive component views driven by serenity collectors.

use std::time::Duration;

use poise::CreateReply;
use serenity::all::ComponentInteraction;
use serenity::all::ComponentInteractionDataKind;
use serenity::all::CreateActionRow;
use serenity::all::CreateInteractionResponse;
use serenity::all::CreateInteractionResponseMessage;
use serenity::all::CreateSelectMenu;
use serenity::all::CreateSelectMenuKind;
use serenity::all::CreateSelectMenuOption;

use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::service::error::ServiceError;

pub mod pagination;

/// How long a view waits for the next interaction.
pub const VIEW_TIMEOUT: Duration = Duration::from_secs(180);
/// Discord's select menu option limit.
pub const MAX_OPTIONS: usize = 25;
const MAX_LABEL_CHARS: usize = 90;

const CHOICE_ID: &str = "search:select";

pub fn truncate_label(label: &str) -> String {
    label.chars().take(MAX_LABEL_CHARS).collect()
}

/// A pick made in a single choice selection.
pub struct Selection {
    pub index: usize,
    pub interaction: ComponentInteraction,
}

impl Selection {
    /// Replaces the selection message with the outcome of acting on it.
    ///
    /// Validation failures are shown in place; other errors are passed on to
    /// the framework error handler.
    pub async fn finish(
        &self,
        ctx: Context<'_>,
        outcome: Result<String, ServiceError>,
    ) -> Result<(), Error> {
        let (content, error) = match outcome {
            Ok(content) => (content, None),
            Err(e) if e.is_validation() => (e.to_string(), None),
            Err(e) => ("Something went wrong.".to_string(), Some(e)),
        };

        self.interaction
            .create_response(
                ctx.http(),
                CreateInteractionResponse::UpdateMessage(
                    CreateInteractionResponseMessage::new()
                        .content(content)
                        .components(vec![]),
                ),
            )
            .await?;

        match error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

/// Asks the command author to pick one of `labels`.
///
/// Only the first [`MAX_OPTIONS`] labels are offered. Returns `None` when the
/// author lets the menu time out.
pub async fn select_one(
    ctx: Context<'_>,
    content: &str,
    placeholder: &str,
    labels: &[String],
) -> Result<Option<Selection>, Error> {
    let options: Vec<CreateSelectMenuOption> = labels
        .iter()
        .take(MAX_OPTIONS)
        .enumerate()
        .map(|(i, label)| CreateSelectMenuOption::new(truncate_label(label), i.to_string()))
        .collect();
    let menu = CreateSelectMenu::new(CHOICE_ID, CreateSelectMenuKind::String { options })
        .placeholder(placeholder)
        .min_values(1)
        .max_values(1);

    let reply = ctx
        .send(
            CreateReply::default()
                .content(content)
                .components(vec![CreateActionRow::SelectMenu(menu)])
                .ephemeral(true),
        )
        .await?;
    let message = reply.message().await?;

    let Some(interaction) = message
        .await_component_interaction(ctx.serenity_context())
        .author_id(ctx.author().id)
        .custom_ids(vec![CHOICE_ID.to_string()])
        .timeout(VIEW_TIMEOUT)
        .await
    else {
        reply
            .edit(
                ctx,
                CreateReply::default()
                    .content("Selection timed out.")
                    .components(vec![]),
            )
            .await?;
        return Ok(None);
    };

    let index = match &interaction.data.kind {
        ComponentInteractionDataKind::StringSelect { values } => {
            values.first().and_then(|v| v.parse::<usize>().ok())
        }
        _ => None,
    };

    match index {
        Some(index) if index < labels.len() => Ok(Some(Selection { index, interaction })),
        _ => {
            interaction
                .create_response(
                    ctx.http(),
                    CreateInteractionResponse::UpdateMessage(
                        CreateInteractionResponseMessage::new()
                            .content("Invalid selection.")
                            .components(vec![]),
                    ),
                )
                .await?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("short"), "short");
        let long = "あ".repeat(120);
        assert_eq!(truncate_label(&long).chars().count(), 90);
    }
}

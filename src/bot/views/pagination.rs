//! Paged notification opt-in menu.

use log::warn;
use poise::CreateReply;
use serenity::all::ButtonStyle;
use serenity::all::ComponentInteractionDataKind;
use serenity::all::CreateActionRow;
use serenity::all::CreateButton;
use serenity::all::CreateInteractionResponse;
use serenity::all::CreateInteractionResponseMessage;
use serenity::all::CreateSelectMenu;
use serenity::all::CreateSelectMenuKind;
use serenity::all::CreateSelectMenuOption;

use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::bot::views::MAX_OPTIONS;
use crate::bot::views::VIEW_TIMEOUT;
use crate::bot::views::truncate_label;
use crate::service::subscription_service::NotificationOption;
use crate::task::FeedKind;

const SELECT_ID: &str = "notifications:select";
const PREV_ID: &str = "notifications:prev";
const NEXT_ID: &str = "notifications:next";

/// Model for tracking pagination state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationModel {
    pub current_page: u32,
    pub pages: u32,
    pub per_page: u32,
}

impl PaginationModel {
    /// Creates a new pagination model with the given parameters.
    pub fn new(pages: u32, per_page: u32, current_page: u32) -> Self {
        let pages = pages.max(1);
        let per_page = per_page.max(1);
        let current_page = current_page.clamp(1, pages);
        Self {
            current_page,
            pages,
            per_page,
        }
    }

    /// Enough pages to show `total_items`, starting on the first.
    pub fn for_items(total_items: usize, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let pages = (total_items as u32).div_ceil(per_page);
        Self::new(pages, per_page, 1)
    }

    /// Wraps around to the first page after the last.
    pub fn next_page(&mut self) {
        self.current_page = if self.current_page >= self.pages {
            1
        } else {
            self.current_page + 1
        };
    }

    /// Wraps around to the last page before the first.
    pub fn prev_page(&mut self) {
        self.current_page = if self.current_page <= 1 {
            self.pages
        } else {
            self.current_page - 1
        };
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.pages
    }

    /// Index range of the current page within `total_items`.
    pub fn range(&self, total_items: usize) -> std::ops::Range<usize> {
        let start = ((self.current_page - 1) * self.per_page) as usize;
        let end = start + self.per_page as usize;
        start.min(total_items)..end.min(total_items)
    }
}

/// The options of a notification menu and the page on display.
pub struct NotificationPages {
    options: Vec<NotificationOption>,
    pub model: PaginationModel,
}

impl NotificationPages {
    pub fn new(options: Vec<NotificationOption>) -> Self {
        let model = PaginationModel::for_items(options.len(), MAX_OPTIONS as u32);
        Self { options, model }
    }

    pub fn current(&self) -> &[NotificationOption] {
        &self.options[self.model.range(self.options.len())]
    }

    /// Subscription ids offered on the current page.
    pub fn shown_ids(&self) -> Vec<i64> {
        self.current().iter().map(|o| o.subscription_id).collect()
    }

    /// Records the user's selection for the current page.
    pub fn apply(&mut self, selected: &[i64]) {
        let range = self.model.range(self.options.len());
        for option in &mut self.options[range] {
            option.followed = selected.contains(&option.subscription_id);
        }
    }

    pub fn content(&self, noun: &str) -> String {
        format!(
            "Select the {noun} you want to get notifications for. Page {}/{}",
            self.model.current_page, self.model.pages
        )
    }

    pub fn components(&self, placeholder: &str) -> Vec<CreateActionRow> {
        let options: Vec<CreateSelectMenuOption> = self
            .current()
            .iter()
            .map(|o| {
                CreateSelectMenuOption::new(
                    truncate_label(&o.label),
                    o.subscription_id.to_string(),
                )
                .default_selection(o.followed)
            })
            .collect();
        let max_values = options.len() as u8;

        let menu = CreateSelectMenu::new(SELECT_ID, CreateSelectMenuKind::String { options })
            .placeholder(placeholder)
            .min_values(0)
            .max_values(max_values);
        let mut rows = vec![CreateActionRow::SelectMenu(menu)];

        let mut buttons = Vec::new();
        if self.model.has_prev() {
            buttons.push(
                CreateButton::new(PREV_ID)
                    .label("Previous")
                    .style(ButtonStyle::Primary),
            );
        }
        if self.model.has_next() {
            buttons.push(
                CreateButton::new(NEXT_ID)
                    .label("Next")
                    .style(ButtonStyle::Primary),
            );
        }
        if !buttons.is_empty() {
            rows.push(CreateActionRow::Buttons(buttons));
        }
        rows
    }
}

/// Shows the paged opt-in menu to the command author and applies every
/// selection they make until the menu times out.
pub async fn run_notification_menu(
    ctx: Context<'_>,
    kind: FeedKind,
    options: Vec<NotificationOption>,
    placeholder: &str,
    noun: &str,
) -> Result<(), Error> {
    if options.is_empty() {
        ctx.send(
            CreateReply::default()
                .content(format!("There are no {noun} to follow in this server."))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let user_id = ctx.author().id;
    let mut pages = NotificationPages::new(options);
    let reply = ctx
        .send(
            CreateReply::default()
                .content(pages.content(noun))
                .components(pages.components(placeholder))
                .ephemeral(true),
        )
        .await?;
    let message = reply.message().await?;

    while let Some(interaction) = message
        .await_component_interaction(ctx.serenity_context())
        .author_id(user_id)
        .timeout(VIEW_TIMEOUT)
        .await
    {
        let response = match &interaction.data.kind {
            ComponentInteractionDataKind::StringSelect { values } => {
                let selected: Vec<i64> = values.iter().filter_map(|v| v.parse().ok()).collect();
                let shown = pages.shown_ids();
                match ctx
                    .data()
                    .services
                    .subscription
                    .apply_notifications(kind, user_id.get(), &shown, &selected)
                    .await
                {
                    Ok(()) => {
                        pages.apply(&selected);
                        CreateInteractionResponse::Acknowledge
                    }
                    Err(e) if e.is_validation() => CreateInteractionResponse::Message(
                        CreateInteractionResponseMessage::new()
                            .content(e.to_string())
                            .ephemeral(true),
                    ),
                    Err(e) => return Err(e.into()),
                }
            }
            ComponentInteractionDataKind::Button => {
                match interaction.data.custom_id.as_str() {
                    PREV_ID => pages.model.prev_page(),
                    NEXT_ID => pages.model.next_page(),
                    _ => {}
                }
                CreateInteractionResponse::UpdateMessage(
                    CreateInteractionResponseMessage::new()
                        .content(pages.content(noun))
                        .components(pages.components(placeholder)),
                )
            }
            _ => CreateInteractionResponse::Acknowledge,
        };

        if let Err(e) = interaction.create_response(ctx.http(), response).await {
            warn!("Failed to answer notification menu interaction: {e}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(count: i64) -> Vec<NotificationOption> {
        (1..=count)
            .map(|id| NotificationOption {
                subscription_id: id,
                label: format!("Feed {id}"),
                followed: id % 2 == 0,
            })
            .collect()
    }

    #[test]
    fn test_pagination_page_count_rounds_up() {
        assert_eq!(PaginationModel::for_items(0, 25).pages, 1);
        assert_eq!(PaginationModel::for_items(25, 25).pages, 1);
        assert_eq!(PaginationModel::for_items(26, 25).pages, 2);
        assert_eq!(PaginationModel::for_items(51, 25).pages, 3);
    }

    #[test]
    fn test_pagination_wraps_around() {
        let mut model = PaginationModel::new(3, 25, 1);
        model.prev_page();
        assert_eq!(model.current_page, 3);
        model.next_page();
        assert_eq!(model.current_page, 1);
        model.next_page();
        assert_eq!(model.current_page, 2);
        assert!(model.has_prev());
        assert!(model.has_next());
    }

    #[test]
    fn test_pagination_range_clamps_to_items() {
        let model = PaginationModel::new(2, 25, 2);
        assert_eq!(model.range(30), 25..30);
        assert_eq!(PaginationModel::new(1, 25, 1).range(3), 0..3);
    }

    #[test]
    fn test_notification_pages_apply_only_touches_current_page() {
        let mut pages = NotificationPages::new(options(30));
        assert_eq!(pages.shown_ids().len(), 25);

        pages.model.next_page();
        assert_eq!(pages.shown_ids(), vec![26, 27, 28, 29, 30]);
        pages.apply(&[27]);

        let current = pages.current();
        assert!(!current[0].followed);
        assert!(current[1].followed);
        assert!(!current[2].followed);

        pages.model.prev_page();
        assert!(pages.current()[1].followed);
        assert_eq!(
            pages.content("manga"),
            "Select the manga you want to get notifications for. Page 1/2"
        );
    }
}

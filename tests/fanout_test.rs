//! Tests for role convergence and message delivery.

use clubhouse::subscriber::OutgoingMessage;
use clubhouse::subscriber::fanout::DeliveryOutcome;
use clubhouse::subscriber::fanout::DeliveryTarget;
use clubhouse::subscriber::fanout::MANGA_ROLE;
use clubhouse::subscriber::fanout::NYAA_ROLE;
use clubhouse::subscriber::fanout::converge_role;
use clubhouse::subscriber::fanout::deliver_to;
use clubhouse::subscriber::fanout::resolve_target;

mod common;

use common::BOT_ID;
use common::MockNotifier;

const GUILD: u64 = 10;
const CHANNEL: u64 = 20;

fn text(mention: &str, body: &str) -> OutgoingMessage {
    OutgoingMessage {
        content: Some(format!("{mention}|{body}")),
        ..Default::default()
    }
}

fn target(role_name: &str, followers: Vec<u64>) -> DeliveryTarget<'_> {
    DeliveryTarget {
        guild_id: GUILD,
        channel_id: CHANNEL,
        role_name,
        followers,
    }
}

#[tokio::test]
async fn test_converge_role_adds_and_removes() {
    let notifier = MockNotifier::new();
    let role_id = 500;
    notifier.give_role(role_id, 2);
    notifier.give_role(role_id, 3);
    notifier.give_role(role_id, BOT_ID);

    converge_role(&*notifier, GUILD, role_id, &[3, 4, BOT_ID])
        .await
        .unwrap();

    let mut holders: Vec<u64> = notifier.holders(role_id).into_iter().collect();
    holders.sort();
    // The bot keeps its role whether or not it is listed
    assert_eq!(holders, vec![BOT_ID, 3, 4]);
}

#[tokio::test]
async fn test_resolve_target() {
    let notifier = MockNotifier::new();
    notifier.add_channel(GUILD, CHANNEL);

    assert_eq!(
        resolve_target(&*notifier, GUILD, CHANNEL).await.unwrap(),
        Some(CHANNEL)
    );
    assert_eq!(resolve_target(&*notifier, GUILD, CHANNEL + 1).await.unwrap(), None);
    // Channel exists but belongs to another guild
    assert_eq!(resolve_target(&*notifier, GUILD + 1, CHANNEL).await.unwrap(), None);
}

#[tokio::test]
async fn test_deliver_creates_role_and_mentions_it() {
    let notifier = MockNotifier::new();
    notifier.add_channel(GUILD, CHANNEL);

    let outcome = deliver_to(&*notifier, CHANNEL, &target(NYAA_ROLE, vec![7, 8]), |mention| {
        Ok(vec![text(mention, "first"), text(mention, "second")])
    })
    .await
    .unwrap();

    assert_eq!(outcome, DeliveryOutcome { sent: 2, failed: 0 });
    let role_id = notifier.role_id(GUILD, NYAA_ROLE).unwrap();
    let mut holders: Vec<u64> = notifier.holders(role_id).into_iter().collect();
    holders.sort();
    assert_eq!(holders, vec![7, 8]);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].0, CHANNEL);
    assert_eq!(
        messages[0].1.content.as_deref(),
        Some(format!("<@&{role_id}>|first").as_str())
    );
    assert_eq!(
        messages[1].1.content.as_deref(),
        Some(format!("<@&{role_id}>|second").as_str())
    );
}

#[tokio::test]
async fn test_deliver_reuses_existing_role() {
    let notifier = MockNotifier::new();
    notifier.add_channel(GUILD, CHANNEL);

    for _ in 0..2 {
        deliver_to(&*notifier, CHANNEL, &target(MANGA_ROLE, vec![7]), |mention| {
            Ok(vec![text(mention, "chapter")])
        })
        .await
        .unwrap();
    }

    let state = notifier.state.lock().unwrap();
    assert_eq!(state.roles.len(), 1);
    assert_eq!(state.messages[0].1, state.messages[1].1);
}

#[tokio::test]
async fn test_deliver_without_role_permission_sends_without_mention() {
    let notifier = MockNotifier::new();
    notifier.add_channel(GUILD, CHANNEL);
    notifier.set(|state| state.fail_ensure_role = true);

    let outcome = deliver_to(&*notifier, CHANNEL, &target(NYAA_ROLE, vec![7]), |mention| {
        Ok(vec![text(mention, "seed")])
    })
    .await
    .unwrap();

    assert_eq!(outcome, DeliveryOutcome { sent: 1, failed: 0 });
    assert_eq!(notifier.messages()[0].1.content.as_deref(), Some("|seed"));
}

#[tokio::test]
async fn test_deliver_counts_failed_sends() {
    let notifier = MockNotifier::new();
    notifier.add_channel(GUILD, CHANNEL);
    notifier.set(|state| state.fail_send = true);

    let outcome = deliver_to(&*notifier, CHANNEL, &target(NYAA_ROLE, vec![]), |mention| {
        Ok(vec![text(mention, "a"), text(mention, "b")])
    })
    .await
    .unwrap();

    assert_eq!(outcome, DeliveryOutcome { sent: 0, failed: 2 });
}

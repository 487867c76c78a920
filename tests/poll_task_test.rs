//! End-to-end poller tests: mock upstream, real database, recording notifier.

use std::sync::Arc;
use std::time::Duration;

use clubhouse::feed::jnovel_platform::JNovelPlatform;
use clubhouse::feed::mangadex_platform::MangaDexPlatform;
use clubhouse::feed::nyaa_platform::NyaaPlatform;
use clubhouse::model::JNovelModel;
use clubhouse::model::MangaModel;
use clubhouse::model::NyaaModel;
use clubhouse::repository::table::Table;
use clubhouse::subscriber::fanout::MANGA_ROLE;
use clubhouse::subscriber::fanout::NOVEL_ROLE;
use clubhouse::subscriber::fanout::NYAA_ROLE;
use clubhouse::task::jnovel_poller::JNovelPoller;
use clubhouse::task::mangadex_poller::MAX_CONSECUTIVE_FAILURES;
use clubhouse::task::mangadex_poller::MangaDexPoller;
use clubhouse::task::nyaa_poller::NyaaPoller;
use clubhouse::task::poll_task::PollControl;
use clubhouse::task::poll_task::PollTask;
use clubhouse::task::poll_task::Poller;
use httpmock::Method::GET;
use httpmock::MockServer;

mod common;

use common::MockNotifier;
use common::get_response;

const TIMEOUT: Duration = Duration::from_secs(5);
const GUILD: u64 = 10;
const CHANNEL: u64 = 20;
const KOMI: &str = "a96676e5-8ae2-425e-b549-7f15dd34a6d8";
const SERIES: &str = "5e9a0c1b8f0e3b0012345678";

#[tokio::test]
async fn test_nyaa_delivers_newest_then_nothing() {
    let (db, db_path) = common::setup_db().await;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body(get_response("nyaa_rss.xml"));
    });
    let mut platform = NyaaPlatform::new(TIMEOUT).unwrap();
    platform.base.info.api_url = server.base_url();

    let notifier = MockNotifier::new();
    notifier.add_channel(GUILD, CHANNEL);
    let sub_id = db
        .nyaa
        .insert(&NyaaModel {
            name: "frieren".to_string(),
            query: "frieren 1080p".to_string(),
            guild_id: GUILD,
            channel_id: CHANNEL,
            creator_id: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    db.nyaa_follower.insert(sub_id, 7).await.unwrap();

    let poller = NyaaPoller::new(db.clone(), Arc::new(platform), notifier.clone());

    assert_eq!(poller.poll().await.unwrap(), PollControl::Continue);
    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    let role_id = notifier.role_id(GUILD, NYAA_ROLE).unwrap();
    assert_eq!(
        messages[0].1.content.as_deref(),
        Some(format!("<@&{role_id}> New seed has been posted for frieren").as_str())
    );
    assert!(notifier.holders(role_id).contains(&7));

    let stored = db.nyaa.select(&sub_id).await.unwrap().unwrap();
    assert_eq!(stored.latest.as_deref(), Some("https://nyaa.si/view/1800003"));

    // Same window again, nothing new
    poller.poll().await.unwrap();
    assert_eq!(notifier.messages().len(), 1);

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_nyaa_delivers_backlog_oldest_first() {
    let (db, db_path) = common::setup_db().await;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body(get_response("nyaa_rss.xml"));
    });
    let mut platform = NyaaPlatform::new(TIMEOUT).unwrap();
    platform.base.info.api_url = server.base_url();

    let notifier = MockNotifier::new();
    notifier.add_channel(GUILD, CHANNEL);
    // Watermark no longer in the window, so every match counts as new
    db.nyaa
        .insert(&NyaaModel {
            name: "frieren".to_string(),
            query: "frieren".to_string(),
            latest: Some("https://nyaa.si/view/1".to_string()),
            guild_id: GUILD,
            channel_id: CHANNEL,
            creator_id: 1,
            ..Default::default()
        })
        .await
        .unwrap();

    let poller = NyaaPoller::new(db.clone(), Arc::new(platform), notifier.clone());
    poller.poll().await.unwrap();

    let urls: Vec<String> = notifier
        .messages()
        .into_iter()
        .filter_map(|(_, m)| m.embed.and_then(|e| e.url))
        .collect();
    assert_eq!(
        urls,
        vec![
            "https://nyaa.si/view/1800001".to_string(),
            "https://nyaa.si/view/1800003".to_string()
        ]
    );

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_nyaa_fetch_failure_keeps_watermark() {
    let (db, db_path) = common::setup_db().await;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(500);
    });
    let mut platform = NyaaPlatform::new(TIMEOUT).unwrap();
    platform.base.info.api_url = server.base_url();

    let notifier = MockNotifier::new();
    let sub_id = db
        .nyaa
        .insert(&NyaaModel {
            name: "frieren".to_string(),
            query: "frieren".to_string(),
            guild_id: GUILD,
            channel_id: CHANNEL,
            creator_id: 1,
            ..Default::default()
        })
        .await
        .unwrap();

    let poller = NyaaPoller::new(db.clone(), Arc::new(platform), notifier.clone());
    assert_eq!(poller.poll().await.unwrap(), PollControl::Continue);

    assert!(notifier.messages().is_empty());
    let stored = db.nyaa.select(&sub_id).await.unwrap().unwrap();
    assert_eq!(stored.latest, None);

    common::teardown_db(db_path).await;
}

fn manga(guild_id: u64, channel_id: u64) -> MangaModel {
    MangaModel {
        title: "Komi Can't Communicate".to_string(),
        description: "desc".to_string(),
        mangadex_id: KOMI.to_string(),
        cover: Some("cover.jpg".to_string()),
        guild_id,
        channel_id,
        creator_id: 1,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_mangadex_fans_out_to_every_guild_with_cover() {
    let (db, db_path) = common::setup_db().await;
    let server = MockServer::start();
    let feed = server.mock(|when, then| {
        when.method(GET).path(format!("/manga/{KOMI}/feed"));
        then.status(200).body(get_response("mangadex_feed.json"));
    });
    let cover = server.mock(|when, then| {
        when.method(GET).path(format!("/covers/{KOMI}/cover.jpg"));
        then.status(200).body([1u8, 2, 3]);
    });
    let mut platform = MangaDexPlatform::new(TIMEOUT).unwrap();
    platform.base.info.api_url = server.base_url();
    platform.uploads_url = server.base_url();

    let notifier = MockNotifier::new();
    notifier.add_channel(GUILD, CHANNEL);
    notifier.add_channel(GUILD + 1, CHANNEL + 1);
    db.manga.insert(&manga(GUILD, CHANNEL)).await.unwrap();
    db.manga.insert(&manga(GUILD + 1, CHANNEL + 1)).await.unwrap();

    let poller = MangaDexPoller::new(db.clone(), Arc::new(platform), notifier.clone());
    assert_eq!(poller.poll().await.unwrap(), PollControl::Continue);

    // One upstream fetch and one cover download for both guilds
    feed.assert_hits(1);
    cover.assert_hits(1);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].0, CHANNEL);
    assert_eq!(messages[1].0, CHANNEL + 1);
    let first = &messages[0].1;
    assert_eq!(
        first.embed.as_ref().unwrap().title.as_deref(),
        Some("Komi Can't Communicate [Volume 36][Chapter 500]")
    );
    assert_eq!(first.attachment.as_ref().unwrap().bytes, vec![1, 2, 3]);
    assert!(notifier.role_id(GUILD, MANGA_ROLE).is_some());
    assert!(notifier.role_id(GUILD + 1, MANGA_ROLE).is_some());

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_mangadex_removes_subscription_with_missing_channel() {
    let (db, db_path) = common::setup_db().await;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("/manga/{KOMI}/feed"));
        then.status(200).body(get_response("mangadex_feed.json"));
    });
    let mut platform = MangaDexPlatform::new(TIMEOUT).unwrap();
    platform.base.info.api_url = server.base_url();
    platform.uploads_url = server.base_url();

    let notifier = MockNotifier::new();
    let mut orphan = manga(GUILD, CHANNEL);
    orphan.cover = None;
    db.manga.insert(&orphan).await.unwrap();

    let poller = MangaDexPoller::new(db.clone(), Arc::new(platform), notifier.clone());
    poller.poll().await.unwrap();

    assert!(notifier.messages().is_empty());
    assert!(db.manga.select_all().await.unwrap().is_empty());

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_mangadex_halts_after_consecutive_failures() {
    let (db, db_path) = common::setup_db().await;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("/manga/{KOMI}/feed"));
        then.status(502);
    });
    let mut platform = MangaDexPlatform::new(TIMEOUT).unwrap();
    platform.base.info.api_url = server.base_url();

    let notifier = MockNotifier::new();
    db.manga.insert(&manga(GUILD, CHANNEL)).await.unwrap();

    let poller = Arc::new(MangaDexPoller::new(
        db.clone(),
        Arc::new(platform),
        notifier.clone(),
    ));
    // Driven by hand so the interval loop does not poll concurrently
    let task = PollTask::new(poller.clone(), Duration::from_secs(3600));

    for attempt in 1..MAX_CONSECUTIVE_FAILURES {
        assert_eq!(task.tick().await, PollControl::Continue);
        assert_eq!(poller.consecutive_failures(), attempt);
    }
    assert_eq!(task.tick().await, PollControl::Halt);
    assert!(!task.is_running());
    assert_eq!(poller.consecutive_failures(), MAX_CONSECUTIVE_FAILURES);

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_jnovel_delivers_new_part() {
    let (db, db_path) = common::setup_db().await;
    let server = MockServer::start();
    let feed = server.mock(|when, then| {
        when.method(GET).path(format!("/feed/series/{SERIES}.rss"));
        then.status(200).body(get_response("jnovel_series_feed.atom"));
    });
    let mut platform = JNovelPlatform::new(TIMEOUT).unwrap();
    platform.base.info.api_url = server.base_url();

    let notifier = MockNotifier::new();
    notifier.add_channel(GUILD, CHANNEL);
    let sub_id = db
        .jnovel
        .insert(&JNovelModel {
            series: SERIES.to_string(),
            title: "Ascendance of a Bookworm".to_string(),
            latest: Some("urn:jnovel:part:p5v12p2".to_string()),
            guild_id: GUILD,
            channel_id: CHANNEL,
            creator_id: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    db.jnovel_follower.insert(sub_id, 9).await.unwrap();

    let poller = JNovelPoller::new(db.clone(), Arc::new(platform), notifier.clone());
    poller.poll().await.unwrap();
    poller.poll().await.unwrap();

    feed.assert_hits(2);
    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    let role_id = notifier.role_id(GUILD, NOVEL_ROLE).unwrap();
    assert!(notifier.holders(role_id).contains(&9));
    let embed = messages[0].1.embed.as_ref().unwrap();
    assert_eq!(embed.url.as_deref(), Some("https://j-novel.club/read/p5v12p3"));
    assert_eq!(
        embed.image_url.as_deref(),
        Some("https://cdn.j-novel.club/p5v12.jpg")
    );

    let stored = db.jnovel.select(&sub_id).await.unwrap().unwrap();
    assert_eq!(stored.latest.as_deref(), Some("urn:jnovel:part:p5v12p3"));

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_nyaa_unreachable_channel_keeps_backlog() {
    let (db, db_path) = common::setup_db().await;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body(get_response("nyaa_rss.xml"));
    });
    let mut platform = NyaaPlatform::new(TIMEOUT).unwrap();
    platform.base.info.api_url = server.base_url();

    let notifier = MockNotifier::new();
    let sub_id = db
        .nyaa
        .insert(&NyaaModel {
            name: "frieren".to_string(),
            query: "frieren 1080p".to_string(),
            guild_id: GUILD,
            channel_id: CHANNEL,
            creator_id: 1,
            ..Default::default()
        })
        .await
        .unwrap();

    let poller = NyaaPoller::new(db.clone(), Arc::new(platform), notifier.clone());
    poller.poll().await.unwrap();

    assert!(notifier.messages().is_empty());
    let stored = db.nyaa.select(&sub_id).await.unwrap().unwrap();
    assert_eq!(stored.latest, None);

    notifier.add_channel(GUILD, CHANNEL);
    poller.poll().await.unwrap();

    assert_eq!(notifier.messages().len(), 1);
    let stored = db.nyaa.select(&sub_id).await.unwrap().unwrap();
    assert_eq!(stored.latest.as_deref(), Some("https://nyaa.si/view/1800003"));

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_jnovel_unreachable_channel_keeps_backlog() {
    let (db, db_path) = common::setup_db().await;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("/feed/series/{SERIES}.rss"));
        then.status(200).body(get_response("jnovel_series_feed.atom"));
    });
    let mut platform = JNovelPlatform::new(TIMEOUT).unwrap();
    platform.base.info.api_url = server.base_url();

    let notifier = MockNotifier::new();
    let sub_id = db
        .jnovel
        .insert(&JNovelModel {
            series: SERIES.to_string(),
            title: "Ascendance of a Bookworm".to_string(),
            latest: Some("urn:jnovel:part:p5v12p2".to_string()),
            guild_id: GUILD,
            channel_id: CHANNEL,
            creator_id: 1,
            ..Default::default()
        })
        .await
        .unwrap();

    let poller = JNovelPoller::new(db.clone(), Arc::new(platform), notifier.clone());
    poller.poll().await.unwrap();

    assert!(notifier.messages().is_empty());
    let stored = db.jnovel.select(&sub_id).await.unwrap().unwrap();
    assert_eq!(stored.latest.as_deref(), Some("urn:jnovel:part:p5v12p2"));

    notifier.add_channel(GUILD, CHANNEL);
    poller.poll().await.unwrap();

    assert_eq!(notifier.messages().len(), 1);
    let stored = db.jnovel.select(&sub_id).await.unwrap().unwrap();
    assert_eq!(stored.latest.as_deref(), Some("urn:jnovel:part:p5v12p3"));

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_mangadex_removes_caught_up_subscription_with_missing_channel() {
    let (db, db_path) = common::setup_db().await;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("/manga/{KOMI}/feed"));
        then.status(200).body(get_response("mangadex_feed.json"));
    });
    let mut platform = MangaDexPlatform::new(TIMEOUT).unwrap();
    platform.base.info.api_url = server.base_url();
    platform.uploads_url = server.base_url();

    let notifier = MockNotifier::new();
    notifier.add_channel(GUILD + 1, CHANNEL + 1);
    let mut orphan = manga(GUILD, CHANNEL);
    orphan.latest = Some("5e8bc984-5f3c-4d4e-8f9b-0c1d2e3f4a5b".to_string());
    db.manga.insert(&orphan).await.unwrap();
    let mut live = manga(GUILD + 1, CHANNEL + 1);
    live.latest = orphan.latest.clone();
    let live_id = db.manga.insert(&live).await.unwrap();

    let poller = MangaDexPoller::new(db.clone(), Arc::new(platform), notifier.clone());
    poller.poll().await.unwrap();

    assert!(notifier.messages().is_empty());
    let remaining: Vec<_> = db
        .manga
        .select_all()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(remaining, vec![live_id]);

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_mangadex_malformed_id_does_not_trip_breaker() {
    let (db, db_path) = common::setup_db().await;
    let platform = MangaDexPlatform::new(TIMEOUT).unwrap();

    let notifier = MockNotifier::new();
    notifier.add_channel(GUILD, CHANNEL);
    let mut broken = manga(GUILD, CHANNEL);
    broken.mangadex_id = "not-a-uuid".to_string();
    db.manga.insert(&broken).await.unwrap();

    let poller = Arc::new(MangaDexPoller::new(
        db.clone(),
        Arc::new(platform),
        notifier.clone(),
    ));
    let task = PollTask::new(poller.clone(), Duration::from_secs(3600));

    for _ in 0..=MAX_CONSECUTIVE_FAILURES {
        assert_eq!(task.tick().await, PollControl::Continue);
    }
    assert_eq!(poller.consecutive_failures(), 0);
    assert_eq!(db.manga.select_all().await.unwrap().len(), 1);

    common::teardown_db(db_path).await;
}

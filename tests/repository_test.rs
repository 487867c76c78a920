//! Tests for the SQLite table handlers.

use clubhouse::model::ClubMemberModel;
use clubhouse::model::ClubModel;
use clubhouse::model::CountdownModel;
use clubhouse::model::DailyModel;
use clubhouse::model::GifKind;
use clubhouse::model::MangaModel;
use clubhouse::model::NyaaModel;
use clubhouse::model::WeeklyGifModel;
use clubhouse::model::WeeklyModel;
use clubhouse::repository::table::SubscriptionTable;
use clubhouse::repository::table::Table;

mod common;

#[tokio::test]
async fn test_club_summaries_count_members() {
    let (db, db_path) = common::setup_db().await;

    let anime = db
        .club
        .insert(&ClubModel {
            name: "anime".to_string(),
            guild_id: 10,
            creator_id: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    db.club
        .insert(&ClubModel {
            name: "books".to_string(),
            guild_id: 10,
            creator_id: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    for user_id in [100, 101] {
        db.club_member
            .insert(&ClubMemberModel {
                club_id: anime,
                user_id,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let summaries = db.club.select_summaries_by_guild(10).await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].name, "anime");
    assert_eq!(summaries[0].members, 2);
    assert_eq!(summaries[1].name, "books");
    assert_eq!(summaries[1].members, 0);

    assert!(db.club.select_summaries_by_guild(11).await.unwrap().is_empty());

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_club_delete_cascades_members() {
    let (db, db_path) = common::setup_db().await;

    let club_id = db
        .club
        .insert(&ClubModel {
            name: "anime".to_string(),
            guild_id: 10,
            creator_id: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    db.club_member
        .insert(&ClubMemberModel {
            club_id,
            user_id: 100,
            ..Default::default()
        })
        .await
        .unwrap();

    db.club.delete(&club_id).await.unwrap();

    assert!(db.club_member.select_all().await.unwrap().is_empty());

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_club_name_is_unique_per_guild() {
    let (db, db_path) = common::setup_db().await;

    let club = ClubModel {
        name: "anime".to_string(),
        guild_id: 10,
        creator_id: 1,
        ..Default::default()
    };
    db.club.insert(&club).await.unwrap();
    assert!(db.club.insert(&club).await.is_err());

    let other_guild = ClubModel {
        guild_id: 11,
        ..club
    };
    assert!(db.club.insert(&other_guild).await.is_ok());

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_countdowns_listed_soonest_first() {
    let (db, db_path) = common::setup_db().await;

    for (lookup, timestamp) in [("later", 2_000), ("sooner", 1_000)] {
        db.countdown
            .insert(&CountdownModel {
                guild_id: 10,
                creator_id: 1,
                timestamp,
                lookup: lookup.to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let countdowns = db.countdown.select_all_by_guild(10).await.unwrap();
    let lookups: Vec<&str> = countdowns.iter().map(|c| c.lookup.as_str()).collect();
    assert_eq!(lookups, vec!["sooner", "later"]);

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_weekly_gifs_split_by_kind() {
    let (db, db_path) = common::setup_db().await;

    let weekly_id = db
        .weekly
        .insert(&WeeklyModel {
            guild_id: 10,
            creator_id: 1,
            timestamp: 1_700_000_000,
            lookup: "friday".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    for (kind, url) in [
        (GifKind::Success, "https://s.gif"),
        (GifKind::Failure, "https://f.gif"),
    ] {
        db.weekly_gif
            .insert(&WeeklyGifModel {
                weekly_id,
                kind,
                url: url.to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let success = db
        .weekly_gif
        .select_all_by_kind(weekly_id, GifKind::Success)
        .await
        .unwrap();
    assert_eq!(success.len(), 1);
    assert_eq!(success[0].url, "https://s.gif");
    assert_eq!(success[0].kind, GifKind::Success);

    assert!(
        db.weekly_gif
            .select_by_url(weekly_id, GifKind::Success, "https://f.gif")
            .await
            .unwrap()
            .is_none()
    );

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_daily_is_one_per_user() {
    let (db, db_path) = common::setup_db().await;

    let daily = DailyModel {
        creator_id: 5,
        timestamp: 100,
        message: Some("check in".to_string()),
        ..Default::default()
    };
    db.daily.insert(&daily).await.unwrap();
    assert!(db.daily.insert(&daily).await.is_err());

    assert!(db.daily.update_timestamp_by_creator(5, 200).await.unwrap());
    assert!(!db.daily.update_timestamp_by_creator(6, 200).await.unwrap());

    let stored = db.daily.select_by_creator(5).await.unwrap().unwrap();
    assert_eq!(stored.timestamp, 200);
    assert_eq!(stored.message.as_deref(), Some("check in"));

    assert!(db.daily.delete_by_creator(5).await.unwrap());
    assert!(!db.daily.delete_by_creator(5).await.unwrap());

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_compare_and_set_latest() {
    let (db, db_path) = common::setup_db().await;

    let id = db
        .nyaa
        .insert(&NyaaModel {
            name: "show".to_string(),
            query: "show 1080p".to_string(),
            guild_id: 10,
            channel_id: 20,
            creator_id: 1,
            ..Default::default()
        })
        .await
        .unwrap();

    // A never polled row matches a NULL expectation
    assert!(db.nyaa.compare_and_set_latest(id, None, "a").await.unwrap());
    // Stale expectation loses
    assert!(!db.nyaa.compare_and_set_latest(id, None, "b").await.unwrap());
    assert!(db.nyaa.compare_and_set_latest(id, Some("a"), "b").await.unwrap());

    let stored = db.nyaa.select(&id).await.unwrap().unwrap();
    assert_eq!(stored.latest.as_deref(), Some("b"));

    db.nyaa.delete(&id).await.unwrap();
    assert!(!db.nyaa.compare_and_set_latest(id, Some("b"), "c").await.unwrap());

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_distinct_mangadex_ids_across_guilds() {
    let (db, db_path) = common::setup_db().await;

    for (guild_id, mangadex_id) in [(10, "m-1"), (11, "m-1"), (10, "m-2")] {
        db.manga
            .insert(&MangaModel {
                title: mangadex_id.to_string(),
                mangadex_id: mangadex_id.to_string(),
                guild_id,
                channel_id: 20,
                creator_id: 1,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    assert_eq!(
        db.manga.select_distinct_mangadex_ids().await.unwrap(),
        vec!["m-1".to_string(), "m-2".to_string()]
    );
    assert_eq!(db.manga.select_all_by_mangadex_id("m-1").await.unwrap().len(), 2);
    assert_eq!(db.manga.select_all_by_guild(10).await.unwrap().len(), 2);

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_follower_apply_selection_only_touches_shown() {
    let (db, db_path) = common::setup_db().await;

    let mut ids = Vec::new();
    for name in ["a", "b", "c"] {
        ids.push(
            db.nyaa
                .insert(&NyaaModel {
                    name: name.to_string(),
                    query: name.to_string(),
                    guild_id: 10,
                    channel_id: 20,
                    creator_id: 1,
                    ..Default::default()
                })
                .await
                .unwrap(),
        );
    }

    assert!(db.nyaa_follower.insert(ids[2], 7).await.unwrap());
    assert!(!db.nyaa_follower.insert(ids[2], 7).await.unwrap());

    db.nyaa_follower
        .apply_selection(7, &ids[..2], &[ids[0]])
        .await
        .unwrap();
    assert_eq!(
        db.nyaa_follower.select_subscription_ids_by_user(7).await.unwrap(),
        vec![ids[0], ids[2]]
    );

    db.nyaa_follower
        .apply_selection(7, &ids[..2], &[ids[1]])
        .await
        .unwrap();
    assert_eq!(
        db.nyaa_follower.select_subscription_ids_by_user(7).await.unwrap(),
        vec![ids[1], ids[2]]
    );

    // Followers go with their subscription
    db.nyaa.delete(&ids[2]).await.unwrap();
    assert!(db.nyaa_follower.select_user_ids(ids[2]).await.unwrap().is_empty());

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_delete_all_tables() {
    let (db, db_path) = common::setup_db().await;

    let club_id = db
        .club
        .insert(&ClubModel {
            name: "anime".to_string(),
            guild_id: 10,
            creator_id: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    db.club_member
        .insert(&ClubMemberModel {
            club_id,
            user_id: 2,
            ..Default::default()
        })
        .await
        .unwrap();

    db.delete_all_tables().await.unwrap();

    assert!(db.club.select_all().await.unwrap().is_empty());
    assert!(db.club_member.select_all().await.unwrap().is_empty());

    common::teardown_db(db_path).await;
}

//! End-to-end scenarios against an on-disk store.

use pitchedlink_core::ingest::parse_payload;
use pitchedlink_core::model::claim::ClaimStatus;
use pitchedlink_core::model::mention::MAX_COUNT;
use pitchedlink_core::{Store, StoreError};
use std::path::PathBuf;
use tempfile::TempDir;

fn temp_store() -> (TempDir, PathBuf, Store) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(".pitched").join("pitched.db");
    let store = Store::open(&path).expect("open store");
    (dir, path, store)
}

const SCENARIO_PAYLOAD: &str = r#"[{
    "meta_data": {"final_url": "https://acme.dev"},
    "seo_data": {"name": "Acme"},
    "pitch_data": {
        "replyLink": "https://x.com/alice/status/1",
        "user": {"handle": "Alice", "name": "Alice A."},
        "timestamp": {"datetime": "2025-01-02T03:04:05Z"},
        "engagement": {"replies": 2, "retweets": 1, "likes": 5, "views": 1600}
    }
}]"#;

#[test]
fn fifteen_claps_from_one_user_cap_at_ten() {
    let (_dir, _path, mut store) = temp_store();
    let pitch = store.create_pitch("Acme", None).expect("create");

    let mut last = None;
    for _ in 0..15 {
        last = Some(store.record_endorsement("alice", &pitch.id).expect("clap"));
    }
    let last = last.expect("at least one clap");

    assert_eq!(last.raw_count, 10);
    assert_eq!(last.effective_count, 3);
    assert!(!last.changed);
    assert_eq!(store.user_clap_count("alice", &pitch.id).expect("count"), 10);
    assert_eq!(store.effective_clap_total(&pitch.id).expect("total"), 3);
    assert_eq!(store.raw_clap_total(&pitch.id).expect("raw"), 10);
}

#[test]
fn claimed_pitch_with_two_clappers_ranks_39() {
    let (_dir, _path, mut store) = temp_store();
    let records = parse_payload(SCENARIO_PAYLOAD).expect("payload");
    let report = store.ingest_batch(&records).expect("ingest");
    let id = report.created[0].clone();

    assert_eq!(store.get_pitch(&id).expect("get").rank(), 20);

    store.record_endorsement("bob", &id).expect("clap");
    store.record_endorsement("carol", &id).expect("clap");
    let pitch = store
        .set_claim("alice", &id, ClaimStatus::Verified)
        .expect("claim");

    assert_eq!(pitch.clap(), 2);
    assert!(pitch.claimed());
    assert_eq!(pitch.rank(), 39);
}

#[test]
fn ranks_survive_reopen() {
    let (_dir, path, mut store) = temp_store();
    let records = parse_payload(SCENARIO_PAYLOAD).expect("payload");
    let report = store.ingest_batch(&records).expect("ingest");
    let id = report.created[0].clone();
    store.record_endorsements("bob", &id, 4).expect("claps");
    drop(store);

    let reopened = Store::open(&path).expect("reopen");
    let pitch = reopened.get_pitch(&id).expect("get");
    assert_eq!(pitch.clap(), 2);
    assert_eq!(pitch.rank(), 26);
    assert_eq!(pitch.mentions().len(), 1);
    assert_eq!(
        pitch.latest_mention().and_then(|m| m.handle()),
        Some("Alice")
    );
    assert!(reopened.verify().expect("verify").is_empty());
}

#[test]
fn failed_batch_rolls_back_entirely() {
    let (_dir, _path, mut store) = temp_store();
    store
        .create_pitch("Acme", Some("https://acme.dev"))
        .expect("create");

    // Reject the second pitch so the batch fails after the first merge.
    store
        .connection()
        .execute_batch(
            "CREATE TRIGGER reject_second BEFORE INSERT ON pitches
             WHEN NEW.url = 'https://second.dev'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .expect("install trigger");

    let records = parse_payload(
        r#"[
            {"meta_data": {"final_url": "https://acme.dev"},
             "pitch_data": {"replyLink": "r1", "engagement": {"likes": 100}}},
            {"meta_data": {"final_url": "https://second.dev"}}
        ]"#,
    )
    .expect("payload");

    let err = store.ingest_batch(&records).expect_err("trigger aborts batch");
    assert!(matches!(err, StoreError::Sqlite(_)));

    let acme = store
        .get_pitch_by_url("https://acme.dev")
        .expect("query")
        .expect("still present");
    assert_eq!(acme.mention_count(), 0);
    assert_eq!(acme.rank(), 0);
    assert!(store.get_pitch_by_url("https://second.dev").expect("query").is_none());
}

#[test]
fn leaderboard_listings_and_suggestions() {
    let (_dir, _path, mut store) = temp_store();
    let records = parse_payload(
        r#"[
            {"meta_data": {"final_url": "https://a.dev"}, "seo_data": {"name": "Alpha"},
             "pitch_data": {"replyLink": "a1", "user": {"handle": "dana"}, "engagement": {"replies": 10}}},
            {"meta_data": {"final_url": "https://b.dev"}, "seo_data": {"name": "Beta"},
             "pitch_data": {"replyLink": "b1", "user": {"handle": "DANA"}, "engagement": {"likes": 2}}},
            {"meta_data": {"final_url": "https://c.dev"}, "seo_data": {"name": "Gamma"},
             "pitch_data": {"replyLink": "c1", "user": {"handle": "erin"}, "engagement": {"retweets": 4}}}
        ]"#,
    )
    .expect("payload");
    store.ingest_batch(&records).expect("ingest");

    let page = store.leaderboard(1, 2).expect("page 1");
    let ids: Vec<&str> = page.entries.iter().map(|e| e.pitch.id.as_str()).collect();
    assert_eq!(ids, ["alpha", "gamma"]);
    assert_eq!(page.total_pages, 2);

    let page = store.leaderboard(2, 2).expect("page 2");
    assert_eq!(page.start_rank, 3);
    assert_eq!(page.entries[0].pitch.id, "beta");

    let suggested: Vec<String> = store
        .suggested_for_handle("@dana", "dana")
        .expect("suggested")
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(suggested, ["alpha", "beta"]);

    store
        .set_claim("dana", "alpha", ClaimStatus::Pending)
        .expect("claim");
    let suggested: Vec<String> = store
        .suggested_for_handle("dana", "dana")
        .expect("suggested")
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(suggested, ["beta"]);
    assert_eq!(store.claimed_by("dana").expect("claimed").len(), 1);
}

#[test]
fn unknown_prefix_and_ambiguous_prefix_are_distinct_errors() {
    let (_dir, _path, mut store) = temp_store();
    store.create_pitch("Acme One", None).expect("create");
    store.create_pitch("Acme Two", None).expect("create");

    assert!(matches!(
        store.get_pitch("acme"),
        Err(StoreError::AmbiguousId { .. })
    ));
    assert!(matches!(
        store.get_pitch("zzz"),
        Err(StoreError::PitchNotFound(_))
    ));
    assert_eq!(store.get_pitch("acme-t").expect("prefix").name, "Acme Two");
}

#[test]
fn oversized_counters_stay_consistent_through_verify_and_rebuild() {
    let (_dir, _path, mut store) = temp_store();
    let records = parse_payload(
        r#"[{"meta_data": {"final_url": "https://huge.dev"},
             "pitch_data": {"replyLink": "h1", "engagement": {"views": 18000000000000000000}}},
            {"meta_data": {"final_url": "https://huge.dev"},
             "pitch_data": {"replyLink": "h2", "engagement": {"views": 9223372036854775807}}}]"#,
    )
    .expect("payload");
    let report = store.ingest_batch(&records).expect("ingest");
    let id = report.created[0].clone();

    let pitch = store.get_pitch(&id).expect("get");
    assert_eq!(pitch.total_engagement().views, MAX_COUNT);
    assert!(pitch.is_consistent());
    assert!(store.verify().expect("verify").is_empty());

    let rebuilt = store.rebuild().expect("rebuild");
    assert!(rebuilt.changed.is_empty());
    assert!(store.verify().expect("verify").is_empty());
}

const CATEGORY_PAYLOAD: &str = r#"[
    {"meta_data": {"final_url": "https://a.dev"},
     "seo_data": {"name": "Alpha", "category_id": 7, "category": "Dev Tools"},
     "pitch_data": {"replyLink": "a1", "engagement": {"replies": 1}}},
    {"meta_data": {"final_url": "https://b.dev"},
     "seo_data": {"name": "Beta", "category_id": "7"},
     "pitch_data": {"replyLink": "b1", "engagement": {"replies": 5}}},
    {"meta_data": {"final_url": "https://c.dev"},
     "seo_data": {"name": "Gamma", "category_id": 8, "category": "Dev Tools"},
     "pitch_data": {"replyLink": "c1", "engagement": {"replies": 3}}},
    {"meta_data": {"final_url": "https://d.dev"},
     "seo_data": {"name": "Delta"},
     "pitch_data": {"replyLink": "d1", "engagement": {"replies": 9}}}
]"#;

fn ids(pitches: Vec<pitchedlink_core::Pitch>) -> Vec<String> {
    pitches.into_iter().map(|p| p.id).collect()
}

#[test]
fn ingest_files_pitches_under_categories() {
    let (_dir, _path, mut store) = temp_store();
    let records = parse_payload(CATEGORY_PAYLOAD).expect("payload");
    store.ingest_batch(&records).expect("ingest");

    let slugs: Vec<(String, String, u64)> = store
        .categories()
        .expect("categories")
        .into_iter()
        .map(|s| (s.category.category_id, s.category.slug, s.pitch_count))
        .collect();
    assert_eq!(
        slugs,
        [
            ("7".to_string(), "dev-tools".to_string(), 2),
            ("8".to_string(), "dev-tools-1".to_string(), 1),
        ]
    );

    assert_eq!(ids(store.by_category("dev-tools", 20).expect("list")), ["beta", "alpha"]);
    assert_eq!(ids(store.by_category("8", 20).expect("list")), ["gamma"]);
    assert!(matches!(
        store.by_category("arcade", 20),
        Err(StoreError::CategoryNotFound(_))
    ));

    assert_eq!(store.get_pitch("alpha").expect("get").category.as_deref(), Some("7"));
    assert!(store.get_pitch("delta").expect("get").category.is_none());
    assert_eq!(
        ids(store.related("alpha", 10).expect("related")),
        ["beta", "delta", "gamma"]
    );
    assert!(store.verify().expect("verify").is_empty());
}

#[test]
fn reingest_refiles_but_never_uncategorizes() {
    let (_dir, _path, mut store) = temp_store();
    store
        .ingest_batch(&parse_payload(CATEGORY_PAYLOAD).expect("payload"))
        .expect("ingest");

    let update = parse_payload(
        r#"[{"meta_data": {"final_url": "https://a.dev"}, "seo_data": {"category_id": 8}},
            {"meta_data": {"final_url": "https://b.dev"}, "seo_data": {"name": "Beta"}}]"#,
    )
    .expect("payload");
    store.ingest_batch(&update).expect("ingest");

    assert_eq!(store.get_pitch("alpha").expect("get").category.as_deref(), Some("8"));
    assert_eq!(store.get_pitch("beta").expect("get").category.as_deref(), Some("7"));
    assert_eq!(ids(store.by_category("dev-tools-1", 20).expect("list")), ["gamma", "alpha"]);
}

#[test]
fn user_stats_cover_owned_pitches_only() {
    let (_dir, _path, mut store) = temp_store();
    store
        .ingest_batch(&parse_payload(SCENARIO_PAYLOAD).expect("payload"))
        .expect("ingest");
    let other = store.create_pitch("Other", None).expect("create");
    let rejected = store.create_pitch("Rejected", None).expect("create");

    store.set_claim("alice", "acme", ClaimStatus::Verified).expect("claim");
    store.set_claim("alice", &other.id, ClaimStatus::Pending).expect("claim");
    store.set_claim("alice", &rejected.id, ClaimStatus::Rejected).expect("claim");

    let stats = store.user_stats(" alice ").expect("stats");
    assert_eq!(stats.user_id, "alice");
    assert_eq!(stats.total_owned, 2);
    assert_eq!(stats.verified_claims, 1);
    assert_eq!(stats.total_engagement, 8);

    assert!(matches!(store.user_stats("  "), Err(StoreError::InvalidUser(_))));
}

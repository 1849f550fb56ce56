use chrono::{DateTime, Duration, TimeZone, Utc};
use feed_rank::api::{explain_request, rank_request, ApiExplainRequest, ApiItem, ApiRankRequest};
use feed_rank::config::RankingConfig;
use feed_rank::context::{filter_badges, BadgeKind, RecommendationContext};
use feed_rank::scoring::RankingPipeline;
use feed_rank::ItemType;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn api_item(id: &str, author: &str) -> ApiItem {
    ApiItem {
        id: Some(id.to_string()),
        author_id: Some(author.to_string()),
        created_at: Some(now() - Duration::hours(3)),
        poster_last_active_at: Some(now() - Duration::hours(3)),
        ..ApiItem::default()
    }
}

#[test]
fn negative_values_are_normalized_to_zero() {
    let mut raw = api_item("p1", "a");
    raw.likes = Some(-4);
    raw.reports = Some(-2);
    raw.distance_km = Some(-12.0);
    raw.content_length = Some(-1);

    let item = raw.into_item(now()).unwrap();

    assert_eq!(item.engagement.likes, 0);
    assert_eq!(item.negative_signals.reports, 0);
    assert_eq!(item.distance_km, Some(0.0));
    assert_eq!(item.content_length, 0);
}

#[test]
fn future_timestamps_are_pulled_back_to_now() {
    let mut raw = api_item("p1", "a");
    raw.created_at = Some(now() + Duration::days(2));

    let item = raw.into_item(now()).unwrap();

    assert_eq!(item.created_at, now());
}

#[test]
fn nan_distance_is_treated_as_unknown() {
    let mut raw = api_item("p1", "a");
    raw.distance_km = Some(f64::NAN);

    let item = raw.into_item(now()).unwrap();

    assert_eq!(item.distance_km, None);
}

#[test]
fn content_length_is_derived_from_content() {
    let mut raw = api_item("p1", "a");
    raw.item_type = Some("video".to_string());
    raw.content = Some("x".repeat(64));

    let item = raw.into_item(now()).unwrap();

    assert_eq!(item.item_type, ItemType::VideoPost);
    assert_eq!(item.content_length, 64);
}

#[test]
fn hashtags_and_mentions_are_detected_in_content() {
    let mut raw = api_item("p1", "a");
    raw.content = Some("Garden swap this Saturday #allotment, thanks @maya".to_string());
    let item = raw.into_item(now()).unwrap();
    assert!(item.has_hashtag);
    assert!(item.has_mention);

    let mut raw = api_item("p2", "a");
    raw.content = Some("Plain request for a lift".to_string());
    let item = raw.into_item(now()).unwrap();
    assert!(!item.has_hashtag);
    assert!(!item.has_mention);
}

#[test]
fn viewer_relationship_is_normalized() {
    let mut raw = api_item("p1", "a");
    raw.viewer_interactions = Some(-3);
    raw.viewer_follows_author = Some(true);

    let item = raw.into_item(now()).unwrap();

    assert_eq!(item.viewer_interactions, Some(0));
    assert!(item.viewer_follows_author);
    assert!(!api_item("p2", "a").into_item(now()).unwrap().viewer_follows_author);
}

#[test]
fn items_missing_required_fields_are_skipped_not_fatal() {
    let pipeline = RankingPipeline::new(RankingConfig::default());
    let mut good = api_item("good", "a");
    good.likes = Some(3);
    let mut no_author = api_item("orphan", "a");
    no_author.author_id = None;
    let mut no_date = api_item("undated", "b");
    no_date.created_at = None;

    let request = ApiRankRequest {
        items: vec![no_author, good, no_date, api_item("good", "c")],
        ..ApiRankRequest::default()
    };
    let response = rank_request(&pipeline, request, now());

    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].item_id, "good");
    assert_eq!(response.results[0].rank, 1);
    let skipped: Vec<usize> = response.skipped.iter().map(|d| d.index).collect();
    assert_eq!(skipped, vec![0, 2, 3]);
    assert_eq!(response.skipped[0].item_id.as_deref(), Some("orphan"));
    assert!(response.skipped[2].reason.contains("duplicate"));
}

#[test]
fn rank_request_parses_from_json() {
    let payload = r#"{
        "viewer_lat": 51.5,
        "viewer_lon": -0.12,
        "include_breakdown": true,
        "items": [
            {"id": "a", "author_id": "u1", "item_type": "image", "created_at": "2026-03-01T10:00:00Z",
             "poster_last_active_at": "2026-03-01T10:00:00Z", "likes": 2, "content_length": 120},
            {"id": "b", "author_id": "u2", "created_at": "2026-02-20T10:00:00Z",
             "poster_last_active_at": "2026-02-28T10:00:00Z", "comments": 3, "lat": 51.5, "lon": -0.12}
        ]
    }"#;
    let request: ApiRankRequest = serde_json::from_str(payload).unwrap();
    let pipeline = RankingPipeline::new(RankingConfig::default());

    let response = rank_request(&pipeline, request, now());

    assert_eq!(response.results.len(), 2);
    let b = response.results.iter().find(|r| r.item_id == "b").unwrap();
    let breakdown = b.breakdown.as_ref().unwrap();
    assert!(breakdown.distance_km.unwrap() < 0.01);
    assert!(breakdown.freshness < 1.0);
    let a = response.results.iter().find(|r| r.item_id == "a").unwrap();
    assert!((a.breakdown.as_ref().unwrap().quality - 1.3).abs() < 1e-6);
}

#[test]
fn explain_reports_badges_for_the_viewer() {
    let pipeline = RankingPipeline::new(RankingConfig::default());
    let mut raw = api_item("p1", "a");
    raw.author_joined_at = Some(now() - Duration::days(3));
    raw.poster_last_active_at = None;

    let member = explain_request(
        &pipeline,
        ApiExplainRequest {
            item: raw.clone(),
            ..ApiExplainRequest::default()
        },
        now(),
    )
    .unwrap();
    let admin = explain_request(
        &pipeline,
        ApiExplainRequest {
            item: raw,
            is_admin: Some(true),
            ..ApiExplainRequest::default()
        },
        now(),
    )
    .unwrap();

    assert!(member.context.is_new_member);
    assert!(member.context.is_inactive_creator);
    assert!(member.context.is_recent_post);
    let member_kinds: Vec<BadgeKind> = member.context.badges.iter().map(|b| b.kind).collect();
    assert_eq!(member_kinds, vec![BadgeKind::NewMember, BadgeKind::RecentPost]);
    assert_eq!(admin.context.badges.len(), 3);
}

#[test]
fn explain_rejects_items_without_identity() {
    let pipeline = RankingPipeline::new(RankingConfig::default());
    let mut raw = api_item("p1", "a");
    raw.id = Some("   ".to_string());

    let result = explain_request(
        &pipeline,
        ApiExplainRequest {
            item: raw,
            ..ApiExplainRequest::default()
        },
        now(),
    );

    assert!(result.is_err());
}

#[test]
fn old_posts_from_active_members_get_no_badges() {
    let pipeline = RankingPipeline::new(RankingConfig::default());
    let mut raw = api_item("p1", "a");
    raw.created_at = Some(now() - Duration::days(5));
    raw.author_joined_at = Some(now() - Duration::days(400));
    let item = raw.into_item(now()).unwrap();

    let breakdown = pipeline.explain(&item, &Default::default(), now());
    let context = RecommendationContext::for_item(&item, &breakdown, now());

    assert_eq!(context, RecommendationContext::default());
    assert!(filter_badges(&context.badges, true).is_empty());
}

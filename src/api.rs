//! Input is normalized here, not in the engine: negative counts and distances
//! become zero, a NaN distance is unknown, a future `created_at` becomes
//! `now`. Items missing `id`, `author_id` or `created_at` are reported in
//! `skipped` instead of ranked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::context::{Badge, RecommendationContext};
use crate::error::ApiError;
use crate::geo::GeoPoint;
use crate::scoring::{RankingPipeline, ScoreBreakdown};
use crate::{EngagementCounts, ItemType, NegativeSignals, ScorableItem, ViewerContext};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiItem {
    pub id: Option<String>,
    pub author_id: Option<String>,
    pub item_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub poster_last_active_at: Option<DateTime<Utc>>,
    pub author_joined_at: Option<DateTime<Utc>>,
    pub distance_km: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
    pub shares: Option<i64>,
    pub hides: Option<i64>,
    pub mutes: Option<i64>,
    pub blocks: Option<i64>,
    pub reports: Option<i64>,
    pub content_length: Option<i64>,
    pub content: Option<String>,
    pub has_hashtag: Option<bool>,
    pub has_mention: Option<bool>,
    pub viewer_interactions: Option<i64>,
    pub viewer_follows_author: Option<bool>,
}

impl ApiItem {
    pub fn into_item(self, now: DateTime<Utc>) -> Result<ScorableItem, ApiError> {
        let id = required_text(self.id, "id")?;
        let author_id = required_text(self.author_id, "author_id")?;
        let created_at = self
            .created_at
            .ok_or_else(|| ApiError::BadRequest(format!("item {}: created_at is required", id)))?
            .min(now);

        let content_length = match (self.content_length, self.content.as_deref()) {
            (Some(length), _) => clamp_count(length) as usize,
            (None, Some(content)) => content.chars().count(),
            (None, None) => 0,
        };
        let content = self.content.as_deref().unwrap_or("");
        let has_hashtag = self.has_hashtag.unwrap_or_else(|| content.contains('#'));
        let has_mention = self.has_mention.unwrap_or_else(|| content.contains('@'));

        let origin = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        };

        Ok(ScorableItem {
            id,
            author_id,
            item_type: ItemType::from_label(self.item_type.as_deref().unwrap_or("post")),
            created_at,
            poster_last_active_at: self.poster_last_active_at.map(|at| at.min(now)),
            distance_km: self
                .distance_km
                .filter(|distance| !distance.is_nan())
                .map(|distance| distance.max(0.0)),
            origin,
            author_joined_at: self.author_joined_at,
            engagement: EngagementCounts {
                likes: clamp_count(self.likes.unwrap_or(0)),
                comments: clamp_count(self.comments.unwrap_or(0)),
                shares: clamp_count(self.shares.unwrap_or(0)),
            },
            negative_signals: NegativeSignals {
                hides: clamp_count(self.hides.unwrap_or(0)),
                mutes: clamp_count(self.mutes.unwrap_or(0)),
                blocks: clamp_count(self.blocks.unwrap_or(0)),
                reports: clamp_count(self.reports.unwrap_or(0)),
            },
            content_length,
            has_hashtag,
            has_mention,
            viewer_interactions: self.viewer_interactions.map(clamp_count),
            viewer_follows_author: self.viewer_follows_author.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiRankRequest {
    #[serde(default)]
    pub items: Vec<ApiItem>,
    pub viewer_lat: Option<f64>,
    pub viewer_lon: Option<f64>,
    pub is_admin: Option<bool>,
    pub include_breakdown: Option<bool>,
}

impl ApiRankRequest {
    pub fn viewer(&self) -> ViewerContext {
        let viewer_location = match (self.viewer_lat, self.viewer_lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        };
        ViewerContext {
            viewer_location,
            is_admin: self.is_admin.unwrap_or(false),
        }
    }

    pub fn into_items(self, now: DateTime<Utc>) -> (Vec<ScorableItem>, Vec<ApiDiagnostic>) {
        let mut items = Vec::with_capacity(self.items.len());
        let mut skipped = Vec::new();
        let mut seen = HashSet::new();

        for (index, raw) in self.items.into_iter().enumerate() {
            let raw_id = raw.id.clone();
            match raw.into_item(now) {
                Ok(item) if !seen.insert(item.id.clone()) => skipped.push(ApiDiagnostic {
                    index,
                    item_id: Some(item.id.clone()),
                    reason: format!("duplicate id {}", item.id),
                }),
                Ok(item) => items.push(item),
                Err(err) => skipped.push(ApiDiagnostic {
                    index,
                    item_id: raw_id,
                    reason: err.to_string(),
                }),
            }
        }

        (items, skipped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDiagnostic {
    pub index: usize,
    pub item_id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiRankedItem {
    pub item_id: String,
    pub rank: usize,
    pub composite_score: f64,
    pub signal_penalty: f64,
    pub diversity_multiplier: f64,
    pub badges: Vec<Badge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiRankResponse {
    pub results: Vec<ApiRankedItem>,
    pub skipped: Vec<ApiDiagnostic>,
}

pub fn rank_request(
    pipeline: &RankingPipeline,
    request: ApiRankRequest,
    now: DateTime<Utc>,
) -> ApiRankResponse {
    let viewer = request.viewer();
    let include_breakdown = request.include_breakdown.unwrap_or(false);
    let (items, skipped) = request.into_items(now);

    let scored = pipeline.score(&items, &viewer, now);
    let by_id: HashMap<&str, &ScorableItem> =
        items.iter().map(|item| (item.id.as_str(), item)).collect();
    let results = scored
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| {
            let badges = by_id
                .get(candidate.item_id.as_str())
                .map(|item| {
                    RecommendationContext::for_item(item, &candidate.breakdown, now)
                        .visible_badges(viewer.is_admin)
                })
                .unwrap_or_default();

            ApiRankedItem {
                item_id: candidate.item_id,
                rank: index + 1,
                composite_score: candidate.score,
                signal_penalty: candidate.breakdown.signal_penalty,
                diversity_multiplier: candidate.diversity_multiplier,
                badges,
                breakdown: include_breakdown.then_some(candidate.breakdown),
            }
        })
        .collect();

    ApiRankResponse { results, skipped }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiExplainRequest {
    pub item: ApiItem,
    pub viewer_lat: Option<f64>,
    pub viewer_lon: Option<f64>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiExplainResponse {
    pub breakdown: ScoreBreakdown,
    pub context: RecommendationContext,
}

pub fn explain_request(
    pipeline: &RankingPipeline,
    request: ApiExplainRequest,
    now: DateTime<Utc>,
) -> Result<ApiExplainResponse, ApiError> {
    let viewer = ApiRankRequest {
        viewer_lat: request.viewer_lat,
        viewer_lon: request.viewer_lon,
        is_admin: request.is_admin,
        ..ApiRankRequest::default()
    }
    .viewer();
    let item = request.item.into_item(now)?;
    let breakdown = pipeline.explain(&item, &viewer, now);
    let mut context = RecommendationContext::for_item(&item, &breakdown, now);
    context.badges = context.visible_badges(viewer.is_admin);

    Ok(ApiExplainResponse { breakdown, context })
}

fn required_text(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}

fn clamp_count(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

use crate::config::RankingConfig;
use crate::geo;
use crate::scoring::{
    DecayCalculator, DiversityReranker, EngagementScorer, QualityAndSignalAdjuster,
    SocialGraphScorer,
};
use crate::{ItemType, RankingResult, ScorableItem, ViewerContext};

const SECONDS_PER_HOUR: f64 = 3600.0;
const HOURS_PER_DAY: f64 = 24.0;

#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub item_id: String,
    pub author_id: String,
    pub item_type: ItemType,
    pub created_at: DateTime<Utc>,
    pub breakdown: ScoreBreakdown,
    pub diversity_multiplier: f64,
    pub deferrals: usize,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub item_id: String,
    pub engagement_score: f64,
    pub base_score: f64,
    pub age_hours: f64,
    pub freshness: f64,
    pub distance_km: Option<f64>,
    pub geo: f64,
    pub inactive_days: Option<f64>,
    pub vitality: f64,
    pub quality: f64,
    pub social_graph: f64,
    pub signal_penalty: f64,
    pub composite_score: f64,
}

#[derive(Debug, Clone)]
pub struct RankingPipeline {
    enabled: bool,
    engagement: EngagementScorer,
    decay: DecayCalculator,
    adjuster: QualityAndSignalAdjuster,
    social: SocialGraphScorer,
    diversity: DiversityReranker,
}

impl RankingPipeline {
    pub fn new(config: RankingConfig) -> Self {
        Self {
            enabled: config.enabled,
            engagement: EngagementScorer::new(config.engagement),
            decay: DecayCalculator::new(config.freshness, config.geo, config.vitality),
            adjuster: QualityAndSignalAdjuster::new(config.quality, config.negative_signals),
            social: SocialGraphScorer::new(config.social_graph),
            diversity: DiversityReranker::new(config.diversity),
        }
    }

    pub fn rank_at(
        &self,
        items: &[ScorableItem],
        viewer: &ViewerContext,
        now: DateTime<Utc>,
    ) -> Vec<RankingResult> {
        self.score(items, viewer, now)
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| RankingResult {
                item_id: candidate.item_id,
                composite_score: candidate.score,
                rank: index + 1,
                signal_penalty: candidate.breakdown.signal_penalty,
            })
            .collect()
    }

    pub fn score(
        &self,
        items: &[ScorableItem],
        viewer: &ViewerContext,
        now: DateTime<Utc>,
    ) -> Vec<ScoredCandidate> {
        if items.is_empty() {
            return Vec::new();
        }

        let mut candidates: Vec<ScoredCandidate> = items
            .par_iter()
            .map(|item| {
                let breakdown = self.explain(item, viewer, now);
                ScoredCandidate {
                    item_id: item.id.clone(),
                    author_id: item.author_id.clone(),
                    item_type: item.item_type.clone(),
                    created_at: item.created_at,
                    score: breakdown.composite_score,
                    breakdown,
                    diversity_multiplier: 1.0,
                    deferrals: 0,
                }
            })
            .collect();

        if !self.enabled {
            for candidate in candidates.iter_mut() {
                candidate.score = candidate.breakdown.base_score;
            }
            candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            debug!(candidates = candidates.len(), "ranking disabled, using chronological order");
            return candidates;
        }

        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        debug!(candidates = candidates.len(), "scored feed candidates");

        self.diversity.rerank(candidates)
    }

    pub fn explain(
        &self,
        item: &ScorableItem,
        viewer: &ViewerContext,
        now: DateTime<Utc>,
    ) -> ScoreBreakdown {
        let engagement_score = self.engagement.score(&item.engagement);
        let base_score = self.engagement.base_score(&item.engagement);

        let age_hours = hours_between(item.created_at, now);
        let freshness = self.decay.freshness(age_hours);

        let distance_km = item
            .distance_km
            .or_else(|| geo::resolve_distance(viewer.viewer_location, item.origin));
        let geo = self.decay.geo(distance_km);

        let inactive_days = item
            .poster_last_active_at
            .map(|active| hours_between(active, now) / HOURS_PER_DAY);
        let vitality = self.decay.vitality(inactive_days);

        let quality = self
            .adjuster
            .quality_boost(&item.item_type, item.content_length)
            * self.adjuster.markup_boost(item.has_hashtag, item.has_mention);

        let social_graph = self
            .social
            .boost(item.viewer_interactions, item.viewer_follows_author);

        let boosted = base_score * freshness * geo * vitality * quality * social_graph;
        let penalized = self.adjuster.apply_penalty(boosted, &item.negative_signals);

        ScoreBreakdown {
            item_id: item.id.clone(),
            engagement_score,
            base_score,
            age_hours,
            freshness,
            distance_km,
            geo,
            inactive_days,
            vitality,
            quality,
            social_graph,
            signal_penalty: penalized.penalty,
            composite_score: penalized.score,
        }
    }
}

fn hours_between(earlier: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let seconds = (now - earlier).num_seconds().max(0);
    seconds as f64 / SECONDS_PER_HOUR
}

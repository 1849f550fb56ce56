use serde::{Deserialize, Serialize};

use crate::EngagementCounts;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementWeights {
    pub like_weight: f64,
    pub comment_weight: f64,
    pub share_weight: f64,
    pub default_score: f64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            like_weight: 1.0,
            comment_weight: 5.0,
            share_weight: 8.0,
            default_score: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngagementScorer {
    weights: EngagementWeights,
}

impl EngagementScorer {
    pub fn new(weights: EngagementWeights) -> Self {
        Self { weights }
    }

    pub fn score(&self, counts: &EngagementCounts) -> f64 {
        let mut score = 0.0;

        score += f64::from(counts.likes) * self.weights.like_weight;
        score += f64::from(counts.comments) * self.weights.comment_weight;
        score += f64::from(counts.shares) * self.weights.share_weight;

        score
    }

    pub fn base_score(&self, counts: &EngagementCounts) -> f64 {
        let score = self.score(counts);
        if score > 0.0 {
            score
        } else {
            self.weights.default_score
        }
    }
}
